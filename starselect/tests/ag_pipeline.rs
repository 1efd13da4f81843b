use approx::assert_relative_eq;
use starselect::catalog::BANNER;
use starselect::config::{ConfigStore, AG_CONFIG_FILE, CONFIG_HOME_ENV};
use starselect::pipeline::run_ag;
use starselect::{ErrorKind, PointingContext, SelectionError};
use test_helpers::{parse_output, CatalogBuilder, ConfigHome, AG_CONFIG};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn context(station: &str, instrument: &str, rotation: f64) -> PointingContext {
    PointingContext {
        rotation,
        limit_mag: 16.0,
        good_mag: 12.0,
        ..PointingContext::new(150.0, 0.0, station, instrument, "STANDARD")
    }
}

fn cassegrain_field() -> String {
    CatalogBuilder::new("10:00:00.000", "+00:00:00.00", 15.0)
        .header_line("Epoch=J2000.0")
        .star("GS0001", 150.05, 0.0, 12.0, 2, 0.3)
        .star("GS0002", 150.0, 0.03, 12.5, 2, 0.4)
        .star("GS0003", 150.0, -0.06, 13.0, 1, 0.5)
        // Outside the field
        .star("GS0004", 150.2, 0.0, 12.0, 2, 0.6)
        // Inside the instrument zone
        .star("US0005", 150.0, 0.005, 11.0, 2, 0.7)
        // Fainter than MaximumMagnitude
        .star("GS0006", 150.0, 0.04, 15.5, 2, 0.8)
        .build()
}

#[test]
fn test_cassegrain_ranking() {
    init_logging();
    let config = ConfigStore::parse(AG_CONFIG);
    let input = cassegrain_field();
    let mut output = Vec::new();

    let selection = run_ag(&context("CS", "MOIRCS", 0.0), &config, input.as_bytes(), &mut output)
        .unwrap();
    assert_eq!(selection.candidate_count, 4);
    assert_eq!(selection.preferred_count, 3);

    let text = String::from_utf8(output).unwrap();
    let out = parse_output(&text);
    assert_eq!(&out.header[..BANNER.len()], &BANNER);
    assert!(out.header.contains(&"FieldCenterRA=10:00:00.000".to_string()));
    assert!(out.header.contains(&"Epoch=J2000.0".to_string()));
    assert!(!out.header.iter().any(|l| l.starts_with("StarNumber")));
    assert_eq!(out.star_number, Some(4));
    assert_eq!(out.preferred_number, Some(3));

    let names: Vec<&str> = out.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["GS0001", "GS0002", "GS0003", "US0005"]);
    let priorities: Vec<usize> = out.records.iter().map(|r| r.priority).collect();
    assert_eq!(priorities, vec![1, 2, 3, 4]);

    let expected = [(10.0, 3.0), (9.5, 1.8), (8.0, 3.6), (-28.5, 0.3)];
    for (record, (pref, distance)) in out.records.iter().zip(expected) {
        assert_relative_eq!(record.pref, pref, epsilon = 1e-6);
        // Distance column is in arcminutes
        assert_relative_eq!(record.distance, distance, epsilon = 1e-6);
    }
}

fn prime_focus_field() -> String {
    CatalogBuilder::new("10:00:00.000", "+00:00:00.00", 15.0)
        .star("GS0001", 150.03, 0.0, 12.0, 2, 0.1)
        .star("GS0002", 150.0, 0.07, 12.0, 2, 0.2)
        .star("GS0003", 150.0, 0.12, 12.0, 2, 0.3)
        .star("GS0004", 150.06, 0.0, 12.0, 2, 0.4)
        .build()
}

#[test]
fn test_prime_focus_rectangle_and_taper() {
    init_logging();
    let config = ConfigStore::parse(AG_CONFIG);
    let input = prime_focus_field();
    let mut output = Vec::new();

    run_ag(&context("P_OPT", "HSC", 0.0), &config, input.as_bytes(), &mut output).unwrap();
    let out = parse_output(&String::from_utf8(output).unwrap());

    assert_eq!(out.star_number, Some(4));
    assert_eq!(out.preferred_number, Some(1));
    assert_eq!(out.records[0].name, "GS0001");
    assert_relative_eq!(out.records[0].pref, 10.0, epsilon = 1e-9);

    // Outside the rectangle, but not rejected by the selector
    let outside = out.records.iter().find(|r| r.name == "GS0002").unwrap();
    assert_relative_eq!(outside.pref, -90.0, epsilon = 1e-9);

    // Between the full and half transmission radii of the taper
    let tapered = out.records.iter().find(|r| r.name == "GS0003").unwrap();
    assert!(tapered.mag > 12.2 && tapered.mag < 12.3, "mag {}", tapered.mag);
    assert!(tapered.pref < -90.0);
}

#[test]
fn test_prime_focus_rotation_turns_rectangle() {
    init_logging();
    let config = ConfigStore::parse(AG_CONFIG);
    let input = prime_focus_field();
    let mut output = Vec::new();

    run_ag(&context("P_OPT", "HSC", 45.0), &config, input.as_bytes(), &mut output).unwrap();
    let out = parse_output(&String::from_utf8(output).unwrap());

    // At 45 degrees the square covers the corners along both axes
    let names: Vec<&str> = out.records.iter().take(3).map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["GS0001", "GS0002", "GS0004"]);
    assert_eq!(out.preferred_number, Some(2));
}

#[test]
fn test_vignetting_table_must_close_at_360() {
    init_logging();
    let text = AG_CONFIG.replace("CS STANDARD 360.0", "CS STANDARD 350.0");
    let config = ConfigStore::parse(&text);
    let input = cassegrain_field();
    let mut output = Vec::new();

    let err = run_ag(&context("CS", "MOIRCS", 0.0), &config, input.as_bytes(), &mut output)
        .unwrap_err();
    assert!(matches!(err, SelectionError::MalformedVignetting(_)));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert!(output.is_empty());
}

#[test]
fn test_missing_station_parameter() {
    init_logging();
    let text = AG_CONFIG.replace("CS MINSEP     10.0      # arcsec\n", "");
    let config = ConfigStore::parse(&text);
    let input = cassegrain_field();
    let mut output = Vec::new();

    let err = run_ag(&context("CS", "MOIRCS", 0.0), &config, input.as_bytes(), &mut output)
        .unwrap_err();
    assert!(matches!(
        err,
        SelectionError::MissingParameter { ref key, .. } if key == "MINSEP"
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(output.is_empty());

    // Unknown instrument has no field radius
    let err = run_ag(
        &context("CS", "NOSUCH", 0.0),
        &ConfigStore::parse(AG_CONFIG),
        input.as_bytes(),
        &mut output,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_bad_record_writes_nothing() {
    init_logging();
    let config = ConfigStore::parse(AG_CONFIG);
    let input = CatalogBuilder::new("10:00:00.000", "+00:00:00.00", 15.0)
        .star("GS0001", 150.05, 0.0, 12.0, 2, 0.3)
        .raw_record("GS0002\t150.0\tnot-a-number\t12.0\t2\t0.3")
        .build();
    let mut output = Vec::new();

    let err = run_ag(&context("CS", "MOIRCS", 0.0), &config, input.as_bytes(), &mut output)
        .unwrap_err();
    // Six header lines, StarNumber, column header and separator come first
    assert!(matches!(err, SelectionError::MalformedRecord { line: 11, .. }));
    assert!(output.is_empty());
}

#[test]
fn test_maximum_magnitude_is_required() {
    init_logging();
    let config = ConfigStore::parse(AG_CONFIG);
    let input = CatalogBuilder::bare()
        .star("GS0001", 150.05, 0.0, 12.0, 2, 0.3)
        .build();
    let mut output = Vec::new();

    let err = run_ag(&context("CS", "MOIRCS", 0.0), &config, input.as_bytes(), &mut output)
        .unwrap_err();
    assert!(matches!(err, SelectionError::MalformedHeader(_)));
}

#[test]
fn test_config_location() {
    init_logging();
    let home = ConfigHome::new().unwrap();
    let path = home.write(AG_CONFIG_FILE, AG_CONFIG).unwrap();

    let explicit = ConfigStore::locate(Some(path.as_path()), AG_CONFIG_FILE).unwrap();
    assert!(explicit.station_values("CS", "FOV").is_some());

    let previous = std::env::var_os(CONFIG_HOME_ENV);
    std::env::set_var(CONFIG_HOME_ENV, home.path());
    let from_env = ConfigStore::locate(None, AG_CONFIG_FILE);
    match previous {
        Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
        None => std::env::remove_var(CONFIG_HOME_ENV),
    }
    assert!(from_env.unwrap().station_values("P_OPT", "HSC").is_some());

    let missing = home.path().join("missing.cfg");
    let err = ConfigStore::locate(Some(missing.as_path()), AG_CONFIG_FILE).unwrap_err();
    assert!(matches!(err, SelectionError::ConfigIo { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
