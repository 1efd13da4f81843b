//! Configuration store for the selection tools.
//!
//! The configuration is a flat text file under `$QDASVGWHOME`. Parameter rows
//! are whitespace separated: `STATION KEY VALUE...` for the full tool and
//! `KEY VALUE...` for the reduced tool. A block delimited by
//! `VIGNET TABLE START` / `VIGNET TABLE END` holds vignetting rows of the form
//! `STATION FOVNAME v1 v2 ...`. `#` starts a comment.
//!
//! The file is read once into an immutable [`ConfigStore`]; lookups never
//! touch the filesystem again.

use crate::error::{Result, SelectionError};
use crate::station::Station;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the configuration home directory.
pub const CONFIG_HOME_ENV: &str = "QDASVGWHOME";

/// Configuration file of the full (AG) tool, relative to the config home.
pub const AG_CONFIG_FILE: &str = "AgAutoSelect.cfg";

/// Configuration file of the reduced (SH) tool, relative to the config home.
pub const SH_CONFIG_FILE: &str = "ShAutoSelect.cfg";

const VIGNET_START: &str = "VIGNET TABLE START";
const VIGNET_END: &str = "VIGNET TABLE END";

/// Minimum separation used by the reduced tool when `MINSEP` is absent (arcsec).
pub const DEFAULT_SH_MINSEP_ARCSEC: f64 = 10.0;

/// Resolve `<$QDASVGWHOME>/<file>`.
pub fn default_config_path(file: &str) -> Result<PathBuf> {
    let home =
        std::env::var(CONFIG_HOME_ENV).map_err(|_| SelectionError::MissingEnv(CONFIG_HOME_ENV))?;
    Ok(PathBuf::from(home).join(file))
}

/// Parsed, read-only view of a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    rows: Vec<Vec<String>>,
    vignet_rows: Vec<Vec<String>>,
}

impl ConfigStore {
    /// Load and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SelectionError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(Self::parse(&text))
    }

    /// Load `path` if given, otherwise `<$QDASVGWHOME>/<file>`.
    pub fn locate(path: Option<&Path>, file: &str) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&default_config_path(file)?),
        }
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Self {
        let mut store = ConfigStore::default();
        let mut in_table = false;

        for raw in text.lines() {
            if raw.contains(VIGNET_START) {
                in_table = true;
                continue;
            }
            if raw.contains(VIGNET_END) {
                in_table = false;
                continue;
            }

            let content = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let tokens: Vec<String> = content.split_whitespace().map(str::to_string).collect();
            if tokens.is_empty() {
                continue;
            }

            if in_table {
                store.vignet_rows.push(tokens);
            } else {
                store.rows.push(tokens);
            }
        }

        store
    }

    /// Values following `KEY` on the first row keyed by `key` alone.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row[0] == key)
            .map(|row| &row[1..])
    }

    /// Values following `STATION KEY` on the first row keyed by both.
    pub fn station_values(&self, station: &str, key: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|row| row.len() >= 2 && row[0] == station && row[1] == key)
            .map(|row| &row[2..])
    }

    /// First value of a reduced-tool parameter, parsed.
    pub fn get<T: FromStr>(&self, key: &str) -> Result<T> {
        let values = self
            .values(key)
            .ok_or_else(|| SelectionError::MissingParameter {
                station: "-".to_string(),
                key: key.to_string(),
            })?;
        parse_value(key, values.first())
    }

    /// First value of a station parameter, parsed.
    pub fn station_get<T: FromStr>(&self, station: &str, key: &str) -> Result<T> {
        let values =
            self.station_values(station, key)
                .ok_or_else(|| SelectionError::MissingParameter {
                    station: station.to_string(),
                    key: key.to_string(),
                })?;
        parse_value(key, values.first())
    }

    /// Numeric rows of the vignetting table for `(station, fov_name)`, in file order.
    pub fn vignet_rows(&self, station: &str, fov_name: &str) -> Result<Vec<Vec<f64>>> {
        self.vignet_rows
            .iter()
            .filter(|row| row.len() >= 2 && row[0] == station && row[1] == fov_name)
            .map(|row| {
                row[2..]
                    .iter()
                    .map(|v| {
                        v.parse::<f64>().map_err(|_| {
                            SelectionError::MalformedVignetting(format!(
                                "non-numeric value {v:?} in {station} {fov_name} row"
                            ))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

fn parse_value<T: FromStr>(key: &str, value: Option<&String>) -> Result<T> {
    let value = value.ok_or_else(|| SelectionError::InvalidParameter {
        key: key.to_string(),
        value: String::new(),
    })?;
    value.parse().map_err(|_| SelectionError::InvalidParameter {
        key: key.to_string(),
        value: value.clone(),
    })
}

/// Acceptance rectangle of a prime focus station, degrees in probe-aligned axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Rectangle {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Per-station parameters read by the full tool.
#[derive(Debug, Clone, PartialEq)]
pub struct StationParams {
    /// Field of view radius, degrees.
    pub fov_radius: f64,
    /// Rectangular acceptance region (prime focus stations only).
    pub rectangle: Option<Rectangle>,
    /// Requested number of candidates.
    pub star_num: usize,
    /// Upper bound on the preferred count.
    pub max_pref_num: usize,
    /// Minimum separation between usable stars, arcsec.
    pub min_sep_arcsec: f64,
    /// Field radius of the instrument in use, degrees.
    pub instrument_radius: f64,
    /// Edge vignetting constant.
    pub edge_vignetting: f64,
    /// Probe vignetting radius, degrees.
    pub probe_vignetting_radius: f64,
    /// Degrees per vignetting radius bucket.
    pub scale: f64,
}

impl StationParams {
    /// Read every parameter the full tool needs for `station` observing with `instrument`.
    pub fn load(config: &ConfigStore, station: &Station, instrument: &str) -> Result<Self> {
        let name = station.name.as_str();
        let fov = config
            .station_values(name, "FOV")
            .ok_or_else(|| SelectionError::MissingParameter {
                station: name.to_string(),
                key: "FOV".to_string(),
            })?;
        let fov_radius: f64 = parse_value("FOV", fov.first())?;

        let rectangle = if station.class.is_rectangular() {
            if fov.len() < 5 {
                return Err(SelectionError::MissingParameter {
                    station: name.to_string(),
                    key: "FOV rectangle".to_string(),
                });
            }
            Some(Rectangle {
                x0: parse_value("FOV", fov.get(1))?,
                x1: parse_value("FOV", fov.get(2))?,
                y0: parse_value("FOV", fov.get(3))?,
                y1: parse_value("FOV", fov.get(4))?,
            })
        } else {
            None
        };

        let params = Self {
            fov_radius,
            rectangle,
            star_num: config.station_get(name, "NUMBER")?,
            max_pref_num: config.station_get(name, "MAXPREFNUM")?,
            min_sep_arcsec: config.station_get(name, "MINSEP")?,
            instrument_radius: config.station_get(name, instrument)?,
            edge_vignetting: config.station_get(name, "EVIG")?,
            probe_vignetting_radius: config.station_get(name, "VIGNET")?,
            scale: config.station_get(name, "SCALE")?,
        };

        if params.instrument_radius <= 0.0 {
            return Err(SelectionError::InvalidParameter {
                key: instrument.to_string(),
                value: params.instrument_radius.to_string(),
            });
        }
        if params.scale <= 0.0 {
            return Err(SelectionError::InvalidParameter {
                key: "SCALE".to_string(),
                value: params.scale.to_string(),
            });
        }

        log::debug!("station {station}: {params:?}");
        Ok(params)
    }
}

/// Parameters read by the reduced tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ShParams {
    pub star_num: usize,
    pub max_pref_num: usize,
    pub limit_mag: f64,
    pub good_mag: f64,
    pub min_sep_arcsec: f64,
}

impl ShParams {
    pub fn load(config: &ConfigStore) -> Result<Self> {
        let min_sep_arcsec = match config.values("MINSEP") {
            Some(values) => parse_value("MINSEP", values.first())?,
            None => DEFAULT_SH_MINSEP_ARCSEC,
        };
        let params = Self {
            limit_mag: config.get("LIMITMAG")?,
            star_num: config.get("NUMBER")?,
            max_pref_num: config.get("MAXPREFNUM")?,
            good_mag: config.get("GOODMAG")?,
            min_sep_arcsec,
        };
        log::debug!("reduced tool parameters: {params:?}");
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
# station parameters
CS FOV 0.1
CS NUMBER 10
CS MAXPREFNUM 3
CS MINSEP 30.0   # arcsec
CS MOIRCS 0.05
CS EVIG 1.0
CS VIGNET 0.01
CS SCALE 0.0005
P_OPT FOV 0.4 -0.1 0.1 -0.2 0.2
#CS NUMBER 99
VIGNET TABLE START
CS STANDARD 0.0 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100
CS STANDARD 360.0 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100
VIGNET TABLE END
";

    #[test]
    fn test_station_lookup() {
        let store = ConfigStore::parse(SAMPLE);
        let fov: f64 = store.station_get("CS", "FOV").unwrap();
        assert_relative_eq!(fov, 0.1);
        let num: usize = store.station_get("CS", "NUMBER").unwrap();
        assert_eq!(num, 10);
        let minsep: f64 = store.station_get("CS", "MINSEP").unwrap();
        assert_relative_eq!(minsep, 30.0);
    }

    #[test]
    fn test_missing_parameter_is_configuration_error() {
        let store = ConfigStore::parse(SAMPLE);
        let err = store.station_get::<f64>("NS_OPT", "FOV").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_exact_token_match() {
        let store = ConfigStore::parse(SAMPLE);
        // "CS" must not match the "CS_OPT" station or a key containing "FOV"
        assert!(store.station_values("CS_OPT", "FOV").is_none());
        assert!(store.station_values("C", "FOV").is_none());
    }

    #[test]
    fn test_vignet_rows_are_separated() {
        let store = ConfigStore::parse(SAMPLE);
        let rows = store.vignet_rows("CS", "STANDARD").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 17);
        assert_relative_eq!(rows[1][0], 360.0);
        assert!(store.station_values("CS", "STANDARD").is_none());
        assert!(store.vignet_rows("CS", "WIDE").unwrap().is_empty());
    }

    #[test]
    fn test_station_params() {
        let store = ConfigStore::parse(SAMPLE);
        let params = StationParams::load(&store, &Station::new("CS"), "MOIRCS").unwrap();
        assert_eq!(params.star_num, 10);
        assert_eq!(params.max_pref_num, 3);
        assert!(params.rectangle.is_none());
        assert_relative_eq!(params.instrument_radius, 0.05);
    }

    #[test]
    fn test_prime_focus_rectangle_required() {
        let text = "P_OPT FOV 0.4\n";
        let store = ConfigStore::parse(text);
        let err = StationParams::load(&store, &Station::new("P_OPT"), "HSC").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_rectangle_edges_inclusive() {
        let rect = Rectangle {
            x0: -1.0,
            x1: 1.0,
            y0: -2.0,
            y1: 2.0,
        };
        assert!(rect.contains(1.0, -2.0));
        assert!(!rect.contains(1.0001, 0.0));
    }

    #[test]
    fn test_sh_params_default_minsep() {
        let store = ConfigStore::parse("NUMBER 5\nMAXPREFNUM 2\nLIMITMAG 14.0\nGOODMAG 12.0\n");
        let params = ShParams::load(&store).unwrap();
        assert_eq!(params.star_num, 5);
        assert_relative_eq!(params.min_sep_arcsec, DEFAULT_SH_MINSEP_ARCSEC);
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let store = ConfigStore::load(file.path()).unwrap();
        assert_eq!(store.station_get::<usize>("CS", "NUMBER").unwrap(), 10);

        let err = ConfigStore::load(&file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, SelectionError::ConfigIo { .. }));
    }

    #[test]
    fn test_default_path_requires_environment() {
        let previous = std::env::var_os(CONFIG_HOME_ENV);
        std::env::remove_var(CONFIG_HOME_ENV);
        let missing = default_config_path(SH_CONFIG_FILE);
        let located = ConfigStore::locate(None, SH_CONFIG_FILE);

        std::env::set_var(CONFIG_HOME_ENV, "/opt/selection");
        let present = default_config_path(AG_CONFIG_FILE);
        match previous {
            Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
            None => std::env::remove_var(CONFIG_HOME_ENV),
        }

        let err = missing.unwrap_err();
        assert!(matches!(err, SelectionError::MissingEnv(CONFIG_HOME_ENV)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(located, Err(SelectionError::MissingEnv(_))));
        assert_eq!(
            present.unwrap(),
            PathBuf::from("/opt/selection").join(AG_CONFIG_FILE)
        );
    }

    #[test]
    fn test_invalid_integer() {
        let store = ConfigStore::parse("NUMBER five\n");
        let err = store.get::<usize>("NUMBER").unwrap_err();
        assert!(matches!(err, SelectionError::InvalidParameter { .. }));
    }
}
