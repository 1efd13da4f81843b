//! Fixture builders shared by the star selection tests.
//!
//! Provides sample configuration files for both tools, a builder for catalog
//! streams in the header + tab separated record format, and scratch
//! configuration homes backed by temporary directories.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Full tool configuration with a Cassegrain station (sixteen-point table)
/// and a prime focus station (three-radius table).
///
/// Cassegrain: 0.1 deg field, MOIRCS radius 0.02 deg, clear optics.
/// Prime focus: 0.1 deg square rectangle, HSC radius 0.01 deg, taper from
/// bucket 100 to 190.
pub const AG_CONFIG: &str = "\
# Autoguider selection parameters
#
# STATION KEY VALUE...
CS FOV        0.1
CS NUMBER     5
CS MAXPREFNUM 3
CS MINSEP     10.0      # arcsec
CS MOIRCS     0.02
CS EVIG       1.0
CS VIGNET     0.0
CS SCALE      0.001

P_OPT FOV        0.4 -0.05 0.05 -0.05 0.05
P_OPT NUMBER     5
P_OPT MAXPREFNUM 2
P_OPT MINSEP     10.0
P_OPT HSC        0.01
P_OPT EVIG       1.0
P_OPT VIGNET     0.0
P_OPT SCALE      0.001

VIGNET TABLE START
CS STANDARD   0.0 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100
CS STANDARD 180.0 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100
CS STANDARD 360.0 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100 100
P_OPT STANDARD   0.0 100 150 190
P_OPT STANDARD 360.0 100 150 190
VIGNET TABLE END
";

/// Reduced tool configuration.
pub const SH_CONFIG: &str = "\
# Wavefront sensor selection parameters
NUMBER     5
MAXPREFNUM 3
LIMITMAG   14.0
GOODMAG    12.0
MINSEP     10.0
";

/// Builder for catalog streams.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    header: Vec<String>,
    records: Vec<String>,
    announce_count: bool,
}

impl CatalogBuilder {
    /// Stream with a field center and a magnitude range in the header.
    pub fn new(center_ra: &str, center_dec: &str, max_mag: f64) -> Self {
        Self {
            header: vec![
                format!("FieldCenterRA={center_ra}"),
                format!("FieldCenterDEC={center_dec}"),
                "FieldRangeRA(arcmin)=  6.0".to_string(),
                "FieldRangeDEC(arcmin)=  6.0".to_string(),
                "MinimumMagnitude= 0.0".to_string(),
                format!("MaximumMagnitude={max_mag:.1}"),
            ],
            records: Vec::new(),
            announce_count: true,
        }
    }

    /// Stream with no recognized header keys at all.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Add a free-form header line.
    pub fn header_line(mut self, line: &str) -> Self {
        self.header.push(line.to_string());
        self
    }

    /// Omit the `StarNumber` line.
    pub fn without_count(mut self) -> Self {
        self.announce_count = false;
        self
    }

    pub fn star(mut self, name: &str, ra: f64, dec: f64, mag: f64, flag: i32, color: f64) -> Self {
        self.records
            .push(format!("{name}\t{ra}\t{dec}\t{mag}\t{flag}\t{color}"));
        self
    }

    /// Add a raw record line.
    pub fn raw_record(mut self, line: &str) -> Self {
        self.records.push(line.to_string());
        self
    }

    pub fn build(&self) -> String {
        let mut text = String::new();
        for line in &self.header {
            let _ = writeln!(text, "{line}");
        }
        if self.announce_count {
            let _ = writeln!(text, "StarNumber=    {}", self.records.len());
        }
        let _ = writeln!(text, "name\tRA\tDEC\tmag\tFlag\tB-R");
        let _ = writeln!(text, "----\t--\t---\t---\t----\t---");
        for line in &self.records {
            let _ = writeln!(text, "{line}");
        }
        text
    }
}

/// Temporary configuration home directory.
pub struct ConfigHome {
    dir: TempDir,
}

impl ConfigHome {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `<home>/<file>` and return the full path.
    pub fn write(&self, file: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(file);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

/// One parsed output record.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub name: String,
    pub mag: f64,
    pub flag: i32,
    pub pref: f64,
    pub priority: usize,
    pub distance: f64,
}

/// Parsed output stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputStream {
    pub header: Vec<String>,
    pub star_number: Option<usize>,
    pub preferred_number: Option<usize>,
    pub records: Vec<OutputRecord>,
}

fn summary_value(line: &str, key: &str) -> Option<usize> {
    line.strip_prefix(key)?.strip_prefix('=')?.trim().parse().ok()
}

/// Split an output stream into header lines, summary values and records.
///
/// Panics on a malformed record line; only meant for tests.
pub fn parse_output(text: &str) -> OutputStream {
    let mut out = OutputStream::default();
    let mut in_records = false;
    for line in text.lines() {
        if in_records {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 9, "bad output record {line:?}");
            out.records.push(OutputRecord {
                name: fields[0].to_string(),
                mag: fields[3].parse().expect("mag"),
                flag: fields[4].parse().expect("flag"),
                pref: fields[6].parse().expect("preference"),
                priority: fields[7].parse().expect("priority"),
                distance: fields[8].parse().expect("distance"),
            });
        } else if let Some(n) = summary_value(line, "StarNumber") {
            out.star_number = Some(n);
        } else if let Some(n) = summary_value(line, "PreferedNumber") {
            out.preferred_number = Some(n);
        } else if line.starts_with("----") {
            in_records = true;
        } else if !line.starts_with("name\t") {
            out.header.push(line.to_string());
        }
    }
    out
}
