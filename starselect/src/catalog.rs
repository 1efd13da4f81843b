//! Catalog stream: the text protocol both tools read on stdin and write on stdout.
//!
//! Input is a free-form header followed by one tab separated record per star:
//!
//! ```text
//! FieldCenterRA=10:00:00.000
//! FieldCenterDEC=+20:00:00.00
//! MaximumMagnitude=15.0
//! StarNumber=    2
//! name    RA      DEC     mag     Flag    B-R
//! ----    --      ---     ---     ----    ---
//! GS0001  150.01  20.01   11.5    2       0.3
//! ```
//!
//! Recognized header keys are parsed in place; `StarNumber` and the column
//! header/separator lines are dropped and everything else is echoed to the
//! output header. The header ends once both the column header and the
//! separator have been seen.

use crate::candidate::Candidate;
use crate::error::{Result, SelectionError};
use crate::selection::Selection;
use std::io::{BufRead, Write};

/// Fixed lines opening every output stream.
pub const BANNER: [&str; 4] = [
    "Guide Star Selection",
    "by",
    "Star Catalog Search System",
    "",
];

/// Output column header and separator.
pub const COLUMN_HEADER: &str = "name\tRA\tDEC\tmag\tFlag\tB-R\tPreference\tPriority\tDistance";
pub const COLUMN_SEPARATOR: &str = "----\t--\t---\t---\t----\t---\t----------\t--------\t--------";

/// Summary keys written after the echoed header.
pub const STAR_NUMBER_KEY: &str = "StarNumber";
pub const PREFERRED_NUMBER_KEY: &str = "PreferedNumber";

/// Number of leading fields of a record; further columns are ignored.
const RECORD_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKey {
    CenterRa,
    CenterDec,
    RangeRa,
    RangeDec,
    MinMag,
    MaxMag,
    StarNumber,
    ColumnNames,
    Separator,
}

const HEADER_KEYS: [(HeaderKey, &str); 9] = [
    (HeaderKey::CenterRa, "FieldCenterRA"),
    (HeaderKey::CenterDec, "FieldCenterDEC"),
    (HeaderKey::RangeRa, "FieldRangeRA"),
    (HeaderKey::RangeDec, "FieldRangeDEC"),
    (HeaderKey::MinMag, "MinimumMagnitude"),
    (HeaderKey::MaxMag, "MaximumMagnitude"),
    (HeaderKey::StarNumber, STAR_NUMBER_KEY),
    (HeaderKey::ColumnNames, "name"),
    (HeaderKey::Separator, "----"),
];

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.len() >= prefix.len()
        && line.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Parsed header of an input catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogHeader {
    /// Header lines echoed to the output, in input order.
    pub passthrough: Vec<String>,
    /// Field center, degrees.
    pub center_ra: Option<f64>,
    pub center_dec: Option<f64>,
    /// Field extent, degrees.
    pub range_ra: Option<f64>,
    pub range_dec: Option<f64>,
    pub min_mag: Option<f64>,
    pub max_mag: Option<f64>,
    /// Number of records announced by the header.
    pub star_num: Option<usize>,
}

/// Header and records of an input catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub header: CatalogHeader,
    pub stars: Vec<Candidate>,
}

fn header_value<'a>(line: &'a str, key: &str) -> Result<&'a str> {
    line.split_once('=')
        .map(|(_, value)| value.trim())
        .ok_or_else(|| SelectionError::MalformedHeader(format!("{key} line has no value: {line}")))
}

fn header_number<T: std::str::FromStr>(line: &str, key: &str) -> Result<T> {
    let value = header_value(line, key)?;
    value
        .parse()
        .map_err(|_| SelectionError::MalformedHeader(format!("invalid {key} value {value:?}")))
}

/// Sum `a:b:c` sexagesimal components as `a + b/60 + c/3600`.
fn sexagesimal(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut divisor = 1.0;
    let mut parts = 0;
    for part in text.split(':') {
        parts += 1;
        if parts > 3 {
            return None;
        }
        let value: f64 = part.trim().parse().ok()?;
        total += value / divisor;
        divisor *= 60.0;
    }
    Some(total)
}

/// Parse an `HH:MM:SS.sss` right ascension into degrees.
pub fn parse_ra(text: &str) -> Option<f64> {
    sexagesimal(text).map(|hours| hours * 15.0)
}

/// Parse a `±DD:MM:SS.ss` declination into degrees. The sign applies to the whole value.
pub fn parse_dec(text: &str) -> Option<f64> {
    let text = text.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    sexagesimal(body).map(|deg| sign * deg)
}

impl CatalogHeader {
    fn apply(&mut self, key: HeaderKey, line: &str, name: &str) -> Result<()> {
        let invalid = || SelectionError::MalformedHeader(format!("invalid {name} value: {line}"));
        match key {
            HeaderKey::CenterRa => {
                self.center_ra = Some(parse_ra(header_value(line, name)?).ok_or_else(invalid)?)
            }
            HeaderKey::CenterDec => {
                self.center_dec = Some(parse_dec(header_value(line, name)?).ok_or_else(invalid)?)
            }
            HeaderKey::RangeRa => self.range_ra = Some(header_number::<f64>(line, name)? / 60.0),
            HeaderKey::RangeDec => self.range_dec = Some(header_number::<f64>(line, name)? / 60.0),
            HeaderKey::MinMag => self.min_mag = Some(header_number(line, name)?),
            HeaderKey::MaxMag => self.max_mag = Some(header_number(line, name)?),
            HeaderKey::StarNumber => self.star_num = Some(header_number(line, name)?),
            HeaderKey::ColumnNames | HeaderKey::Separator => {}
        }
        Ok(())
    }
}

/// Parse one record line. `line_no` is 1-based and only used for errors.
pub fn parse_record(line: &str, line_no: usize) -> Result<Candidate> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < RECORD_FIELDS {
        return Err(SelectionError::MalformedRecord {
            line: line_no,
            reason: format!(
                "expected {RECORD_FIELDS} fields, found {}",
                fields.len()
            ),
        });
    }

    fn field<T: std::str::FromStr>(value: &str, what: &str, line_no: usize) -> Result<T> {
        value.parse().map_err(|_| SelectionError::MalformedRecord {
            line: line_no,
            reason: format!("invalid {what} {value:?}"),
        })
    }

    fn finite(value: &str, what: &str, line_no: usize) -> Result<f64> {
        let parsed: f64 = field(value, what, line_no)?;
        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(SelectionError::MalformedRecord {
                line: line_no,
                reason: format!("non-finite {what} {value:?}"),
            })
        }
    }

    Ok(Candidate::new(
        fields[0],
        finite(fields[1], "RA", line_no)?,
        finite(fields[2], "DEC", line_no)?,
        finite(fields[3], "magnitude", line_no)?,
        field(fields[4], "flag", line_no)?,
        finite(fields[5], "B-R", line_no)?,
    ))
}

/// Read a whole catalog stream.
pub fn read_catalog<R: BufRead>(reader: R) -> Result<Catalog> {
    let mut header = CatalogHeader::default();
    let mut lines = reader.lines().enumerate();
    let mut seen_names = false;
    let mut seen_separator = false;

    while !(seen_names && seen_separator) {
        let Some((_, line)) = lines.next() else {
            return Err(SelectionError::MalformedHeader(
                "input ended before the column header and separator".to_string(),
            ));
        };
        let line = line?;

        let mut echo = true;
        for (key, name) in HEADER_KEYS {
            if !starts_with_ignore_case(&line, name) {
                continue;
            }
            header.apply(key, &line, name)?;
            match key {
                HeaderKey::StarNumber => echo = false,
                HeaderKey::ColumnNames => {
                    seen_names = true;
                    echo = false;
                }
                HeaderKey::Separator => {
                    seen_separator = true;
                    echo = false;
                }
                _ => {}
            }
        }
        if echo {
            header.passthrough.push(line);
        }
    }

    let mut stars = Vec::new();
    for (index, line) in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stars.push(parse_record(&line, index + 1)?);
    }

    if let Some(expected) = header.star_num {
        if expected != stars.len() {
            log::warn!(
                "header announces {expected} stars, read {}",
                stars.len()
            );
        }
    }
    log::debug!("read {} catalog records", stars.len());

    Ok(Catalog { header, stars })
}

/// How the `Distance` column is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Degrees,
    Arcminutes,
}

impl DistanceUnit {
    fn from_degrees(self, r: f64) -> f64 {
        match self {
            DistanceUnit::Degrees => r,
            DistanceUnit::Arcminutes => r * 60.0,
        }
    }
}

/// Format one output record.
pub fn format_record(star: &Candidate, priority: usize, unit: DistanceUnit) -> String {
    format!(
        "{}\t{:.6}\t{:.6}\t{:.6}\t{}\t{:.6}\t{:.6}\t{}\t{:.6}",
        star.name,
        star.ra,
        star.dec,
        star.mag,
        star.flag,
        star.color,
        star.pref,
        priority,
        unit.from_degrees(star.r)
    )
}

/// Write the ranked output stream.
pub fn write_selection<W: Write>(
    out: &mut W,
    header: &CatalogHeader,
    selection: &Selection,
    unit: DistanceUnit,
) -> Result<()> {
    for line in BANNER {
        writeln!(out, "{line}")?;
    }
    for line in &header.passthrough {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{STAR_NUMBER_KEY}={}", selection.candidate_count)?;
    writeln!(out, "{PREFERRED_NUMBER_KEY}={}", selection.preferred_count)?;
    writeln!(out, "{COLUMN_HEADER}")?;
    writeln!(out, "{COLUMN_SEPARATOR}")?;
    for (star, priority) in selection.selected() {
        writeln!(out, "{}", format_record(star, priority, unit))?;
    }
    out.flush()?;
    Ok(())
}
