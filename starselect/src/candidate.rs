//! Candidate stars and the pointing context they are evaluated against.

use crate::station::{truncate_name, Station};

/// Score every candidate starts with. Scoring only ever subtracts from it.
pub const INIT_PREFERENCE: f64 = 10.0;

/// Score marking a candidate as rejected by the full tool's selector.
pub const REJECT_PREFERENCE: f64 = -100.0;

/// One catalog star being considered as a guide star.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    /// Right ascension, degrees.
    pub ra: f64,
    /// Declination, degrees.
    pub dec: f64,
    /// Magnitude. The full tool adds the vignetting correction in place.
    pub mag: f64,
    /// Catalog quality flag.
    pub flag: i32,
    /// B-R color index, passed through untouched.
    pub color: f64,
    /// Offset east of the pointing center, degrees on the sky.
    pub dx: f64,
    /// Offset north of the pointing center, degrees.
    pub dy: f64,
    /// Distance from the pointing center, degrees.
    pub r: f64,
    /// Position angle in the station frame, degrees in `[0, 360]`.
    pub t: f64,
    /// Suitability score, higher is better.
    pub pref: f64,
}

impl Candidate {
    pub fn new(name: &str, ra: f64, dec: f64, mag: f64, flag: i32, color: f64) -> Self {
        Self {
            name: truncate_name(name),
            ra,
            dec,
            mag,
            flag,
            color,
            dx: 0.0,
            dy: 0.0,
            r: 0.0,
            t: 0.0,
            pref: INIT_PREFERENCE,
        }
    }

    /// Whether two candidates come from the same source catalog.
    ///
    /// Catalog names carry a two character source prefix; the comparison is
    /// case-insensitive like the rest of the identifier handling.
    pub fn same_source(&self, other: &Candidate) -> bool {
        let a = self.name.chars().take(2).map(|c| c.to_ascii_lowercase());
        let b = other.name.chars().take(2).map(|c| c.to_ascii_lowercase());
        a.eq(b)
    }
}

/// Immutable per-run parameters of the full tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PointingContext {
    /// Telescope pointing, degrees.
    pub tel_ra: f64,
    pub tel_dec: f64,
    /// Probe pointing, degrees.
    pub probe_ra: f64,
    pub probe_dec: f64,
    pub station: Station,
    pub instrument: String,
    /// Probe position in polar (`r`, `t`) and Cartesian (`x`, `y`) form.
    pub probe_r: f64,
    pub probe_t: f64,
    pub probe_x: f64,
    pub probe_y: f64,
    /// Field rotation angle, degrees.
    pub rotation: f64,
    pub limit_mag: f64,
    /// Magnitude the probe works best at.
    pub good_mag: f64,
    /// Vignetting table name.
    pub fov_name: String,
}

impl PointingContext {
    /// Context for a pointing with every identifier bounded to
    /// [`MAX_NAME_LEN`](crate::station::MAX_NAME_LEN). Probe position,
    /// rotation and magnitudes start at zero.
    pub fn new(tel_ra: f64, tel_dec: f64, station: &str, instrument: &str, fov_name: &str) -> Self {
        Self {
            tel_ra,
            tel_dec,
            probe_ra: tel_ra,
            probe_dec: tel_dec,
            station: Station::new(station),
            instrument: truncate_name(instrument),
            probe_r: 0.0,
            probe_t: 0.0,
            probe_x: 0.0,
            probe_y: 0.0,
            rotation: 0.0,
            limit_mag: 0.0,
            good_mag: 0.0,
            fov_name: truncate_name(fov_name),
        }
    }
}

/// Immutable per-run parameters of the reduced tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShContext {
    pub tel_ra: f64,
    pub tel_dec: f64,
}
