//! Vignetting map: position dependent magnitude correction for the full tool.
//!
//! The map is a 73 x 200 table indexed by position angle bucket (5 degrees,
//! bucket 72 is 360 degrees and duplicates bucket 0) and radius bucket (one
//! bucket per `SCALE` degrees). Each cell holds the magnitude lost to
//! vignetting at that position, or [`SENTINEL_MAG`] where the probe sees no
//! light at all.
//!
//! Two table layouts exist in the configuration, see [`VignetRows`]. Both
//! are interpolated linearly in angle between successive rows; they differ in
//! how the radial profile of a single angle bucket is formed.

use crate::config::ConfigStore;
use crate::error::{Result, SelectionError};
use crate::geometry::RADIUS_BUCKETS;
use crate::station::{Station, VignettingFormat};
use ndarray::{s, Array2, ArrayViewMut1};

/// Number of position angle buckets, including the closing 360 degree bucket.
pub const ANGLE_BUCKETS: usize = 73;

/// Width of one position angle bucket, degrees.
pub const ANGLE_STEP: f64 = 5.0;

/// Magnitude correction standing for "fully vignetted".
pub const SENTINEL_MAG: f64 = 50.0;

/// Transmission fraction below which a cell is treated as fully vignetted.
const MIN_TRANSMISSION: f64 = 0.01;

/// Samples per row of a sixteen-point profile.
pub const PROFILE_SAMPLES: usize = 16;

/// Radius buckets between two profile samples.
const PROFILE_SPACING: usize = 10;

/// Radius buckets covered by a sixteen-point profile; beyond is the sentinel.
const PROFILE_BUCKETS: usize = (PROFILE_SAMPLES - 1) * PROFILE_SPACING;

/// Row of a sixteen-point table: transmission in percent every 10 radius buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct SixteenPointRow {
    pub angle: f64,
    pub transmission: [f64; PROFILE_SAMPLES],
}

/// Row of a three-radius table: radius buckets where transmission reaches
/// 100%, 50% and 0%.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeRadiusRow {
    pub angle: f64,
    pub r100: f64,
    pub r50: f64,
    pub r0: f64,
}

/// Vignetting table rows for one station and field of view name.
#[derive(Debug, Clone, PartialEq)]
pub enum VignetRows {
    SixteenPoint(Vec<SixteenPointRow>),
    ThreeRadius(Vec<ThreeRadiusRow>),
}

impl VignetRows {
    /// Interpret raw numeric rows according to the station's table layout.
    pub fn from_raw(format: VignettingFormat, raw: &[Vec<f64>]) -> Result<Self> {
        match format {
            VignettingFormat::SixteenPoint => {
                let rows = raw
                    .iter()
                    .map(|values| {
                        if values.len() != PROFILE_SAMPLES + 1 {
                            return Err(SelectionError::MalformedVignetting(format!(
                                "expected {} values per row, found {}",
                                PROFILE_SAMPLES + 1,
                                values.len()
                            )));
                        }
                        let mut transmission = [0.0; PROFILE_SAMPLES];
                        transmission.copy_from_slice(&values[1..]);
                        Ok(SixteenPointRow {
                            angle: values[0],
                            transmission,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(VignetRows::SixteenPoint(rows))
            }
            VignettingFormat::ThreeRadius => {
                let rows = raw
                    .iter()
                    .map(|values| match values.as_slice() {
                        &[angle, r100, r50, r0] => Ok(ThreeRadiusRow {
                            angle,
                            r100,
                            r50,
                            r0,
                        }),
                        _ => Err(SelectionError::MalformedVignetting(format!(
                            "expected 4 values per row, found {}",
                            values.len()
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(VignetRows::ThreeRadius(rows))
            }
        }
    }

    fn angles(&self) -> Vec<f64> {
        match self {
            VignetRows::SixteenPoint(rows) => rows.iter().map(|r| r.angle).collect(),
            VignetRows::ThreeRadius(rows) => rows.iter().map(|r| r.angle).collect(),
        }
    }
}

/// Read-only angle x radius magnitude correction table.
#[derive(Debug, Clone, PartialEq)]
pub struct VignettingMap {
    table: Array2<f64>,
}

impl VignettingMap {
    /// Read the rows for `(station, fov_name)` from the configuration and build the map.
    pub fn from_config(config: &ConfigStore, station: &Station, fov_name: &str) -> Result<Self> {
        let raw = config.vignet_rows(&station.name, fov_name)?;
        log::debug!(
            "vignetting table {} {}: {} rows",
            station.name,
            fov_name,
            raw.len()
        );
        let rows = VignetRows::from_raw(station.class.vignetting_format(), &raw)?;
        Self::build(&rows)
    }

    /// Build the map from parsed rows.
    ///
    /// Angles must start at exactly 0, increase strictly and end at exactly 360.
    pub fn build(rows: &VignetRows) -> Result<Self> {
        let angles = rows.angles();
        validate_angles(&angles)?;

        let mut table = Array2::<f64>::zeros((ANGLE_BUCKETS, RADIUS_BUCKETS));

        match rows {
            VignetRows::SixteenPoint(rows) => {
                for pair in rows.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    for bucket in buckets_between(prev.angle, next.angle) {
                        let x = bucket as f64 * ANGLE_STEP;
                        let mut profile = [0.0; PROFILE_SAMPLES];
                        for (n, value) in profile.iter_mut().enumerate() {
                            *value = blend(
                                prev.transmission[n],
                                next.transmission[n],
                                prev.angle,
                                next.angle,
                                x,
                            );
                        }
                        fill_sixteen_point(table.row_mut(bucket), &profile);
                    }
                }
            }
            VignetRows::ThreeRadius(rows) => {
                for pair in rows.windows(2) {
                    let (prev, next) = (&pair[0], &pair[1]);
                    for bucket in buckets_between(prev.angle, next.angle) {
                        let x = bucket as f64 * ANGLE_STEP;
                        let r100 = blend(prev.r100, next.r100, prev.angle, next.angle, x);
                        let r50 = blend(prev.r50, next.r50, prev.angle, next.angle, x);
                        let r0 = blend(prev.r0, next.r0, prev.angle, next.angle, x);
                        fill_three_radius(table.row_mut(bucket), r100, r50, r0);
                    }
                }
            }
        }

        let first = table.row(0).to_owned();
        table.row_mut(ANGLE_BUCKETS - 1).assign(&first);

        Ok(Self { table })
    }

    /// Correction for an angle bucket and radius bucket.
    pub fn get(&self, angle_bucket: usize, radius_bucket: usize) -> f64 {
        self.table[[angle_bucket, radius_bucket]]
    }

    /// Correction at position angle `t` (degrees) and lookup radius `r`
    /// (degrees, already clamped to the table) for the given bucket scale.
    pub fn correction(&self, t: f64, r: f64, scale: f64) -> f64 {
        let angle_bucket = ((t / ANGLE_STEP) as usize).min(ANGLE_BUCKETS - 1);
        let radius_bucket = ((r / scale) as usize).min(RADIUS_BUCKETS - 1);
        self.get(angle_bucket, radius_bucket)
    }

    pub fn table(&self) -> &Array2<f64> {
        &self.table
    }
}

fn validate_angles(angles: &[f64]) -> Result<()> {
    let first = *angles
        .first()
        .ok_or_else(|| SelectionError::MalformedVignetting("no table rows".to_string()))?;
    if first != 0.0 {
        return Err(SelectionError::MalformedVignetting(format!(
            "first row angle is {first}, expected 0"
        )));
    }
    if let Some(pair) = angles.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(SelectionError::MalformedVignetting(format!(
            "row angle {} does not increase past {}",
            pair[1], pair[0]
        )));
    }
    let last = angles[angles.len() - 1];
    if last != 360.0 {
        return Err(SelectionError::MalformedVignetting(format!(
            "last row angle is {last}, expected 360"
        )));
    }
    Ok(())
}

/// Output buckets whose angle lies in `[from, to)`.
fn buckets_between(from: f64, to: f64) -> impl Iterator<Item = usize> {
    (0..ANGLE_BUCKETS).filter(move |&i| {
        let x = i as f64 * ANGLE_STEP;
        x >= from && x < to
    })
}

/// Linear blend of two row values at angle `x` between `from` and `to`.
fn blend(at_from: f64, at_to: f64, from: f64, to: f64, x: f64) -> f64 {
    (at_to * (x - from) + at_from * (to - x)) / (to - from)
}

fn transmission_to_mag(fraction: f64) -> f64 {
    if fraction >= MIN_TRANSMISSION {
        -2.5 * fraction.log10()
    } else {
        SENTINEL_MAG
    }
}

fn fill_sixteen_point(mut row: ArrayViewMut1<f64>, profile: &[f64; PROFILE_SAMPLES]) {
    for (j, cell) in row.iter_mut().take(PROFILE_BUCKETS).enumerate() {
        let k = j / PROFILE_SPACING;
        let lo = (k * PROFILE_SPACING) as f64;
        let hi = ((k + 1) * PROFILE_SPACING) as f64;
        let jf = j as f64;
        // Percent over a spacing of 10 buckets
        let fraction = (profile[k] * (hi - jf) + profile[k + 1] * (jf - lo)) / 1000.0;
        *cell = transmission_to_mag(fraction);
    }
    row.slice_mut(s![PROFILE_BUCKETS..]).fill(SENTINEL_MAG);
}

fn fill_three_radius(mut row: ArrayViewMut1<f64>, r100: f64, r50: f64, r0: f64) {
    let r100 = if r100 == r50 { r100 - 1.0 } else { r100 };
    let r0 = if r0 == r50 { r0 + 1.0 } else { r0 };

    for (j, cell) in row.iter_mut().enumerate() {
        let jf = j as f64;
        *cell = if jf <= r100 {
            0.0
        } else if jf <= r50 {
            -2.5 * (((r50 - jf) + 0.5 * (jf - r100)) / (r50 - r100)).log10()
        } else if jf < r0 {
            (-2.5 * (0.5 * (r0 - jf) / (r0 - r50)).log10()).min(SENTINEL_MAG)
        } else {
            SENTINEL_MAG
        };
    }
}
