//! Preference scoring.
//!
//! Each candidate starts at [`INIT_PREFERENCE`] and loses score for every
//! property that makes it a worse guide star. Scores are only ever decreased.
//!
//! Candidates are processed in catalog order. The crowding check compares a
//! candidate only with those before it (`j < i`) and penalizes both members of
//! a close pair, so every pair is visited exactly once. The loop is sequential
//! by construction and must stay that way.
//!
//! Steps for the full tool, per candidate:
//! 1. crowding against earlier candidates
//! 2. vignetting correction added to the magnitude
//! 3. field of view / probe vignetting zone check
//! 4. magnitude quality against the good magnitude
//! 5. catalog quality flag
//!
//! The reduced tool replaces steps 2 and 3 by a radial penalty.

use crate::candidate::{Candidate, PointingContext, INIT_PREFERENCE};
use crate::config::{ShParams, StationParams};
use crate::geometry::{lookup_radius, to_probe_axes};
use crate::vignetting::VignettingMap;

/// Magnitudes brighter than the good magnitude by more than this get the full penalty.
pub const BRIGHT_END_THRESHOLD: f64 = 3.0;

/// Pairs from different catalogs closer than this are one star listed twice (arcsec).
pub const DIFF_CATALOG_ARCSEC: f64 = 1.0;

/// Quality flag of an ideal catalog entry.
pub const BEST_FLAG: i32 = 2;

/// Penalty for a candidate outside the usable field.
pub const OUT_OF_FIELD_PENALTY: f64 = INIT_PREFERENCE * 10.0;

/// Multiplier of the graduated probe vignetting zone penalty.
const ZONE_PENALTY_FACTOR: f64 = 5.0;

/// Reduced tool penalty per degree of distance from the pointing center.
pub const SH_RADIAL_PENALTY: f64 = 10.0;

/// Scores a candidate list in place.
pub trait PreferenceScorer {
    fn score(&self, stars: &mut [Candidate]);
}

/// Squared separation threshold in square degrees.
fn separation_threshold(arcsec: f64) -> f64 {
    arcsec * arcsec / 3600.0 / 3600.0
}

/// Crowding step for candidate `i` against every earlier candidate.
///
/// A pair closer than the minimum separation costs both members
/// [`INIT_PREFERENCE`], unless the two entries come from different catalogs
/// and are close enough to be the same star.
pub fn apply_crowding(stars: &mut [Candidate], i: usize, min_sep2: f64, diff_sep2: f64) {
    let (before, rest) = stars.split_at_mut(i);
    let star = &mut rest[0];
    for other in before.iter_mut() {
        let ddx = star.dx - other.dx;
        let ddy = star.dy - other.dy;
        let sep = ddx * ddx + ddy * ddy;
        if min_sep2 > sep && (diff_sep2 < sep || star.same_source(other)) {
            star.pref -= INIT_PREFERENCE;
            other.pref -= INIT_PREFERENCE;
        }
    }
}

/// Magnitude quality penalty.
pub fn magnitude_penalty(good_mag: f64, mag: f64) -> f64 {
    let gap = good_mag - mag;
    if gap > BRIGHT_END_THRESHOLD {
        INIT_PREFERENCE
    } else {
        gap.abs()
    }
}

/// Catalog quality flag penalty.
pub fn flag_penalty(flag: i32) -> f64 {
    (f64::from(BEST_FLAG) - f64::from(flag)).abs()
}

/// Scorer of the full tool.
#[derive(Debug, Clone, Copy)]
pub struct AgScorer<'a> {
    pub context: &'a PointingContext,
    pub params: &'a StationParams,
    pub vignetting: &'a VignettingMap,
}

impl<'a> AgScorer<'a> {
    pub fn new(
        context: &'a PointingContext,
        params: &'a StationParams,
        vignetting: &'a VignettingMap,
    ) -> Self {
        Self {
            context,
            params,
            vignetting,
        }
    }

    /// Field of view and probe vignetting zone penalty.
    fn field_penalty(&self, star: &Candidate) -> f64 {
        let inside = match &self.params.rectangle {
            Some(rect) => {
                let (rx, ry) = to_probe_axes(star.dx, star.dy, self.context.rotation);
                rect.contains(rx, ry)
            }
            None => star.r <= self.params.fov_radius,
        };
        if !inside {
            return OUT_OF_FIELD_PENALTY;
        }

        let ins = self.params.instrument_radius;
        let zone = ins + self.params.probe_vignetting_radius;
        if zone > star.r {
            (zone - star.r) / ins * INIT_PREFERENCE * ZONE_PENALTY_FACTOR
        } else {
            0.0
        }
    }
}

impl PreferenceScorer for AgScorer<'_> {
    fn score(&self, stars: &mut [Candidate]) {
        let min_sep2 = separation_threshold(self.params.min_sep_arcsec);
        let diff_sep2 = separation_threshold(DIFF_CATALOG_ARCSEC);
        let scale = self.params.scale;

        for i in 0..stars.len() {
            apply_crowding(stars, i, min_sep2, diff_sep2);

            let star = &mut stars[i];
            star.mag += self
                .vignetting
                .correction(star.t, lookup_radius(star.r, scale), scale);
            star.pref -= self.field_penalty(star);
            star.pref -= magnitude_penalty(self.context.good_mag, star.mag);
            star.pref -= flag_penalty(star.flag);

            log::trace!(
                "{}: r={:.6} t={:.3} mag={:.3} pref={:.6}",
                star.name,
                star.r,
                star.t,
                star.mag,
                star.pref
            );
        }
    }
}

/// Scorer of the reduced tool.
#[derive(Debug, Clone, Copy)]
pub struct ShScorer<'a> {
    pub params: &'a ShParams,
}

impl<'a> ShScorer<'a> {
    pub fn new(params: &'a ShParams) -> Self {
        Self { params }
    }
}

impl PreferenceScorer for ShScorer<'_> {
    fn score(&self, stars: &mut [Candidate]) {
        let min_sep2 = separation_threshold(self.params.min_sep_arcsec);
        let diff_sep2 = separation_threshold(DIFF_CATALOG_ARCSEC);

        for i in 0..stars.len() {
            apply_crowding(stars, i, min_sep2, diff_sep2);

            let star = &mut stars[i];
            star.pref -= star.r * SH_RADIAL_PENALTY;
            star.pref -= magnitude_penalty(self.params.good_mag, star.mag);
            star.pref -= flag_penalty(star.flag);
        }
    }
}
