//! Sky position to pointing-relative geometry.
//!
//! For each candidate the offset from the telescope pointing is computed on a
//! local tangent approximation:
//!
//! ```text
//! dx = wrap(RA - TelRA) * cos(TelDEC)
//! dy = DEC - TelDEC
//! r  = sqrt(dx^2 + dy^2)
//! t  = (atan2(dy, dx) - dt + 3600) mod 360      (mirrored for flipped frames)
//! ```
//!
//! The station supplies `dt` and the mirror flag through [`OriginFrame`].

use crate::candidate::Candidate;
use crate::station::OriginFrame;

/// Number of radius buckets in a vignetting map.
pub const RADIUS_BUCKETS: usize = 200;

/// Wrap an RA difference into `[-180, 180]` degrees.
pub fn wrap_ra_difference(diff: f64) -> f64 {
    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Fill `dx`, `dy`, `r` and `t` of one candidate.
pub fn resolve(star: &mut Candidate, tel_ra: f64, tel_dec: f64, frame: OriginFrame) {
    let diff = wrap_ra_difference(star.ra - tel_ra);
    star.dx = diff * tel_dec.to_radians().cos();
    star.dy = star.dec - tel_dec;
    star.r = (star.dx * star.dx + star.dy * star.dy).sqrt();

    let angle = star.dy.atan2(star.dx).to_degrees();
    let t = (angle - frame.dt + 3600.0) % 360.0;
    star.t = if frame.flip { 360.0 - t } else { t };
}

/// Resolve every candidate in place.
pub fn resolve_all(stars: &mut [Candidate], tel_ra: f64, tel_dec: f64, frame: OriginFrame) {
    for star in stars.iter_mut() {
        resolve(star, tel_ra, tel_dec, frame);
    }
}

/// Radius used for table lookups: `r` clamped to the last bucket.
///
/// The candidate's own `r` is never modified.
pub fn lookup_radius(r: f64, scale: f64) -> f64 {
    r.min((RADIUS_BUCKETS - 1) as f64 * scale)
}

/// Rotate sky offsets into probe-aligned axes by the field rotation (degrees).
pub fn to_probe_axes(dx: f64, dy: f64, rotation: f64) -> (f64, f64) {
    let (sin_rot, cos_rot) = rotation.to_radians().sin_cos();
    let rx = dx * cos_rot + dy * sin_rot;
    let ry = dy * cos_rot - dx * sin_rot;
    (rx, ry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationClass;
    use approx::assert_relative_eq;

    fn star_at(ra: f64, dec: f64) -> Candidate {
        Candidate::new("S1", ra, dec, 11.5, 2, 0.3)
    }

    #[test]
    fn test_wrap_ra_difference() {
        assert_eq!(wrap_ra_difference(190.0), -170.0);
        assert_eq!(wrap_ra_difference(-190.0), 170.0);
        assert_eq!(wrap_ra_difference(180.0), 180.0);
        assert_eq!(wrap_ra_difference(-5.0), -5.0);
    }

    #[test]
    fn test_offsets_scale_with_declination() {
        let mut star = star_at(150.01, 20.01);
        resolve(&mut star, 150.0, 20.0, OriginFrame::default());
        assert_relative_eq!(star.dx, 0.01 * 20f64.to_radians().cos(), epsilon = 1e-9);
        assert_relative_eq!(star.dy, 0.01, epsilon = 1e-9);
        assert_relative_eq!(star.r, star.dx.hypot(star.dy), epsilon = 1e-15);
        assert_relative_eq!(star.r, 0.0137223, epsilon = 1e-7);
    }

    #[test]
    fn test_ra_wraps_across_zero() {
        let mut star = star_at(359.99, 0.0);
        resolve(&mut star, 0.01, 0.0, OriginFrame::default());
        assert_relative_eq!(star.dx, -0.02, epsilon = 1e-9);
        assert_relative_eq!(star.t, 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_position_angle_frames() {
        // Star due north of the pointing
        let mut star = star_at(10.0, 1.0);
        resolve(&mut star, 10.0, 0.0, OriginFrame::default());
        assert_relative_eq!(star.t, 90.0, epsilon = 1e-9);

        let cs = StationClass::Cassegrain.origin_frame(0.0);
        resolve(&mut star, 10.0, 0.0, cs);
        assert_relative_eq!(star.t, 270.0, epsilon = 1e-9);

        let ns_ir = StationClass::NasmythInfrared.origin_frame(10.0);
        resolve(&mut star, 10.0, 0.0, ns_ir);
        // 90 + 20 = 110, mirrored
        assert_relative_eq!(star.t, 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let frame = StationClass::NasmythOptical.origin_frame(12.5);
        let mut a = star_at(45.123, -30.456);
        let mut b = a.clone();
        resolve(&mut a, 45.1, -30.4, frame);
        resolve(&mut b, 45.1, -30.4, frame);
        assert_eq!(a.dx.to_bits(), b.dx.to_bits());
        assert_eq!(a.dy.to_bits(), b.dy.to_bits());
        assert_eq!(a.r.to_bits(), b.r.to_bits());
        assert_eq!(a.t.to_bits(), b.t.to_bits());
    }

    #[test]
    fn test_lookup_radius_clamps_copy_only() {
        let mut star = star_at(11.0, 0.0);
        resolve(&mut star, 10.0, 0.0, OriginFrame::default());
        let scale = 0.001;
        assert_relative_eq!(lookup_radius(star.r, scale), 0.199, epsilon = 1e-12);
        assert_relative_eq!(star.r, 1.0, epsilon = 1e-12);
        assert_eq!(lookup_radius(0.05, scale), 0.05);
    }

    #[test]
    fn test_probe_axes() {
        let (rx, ry) = to_probe_axes(1.0, 0.0, 90.0);
        assert_relative_eq!(rx, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ry, -1.0, epsilon = 1e-12);
        let (rx, ry) = to_probe_axes(0.3, -0.2, 0.0);
        assert_eq!((rx, ry), (0.3, -0.2));
    }
}
