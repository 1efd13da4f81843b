//! Telescope focus stations and their geometric conventions.
//!
//! A station id such as `CS_OPT` or `P_IR` is resolved once into a
//! [`StationClass`]. Everything that depends on the mounting (position angle
//! origin, axis flip, acceptance shape, vignetting table layout) is then a
//! `match` over that class.

use std::fmt;

/// Longest identifier retained from the command line or a catalog record.
/// Longer values are truncated.
pub const MAX_NAME_LEN: usize = 31;

/// Truncate a string to at most [`MAX_NAME_LEN`] characters.
pub fn truncate_name(s: &str) -> String {
    s.chars().take(MAX_NAME_LEN).collect()
}

/// Geometry class of a focus station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationClass {
    PrimeFocusOptical,
    PrimeFocusInfrared,
    Cassegrain,
    NasmythInfrared,
    NasmythOptical,
}

/// Row layout of a station's vignetting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VignettingFormat {
    /// `angle t0 .. t15`: transmission percentages sampled every 10 radius buckets.
    SixteenPoint,
    /// `angle r100 r50 r0`: radii where transmission is 100%, 50% and 0%.
    ThreeRadius,
}

impl StationClass {
    /// Resolve the class from a station id by its prefix (case-insensitive).
    ///
    /// `P_*` is prime focus (infrared when the id mentions `IR`), `CS*` is
    /// Cassegrain, `NS_I*` is Nasmyth infrared and anything else is Nasmyth
    /// optical.
    pub fn from_station_id(id: &str) -> Self {
        let upper = id.to_ascii_uppercase();
        if upper.starts_with("P_") {
            if upper[2..].contains("IR") {
                StationClass::PrimeFocusInfrared
            } else {
                StationClass::PrimeFocusOptical
            }
        } else if upper.starts_with("CS") {
            StationClass::Cassegrain
        } else if upper.starts_with("NS_I") {
            StationClass::NasmythInfrared
        } else {
            StationClass::NasmythOptical
        }
    }

    /// Prime focus stations accept stars inside a probe-aligned rectangle
    /// instead of a circular field.
    pub fn is_rectangular(self) -> bool {
        matches!(
            self,
            StationClass::PrimeFocusOptical | StationClass::PrimeFocusInfrared
        )
    }

    pub fn vignetting_format(self) -> VignettingFormat {
        if self.is_rectangular() {
            VignettingFormat::ThreeRadius
        } else {
            VignettingFormat::SixteenPoint
        }
    }

    /// Position angle frame for a given field rotation (degrees).
    pub fn origin_frame(self, rotation: f64) -> OriginFrame {
        match self {
            // Origin east
            StationClass::PrimeFocusOptical | StationClass::PrimeFocusInfrared => OriginFrame {
                dt: rotation,
                flip: false,
            },
            // Origin west
            StationClass::Cassegrain => OriginFrame {
                dt: rotation + 180.0,
                flip: false,
            },
            // Origin east, mirrored
            StationClass::NasmythInfrared => OriginFrame {
                dt: -2.0 * rotation,
                flip: true,
            },
            // Origin west
            StationClass::NasmythOptical => OriginFrame {
                dt: 2.0 * rotation + 180.0,
                flip: false,
            },
        }
    }
}

impl fmt::Display for StationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StationClass::PrimeFocusOptical => "prime-focus-optical",
            StationClass::PrimeFocusInfrared => "prime-focus-infrared",
            StationClass::Cassegrain => "cassegrain",
            StationClass::NasmythInfrared => "nasmyth-infrared",
            StationClass::NasmythOptical => "nasmyth-optical",
        };
        write!(f, "{name}")
    }
}

/// Offset and handedness applied to raw position angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OriginFrame {
    /// Angle subtracted from the raw position angle, degrees.
    pub dt: f64,
    /// Mirror the result (`t = 360 - t`).
    pub flip: bool,
}

/// A named station together with its resolved class.
///
/// The name is kept verbatim because configuration rows are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub name: String,
    pub class: StationClass,
}

impl Station {
    pub fn new(id: &str) -> Self {
        let name = truncate_name(id);
        let class = StationClass::from_station_id(&name);
        Self { name, class }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_dispatch() {
        assert_eq!(
            StationClass::from_station_id("P_OPT"),
            StationClass::PrimeFocusOptical
        );
        assert_eq!(
            StationClass::from_station_id("p_ir"),
            StationClass::PrimeFocusInfrared
        );
        assert_eq!(
            StationClass::from_station_id("CS_OPT"),
            StationClass::Cassegrain
        );
        assert_eq!(StationClass::from_station_id("CS"), StationClass::Cassegrain);
        assert_eq!(
            StationClass::from_station_id("NS_IR"),
            StationClass::NasmythInfrared
        );
        assert_eq!(
            StationClass::from_station_id("NS_OPT"),
            StationClass::NasmythOptical
        );
        assert_eq!(
            StationClass::from_station_id("ANYTHING"),
            StationClass::NasmythOptical
        );
    }

    #[test]
    fn test_vignetting_format_follows_shape() {
        assert_eq!(
            StationClass::PrimeFocusInfrared.vignetting_format(),
            VignettingFormat::ThreeRadius
        );
        assert_eq!(
            StationClass::Cassegrain.vignetting_format(),
            VignettingFormat::SixteenPoint
        );
        assert!(!StationClass::NasmythOptical.is_rectangular());
    }

    #[test]
    fn test_origin_frames() {
        let rot = 30.0;
        assert_eq!(
            StationClass::PrimeFocusOptical.origin_frame(rot),
            OriginFrame { dt: 30.0, flip: false }
        );
        assert_eq!(
            StationClass::Cassegrain.origin_frame(rot),
            OriginFrame { dt: 210.0, flip: false }
        );
        assert_eq!(
            StationClass::NasmythInfrared.origin_frame(rot),
            OriginFrame { dt: -60.0, flip: true }
        );
        assert_eq!(
            StationClass::NasmythOptical.origin_frame(rot),
            OriginFrame { dt: 240.0, flip: false }
        );
    }

    #[test]
    fn test_truncation() {
        let long = "X".repeat(MAX_NAME_LEN + 10);
        assert_eq!(truncate_name(&long).len(), MAX_NAME_LEN);
        assert_eq!(Station::new("CS").name, "CS");
    }
}
