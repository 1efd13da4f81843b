//! Guide star selection for telescope probes.
//!
//! Given a telescope pointing and a list of catalog stars, this crate scores
//! every star for its suitability as a guide star and ranks the usable ones.
//! Two variants share the same pipeline:
//!
//! - the autoguider (AG) tool, aware of the focal station, field rotation,
//!   instrument field and an angle x radius vignetting map;
//! - the wavefront sensor (SH) tool, with a single fixed geometry and a plain
//!   radial penalty instead of vignetting.
//!
//! The pipeline runs geometry resolution ([`geometry`]), optional vignetting
//! map construction ([`vignetting`]), preference scoring ([`scoring`]) and
//! ranking ([`selection`]), reading and writing the text catalog stream
//! described in [`catalog`]. [`pipeline`] wires the stages together for the
//! two binaries.

pub mod candidate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod scoring;
pub mod selection;
pub mod station;
pub mod vignetting;

pub use candidate::{Candidate, PointingContext, ShContext};
pub use config::{ConfigStore, ShParams, StationParams};
pub use error::{ErrorKind, Result, SelectionError};
pub use scoring::{AgScorer, PreferenceScorer, ShScorer};
pub use selection::{RankedStar, Selection};
pub use station::{Station, StationClass};
pub use vignetting::VignettingMap;
