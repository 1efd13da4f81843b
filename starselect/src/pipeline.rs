//! End-to-end selection runs.
//!
//! Each run reads the whole catalog, resolves geometry, scores, ranks and only
//! then writes the output stream, so a failure at any stage leaves the output
//! untouched.

use crate::candidate::{PointingContext, ShContext};
use crate::catalog::{read_catalog, write_selection, DistanceUnit};
use crate::config::{ConfigStore, ShParams, StationParams};
use crate::error::{Result, SelectionError};
use crate::geometry::resolve_all;
use crate::scoring::{AgScorer, PreferenceScorer, ShScorer};
use crate::selection::{select_ag, select_sh, Selection};
use crate::station::OriginFrame;
use crate::vignetting::VignettingMap;
use std::io::{BufRead, Write};

/// Run the full (autoguider) selection.
pub fn run_ag<R: BufRead, W: Write>(
    context: &PointingContext,
    config: &ConfigStore,
    input: R,
    output: &mut W,
) -> Result<Selection> {
    let params = StationParams::load(config, &context.station, &context.instrument)?;
    let vignetting = VignettingMap::from_config(config, &context.station, &context.fov_name)?;
    log::debug!(
        "probe ra={} dec={} r={} t={} x={} y={} limit_mag={} evig={}",
        context.probe_ra,
        context.probe_dec,
        context.probe_r,
        context.probe_t,
        context.probe_x,
        context.probe_y,
        context.limit_mag,
        params.edge_vignetting
    );

    let catalog = read_catalog(input)?;
    let max_mag = catalog.header.max_mag.ok_or_else(|| {
        SelectionError::MalformedHeader("MaximumMagnitude is missing".to_string())
    })?;

    let mut stars = catalog.stars;
    let frame = context.station.class.origin_frame(context.rotation);
    resolve_all(&mut stars, context.tel_ra, context.tel_dec, frame);
    AgScorer::new(context, &params, &vignetting).score(&mut stars);

    let read = stars.len();
    let selection = select_ag(stars, max_mag, params.star_num, params.max_pref_num);
    log::info!(
        "{}: {} stars read, {} selected, {} preferred",
        context.station,
        read,
        selection.candidate_count,
        selection.preferred_count
    );

    write_selection(
        output,
        &catalog.header,
        &selection,
        DistanceUnit::Arcminutes,
    )?;
    Ok(selection)
}

/// Run the reduced (wavefront sensor) selection.
pub fn run_sh<R: BufRead, W: Write>(
    context: ShContext,
    config: &ConfigStore,
    input: R,
    output: &mut W,
) -> Result<Selection> {
    let params = ShParams::load(config)?;
    log::debug!("limit magnitude {}", params.limit_mag);

    let catalog = read_catalog(input)?;
    let mut stars = catalog.stars;
    resolve_all(
        &mut stars,
        context.tel_ra,
        context.tel_dec,
        OriginFrame::default(),
    );
    ShScorer::new(&params).score(&mut stars);

    let read = stars.len();
    let selection = select_sh(stars, params.star_num, params.max_pref_num);
    log::info!(
        "{} stars read, {} selected, {} preferred",
        read,
        selection.candidate_count,
        selection.preferred_count
    );

    write_selection(output, &catalog.header, &selection, DistanceUnit::Degrees)?;
    Ok(selection)
}
