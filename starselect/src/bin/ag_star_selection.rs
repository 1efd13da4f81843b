//! Autoguider guide star selection.
//!
//! Reads a catalog stream on stdin, ranks the stars for the given pointing,
//! station and instrument, and writes the ranked stream to stdout. The
//! configuration is read from `$QDASVGWHOME/AgAutoSelect.cfg` unless
//! `--config` is given.

use clap::Parser;
use starselect::config::{ConfigStore, AG_CONFIG_FILE};
use starselect::pipeline::run_ag;
use starselect::{PointingContext, SelectionError};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ag_star_selection",
    version,
    about = "Select and rank autoguider stars from a catalog stream",
    long_about = None,
    allow_negative_numbers = true
)]
struct Args {
    /// Telescope pointing right ascension (degrees)
    tel_ra: f64,

    /// Telescope pointing declination (degrees)
    tel_dec: f64,

    /// Probe right ascension (degrees)
    probe_ra: f64,

    /// Probe declination (degrees)
    probe_dec: f64,

    /// Focal station identifier, e.g. CS, NS_OPT, NS_IR, P_OPT
    station: String,

    /// Instrument name, selects the instrument field radius
    instrument: String,

    /// Probe radial position
    probe_r: f64,

    /// Probe angular position
    probe_t: f64,

    /// Probe X position
    probe_x: f64,

    /// Probe Y position
    probe_y: f64,

    /// Field rotation angle (degrees)
    rotation: f64,

    /// Limiting magnitude
    limit_mag: f64,

    /// Magnitude the probe works best at
    good_mag: f64,

    /// Vignetting table name
    fov_name: String,

    /// Configuration file (defaults to $QDASVGWHOME/AgAutoSelect.cfg)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn context(&self) -> PointingContext {
        PointingContext {
            probe_ra: self.probe_ra,
            probe_dec: self.probe_dec,
            probe_r: self.probe_r,
            probe_t: self.probe_t,
            probe_x: self.probe_x,
            probe_y: self.probe_y,
            rotation: self.rotation,
            limit_mag: self.limit_mag,
            good_mag: self.good_mag,
            ..PointingContext::new(
                self.tel_ra,
                self.tel_dec,
                &self.station,
                &self.instrument,
                &self.fov_name,
            )
        }
    }
}

fn run(args: &Args) -> Result<(), SelectionError> {
    let config = ConfigStore::locate(args.config.as_deref(), AG_CONFIG_FILE)?;
    let context = args.context();
    log::debug!("{context:?}");

    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout().lock());
    run_ag(&context, &config, stdin.lock(), &mut stdout)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let err = SelectionError::InvalidArguments(err.to_string());
            log::error!(target: err.stage(), "{err}");
            return ExitCode::from(1);
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!(target: err.stage(), "{err}");
            ExitCode::from(1)
        }
    }
}
