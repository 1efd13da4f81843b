//! Wavefront sensor reference star selection.
//!
//! Same stream protocol as `ag_star_selection`, for a single fixed probe
//! geometry. Only the pointing is given on the command line; the remaining
//! parameters come from `$QDASVGWHOME/ShAutoSelect.cfg` or `--config`.

use clap::Parser;
use starselect::config::{ConfigStore, SH_CONFIG_FILE};
use starselect::pipeline::run_sh;
use starselect::{SelectionError, ShContext};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "sh_star_selection",
    version,
    about = "Select and rank wavefront sensor stars from a catalog stream",
    long_about = None,
    allow_negative_numbers = true
)]
struct Args {
    /// Telescope pointing right ascension (degrees)
    tel_ra: f64,

    /// Telescope pointing declination (degrees)
    tel_dec: f64,

    /// Configuration file (defaults to $QDASVGWHOME/ShAutoSelect.cfg)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), SelectionError> {
    let config = ConfigStore::locate(args.config.as_deref(), SH_CONFIG_FILE)?;
    let context = ShContext {
        tel_ra: args.tel_ra,
        tel_dec: args.tel_dec,
    };

    let stdin = io::stdin();
    let mut stdout = BufWriter::new(io::stdout().lock());
    run_sh(context, &config, stdin.lock(), &mut stdout)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => {
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
