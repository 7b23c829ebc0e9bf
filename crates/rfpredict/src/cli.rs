//! Command-line front end.
//!
//! ```bash
//! rfpredict model.json '{"x": 2.5, "y": "4"}'
//! ```
//!
//! The prediction is the only thing written to stdout on success. Failures
//! print one line to stdout and exit with status 1; diagnostics go to stderr
//! through `tracing`.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser, ValueEnum};
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::PredictError;
use crate::params::ParameterSet;
use crate::persist::ModelFormat;
use crate::predict::Predictor;

/// Usage line printed on argument errors.
pub const USAGE: &str = "Usage: rfpredict <model_path> <parameters_json>";

/// Environment variable holding an `EnvFilter` directive for log output.
pub const LOG_ENV: &str = "RFPREDICT_LOG";

/// Predict a single value from a persisted regression model.
#[derive(Parser, Debug)]
#[command(name = "rfpredict")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the model file (native rfpredict JSON or XGBoost JSON)
    pub model_path: PathBuf,

    /// Parameters as a JSON object mapping feature names to values
    #[arg(allow_hyphen_values = true)]
    pub parameters_json: String,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Model file format
    #[arg(long, value_enum, default_value_t = FormatArg::Auto, env = "RFPREDICT_MODEL_FORMAT")]
    pub format: FormatArg,
}

/// `--format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Detect from the file contents
    Auto,
    /// Native rfpredict JSON document
    Native,
    /// XGBoost JSON model
    Xgboost,
}

impl From<FormatArg> for ModelFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => ModelFormat::Auto,
            FormatArg::Native => ModelFormat::Native,
            FormatArg::Xgboost => ModelFormat::Xgboost,
        }
    }
}

/// CLI error types.
#[derive(Error, Debug)]
pub enum CliError {
    /// Wrong arguments.
    #[error("{0}")]
    Usage(String),

    /// Prediction failed.
    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl CliError {
    /// Line written to stdout for this error.
    pub fn message(&self) -> String {
        match self {
            Self::Usage(usage) => usage.clone(),
            Self::Predict(err @ PredictError::ModelNotFound(_)) => err.to_string(),
            Self::Predict(err) => format!("Error: {err}"),
        }
    }

    /// Process exit status for this error.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Predict(_) => 1,
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RFPREDICT_LOG` takes precedence; otherwise the level is `warn`, raised
/// by each `-v`. Calling this twice is harmless.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

/// Render a prediction the way it is printed on stdout.
///
/// Shortest round-trip form with a trailing `.0` on integral values;
/// `nan`, `inf` and `-inf` for non-finite values. Values below `1e-4` or
/// from `1e16` up switch to scientific notation with a signed exponent of at
/// least two digits (`1e-05`, `1.5e+16`).
pub fn format_prediction(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        let s = if value > 0.0 { "inf" } else { "-inf" };
        return s.to_string();
    }

    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.unsigned_abs())
            }
            Err(_) => repr,
        },
        None => repr,
    }
}

/// Load the model named on the command line and predict.
pub fn execute(cli: &Cli) -> Result<f64, CliError> {
    tracing::debug!(?cli, "parsed arguments");

    // Existence is checked before the parameters are looked at.
    if !cli.model_path.exists() {
        return Err(PredictError::ModelNotFound(cli.model_path.clone()).into());
    }

    let parameters = ParameterSet::parse(&cli.parameters_json)?;
    let predictor = Predictor::new().with_format(cli.format.into());
    Ok(predictor.predict(&cli.model_path, &parameters)?)
}

/// Run with the process arguments, writing to stdout.
pub fn run() -> ExitCode {
    ExitCode::from(run_from(std::env::args_os(), &mut io::stdout().lock()))
}

/// Run with explicit arguments (including the program name) and output.
///
/// Returns the process exit status.
pub fn run_from<I, T, W>(args: I, out: &mut W) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    match write!(out, "{err}") {
                        Ok(()) => 0,
                        Err(_) => 1,
                    }
                }
                _ => report(out, &CliError::Usage(USAGE.to_string())),
            };
        }
    };

    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(prediction) => match writeln!(out, "{}", format_prediction(prediction)) {
            Ok(()) => 0,
            Err(err) => {
                tracing::error!(%err, "failed to write prediction");
                1
            }
        },
        Err(err) => {
            tracing::debug!(?err, "prediction failed");
            report(out, &err)
        }
    }
}

fn report<W: Write>(out: &mut W, err: &CliError) -> u8 {
    if let Err(write_err) = writeln!(out, "{}", err.message()) {
        tracing::error!(%write_err, "failed to write error message");
    }
    err.exit_status()
}
