//! `rfpredict <model_path> <parameters_json>`
//!
//! Prints one prediction to stdout. See [`rfpredict::cli`].

use std::process::ExitCode;

fn main() -> ExitCode {
    rfpredict::cli::run()
}
