//! Preview a mapping on sample input

use std::path::PathBuf;

use crate::cli::commands::{SessionArgs, build_session};
use crate::cli::error::CliError;
use crate::cli::input::load_value;
use crate::preview::{PreviewExecutor, PreviewOutcome};

/// Arguments for the `preview` command
#[derive(Debug, Clone, Default)]
pub struct PreviewArgs {
    pub session: SessionArgs,
    /// Sample input file, `-` for stdin
    pub sample: PathBuf,
    /// Run this program file instead of the generated one
    pub code: Option<PathBuf>,
    /// Print the `{result}` / `{error}` envelope instead of failing
    pub envelope: bool,
}

/// Handle the `preview` command
///
/// Returns the converted value as pretty JSON.
pub fn handle_preview(args: &PreviewArgs) -> Result<String, CliError> {
    let mut session = build_session(&args.session)?;
    let sample = load_value(&args.sample)?;

    let result = match &args.code {
        Some(path) => {
            let code = std::fs::read_to_string(path)
                .map_err(|e| CliError::FileReadError(path.clone(), e.to_string()))?;
            PreviewExecutor::new(session.config().clone()).run(
                &sample,
                session.mapping(),
                &code,
                session.target_schema(),
            )
        }
        None => session.preview(&sample),
    };

    if args.envelope {
        let outcome = PreviewOutcome::from(result);
        return to_pretty(&outcome);
    }
    to_pretty(&result?)
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::InvalidArgument(format!("Failed to serialize output: {}", e)))
}
