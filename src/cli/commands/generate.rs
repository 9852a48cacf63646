//! Generate the conversion program for a mapping

use std::path::PathBuf;

use crate::cli::commands::{SessionArgs, build_session};
use crate::cli::error::CliError;
use crate::cli::output::{format_field_statuses, format_stats};

/// Arguments for the `generate` command
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub session: SessionArgs,
    /// Write the program here instead of returning it
    pub output: Option<PathBuf>,
    /// Print the mapping summary to stderr
    pub verbose: bool,
}

/// Handle the `generate` command
///
/// Returns the program text, or a confirmation line when `output` is set.
pub fn handle_generate(args: &GenerateArgs) -> Result<String, CliError> {
    let mut session = build_session(&args.session)?;

    if args.verbose {
        eprintln!("{}", format_stats(&session.stats()));
        eprint!("{}", format_field_statuses(&session.field_statuses()));
    }

    let code = session.generated_code().to_string();
    match &args.output {
        Some(path) => {
            std::fs::write(path, &code).map_err(|e| {
                CliError::InvalidArgument(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(format!("Wrote conversion program to {}", path.display()))
        }
        None => Ok(code),
    }
}
