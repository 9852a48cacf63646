//! api-mapper: generate, preview and validate API-to-UI field mappings

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use api_mapping_sdk::cli::commands::SessionArgs;
use api_mapping_sdk::cli::commands::generate::{GenerateArgs, handle_generate};
use api_mapping_sdk::cli::commands::preview::{PreviewArgs, handle_preview};
use api_mapping_sdk::cli::commands::template::{TemplateArgs, handle_template};
use api_mapping_sdk::cli::commands::validate::{ValidateArgs, handle_validate};

#[derive(Parser)]
#[command(name = "api-mapper")]
#[command(version, about = "Map API response fields onto UI requirement fields")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log progress and mapping summaries to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct SessionOpts {
    /// Source (API response) schema, JSON or YAML
    #[arg(long)]
    source: PathBuf,
    /// Target (UI requirement) schema, JSON or YAML
    #[arg(long)]
    target: PathBuf,
    /// Mapping file: target field to source field or list of fields
    #[arg(short, long)]
    mapping: Option<PathBuf>,
    /// Overrides file: target field to custom function text
    #[arg(long)]
    overrides: Option<PathBuf>,
    /// Session configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl From<SessionOpts> for SessionArgs {
    fn from(opts: SessionOpts) -> Self {
        SessionArgs {
            source: opts.source,
            target: opts.target,
            mapping: opts.mapping,
            overrides: opts.overrides,
            config: opts.config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the conversion program
    Generate {
        #[command(flatten)]
        session: SessionOpts,
        /// Write the program to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the conversion program on sample input
    Preview {
        #[command(flatten)]
        session: SessionOpts,
        /// Sample input, `-` for stdin
        #[arg(short, long)]
        sample: PathBuf,
        /// Run this program instead of the generated one
        #[arg(long)]
        code: Option<PathBuf>,
        /// Print a {"result"} or {"error"} object instead of failing
        #[arg(long)]
        envelope: bool,
    },
    /// Check a value against a target schema
    Validate {
        /// Target schema, JSON or YAML
        #[arg(long)]
        target: PathBuf,
        /// Value to check, `-` for stdin
        #[arg(long)]
        value: PathBuf,
        /// Session configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the custom-function template for a mapped field
    Template {
        #[command(flatten)]
        session: SessionOpts,
        /// Target field
        #[arg(short, long)]
        field: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "api_mapping_sdk=debug" } else { "api_mapping_sdk=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let verbose = cli.verbose;
    let output = match cli.command {
        Commands::Generate { session, output } => handle_generate(&GenerateArgs {
            session: session.into(),
            output,
            verbose,
        })?,
        Commands::Preview {
            session,
            sample,
            code,
            envelope,
        } => handle_preview(&PreviewArgs {
            session: session.into(),
            sample,
            code,
            envelope,
        })?,
        Commands::Validate {
            target,
            value,
            config,
        } => handle_validate(&ValidateArgs {
            target,
            value,
            config,
        })?,
        Commands::Template { session, field } => handle_template(&TemplateArgs {
            session: session.into(),
            field,
        })?,
    };
    Ok(output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
