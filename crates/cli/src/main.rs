mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::config::Project;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Castor type description language toolchain.
#[derive(Parser)]
#[command(name = "castor", version, about = "Castor type description language toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log parser and executor decisions to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Project file declaring enums, date/time types, constants and aliases
    /// (default: ./castor.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a type string and print its canonical form
    Check {
        /// The type string, e.g. "array{id: positive-int, tags: string[]}"
        #[arg(value_name = "TYPE")]
        type_str: String,
    },

    /// Parse wire JSON against a type and print the typed value
    Parse {
        #[arg(value_name = "TYPE")]
        type_str: String,
        /// JSON input file, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Accept strings, numbers and booleans for one another
        #[arg(long)]
        coerce: bool,
    },

    /// Parse wire JSON, then serialize the typed value back to wire form
    Serialize {
        #[arg(value_name = "TYPE")]
        type_str: String,
        /// JSON input file, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Accept strings, numbers and booleans for one another while parsing
        #[arg(long)]
        coerce: bool,
    },

    /// Compile a JSON map of schema name to type string into Rust source
    Compile {
        /// Path to the schemas JSON file
        schemas: PathBuf,
        /// Write the generated source here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project = match Project::load(cli.config.as_deref()) {
        Ok(p) => p,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Check { type_str } => {
            commands::check::cmd_check(&project, &type_str, cli.output, cli.quiet);
        }
        Commands::Parse {
            type_str,
            input,
            coerce,
        } => {
            commands::parse::cmd_parse(&project, &type_str, &input, coerce, cli.output, cli.quiet);
        }
        Commands::Serialize {
            type_str,
            input,
            coerce,
        } => {
            commands::serialize::cmd_serialize(&project, &type_str, &input, coerce, cli.output, cli.quiet);
        }
        Commands::Compile { schemas, out } => {
            commands::compile::cmd_compile(&project, &schemas, out.as_deref(), cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `CASTOR_LOG`
/// overrides the level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CASTOR_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
