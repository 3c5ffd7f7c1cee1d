//! argdef - option-definition driven argument parsing for shell scripts.

use anyhow::{Context, Result};
use argdef::output::{
    find_var_collision, generate_error_output, generate_help_output, DEFAULT_PREFIX,
};
use argdef::{generate_output, Args, Collector, DiagnosticSink, LogSink, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Option-definition driven argument parsing for shell scripts.
#[derive(Parser, Debug)]
#[command(name = "argdef", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse script arguments and output environment variables
    Parse {
        /// Option definition string for the target script
        #[arg(long, allow_hyphen_values = true)]
        spec: String,

        /// JSON parser settings
        #[arg(long)]
        settings: Option<String>,

        /// Environment variable prefix
        #[arg(long, default_value = DEFAULT_PREFIX)]
        prefix: String,

        /// Program name used in usage text
        #[arg(long, default_value = "argdef")]
        name: String,

        /// Arguments to parse for the target script
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Print usage text for the target script
    Usage {
        /// Option definition string for the target script
        #[arg(long, allow_hyphen_values = true)]
        spec: String,

        /// Program name used in usage text
        #[arg(long, default_value = "argdef")]
        name: String,
    },

    /// Parse script arguments and print the option state as JSON
    Dump {
        /// Option definition string for the target script
        #[arg(long, allow_hyphen_values = true)]
        spec: String,

        /// JSON parser settings
        #[arg(long)]
        settings: Option<String>,

        /// Program name used in usage text
        #[arg(long, default_value = "argdef")]
        name: String,

        /// Arguments to parse for the target script
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_args(spec: &str, settings: Option<&str>) -> Result<Args> {
    let settings = match settings {
        Some(json) => Settings::from_json(json).context("failed to parse settings JSON")?,
        None => Settings::default(),
    };
    Args::with_settings(spec, settings).context("invalid option definition")
}

/// Parse `args` against the registry, collecting diagnostics. Returns the
/// compacted leftovers (program name removed), the success flag and the
/// collected diagnostics.
fn scan(args: &mut Args, name: &str, rest: &[String]) -> (Vec<String>, bool, Collector) {
    let argv: Vec<&str> = std::iter::once(name)
        .chain(rest.iter().map(String::as_str))
        .collect();

    let mut sink = Collector::new();
    let outcome = args.parse_with(&argv, true, &mut sink);

    let mut leftovers = outcome.compacted.unwrap_or_default();
    if !leftovers.is_empty() {
        leftovers.remove(0);
    }
    (leftovers, outcome.success, sink)
}

/// Run the parse command and return the path of the generated file.
fn parse_command(
    spec: &str,
    settings: Option<&str>,
    prefix: &str,
    name: &str,
    rest: &[String],
) -> Result<PathBuf> {
    let mut args = load_args(spec, settings)?;
    let (leftovers, success, sink) = scan(&mut args, name, rest);

    if args.is_help() {
        return generate_help_output(&args.usage_text(name))
            .context("failed to generate help output file");
    }

    let errors: Vec<String> = sink
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(ToString::to_string)
        .collect();

    for diagnostic in sink.diagnostics.into_iter().filter(|d| !d.is_error()) {
        LogSink.report(diagnostic);
    }

    if !success || !errors.is_empty() {
        return generate_error_output(&errors.join("; "))
            .context("failed to generate error output file");
    }

    if let Some(message) = find_var_collision(&args, prefix) {
        return generate_error_output(&message).context("failed to generate error output file");
    }

    generate_output(&args, &leftovers, prefix).context("failed to generate output file")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Parse {
            spec,
            settings,
            prefix,
            name,
            args,
        } => {
            let path = parse_command(&spec, settings.as_deref(), &prefix, &name, &args)?;
            println!("{}", path.display());
        }
        Commands::Usage { spec, name } => {
            let args = load_args(&spec, None)?;
            print!("{}", args.usage_text(&name));
        }
        Commands::Dump {
            spec,
            settings,
            name,
            args: rest,
        } => {
            let mut args = load_args(&spec, settings.as_deref())?;
            let (_, _, sink) = scan(&mut args, &name, &rest);
            for diagnostic in sink.diagnostics {
                LogSink.report(diagnostic);
            }
            println!("{}", args.dump_json().context("failed to serialize options")?);
        }
    }

    Ok(())
}
