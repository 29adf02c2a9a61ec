//! resin-quote: price resin 3D prints from STL files.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=resin_quote=info` - Extraction summaries
//! - `RUST_LOG=resin_quote=debug` - Registry and quote detail
//! - `RUST_LOG=resin_quote::timing=info` - Per-file decode timing
//!
//! # Example
//!
//! ```bash
//! resin-quote quote dragon.stl base.stl --set profit_margin_percent=40
//! resin-quote quote parts/*.stl --config shop.toml -o quote.json
//! resin-quote inspect dragon.stl --axis y
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use resin_quote::VerticalAxis;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{config, inspect, quote};

/// resin-quote - cost quotes for resin 3D printing.
///
/// Measures STL files and prices them with a configurable cost model.
#[derive(Parser)]
#[command(name = "resin-quote")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a batch of STL files printed together
    Quote {
        /// Input STL files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Parameter file (TOML, or JSON for .json)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Override one parameter, e.g. --set resin_price_per_kg=180
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,

        /// Build direction of the printer
        #[arg(long, default_value = "z")]
        axis: VerticalAxis,

        /// Project name shown on the document
        #[arg(long)]
        project: Option<String>,

        /// Quote date printed on the document
        #[arg(long)]
        date: Option<String>,

        /// Ask the configured generator for a proposal text
        #[arg(long)]
        narrative: bool,

        /// Write the quote document (JSON for .json, text otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Measure a single mesh file
    Inspect {
        /// Input STL file
        input: PathBuf,

        /// Build direction of the printer
        #[arg(long, default_value = "z")]
        axis: VerticalAxis,
    },

    /// Print or save the default parameter file
    Config {
        /// Save to this path instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "resin_quote=info",
            2 => "resin_quote=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Quote {
            inputs,
            config,
            overrides,
            axis,
            project,
            date,
            narrative,
            output,
        } => quote::run(
            &quote::QuoteArgs {
                inputs,
                config: config.as_deref(),
                overrides,
                axis: *axis,
                project: project.as_deref(),
                date: date.as_deref(),
                narrative: *narrative,
                output: output.as_deref(),
            },
            &cli,
        ),
        Commands::Inspect { input, axis } => inspect::run(input, *axis, &cli),
        Commands::Config { output } => config::run(output.as_deref(), &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(quote_err) = e.downcast_ref::<resin_quote::QuoteError>() {
                eprintln!("{}: {}", "Error".red().bold(), quote_err);
                eprintln!("  {}: {}", "Code".cyan(), quote_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    quote_err.recovery_suggestion()
                );
                if let Some(location) = quote_err.location() {
                    eprintln!("  {}: {}", "Location".yellow(), location);
                }
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
