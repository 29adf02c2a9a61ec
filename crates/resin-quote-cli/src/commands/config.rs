//! resin-quote config command - emit the default parameter file.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use resin_quote::ParameterConfiguration;

use crate::{Cli, OutputFormat, output};

pub fn run(output_path: Option<&Path>, cli: &Cli) -> Result<()> {
    let config = ParameterConfiguration::default();

    if let Some(path) = output_path {
        config.save_toml(path)?;
        if !cli.quiet {
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
        return Ok(());
    }

    match cli.format {
        OutputFormat::Json => output::print(&config, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print!("{}", config.to_toml()?);
            }
        }
    }

    Ok(())
}
