//! resin-quote quote command - price a batch of files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use resin_quote::{
    CommandGenerator, DocumentOptions, FALLBACK_PROPOSAL, MoneyFormat, NarrativeOptions,
    NarrativeOutcome, ParameterConfiguration, QuoteDocument, QuoteSession, SourceHandle,
    VerticalAxis, generate_or_fallback,
};
use serde::Serialize;
use tracing::info;

use crate::{Cli, OutputFormat, output};

pub struct QuoteArgs<'a> {
    pub inputs: &'a [PathBuf],
    pub config: Option<&'a Path>,
    pub overrides: &'a [String],
    pub axis: VerticalAxis,
    pub project: Option<&'a str>,
    pub date: Option<&'a str>,
    pub narrative: bool,
    pub output: Option<&'a Path>,
}

#[derive(Serialize)]
struct FailedFile {
    id: u64,
    origin: String,
    error: String,
}

#[derive(Serialize)]
struct QuoteReport<'a> {
    document: &'a QuoteDocument,
    failed: Vec<FailedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative_error: Option<String>,
}

fn load_config(args: &QuoteArgs<'_>) -> Result<ParameterConfiguration> {
    let mut config = match args.config {
        Some(path) => ParameterConfiguration::from_file(path)
            .with_context(|| format!("Failed to load parameters from {:?}", path))?,
        None => ParameterConfiguration::default(),
    };

    for assignment in args.overrides {
        let (parameter, value) = ParameterConfiguration::parse_assignment(assignment)?;
        config.set(parameter, value);
        info!(parameter = %parameter, value, "Parameter override");
    }

    Ok(config)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn request_narrative(session: &QuoteSession) -> NarrativeOutcome {
    let snapshot = session.narrative_snapshot();
    let options = NarrativeOptions::default();
    match CommandGenerator::from_env() {
        Ok(generator) => generate_or_fallback(&generator, &snapshot, &options),
        Err(e) => NarrativeOutcome {
            text: FALLBACK_PROPOSAL.to_string(),
            error: Some(e.to_string()),
        },
    }
}

pub fn run(args: &QuoteArgs<'_>, cli: &Cli) -> Result<()> {
    let config = load_config(args)?;

    let issues = config.validate();
    if !cli.quiet {
        for issue in &issues {
            eprintln!("{}: {}", "Warning".yellow().bold(), issue);
        }
    }

    let mut session = QuoteSession::with_axis(config, args.axis);
    for path in args.inputs {
        session.upload(SourceHandle::from(path.clone()), display_name(path));
    }
    session.wait_idle();

    let narrative = args.narrative.then(|| request_narrative(&session));

    let options = DocumentOptions {
        project_name: args.project.unwrap_or_default().to_string(),
        date: args.date.map(String::from),
        ..Default::default()
    };
    let document = session.document(&options, narrative.as_ref().map(|n| n.text.as_str()));
    let money = MoneyFormat::default();

    let failed: Vec<FailedFile> = session
        .failures()
        .iter()
        .map(|f| FailedFile {
            id: f.id.raw(),
            origin: f.origin.clone(),
            error: f.message.clone(),
        })
        .collect();
    let narrative_error = narrative.and_then(|n| n.error);

    match cli.format {
        OutputFormat::Json => {
            let report = QuoteReport {
                document: &document,
                failed,
                narrative_error,
            };
            output::print(&report, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Quote".bold().underline());
                print!("{}", document.text(&money));

                if !failed.is_empty() {
                    println!();
                    println!("{}", "Files still pending".bold());
                    for f in &failed {
                        println!("  {} {}: {}", "✗".red(), f.origin, f.error);
                    }
                }

                if let Some(err) = &narrative_error {
                    println!();
                    println!("{}: {}", "Narrative unavailable".yellow(), err);
                }
            }
        }
    }

    if let Some(path) = args.output {
        document
            .write_to(path, &money)
            .with_context(|| format!("Failed to write quote to {:?}", path))?;
        if !cli.quiet {
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
    }

    Ok(())
}
