//! Narrative boundary: hand a quote to an external text generator.
//!
//! The core builds a read-only [`NarrativeSnapshot`] and a prompt from it.
//! Generating the sales paragraph is someone else's job, reached through the
//! [`NarrativeGenerator`] trait. Failure there is never fatal: use
//! [`generate_or_fallback`] to always get something printable back.
//!
//! [`CommandGenerator`] runs a user-configured program, writing the prompt to
//! its stdin and reading the paragraph from its stdout.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cost::QuoteResult;
use crate::export::FALLBACK_PROPOSAL;
use crate::params::ParameterConfiguration;
use crate::registry::MeshRecord;

/// Environment variable naming the generator program and its arguments.
pub const NARRATIVE_COMMAND_ENV: &str = "RESIN_QUOTE_NARRATIVE_CMD";

/// How long [`CommandGenerator`] waits before killing the program.
pub const DEFAULT_NARRATIVE_TIMEOUT: Duration = Duration::from_secs(120);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A file as the generator sees it.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeFile {
    pub name: String,
    pub volume_cm3: f64,
    pub height_mm: f64,
}

/// Everything the generator may read.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeSnapshot {
    pub files: Vec<NarrativeFile>,
    pub quote: QuoteResult,
    pub config: ParameterConfiguration,
}

impl NarrativeSnapshot {
    pub fn capture(
        records: &[MeshRecord],
        quote: &QuoteResult,
        config: &ParameterConfiguration,
    ) -> Self {
        Self {
            files: records
                .iter()
                .map(|r| NarrativeFile {
                    name: r.display_name.clone(),
                    volume_cm3: r.volume_cm3,
                    height_mm: r.height_mm,
                })
                .collect(),
            quote: quote.clone(),
            config: *config,
        }
    }
}

/// Wording knobs for the prompt.
#[derive(Debug, Clone)]
pub struct NarrativeOptions {
    pub equipment: String,
    /// Currency code quoted in the prompt.
    pub currency: String,
}

impl Default for NarrativeOptions {
    fn default() -> Self {
        Self {
            equipment: "Elegoo Saturn 4 Ultra (12K resolution)".to_string(),
            currency: "BRL".to_string(),
        }
    }
}

/// The instruction block sent ahead of the prompt.
pub fn system_instruction(options: &NarrativeOptions) -> String {
    format!(
        "You write formal, appealing commercial proposals for high-fidelity resin 3D printing. \
         Keep a professional tone, highlight the quality of the {} and the finishing work. \
         Amounts are in {}.",
        options.equipment, options.currency
    )
}

/// Compose the proposal request for a snapshot.
pub fn build_prompt(snapshot: &NarrativeSnapshot, options: &NarrativeOptions) -> String {
    let files: Vec<String> = snapshot
        .files
        .iter()
        .map(|f| {
            format!(
                "- {} (volume: {:.2} cm³, height: {:.1} mm)",
                f.name, f.volume_cm3, f.height_mm
            )
        })
        .collect();

    let quote = &snapshot.quote;
    let currency = &options.currency;
    format!(
        "Write a formal commercial proposal for a client.\n\
         \n\
         Project details:\n\
         - Equipment: {equipment}\n\
         - Total files: {count}\n\
         - Parts:\n\
         {files}\n\
         \n\
         Calculated costs:\n\
         - Material (resin): {currency} {resin:.2}\n\
         - Energy and depreciation: {currency} {machine:.2}\n\
         - Finishing/post-processing: {currency} {post:.2}\n\
         \n\
         Suggested final price: {currency} {total:.2}\n\
         \n\
         Write an email or message to the client explaining the price, highlighting the print \
         resolution and the care taken in finishing.",
        equipment = options.equipment,
        count = snapshot.files.len(),
        files = files.join("\n"),
        resin = quote.resin_cost,
        machine = quote.machine_cost(),
        post = quote.post_processing_cost,
        total = quote.total,
    )
}

/// Why a narrative could not be produced.
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative generator not configured (set {NARRATIVE_COMMAND_ENV})")]
    NotConfigured,

    #[error("narrative generator unavailable: {0}")]
    Unavailable(#[source] std::io::Error),

    #[error("narrative generator failed: {0}")]
    Failed(String),
}

/// Produces the sales paragraph from a snapshot.
pub trait NarrativeGenerator {
    fn generate(
        &self,
        snapshot: &NarrativeSnapshot,
        options: &NarrativeOptions,
    ) -> Result<String, NarrativeError>;
}

/// Runs an external program as the generator.
///
/// The prompt is written to the program's stdin while its stdout is read,
/// so programs that stream output before consuming all input do not stall.
/// A program still running after the timeout is killed.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_NARRATIVE_TIMEOUT,
        }
    }

    /// Replace the default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse a whitespace-separated command line.
    pub fn from_command_line(command_line: &str) -> Result<Self, NarrativeError> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next().ok_or(NarrativeError::NotConfigured)?;
        Ok(Self::new(program, parts.collect()))
    }

    /// Read the command line from [`NARRATIVE_COMMAND_ENV`].
    pub fn from_env() -> Result<Self, NarrativeError> {
        let command_line =
            std::env::var(NARRATIVE_COMMAND_ENV).map_err(|_| NarrativeError::NotConfigured)?;
        Self::from_command_line(&command_line)
    }

    /// Poll for exit until the deadline, killing the child if it passes.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, NarrativeError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(NarrativeError::Unavailable)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!(program = %self.program, timeout_s = self.timeout.as_secs_f64(), "Narrative generator timed out");
                // Already exited if kill fails; wait reaps it either way.
                let _ = child.kill();
                let _ = child.wait();
                return Err(NarrativeError::Unavailable(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "{} did not finish within {:.1}s",
                        self.program,
                        self.timeout.as_secs_f64()
                    ),
                )));
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            // A read error just truncates the captured output.
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl NarrativeGenerator for CommandGenerator {
    fn generate(
        &self,
        snapshot: &NarrativeSnapshot,
        options: &NarrativeOptions,
    ) -> Result<String, NarrativeError> {
        let input = format!(
            "{}\n\n{}\n",
            system_instruction(options),
            build_prompt(snapshot, options)
        );
        debug!(program = %self.program, bytes = input.len(), "Running narrative generator");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(NarrativeError::Unavailable)?;

        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                // Dropping stdin at the end closes the pipe so the program sees EOF.
                match stdin.write_all(input.as_bytes()) {
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                }
            })
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;

        if let Some(Ok(Err(e))) = writer.map(JoinHandle::join) {
            debug!(program = %self.program, error = %e, "Prompt was not fully written");
        }
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(NarrativeError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&stdout).trim().to_string();
        if text.is_empty() {
            return Err(NarrativeError::Failed(format!(
                "{} produced no text",
                self.program
            )));
        }
        Ok(text)
    }
}

/// Result of [`generate_or_fallback`].
#[derive(Debug, Clone)]
pub struct NarrativeOutcome {
    /// Generated text, or the fallback proposal.
    pub text: String,
    /// User-visible message when generation failed.
    pub error: Option<String>,
}

/// Run a generator, never failing.
pub fn generate_or_fallback(
    generator: &dyn NarrativeGenerator,
    snapshot: &NarrativeSnapshot,
    options: &NarrativeOptions,
) -> NarrativeOutcome {
    match generator.generate(snapshot, options) {
        Ok(text) => NarrativeOutcome { text, error: None },
        Err(err) => {
            warn!(error = %err, "Narrative generation failed, using fallback text");
            NarrativeOutcome {
                text: FALLBACK_PROPOSAL.to_string(),
                error: Some(err.to_string()),
            }
        }
    }
}
