//! Asynchronous geometry extraction.
//!
//! Each dispatched source becomes one independent job on the rayon pool.
//! Every job sends exactly one [`ExtractionEvent`] back over a channel,
//! tagged with the ticket it was dispatched with, even when decoding fails or
//! panics. Completion order is unspecified and one slow or broken
//! file never holds up another.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::{debug, error};

use crate::error::{CoreResult, QuoteError};
use crate::extract::{Extraction, extract_from_source};
use crate::registry::{ExtractionTicket, SourceHandle};
use crate::types::VerticalAxis;

/// The single completion message of one extraction job.
#[derive(Debug)]
pub struct ExtractionEvent {
    pub ticket: ExtractionTicket,
    /// Description of the source, for messages.
    pub origin: String,
    pub result: CoreResult<Extraction>,
}

/// Dispatches extraction jobs and collects their results.
pub struct ExtractionQueue {
    sender: Sender<ExtractionEvent>,
    receiver: Receiver<ExtractionEvent>,
    in_flight: usize,
}

impl ExtractionQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Start extracting `source` in the background.
    pub fn dispatch(&mut self, ticket: ExtractionTicket, source: SourceHandle, axis: VerticalAxis) {
        let sender = self.sender.clone();
        self.in_flight += 1;
        debug!(id = %ticket.id, generation = ticket.generation, "Dispatching extraction");

        rayon::spawn(move || {
            let origin = source.describe();
            let result = catch_unwind(AssertUnwindSafe(|| extract_from_source(&source, axis)))
                .unwrap_or_else(|panic| {
                    let details = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "decoder panicked".to_string());
                    error!(origin = %origin, details = %details, "Extraction panicked");
                    Err(QuoteError::ExtractionAborted {
                        origin: origin.clone(),
                        details,
                    })
                });

            // The queue may have been dropped; nobody is waiting then.
            let _ = sender.send(ExtractionEvent {
                ticket,
                origin,
                result,
            });
        });
    }

    /// Number of dispatched jobs whose event has not been collected yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect one finished event without blocking.
    pub fn try_next(&mut self) -> Option<ExtractionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => {
                self.in_flight -= 1;
                Some(event)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until one event arrives. Returns `None` when nothing is in flight.
    pub fn next_blocking(&mut self) -> Option<ExtractionEvent> {
        if self.in_flight == 0 {
            return None;
        }
        // We hold a sender, so recv cannot fail while jobs are outstanding.
        let event = self.receiver.recv().ok()?;
        self.in_flight -= 1;
        Some(event)
    }
}

impl Default for ExtractionQueue {
    fn default() -> Self {
        Self::new()
    }
}
