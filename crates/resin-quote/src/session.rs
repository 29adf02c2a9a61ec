//! A quoting session: registry, parameters and background extraction.
//!
//! The session is the only writer of the registry. It adds records on upload,
//! applies extraction events, removes records and re-weighs them when the
//! density changes. The quote itself is never stored; [`QuoteSession::quote`]
//! recomputes it from the current state on every call.

use tracing::{info, warn};

use crate::cost::{QuoteResult, compute_quote};
use crate::export::{DocumentOptions, QuoteDocument};
use crate::narrative::NarrativeSnapshot;
use crate::params::{Parameter, ParameterConfiguration};
use crate::queue::{ExtractionEvent, ExtractionQueue};
use crate::registry::{ApplyOutcome, GeometryRegistry, MeshRecord, RecordId, SourceHandle};
use crate::tracing_ext::{OperationTimer, log_extraction, log_quote};
use crate::types::VerticalAxis;

/// An extraction that failed; the record stays pending.
#[derive(Debug, Clone)]
pub struct ExtractionFailure {
    pub id: RecordId,
    pub origin: String,
    pub message: String,
}

/// Single-operator quoting state.
pub struct QuoteSession {
    registry: GeometryRegistry,
    config: ParameterConfiguration,
    axis: VerticalAxis,
    queue: ExtractionQueue,
    failures: Vec<ExtractionFailure>,
}

impl QuoteSession {
    pub fn new(config: ParameterConfiguration) -> Self {
        Self::with_axis(config, VerticalAxis::default())
    }

    pub fn with_axis(config: ParameterConfiguration, axis: VerticalAxis) -> Self {
        Self {
            registry: GeometryRegistry::new(),
            config,
            axis,
            queue: ExtractionQueue::new(),
            failures: Vec::new(),
        }
    }

    /// Register a file and start extracting it. Returns without waiting.
    pub fn upload(&mut self, source: SourceHandle, display_name: impl Into<String>) -> RecordId {
        let id = self.registry.add(source.clone(), display_name);
        if let Some(record) = self.registry.get(id) {
            self.queue.dispatch(record.ticket(), source, self.axis);
        }
        id
    }

    /// Replace a file's source and extract it again.
    ///
    /// Returns false if `id` is unknown.
    pub fn replace(&mut self, id: RecordId, source: SourceHandle) -> bool {
        match self.registry.replace_source(id, source.clone()) {
            Some(ticket) => {
                self.failures.retain(|f| f.id != id);
                self.queue.dispatch(ticket, source, self.axis);
                true
            }
            None => false,
        }
    }

    /// Remove a file. A late extraction result for it is discarded.
    pub fn remove(&mut self, id: RecordId) -> Option<MeshRecord> {
        self.failures.retain(|f| f.id != id);
        self.registry.remove(id)
    }

    /// Apply every finished extraction without blocking.
    ///
    /// Returns the number of records updated.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.queue.try_next() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until no extraction is in flight.
    pub fn wait_idle(&mut self) -> usize {
        let timer = OperationTimer::new("wait_idle");
        let _span = timer.span().enter();
        let mut applied = 0;
        while let Some(event) = self.queue.next_blocking() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Number of extractions dispatched but not yet collected.
    pub fn in_flight(&self) -> usize {
        self.queue.in_flight()
    }

    fn handle_event(&mut self, event: ExtractionEvent) -> bool {
        let ExtractionEvent {
            ticket,
            origin,
            result,
        } = event;

        match result {
            Ok(extraction) => {
                let outcome =
                    self.registry
                        .apply_extraction(ticket, &extraction, self.config.resin_density);
                if outcome == ApplyOutcome::Applied {
                    if let Some(record) = self.registry.get(ticket.id) {
                        log_extraction(ticket.id, &record.display_name, &extraction);
                    }
                    true
                } else {
                    false
                }
            }
            Err(err) => {
                let current = self
                    .registry
                    .get(ticket.id)
                    .is_some_and(|r| r.generation == ticket.generation);
                if current {
                    warn!(
                        id = %ticket.id,
                        origin = %origin,
                        code = %err.code(),
                        error = %err,
                        "Extraction failed, record stays pending"
                    );
                    self.failures.push(ExtractionFailure {
                        id: ticket.id,
                        origin,
                        message: err.to_string(),
                    });
                }
                false
            }
        }
    }

    /// Update one parameter. A density change re-weighs every record.
    pub fn set_parameter(&mut self, parameter: Parameter, value: f64) {
        self.config.set(parameter, value);
        if parameter == Parameter::ResinDensity {
            self.registry.recompute_mass_for_density_change(value);
        }
        info!(parameter = %parameter, value, "Parameter updated");
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: ParameterConfiguration) {
        let density_changed = config.resin_density != self.config.resin_density;
        self.config = config;
        if density_changed {
            self.registry
                .recompute_mass_for_density_change(self.config.resin_density);
        }
    }

    pub fn config(&self) -> &ParameterConfiguration {
        &self.config
    }

    pub fn axis(&self) -> VerticalAxis {
        self.axis
    }

    /// Records in upload order.
    pub fn records(&self) -> &[MeshRecord] {
        self.registry.records()
    }

    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    /// Extraction failures for records that are still loaded.
    pub fn failures(&self) -> &[ExtractionFailure] {
        &self.failures
    }

    /// Price the current batch.
    pub fn quote(&self) -> QuoteResult {
        let quote = compute_quote(self.registry.records(), &self.config);
        log_quote(&quote, self.registry.len());
        quote
    }

    /// Everything a document generator needs.
    pub fn document(&self, options: &DocumentOptions, proposal: Option<&str>) -> QuoteDocument {
        QuoteDocument::build(self.records(), &self.quote(), options, proposal)
    }

    /// Read-only view for a text-generation collaborator.
    pub fn narrative_snapshot(&self) -> NarrativeSnapshot {
        NarrativeSnapshot::capture(self.records(), &self.quote(), &self.config)
    }
}
