//! Tracing extensions for quote operations.
//!
//! Enable output by installing a subscriber in the application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=resin_quote=debug for detailed output
//! // RUST_LOG=resin_quote::timing=info for extraction timing
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: Files that failed extraction, degenerate parameters
//! - **INFO**: Extraction and quote summaries, timing
//! - **DEBUG**: Registry changes, discarded results
//! - **TRACE**: Per-recompute cost breakdowns

use std::time::Instant;
use tracing::{Span, debug, info, trace, warn};

use crate::cost::QuoteResult;
use crate::extract::Extraction;
use crate::registry::RecordId;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// fn expensive_operation() {
///     let _timer = OperationTimer::new("expensive_operation");
///     // ... do work ...
/// } // Timer logs duration when dropped
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("quote_operation", operation = name);
        debug!(target: "resin_quote::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer tagged with the source being processed.
    pub fn with_origin(name: &'static str, origin: &str) -> Self {
        let span = tracing::info_span!("quote_operation", operation = name, origin = origin);
        debug!(
            target: "resin_quote::timing",
            operation = name,
            origin = origin,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "resin_quote::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log a finished extraction.
pub fn log_extraction(id: RecordId, name: &str, extraction: &Extraction) {
    info!(
        target: "resin_quote::extract",
        id = %id,
        name = name,
        volume_cm3 = format!("{:.3}", extraction.volume_cm3),
        height_mm = format!("{:.2}", extraction.height_mm),
        "Geometry extracted"
    );
}

/// Log a computed quote. Invalid quotes are logged at warn level.
pub fn log_quote(quote: &QuoteResult, record_count: usize) {
    if quote.is_valid() {
        trace!(
            target: "resin_quote::cost",
            records = record_count,
            resin = quote.resin_cost,
            energy = quote.energy_cost,
            depreciation = quote.depreciation_cost,
            post_processing = quote.post_processing_cost,
            "Cost breakdown"
        );
        debug!(
            target: "resin_quote::cost",
            records = record_count,
            print_time_hours = format!("{:.3}", quote.print_time_hours),
            total = format!("{:.2}", quote.total),
            "Quote computed"
        );
    } else {
        warn!(
            target: "resin_quote::cost",
            records = record_count,
            issues = ?quote.issues,
            "Quote depends on degenerate parameters"
        );
    }
}
