//! Shared output helpers.

use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable value as pretty JSON. Text mode prints nothing;
/// callers render text themselves.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize output"),
        }
    }
}
