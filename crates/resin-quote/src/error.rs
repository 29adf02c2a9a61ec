//! Error types for quote operations with rich diagnostics.
//!
//! Every error carries:
//! - A machine-readable code for programmatic handling
//! - Context about what went wrong (which file, which vertex, which parameter)
//! - A recovery suggestion
//! - Terminal display via miette
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `QUOTE-XXXX`:
//! - `QUOTE-1xxx`: I/O errors (file reading, writing, parsing)
//! - `QUOTE-2xxx`: Mesh data errors (indices, coordinates)
//! - `QUOTE-3xxx`: Extraction errors (jobs that never produced a result)
//! - `QUOTE-4xxx`: Format errors
//! - `QUOTE-5xxx`: Configuration errors
//!
//! Degenerate cost parameters are not errors: the cost model reports them
//! on the [`QuoteResult`](crate::QuoteResult) it returns.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fallible core operations.
pub type CoreResult<T> = Result<T, QuoteError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// QUOTE-1001: Failed to read file
    IoRead = 1001,
    /// QUOTE-1002: Failed to write file
    IoWrite = 1002,
    /// QUOTE-1003: Failed to parse mesh data
    ParseError = 1003,

    // Mesh data errors (2xxx)
    /// QUOTE-2001: Face references invalid vertex index
    InvalidVertexIndex = 2001,
    /// QUOTE-2002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 2002,

    // Extraction errors (3xxx)
    /// QUOTE-3001: Extraction job stopped without a result
    ExtractionAborted = 3001,

    // Format errors (4xxx)
    /// QUOTE-4001: Unsupported file format
    UnsupportedFormat = 4001,
    /// QUOTE-4002: Quote document could not be serialized
    DocumentSerialize = 4002,

    // Configuration errors (5xxx)
    /// QUOTE-5001: Failed to read configuration file
    ConfigRead = 5001,
    /// QUOTE-5002: Configuration file is malformed
    ConfigParse = 5002,
    /// QUOTE-5003: Configuration could not be serialized
    ConfigSerialize = 5003,
    /// QUOTE-5004: Unknown parameter name
    UnknownParameter = 5004,
    /// QUOTE-5005: Parameter value is not a number
    InvalidParameterValue = 5005,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `QUOTE-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "QUOTE-1001",
            ErrorCode::IoWrite => "QUOTE-1002",
            ErrorCode::ParseError => "QUOTE-1003",
            ErrorCode::InvalidVertexIndex => "QUOTE-2001",
            ErrorCode::InvalidCoordinate => "QUOTE-2002",
            ErrorCode::ExtractionAborted => "QUOTE-3001",
            ErrorCode::UnsupportedFormat => "QUOTE-4001",
            ErrorCode::DocumentSerialize => "QUOTE-4002",
            ErrorCode::ConfigRead => "QUOTE-5001",
            ErrorCode::ConfigParse => "QUOTE-5002",
            ErrorCode::ConfigSerialize => "QUOTE-5003",
            ErrorCode::UnknownParameter => "QUOTE-5004",
            ErrorCode::InvalidParameterValue => "QUOTE-5005",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for quote errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the file from the original software.
    ReexportFile { format: Option<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Check the source file or directory.
    CheckSource { checks: Vec<String> },
    /// Fix the configuration.
    FixConfiguration { hint: String },
    /// Retry the upload or remove the file.
    RetryUpload,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportFile { format } => {
                if let Some(fmt) = format {
                    write!(
                        f,
                        "Try re-exporting the mesh as {} from the original software",
                        fmt
                    )
                } else {
                    write!(f, "Try re-exporting the mesh from the original software")
                }
            }
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::CheckSource { checks } => {
                write!(f, "Check: {}", checks.join(", "))
            }
            RecoverySuggestion::FixConfiguration { hint } => write!(f, "{}", hint),
            RecoverySuggestion::RetryUpload => {
                write!(f, "Upload the file again or remove it from the batch")
            }
        }
    }
}

/// Location information for errors.
#[derive(Debug, Clone)]
pub enum ErrorLocation {
    /// Error at a specific vertex.
    Vertex { index: usize },
    /// Error at a specific face.
    Face { index: usize },
    /// Error in a file or named source.
    Source { name: String },
    /// Error in a configuration parameter.
    Parameter { name: String },
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::Vertex { index } => write!(f, "vertex {}", index),
            ErrorLocation::Face { index } => write!(f, "face {}", index),
            ErrorLocation::Source { name } => write!(f, "{}", name),
            ErrorLocation::Parameter { name } => write!(f, "parameter `{}`", name),
        }
    }
}

/// Errors that can occur while loading meshes or configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum QuoteError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(quote::io::read),
        help("Check that the file exists and is readable: {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write {path}")]
    #[diagnostic(
        code(quote::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mesh bytes could not be decoded.
    #[error("failed to parse mesh from {origin}: {details}")]
    #[diagnostic(
        code(quote::parse::error),
        help("The file may be truncated or corrupted. Try re-exporting it as binary STL.")
    )]
    ParseError { origin: String, details: String },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(code(quote::format::unsupported), help("Supported formats: STL"))]
    UnsupportedFormat { extension: Option<String> },

    /// A quote document could not be encoded.
    #[error("failed to serialize quote document: {details}")]
    #[diagnostic(code(quote::format::document))]
    DocumentSerialize { details: String },

    /// Invalid vertex index in face data.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(code(quote::mesh::vertex_index))]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// NaN or infinite coordinate value.
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(quote::mesh::coordinate),
        help("Check the export precision of the source file.")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// An extraction job ended without reporting.
    #[error("extraction of {origin} stopped without a result: {details}")]
    #[diagnostic(code(quote::extract::aborted))]
    ExtractionAborted { origin: String, details: String },

    /// Error reading a configuration file.
    #[error("failed to read configuration from {path}")]
    #[diagnostic(code(quote::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration.
    #[error("invalid configuration: {details}")]
    #[diagnostic(
        code(quote::config::parse),
        help("Run `resin-quote config` to print a valid parameter file.")
    )]
    ConfigParse { details: String },

    /// Configuration serialization failed.
    #[error("failed to serialize configuration: {details}")]
    #[diagnostic(code(quote::config::serialize))]
    ConfigSerialize { details: String },

    /// Unknown parameter name.
    #[error("unknown parameter `{name}`")]
    #[diagnostic(
        code(quote::config::unknown_parameter),
        help("Run `resin-quote config` to list parameter names.")
    )]
    UnknownParameter { name: String },

    /// Parameter value did not parse as a number.
    #[error("invalid value `{value}` for parameter `{name}`")]
    #[diagnostic(code(quote::config::value))]
    InvalidParameterValue { name: String, value: String },
}

impl QuoteError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            QuoteError::IoRead { .. } => ErrorCode::IoRead,
            QuoteError::IoWrite { .. } => ErrorCode::IoWrite,
            QuoteError::ParseError { .. } => ErrorCode::ParseError,
            QuoteError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            QuoteError::DocumentSerialize { .. } => ErrorCode::DocumentSerialize,
            QuoteError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            QuoteError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            QuoteError::ExtractionAborted { .. } => ErrorCode::ExtractionAborted,
            QuoteError::ConfigRead { .. } => ErrorCode::ConfigRead,
            QuoteError::ConfigParse { .. } => ErrorCode::ConfigParse,
            QuoteError::ConfigSerialize { .. } => ErrorCode::ConfigSerialize,
            QuoteError::UnknownParameter { .. } => ErrorCode::UnknownParameter,
            QuoteError::InvalidParameterValue { .. } => ErrorCode::InvalidParameterValue,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            QuoteError::IoRead { .. } => RecoverySuggestion::CheckSource {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            QuoteError::IoWrite { .. } => RecoverySuggestion::CheckSource {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            QuoteError::ParseError { .. } => RecoverySuggestion::ReexportFile {
                format: Some("binary STL".into()),
            },
            QuoteError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["STL".into()],
            },
            QuoteError::DocumentSerialize { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["text (.txt)".into()],
            },
            QuoteError::InvalidVertexIndex { .. } | QuoteError::InvalidCoordinate { .. } => {
                RecoverySuggestion::ReexportFile { format: None }
            }
            QuoteError::ExtractionAborted { .. } => RecoverySuggestion::RetryUpload,
            QuoteError::ConfigRead { .. } => RecoverySuggestion::CheckSource {
                checks: vec!["configuration path".into(), "file permissions".into()],
            },
            QuoteError::ConfigParse { .. } | QuoteError::ConfigSerialize { .. } => {
                RecoverySuggestion::FixConfiguration {
                    hint: "Every parameter must be a number; unknown keys are rejected".into(),
                }
            }
            QuoteError::UnknownParameter { .. } => RecoverySuggestion::FixConfiguration {
                hint: "Use one of the names printed by `resin-quote config`".into(),
            },
            QuoteError::InvalidParameterValue { .. } => RecoverySuggestion::FixConfiguration {
                hint: "Pass values as plain decimal numbers, e.g. resin_density=1.15".into(),
            },
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            QuoteError::InvalidVertexIndex { face_index, .. } => {
                Some(ErrorLocation::Face { index: *face_index })
            }
            QuoteError::InvalidCoordinate { vertex_index, .. } => Some(ErrorLocation::Vertex {
                index: *vertex_index,
            }),
            QuoteError::ParseError { origin, .. } | QuoteError::ExtractionAborted { origin, .. } => {
                Some(ErrorLocation::Source {
                    name: origin.clone(),
                })
            }
            QuoteError::IoRead { path, .. }
            | QuoteError::IoWrite { path, .. }
            | QuoteError::ConfigRead { path, .. } => Some(ErrorLocation::Source {
                name: path.display().to_string(),
            }),
            QuoteError::UnknownParameter { name }
            | QuoteError::InvalidParameterValue { name, .. } => Some(ErrorLocation::Parameter {
                name: name.clone(),
            }),
            _ => None,
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuoteError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QuoteError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(origin: impl Into<String>, details: impl Into<String>) -> Self {
        QuoteError::ParseError {
            origin: origin.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = QuoteError::parse_error("bracket.stl", "unexpected EOF");
        assert_eq!(err.code(), ErrorCode::ParseError);
        assert_eq!(err.code().as_str(), "QUOTE-1003");
        assert_eq!(err.code().to_string(), "QUOTE-1003");
    }

    #[test]
    fn test_document_errors_are_format_errors() {
        let err = QuoteError::DocumentSerialize {
            details: "key must be a string".into(),
        };
        assert_eq!(err.code().as_str(), "QUOTE-4002");
        assert!(err.to_string().contains("quote document"));
        assert!(err.location().is_none());
    }

    #[test]
    fn test_location_for_parameter_errors() {
        let err = QuoteError::UnknownParameter {
            name: "resin_colour".into(),
        };
        let location = err.location().expect("parameter errors have a location");
        assert_eq!(location.to_string(), "parameter `resin_colour`");
    }

    #[test]
    fn test_recovery_suggestion_display() {
        let err = QuoteError::UnsupportedFormat {
            extension: Some("obj".into()),
        };
        assert_eq!(
            err.recovery_suggestion().to_string(),
            "Try using a different format: STL"
        );
    }

    #[test]
    fn test_error_message_includes_context() {
        let err = QuoteError::InvalidVertexIndex {
            face_index: 3,
            vertex_index: 12,
            vertex_count: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("face 3"));
        assert!(msg.contains("vertex 12"));
        assert!(msg.contains("8 vertices"));
    }
}
