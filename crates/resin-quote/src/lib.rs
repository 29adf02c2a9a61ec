//! Volume extraction and cost model for resin 3D-printing quotes.
//!
//! This crate turns a batch of uploaded STL files into a priced quote. Each
//! file is decoded in the background, measured (enclosed volume and vertical
//! extent) and stored in a registry. The cost model is a pure function of the
//! registry and a small set of operator parameters.
//!
//! # Units
//!
//! **Mesh coordinates are assumed to be millimeters.**
//!
//! - Volume is reported in cm³ (mm³ / 1000)
//! - Height is reported in mm
//! - Mass is `volume_cm3 × resin_density` in grams
//! - Prices use whatever currency the parameters are expressed in
//!
//! # Quick Start
//!
//! ```no_run
//! use resin_quote::{ParameterConfiguration, QuoteSession, SourceHandle};
//! use std::path::PathBuf;
//!
//! let mut session = QuoteSession::new(ParameterConfiguration::default());
//! session.upload(SourceHandle::from(PathBuf::from("bracket.stl")), "bracket.stl");
//! session.upload(SourceHandle::from(PathBuf::from("lid.stl")), "lid.stl");
//!
//! // Extraction runs on the rayon pool; collect the results.
//! session.wait_idle();
//!
//! let quote = session.quote();
//! println!("total: {:.2}", quote.total);
//! ```
//!
//! # Measuring a single file
//!
//! ```no_run
//! use resin_quote::{Mesh, VerticalAxis, extract_geometry};
//!
//! let mesh = Mesh::load("figure.stl").unwrap();
//! let extraction = extract_geometry(&mesh, VerticalAxis::Z);
//! println!("{:.2} cm³, {:.1} mm tall", extraction.volume_cm3, extraction.height_mm);
//! ```
//!
//! # Pricing
//!
//! ```
//! use resin_quote::{ParameterConfiguration, compute_quote};
//!
//! // No files: every figure is zero.
//! let quote = compute_quote(&[], &ParameterConfiguration::default());
//! assert_eq!(quote.total, 0.0);
//! ```
//!
//! A configuration with a zero print speed or printer lifespan yields
//! infinite figures; [`QuoteResult::is_valid`] and [`QuoteResult::issues`]
//! report it rather than hiding it.

mod error;
pub mod tracing_ext;
mod types;

pub mod cost;
pub mod export;
pub mod extract;
pub mod io;
pub mod narrative;
pub mod params;
pub mod queue;
pub mod registry;
pub mod session;

// Re-export core types at crate root
pub use error::{CoreResult, ErrorCode, ErrorLocation, QuoteError, RecoverySuggestion};
pub use types::{Mesh, Triangle, Vertex, VerticalAxis};

pub use io::{MeshFormat, load_mesh, load_stl, read_stl, save_stl, validate_mesh_data, write_stl};

pub use cost::{
    DegenerateParameter, PrintTimeSource, QuoteResult, SETUP_OVERHEAD_HOURS, compute_quote,
    resolve_print_time,
};
pub use export::{
    CostLine, DocumentOptions, DocumentText, FALLBACK_PROPOSAL, LineItem, MoneyFormat,
    QuoteDocument,
};
pub use extract::{Extraction, MM3_PER_CM3, extract_from_source, extract_geometry};
pub use narrative::{
    CommandGenerator, DEFAULT_NARRATIVE_TIMEOUT, NARRATIVE_COMMAND_ENV, NarrativeError, NarrativeFile, NarrativeGenerator,
    NarrativeOptions, NarrativeOutcome, NarrativeSnapshot, build_prompt, generate_or_fallback,
};
pub use params::{Parameter, ParameterConfiguration, ParameterIssue};
pub use queue::{ExtractionEvent, ExtractionQueue};
pub use registry::{
    ApplyOutcome, ExtractionTicket, GeometryRegistry, MeshRecord, RecordId, SourceHandle,
};
pub use session::{ExtractionFailure, QuoteSession};

pub use tracing_ext::{OperationTimer, log_extraction, log_quote};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from a file, detecting the format from the extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> CoreResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh as binary STL.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> CoreResult<()> {
        io::save_stl(self, path.as_ref())
    }

    /// Measure volume and height along `axis`.
    pub fn extract(&self, axis: VerticalAxis) -> Extraction {
        extract::extract_geometry(self, axis)
    }
}
