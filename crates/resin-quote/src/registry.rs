//! Geometry registry: one record per uploaded file.
//!
//! Records are created pending, filled once by an extraction result and
//! re-weighed whenever the resin density changes. Results are matched to
//! records through an [`ExtractionTicket`], which carries the record id and
//! the generation of the source it was computed from. A result whose record
//! is gone, or whose source has since been replaced, is discarded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::extract::Extraction;

/// Opaque identifier of an uploaded file. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    /// Rebuild an id from its raw value, e.g. one read back from an export.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the raw mesh bytes live. The registry never modifies them.
#[derive(Debug, Clone)]
pub enum SourceHandle {
    /// A file on disk.
    Path(PathBuf),
    /// Bytes already in memory (e.g. an upload body).
    Bytes(Arc<[u8]>),
}

impl SourceHandle {
    /// Human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            SourceHandle::Path(path) => path.display().to_string(),
            SourceHandle::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for SourceHandle {
    fn from(path: PathBuf) -> Self {
        SourceHandle::Path(path)
    }
}

impl From<&Path> for SourceHandle {
    fn from(path: &Path) -> Self {
        SourceHandle::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for SourceHandle {
    fn from(bytes: Vec<u8>) -> Self {
        SourceHandle::Bytes(Arc::from(bytes))
    }
}

/// Tags an extraction job with the record and source generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractionTicket {
    pub id: RecordId,
    pub generation: u32,
}

/// Derived measurements of one uploaded file.
#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub id: RecordId,
    /// Original file name, informational only.
    pub display_name: String,
    pub source: SourceHandle,
    /// 0 while pending.
    pub volume_cm3: f64,
    /// 0 while pending.
    pub height_mm: f64,
    /// `volume_cm3 × resin density` for the density last applied.
    pub mass_g: f64,
    /// Bumped every time the source is replaced.
    pub generation: u32,
    extracted: bool,
}

impl MeshRecord {
    /// True until an extraction result for the current source has been applied.
    pub fn is_pending(&self) -> bool {
        !self.extracted
    }

    /// The ticket an extraction of the current source must carry.
    pub fn ticket(&self) -> ExtractionTicket {
        ExtractionTicket {
            id: self.id,
            generation: self.generation,
        }
    }
}

/// What [`GeometryRegistry::apply_extraction`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Measurements stored.
    Applied,
    /// The record was removed before the result arrived.
    Discarded,
    /// The record's source was replaced after this job started.
    Stale,
}

/// Per-file record store. Keeps upload order.
#[derive(Debug, Default)]
pub struct GeometryRegistry {
    records: Vec<MeshRecord>,
    next_id: u64,
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a pending record and return its id immediately.
    pub fn add(&mut self, source: SourceHandle, display_name: impl Into<String>) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;

        let display_name = display_name.into();
        debug!(id = %id, name = %display_name, "Registered pending record");

        self.records.push(MeshRecord {
            id,
            display_name,
            source,
            volume_cm3: 0.0,
            height_mm: 0.0,
            mass_g: 0.0,
            generation: 0,
            extracted: false,
        });
        id
    }

    /// Store an extraction result, weighing it with `resin_density`.
    ///
    /// Results for removed records or replaced sources are dropped.
    pub fn apply_extraction(
        &mut self,
        ticket: ExtractionTicket,
        extraction: &Extraction,
        resin_density: f64,
    ) -> ApplyOutcome {
        let Some(record) = self.get_mut(ticket.id) else {
            debug!(id = %ticket.id, "Discarding extraction for removed record");
            return ApplyOutcome::Discarded;
        };

        if record.generation != ticket.generation {
            debug!(
                id = %ticket.id,
                expected = record.generation,
                got = ticket.generation,
                "Discarding extraction for replaced source"
            );
            return ApplyOutcome::Stale;
        }

        record.volume_cm3 = extraction.volume_cm3;
        record.height_mm = extraction.height_mm;
        record.mass_g = extraction.volume_cm3 * resin_density;
        record.extracted = true;
        ApplyOutcome::Applied
    }

    /// Swap in a new source, resetting the record to pending.
    ///
    /// Returns the ticket for the new extraction, or `None` if `id` is unknown.
    pub fn replace_source(&mut self, id: RecordId, source: SourceHandle) -> Option<ExtractionTicket> {
        let record = self.get_mut(id)?;
        record.source = source;
        record.generation = record.generation.wrapping_add(1);
        record.volume_cm3 = 0.0;
        record.height_mm = 0.0;
        record.mass_g = 0.0;
        record.extracted = false;
        Some(record.ticket())
    }

    /// Delete a record. No-op if absent.
    pub fn remove(&mut self, id: RecordId) -> Option<MeshRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        debug!(id = %id, "Removed record");
        Some(self.records.remove(index))
    }

    /// Re-weigh every record for a new density without re-extracting.
    pub fn recompute_mass_for_density_change(&mut self, new_density: f64) {
        for record in &mut self.records {
            record.mass_g = record.volume_cm3 * new_density;
        }
        debug!(
            records = self.records.len(),
            density = new_density,
            "Recomputed masses"
        );
    }

    pub fn get(&self, id: RecordId) -> Option<&MeshRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: RecordId) -> Option<&mut MeshRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Records in upload order.
    pub fn records(&self) -> &[MeshRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records still waiting for an extraction result.
    pub fn pending_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_pending()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn source(name: &str) -> SourceHandle {
        SourceHandle::Path(PathBuf::from(name))
    }

    fn extraction(volume_cm3: f64, height_mm: f64) -> Extraction {
        Extraction {
            volume_cm3,
            height_mm,
        }
    }

    #[test]
    fn test_add_creates_pending_record() {
        let mut registry = GeometryRegistry::new();
        let id = registry.add(source("a.stl"), "a.stl");

        let record = registry.get(id).unwrap();
        assert!(record.is_pending());
        assert_eq!(record.volume_cm3, 0.0);
        assert_eq!(record.height_mm, 0.0);
        assert_eq!(record.mass_g, 0.0);
        assert_eq!(registry.pending_count(), 1);
    }

    #[test]
    fn test_ids_are_unique_after_removal() {
        let mut registry = GeometryRegistry::new();
        let a = registry.add(source("a.stl"), "a");
        registry.remove(a);
        let b = registry.add(source("b.stl"), "b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_apply_extraction_sets_mass() {
        let mut registry = GeometryRegistry::new();
        let id = registry.add(source("a.stl"), "a");
        let ticket = registry.get(id).unwrap().ticket();

        let outcome = registry.apply_extraction(ticket, &extraction(10.0, 50.0), 1.15);
        assert_eq!(outcome, ApplyOutcome::Applied);

        let record = registry.get(id).unwrap();
        assert!(!record.is_pending());
        assert_relative_eq!(record.mass_g, 11.5, epsilon = 1e-12);
        assert_eq!(record.height_mm, 50.0);
    }

    #[test]
    fn test_applying_twice_is_harmless() {
        let mut registry = GeometryRegistry::new();
        let id = registry.add(source("a.stl"), "a");
        let ticket = registry.get(id).unwrap().ticket();

        registry.apply_extraction(ticket, &extraction(2.0, 5.0), 1.0);
        registry.apply_extraction(ticket, &extraction(2.0, 5.0), 1.0);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(id).unwrap().mass_g, 2.0);
    }

    #[test]
    fn test_result_for_removed_record_is_discarded() {
        let mut registry = GeometryRegistry::new();
        let keep = registry.add(source("keep.stl"), "keep");
        let gone = registry.add(source("gone.stl"), "gone");
        let ticket = registry.get(gone).unwrap().ticket();

        registry.remove(gone);
        let outcome = registry.apply_extraction(ticket, &extraction(3.0, 9.0), 1.15);

        assert_eq!(outcome, ApplyOutcome::Discarded);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(gone).is_none());
        assert!(registry.get(keep).unwrap().is_pending());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut registry = GeometryRegistry::new();
        registry.add(source("a.stl"), "a");
        assert!(registry.remove(RecordId(99)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_replaced_source_discards_old_result() {
        let mut registry = GeometryRegistry::new();
        let id = registry.add(source("v1.stl"), "part");
        let old_ticket = registry.get(id).unwrap().ticket();
        registry.apply_extraction(old_ticket, &extraction(1.0, 1.0), 1.0);

        let new_ticket = registry.replace_source(id, source("v2.stl")).unwrap();
        assert!(registry.get(id).unwrap().is_pending());
        assert_eq!(registry.get(id).unwrap().volume_cm3, 0.0);

        assert_eq!(
            registry.apply_extraction(old_ticket, &extraction(1.0, 1.0), 1.0),
            ApplyOutcome::Stale
        );
        assert!(registry.get(id).unwrap().is_pending());

        assert_eq!(
            registry.apply_extraction(new_ticket, &extraction(4.0, 2.0), 1.0),
            ApplyOutcome::Applied
        );
        assert_eq!(registry.get(id).unwrap().volume_cm3, 4.0);
    }

    #[test]
    fn test_density_change_reweighs_all_records() {
        let mut registry = GeometryRegistry::new();
        for (i, volume) in [10.0, 20.0].into_iter().enumerate() {
            let id = registry.add(source(&format!("{}.stl", i)), format!("{}", i));
            let ticket = registry.get(id).unwrap().ticket();
            registry.apply_extraction(ticket, &extraction(volume, 1.0), 1.15);
        }

        registry.recompute_mass_for_density_change(2.0);
        let masses: Vec<f64> = registry.records().iter().map(|r| r.mass_g).collect();
        assert_eq!(masses, vec![20.0, 40.0]);
    }

    #[test]
    fn test_records_keep_upload_order() {
        let mut registry = GeometryRegistry::new();
        let names = ["c", "a", "b"];
        for name in names {
            registry.add(source(name), name);
        }
        let listed: Vec<&str> = registry
            .records()
            .iter()
            .map(|r| r.display_name.as_str())
            .collect();
        assert_eq!(listed, names);
    }
}
