//! End-to-end tests: STL files on disk through the session to a document.

use approx::assert_relative_eq;
use resin_quote::{
    DegenerateParameter, DocumentOptions, MoneyFormat, Mesh, Parameter, ParameterConfiguration,
    PrintTimeSource, QuoteSession, SourceHandle, Vertex, VerticalAxis, compute_quote,
    extract_geometry, save_stl,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Test Mesh Helpers
// =============================================================================

fn create_cuboid(a: f64, b: f64, c: f64) -> Mesh {
    let mut mesh = Mesh::new();

    mesh.vertices = vec![
        Vertex::from_coords(0.0, 0.0, 0.0),
        Vertex::from_coords(a, 0.0, 0.0),
        Vertex::from_coords(a, b, 0.0),
        Vertex::from_coords(0.0, b, 0.0),
        Vertex::from_coords(0.0, 0.0, c),
        Vertex::from_coords(a, 0.0, c),
        Vertex::from_coords(a, b, c),
        Vertex::from_coords(0.0, b, c),
    ];

    mesh.faces = vec![
        [0, 2, 1],
        [0, 3, 2], // bottom
        [4, 5, 6],
        [4, 6, 7], // top
        [0, 1, 5],
        [0, 5, 4], // front
        [3, 7, 6],
        [3, 6, 2], // back
        [0, 4, 7],
        [0, 7, 3], // left
        [1, 2, 6],
        [1, 6, 5], // right
    ];

    mesh
}

fn write_cuboid(dir: &Path, name: &str, a: f64, b: f64, c: f64) -> PathBuf {
    let path = dir.join(name);
    create_cuboid(a, b, c).save(&path).unwrap();
    path
}

fn session_with(paths: &[PathBuf]) -> QuoteSession {
    let mut session = QuoteSession::new(ParameterConfiguration::default());
    for path in paths {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        session.upload(SourceHandle::from(path.clone()), name);
    }
    session.wait_idle();
    session
}

// =============================================================================
// Extraction
// =============================================================================

#[test]
fn test_extraction_of_closed_cuboid() {
    let mesh = create_cuboid(20.0, 30.0, 50.0);
    let extraction = extract_geometry(&mesh, VerticalAxis::Z);
    assert_relative_eq!(extraction.volume_cm3, 30.0, epsilon = 1e-9);
    assert_relative_eq!(extraction.height_mm, 50.0, epsilon = 1e-12);
}

#[test]
fn test_empty_file_measures_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.stl");
    save_stl(&Mesh::new(), &path).unwrap();

    let session = session_with(&[path]);
    let record = &session.records()[0];
    assert!(!record.is_pending());
    assert_eq!(record.volume_cm3, 0.0);
    assert_eq!(record.height_mm, 0.0);
    assert!(session.failures().is_empty());
}

#[test]
fn test_missing_file_is_reported_and_stays_pending() {
    let dir = TempDir::new().unwrap();
    let good = write_cuboid(dir.path(), "good.stl", 10.0, 10.0, 10.0);
    let missing = dir.path().join("missing.stl");

    let session = session_with(&[good, missing]);
    assert_eq!(session.records().len(), 2);
    assert!(!session.records()[0].is_pending());
    assert!(session.records()[1].is_pending());
    assert_eq!(session.failures().len(), 1);
    assert!(session.failures()[0].origin.ends_with("missing.stl"));
}

// =============================================================================
// Quoting
// =============================================================================

#[test]
fn test_reference_scenario() {
    let dir = TempDir::new().unwrap();
    // 20 x 10 x 50 mm: 10 cm³, 50 mm tall
    let path = write_cuboid(dir.path(), "part.stl", 20.0, 10.0, 50.0);
    let session = session_with(&[path]);

    let quote = session.quote();
    assert_relative_eq!(quote.total_weight_g, 11.5, epsilon = 1e-6);
    assert_relative_eq!(quote.resin_cost, 1.84, epsilon = 1e-6);
    assert_relative_eq!(quote.print_time_hours, 50.0 / 60.0 + 0.5, epsilon = 1e-9);
    assert_relative_eq!(quote.energy_cost, 0.16320, epsilon = 1e-6);
    assert_relative_eq!(quote.depreciation_cost, 3.0, epsilon = 1e-6);
    assert_relative_eq!(quote.subtotal, 25.0032, epsilon = 1e-6);
    assert_relative_eq!(quote.profit, 7.50096, epsilon = 1e-6);
    assert_relative_eq!(quote.total, 32.50416, epsilon = 1e-5);
    assert_eq!(quote.print_time_source, PrintTimeSource::Calculated);
}

#[test]
fn test_tallest_part_drives_print_time() {
    let dir = TempDir::new().unwrap();
    let short = write_cuboid(dir.path(), "short.stl", 10.0, 10.0, 12.0);
    let tall = write_cuboid(dir.path(), "tall.stl", 10.0, 10.0, 120.0);
    let session = session_with(&[short, tall]);

    let quote = session.quote();
    assert_relative_eq!(quote.max_height_mm, 120.0, epsilon = 1e-6);
    assert_relative_eq!(quote.print_time_hours, 2.5, epsilon = 1e-9);
}

#[test]
fn test_manual_time_overrides_height() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "part.stl", 10.0, 10.0, 120.0);
    let mut session = session_with(&[path]);

    session.set_parameter(Parameter::ManualPrintTimeHours, 7.25);
    let quote = session.quote();
    assert_eq!(quote.print_time_hours, 7.25);
    assert_eq!(quote.print_time_source, PrintTimeSource::Manual);
}

#[test]
fn test_zero_speed_is_reported_not_hidden() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "part.stl", 10.0, 10.0, 10.0);
    let mut session = session_with(&[path]);

    session.set_parameter(Parameter::PrintSpeedMmPerHour, 0.0);
    let quote = session.quote();
    assert!(!quote.is_valid());
    assert!(quote.total.is_infinite());
    assert!(quote.issues.contains(&DegenerateParameter::PrintSpeed));
    // Resin cost does not depend on print time.
    assert!(quote.resin_cost.is_finite());
}

#[test]
fn test_no_files_quotes_zero() {
    let quote = compute_quote(&[], &ParameterConfiguration::default());
    assert_eq!(quote.total, 0.0);
    assert_eq!(quote.post_processing_cost, 0.0);
    assert_eq!(quote.print_time_source, PrintTimeSource::None);
}

// =============================================================================
// Registry lifecycle
// =============================================================================

#[test]
fn test_removing_every_file_returns_to_zero() {
    let dir = TempDir::new().unwrap();
    let a = write_cuboid(dir.path(), "a.stl", 10.0, 10.0, 10.0);
    let b = write_cuboid(dir.path(), "b.stl", 10.0, 10.0, 10.0);
    let mut session = session_with(&[a, b]);
    assert!(session.quote().total > 0.0);

    let ids: Vec<_> = session.records().iter().map(|r| r.id).collect();
    for id in ids {
        assert!(session.remove(id).is_some());
    }
    assert_eq!(session.quote().total, 0.0);
}

#[test]
fn test_remove_while_extracting_discards_late_result() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "slow.stl", 10.0, 10.0, 10.0);

    let mut session = QuoteSession::new(ParameterConfiguration::default());
    let id = session.upload(SourceHandle::from(path), "slow.stl");
    session.remove(id);
    session.wait_idle();

    assert!(session.records().is_empty());
    assert_eq!(session.quote().total, 0.0);
}

#[test]
fn test_density_change_keeps_volume() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "part.stl", 10.0, 10.0, 10.0);
    let mut session = session_with(&[path]);

    session.set_parameter(Parameter::ResinDensity, 1.0);
    let record = &session.records()[0];
    assert_relative_eq!(record.volume_cm3, 1.0, epsilon = 1e-6);
    assert_relative_eq!(record.mass_g, 1.0, epsilon = 1e-6);
}

#[test]
fn test_bytes_and_path_sources_agree() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "part.stl", 15.0, 25.0, 35.0);
    let bytes = std::fs::read(&path).unwrap();

    let mut session = QuoteSession::new(ParameterConfiguration::default());
    session.upload(SourceHandle::from(path), "from-disk.stl");
    session.upload(SourceHandle::from(bytes), "from-memory.stl");
    session.wait_idle();

    let records = session.records();
    assert_eq!(records[0].volume_cm3, records[1].volume_cm3);
    assert_eq!(records[0].height_mm, records[1].height_mm);
}

// =============================================================================
// Documents
// =============================================================================

#[test]
fn test_document_written_as_text_and_json() {
    let dir = TempDir::new().unwrap();
    let path = write_cuboid(dir.path(), "part.stl", 20.0, 10.0, 50.0);
    let session = session_with(&[path]);

    let options = DocumentOptions {
        project_name: "Miniatures".into(),
        ..Default::default()
    };
    let doc = session.document(&options, None);

    let text_path = dir.path().join("quote.txt");
    doc.write_to(&text_path, &MoneyFormat::default()).unwrap();
    let text = std::fs::read_to_string(&text_path).unwrap();
    assert!(text.contains("Project: Miniatures"));
    assert!(text.contains("R$ 32,50"));

    let json_path = dir.path().join("quote.json");
    doc.write_to(&json_path, &MoneyFormat::default()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["project_name"], "Miniatures");
    assert_eq!(value["items"][0]["name"], "part.stl");
}

#[test]
fn test_config_file_drives_session() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("quote.toml");
    std::fs::write(&config_path, "post_processing_cost = 0.0\nprofit_margin_percent = 0.0\n")
        .unwrap();
    let config = ParameterConfiguration::from_file(&config_path).unwrap();

    let mut session = QuoteSession::new(config);
    let path = write_cuboid(dir.path(), "part.stl", 20.0, 10.0, 50.0);
    session.upload(SourceHandle::from(path), "part.stl");
    session.wait_idle();

    let quote = session.quote();
    assert_eq!(quote.profit, 0.0);
    assert_relative_eq!(quote.total, 1.84 + 0.1632 + 3.0, epsilon = 1e-6);
}
