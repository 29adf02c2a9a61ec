//! resin-quote inspect command - measure one file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use resin_quote::{Mesh, VerticalAxis};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct MeshInfo {
    path: String,
    triangles: usize,
    vertices: usize,
    axis: &'static str,
    volume_cm3: f64,
    height_mm: f64,
    surface_area_mm2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions_mm: Option<[f64; 3]>,
}

pub fn run(input: &Path, axis: VerticalAxis, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let extraction = mesh.extract(axis);
    let info = MeshInfo {
        path: input.display().to_string(),
        triangles: mesh.face_count(),
        vertices: mesh.vertex_count(),
        axis: axis.as_str(),
        volume_cm3: extraction.volume_cm3,
        height_mm: extraction.height_mm,
        surface_area_mm2: mesh.surface_area(),
        dimensions_mm: mesh.bounds().map(|(min, max)| {
            let d = max - min;
            [d.x, d.y, d.z]
        }),
    };

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Mesh Information".bold().underline());
                println!("  {}: {}", "File".cyan(), info.path);
                println!("  {}: {}", "Triangles".cyan(), info.triangles);
                println!("  {}: {:.2} cm³", "Volume".cyan(), info.volume_cm3);
                println!(
                    "  {}: {:.2} mm ({})",
                    "Height".cyan(),
                    info.height_mm,
                    info.axis
                );
                if let Some(d) = info.dimensions_mm {
                    println!(
                        "  {}: {:.2} x {:.2} x {:.2} mm",
                        "Dimensions".cyan(),
                        d[0],
                        d[1],
                        d[2]
                    );
                }
                println!(
                    "  {}: {:.2} mm²",
                    "Surface area".cyan(),
                    info.surface_area_mm2
                );
            }
        }
    }

    Ok(())
}
