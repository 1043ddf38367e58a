//! Example: Load an AmiraMesh file and print what was found
//!
//! Run with: cargo run --example load_volume -- path/to/volume.am
//!
//! Without an argument a small synthetic label volume is written to a
//! temporary directory and loaded back.

use amiramesh::{
    load_amiramesh_with, write_amiramesh, BoundingBox, DataFormat, Encoding, LoadOptions,
    MetadataRecord, VolumeData,
};
use anyhow::Context;
use ndarray::Array3;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("AmiraMesh Loader Example");
    println!("========================\n");

    // Keep the temp dir alive until loading is done
    let mut _temp_dir = None;
    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            let dir = tempfile::TempDir::new()?;
            let path = dir.path().join("synthetic_labels.am");
            write_synthetic(&path)?;
            println!("No input given, wrote {}\n", path.display());
            _temp_dir = Some(dir);
            path
        }
    };

    let options = LoadOptions::default().with_typed_lattices(true);
    let (metadata, volume) = load_amiramesh_with(&path, &options)
        .with_context(|| format!("failed to load {}", path.display()))?;

    println!("Volume: {}", volume.summary());
    println!("Format: {} {}", metadata.data_format, metadata.data_format_version);
    if let Some(resolution) = &metadata.resolution {
        let [z, y, x] = resolution.zyx();
        let kind = if resolution.is_isotropic() { "isotropic" } else { "anisotropic" };
        println!("Resolution ({kind}): z={z:.4} y={y:.4} x={x:.4} {}", metadata.units);
    }
    println!();

    let values = volume.to_f64();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    println!("Value range: {min} .. {max}\n");

    println!("Metadata:");
    println!("{}", metadata.to_json()?);

    Ok(())
}

fn write_synthetic(path: &std::path::Path) -> anyhow::Result<()> {
    // Two nested boxes of labels inside a 32 x 24 x 16 volume
    let labels = Array3::from_shape_fn((16, 24, 32), |(z, y, x)| {
        let inner = (4..12).contains(&z) && (6..18).contains(&y) && (8..24).contains(&x);
        let core = (6..10).contains(&z) && (10..14).contains(&y) && (12..20).contains(&x);
        match (inner, core) {
            (_, true) => 2u8,
            (true, false) => 1,
            _ => 0,
        }
    });
    let volume = VolumeData::from(labels);

    let metadata = MetadataRecord::new("AmiraMesh", DataFormat::Binary, "2.1")
        .with_dimensions(volume.dimensions())
        .with_encoding(Encoding::Rle(String::new()))
        .with_coord_type("uniform")
        .with_coordinates("microns")
        .with_bounding_box(BoundingBox::from_values([0.0, 31.0, 0.0, 23.0, 0.0, 15.0]))?;

    write_amiramesh(path, &metadata, &volume, true)?;
    Ok(())
}
