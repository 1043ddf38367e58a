//! Example: Load a directory of AmiraMesh files concurrently
//!
//! Run with: cargo run --example concurrent_loading
//!
//! Writes a handful of volumes in each supported data section format, then
//! loads them all at once with `load_many`.

use amiramesh::{
    load_amiramesh_with, load_many, write_amiramesh, BoundingBox, DataFormat, LoadOptions,
    MetadataRecord, VolumeData,
};
use ndarray::Array3;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("AmiraMesh Concurrent Loading Demo");
    println!("=================================\n");

    let temp_dir = tempfile::TempDir::new()?;
    let formats = [
        DataFormat::BinaryLittleEndian,
        DataFormat::Ascii,
        DataFormat::BinaryLittleEndian,
        DataFormat::Ascii,
    ];

    let mut paths = Vec::new();
    for (i, format) in formats.into_iter().enumerate() {
        let volume = VolumeData::from(Array3::from_shape_fn((24, 48, 48), |(z, y, x)| {
            ((z * y + x + i) % 1000) as f32 * 0.01
        }));
        let metadata = MetadataRecord::new("AmiraMesh", format, "2.1")
            .with_dimensions(volume.dimensions())
            .with_bounding_box(BoundingBox::from_values([0.0, 4.7, 0.0, 4.7, 0.0, 4.6]))?;

        let path = temp_dir.path().join(format!("volume_{i}.am"));
        write_amiramesh(&path, &metadata, &volume, true)?;
        paths.push(path);
    }
    println!("Wrote {} volumes to {}\n", paths.len(), temp_dir.path().display());

    // Float lattices are only decoded with typed lattices enabled
    let options = LoadOptions::default().with_typed_lattices(true);

    // Sequential baseline
    let start = Instant::now();
    for path in &paths {
        load_amiramesh_with(path, &options)?;
    }
    println!("Sequential: {:?}", start.elapsed());

    // Concurrent: reads on tokio, decoding on the blocking pool
    let start = Instant::now();
    let loaded = load_many(&paths, options).await?;
    println!("Concurrent: {:?}\n", start.elapsed());

    for (path, (metadata, volume)) in paths.iter().zip(&loaded) {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!(
            "  {name}: {} ({}), {:?}",
            volume.summary(),
            metadata.data_format,
            metadata.resolution
        );
    }

    Ok(())
}
