//! AmiraMesh - reader and writer for Avizo `.am` volumes
//!
//! A pure Rust implementation of the AmiraMesh lattice format used by Avizo
//! and Amira for volumetric image data.
//!
//! # Features
//!
//! - Text header parsing into a typed [`MetadataRecord`], including derived
//!   voxel resolution and isotropy
//! - `BINARY-LITTLE-ENDIAN`, `BINARY` and `ASCII` data sections
//! - `float`, `short`, `ushort` and `byte` lattices as [`ndarray`] arrays
//! - `HxByteRLE` compressed label fields
//! - Writing volumes back out in the same format
//! - Async and concurrent loading on top of tokio
//!
//! # Pipeline
//!
//! A file flows through [`io`] (header/payload split), [`tokenizer`]
//! (header tokens), [`metadata`] (record extraction) and [`decoder`]
//! (typed array). [`access`] chains the stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use amiramesh::load_amiramesh;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (metadata, volume) = load_amiramesh("/data/sample.am")?;
//! println!("{:?} voxels, {}", metadata.array_dimensions, volume.summary());
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod compression;
pub mod decoder;
pub mod error;
pub mod io;
pub mod layout;
pub mod metadata;
pub mod tokenizer;
pub mod types;
pub mod utils;
pub mod volume;
pub mod writer;

// Re-exports
pub use access::{
    load_amiramesh, load_amiramesh_async, load_amiramesh_from_bytes, load_amiramesh_with,
    load_many, LoadOptions, LoadedVolume,
};
pub use compression::{decode_rle, encode_rle, CompressionMethod, Compressor};
pub use decoder::decode_payload;
pub use error::{AmiraError, Result};
pub use io::{read_sections, RawHeader, DATA_SECTION_SENTINEL};
pub use layout::{ArrayDimensions, BoundingBox, Resolution};
pub use metadata::{extract, extract_with, MetadataRecord};
pub use tokenizer::clean_header;
pub use types::{DataFormat, DataType, Encoding};
pub use volume::VolumeData;
pub use writer::{encode_amiramesh, write_amiramesh};

/// Version of the AmiraMesh implementation
pub const AMIRAMESH_VERSION: &str = env!("CARGO_PKG_VERSION");
