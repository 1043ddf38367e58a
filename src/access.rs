//! Loading AmiraMesh volumes - main API

use crate::decoder::decode_payload;
use crate::error::{AmiraError, Result};
use crate::io::{read_sections, read_sections_async, read_sections_from, RawHeader};
use crate::metadata::{extract_with, MetadataRecord};
use crate::tokenizer::clean_header;
use crate::volume::VolumeData;
use bytes::Bytes;
use futures::future::try_join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Metadata and lattice of one loaded file
pub type LoadedVolume = (MetadataRecord, VolumeData);

/// Options controlling how a payload is turned into an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Reverse the z axis after decoding, matching Avizo's slice order
    pub flip_z: bool,

    /// Accept `Lattice { <float|short|ushort> Data } @1` as a raw lattice.
    /// Off by default, where only `byte` data lattices are raw.
    pub typed_lattices: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the z axis is reversed
    pub fn with_flip_z(mut self, flip_z: bool) -> Self {
        self.flip_z = flip_z;
        self
    }

    /// Set whether non-byte `Data` lattices are decoded
    pub fn with_typed_lattices(mut self, typed_lattices: bool) -> Self {
        self.typed_lattices = typed_lattices;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            flip_z: true,
            typed_lattices: false,
        }
    }
}

/// Load an AmiraMesh file with default options.
///
/// Runs header reading, tokenizing, metadata extraction and payload decoding
/// in order; the first failing stage's error is returned unchanged.
pub fn load_amiramesh(path: impl AsRef<Path>) -> Result<LoadedVolume> {
    load_amiramesh_with(path, &LoadOptions::default())
}

/// Load an AmiraMesh file
pub fn load_amiramesh_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<LoadedVolume> {
    let path = path.as_ref();
    info!("Loading AmiraMesh file {}", path.display());
    let (header, payload) = read_sections(path)?;
    decode_sections(&header, &payload, options)
}

/// Load an AmiraMesh file already held in memory
pub fn load_amiramesh_from_bytes(data: &[u8], options: &LoadOptions) -> Result<LoadedVolume> {
    let (header, payload) = read_sections_from(Cursor::new(data))?;
    decode_sections(&header, &payload, options)
}

/// Load an AmiraMesh file without blocking the async runtime.
///
/// The file is read with `tokio::fs`; decoding runs on the blocking pool.
pub async fn load_amiramesh_async(path: impl AsRef<Path>, options: LoadOptions) -> Result<LoadedVolume> {
    let path = path.as_ref();
    info!("Loading AmiraMesh file {}", path.display());
    let (header, payload) = read_sections_async(path).await?;

    tokio::task::spawn_blocking(move || decode_sections(&header, &payload, &options))
        .await
        .map_err(|e| AmiraError::Task(e.to_string()))?
}

/// Load several files concurrently.
///
/// Each load owns its data, so no coordination is needed beyond joining the
/// results. Fails with the first error encountered.
pub async fn load_many<P: AsRef<Path>>(paths: &[P], options: LoadOptions) -> Result<Vec<LoadedVolume>> {
    let futures: Vec<_> = paths
        .iter()
        .map(|path| {
            let path: PathBuf = path.as_ref().to_path_buf();
            async move { load_amiramesh_async(path, options).await }
        })
        .collect();

    try_join_all(futures).await
}

fn decode_sections(header: &RawHeader, payload: &Bytes, options: &LoadOptions) -> Result<LoadedVolume> {
    let tokens = clean_header(header.lines());
    let metadata = extract_with(&tokens, options)?;
    let volume = decode_payload(payload, &metadata, options.flip_z)?;
    debug!("Loaded {}", volume.summary());
    Ok((metadata, volume))
}
