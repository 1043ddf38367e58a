//! Compression and decompression for AmiraMesh lattices
//!
//! Avizo stores label fields with `HxByteRLE`, a byte-oriented run-length
//! scheme made of packets:
//! - control byte `1..=127`: repeat the next byte `control` times
//! - control byte `128..=255`: copy the next `control & 0x7f` bytes verbatim
//! - control byte `0` never appears in a valid stream

use crate::error::{AmiraError, Result};
use crate::types::Encoding;
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Longest run a single packet can describe
const MAX_RUN: usize = 0x7f;

/// Shortest repeat worth emitting as a repeat packet
const MIN_REPEAT: usize = 3;

static RLE_DESCRIPTOR: OnceLock<Regex> = OnceLock::new();

fn rle_descriptor_regex() -> &'static Regex {
    RLE_DESCRIPTOR
        .get_or_init(|| Regex::new(r"^@1\(HxByteRLE,?(\d+)\)").expect("Invalid HxByteRLE regex"))
}

/// Compression methods found in AmiraMesh lattices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionMethod {
    /// No compression
    None,
    /// Avizo byte run-length encoding
    HxByteRle,
}

impl CompressionMethod {
    /// Get the method for a declared lattice encoding
    pub fn from_encoding(encoding: &Encoding) -> Self {
        match encoding {
            Encoding::Raw => CompressionMethod::None,
            Encoding::Rle(_) => CompressionMethod::HxByteRle,
        }
    }
}

/// Trait for compression/decompression operations
pub trait Compressor: Send + Sync {
    /// Compress data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress data into exactly `expected_size` bytes where the method allows it
    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>>;

    /// Get the compression method
    fn method(&self) -> CompressionMethod;
}

/// No compression
#[derive(Debug, Default)]
pub struct NoneCompressor;

impl Compressor for NoneCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8], _expected_size: usize) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::None
    }
}

/// `HxByteRLE` run-length compressor
#[derive(Debug, Default)]
pub struct HxByteRleCompressor;

impl Compressor for HxByteRleCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(encode_rle(data))
    }

    fn decompress(&self, data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
        decode_rle(data, expected_size)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::HxByteRle
    }
}

/// Get a compressor for a given method
pub fn get_compressor(method: CompressionMethod) -> Box<dyn Compressor> {
    match method {
        CompressionMethod::None => Box::new(NoneCompressor),
        CompressionMethod::HxByteRle => Box::new(HxByteRleCompressor),
    }
}

/// Decode an `HxByteRLE` stream into exactly `uncompressed_size` bytes.
///
/// Input left over once the output is full is ignored.
///
/// # Errors
/// `CorruptStream` on a zero control byte or on a packet that would run past
/// `uncompressed_size`, `TruncatedStream` when the input ends before enough
/// output has been produced.
pub fn decode_rle(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    // No packet expands to more than MAX_RUN bytes
    let reachable = data.len().saturating_mul(MAX_RUN);
    let mut output = Vec::with_capacity(uncompressed_size.min(reachable));
    let mut pos = 0usize;

    let truncated = |produced: usize| AmiraError::TruncatedStream {
        produced,
        expected: uncompressed_size,
    };

    while output.len() < uncompressed_size {
        let control = *data.get(pos).ok_or_else(|| truncated(output.len()))?;
        let run = (control & 0x7f) as usize;
        if control == 0 || output.len() + run > uncompressed_size {
            return Err(AmiraError::CorruptStream { offset: pos });
        }
        pos += 1;

        if control & 0x80 != 0 {
            let literal = data
                .get(pos..pos + run)
                .ok_or_else(|| truncated(output.len()))?;
            output.extend_from_slice(literal);
            pos += run;
        } else {
            let value = *data.get(pos).ok_or_else(|| truncated(output.len()))?;
            output.extend(std::iter::repeat(value).take(run));
            pos += 1;
        }
    }

    trace!(
        "Decoded HxByteRLE: {} bytes -> {} bytes ({} input bytes unused)",
        pos,
        output.len(),
        data.len().saturating_sub(pos)
    );

    Ok(output)
}

/// Encode bytes as an `HxByteRLE` stream that `decode_rle` reverses.
pub fn encode_rle(data: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let mut count = 1usize;

        // Count consecutive identical bytes
        while i + count < data.len() && data[i + count] == byte && count < MAX_RUN {
            count += 1;
        }

        if count >= MIN_REPEAT {
            push_literals(&mut compressed, &data[literal_start..i]);
            compressed.push(count as u8);
            compressed.push(byte);
            literal_start = i + count;
        }
        i += count;
    }
    push_literals(&mut compressed, &data[literal_start..]);

    trace!(
        "Encoded HxByteRLE: {} bytes -> {} bytes",
        data.len(),
        compressed.len()
    );
    compressed
}

fn push_literals(compressed: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_RUN) {
        compressed.push(0x80 | chunk.len() as u8);
        compressed.extend_from_slice(chunk);
    }
}

/// Compressed byte count embedded in an RLE descriptor such as
/// `@1(HxByteRLE,1803306)` or `@1(HxByteRLE1803306)`.
pub fn rle_byte_count(descriptor: &str) -> Result<usize> {
    rle_descriptor_regex()
        .captures(descriptor)
        .and_then(|caps| caps.get(1))
        .and_then(|count| count.as_str().parse().ok())
        .ok_or_else(|| {
            AmiraError::UnsupportedLatticeFormat(format!("unrecognized RLE descriptor {descriptor}"))
        })
}

/// RLE descriptor for a compressed payload of `byte_count` bytes
pub fn rle_descriptor(byte_count: usize) -> String {
    format!("@1(HxByteRLE,{byte_count})")
}
