//! Error types for AmiraMesh operations

use thiserror::Error;

/// Main error type for AmiraMesh decoding and encoding
#[derive(Error, Debug)]
pub enum AmiraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The `# Data section follows` sentinel was never found.
    #[error("Malformed AmiraMesh file: {0}")]
    MalformedFile(String),

    /// A zero control byte was found in an RLE stream.
    #[error("Corrupt RLE stream: zero control byte at offset {offset}")]
    CorruptStream { offset: usize },

    /// The RLE input ran out before the expected output size was produced.
    #[error("Truncated RLE stream: produced {produced} of {expected} bytes")]
    TruncatedStream { produced: usize, expected: usize },

    /// A header directive needs a field that has not been declared yet.
    #[error("Missing dependency: {directive} requires {requires}")]
    MissingDependency {
        directive: &'static str,
        requires: &'static str,
    },

    /// A header directive is present but its positional values are unusable.
    #[error("Malformed header directive {keyword}: {reason}")]
    MalformedHeader { keyword: &'static str, reason: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Unsupported lattice declaration: {0}")]
    UnsupportedLatticeFormat(String),

    #[error("Unsupported data type {data_type} for format {data_format}")]
    UnsupportedType {
        data_type: String,
        data_format: String,
    },

    #[error("Unsupported data format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported encoding {encoding} for format {data_format}")]
    UnsupportedEncoding {
        encoding: String,
        data_format: String,
    },

    #[error("Size mismatch for {context}: expected {expected} bytes, found {found}")]
    SizeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Shape mismatch: expected {expected} elements for {shape:?}, found {found}")]
    ShapeMismatch {
        shape: [usize; 3],
        expected: usize,
        found: usize,
    },

    #[error("Invalid {data_type} value: {token:?}")]
    InvalidValue { token: String, data_type: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Specialized Result type for AmiraMesh operations
pub type Result<T> = std::result::Result<T, AmiraError>;

impl From<serde_json::Error> for AmiraError {
    fn from(err: serde_json::Error) -> Self {
        AmiraError::Serialization(err.to_string())
    }
}
