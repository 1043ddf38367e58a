//! Core data types for AmiraMesh headers and payloads

use byteorder::ByteOrder;
use num_traits::AsPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload layout declared on the first header line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataFormat {
    /// IEEE binary, little-endian
    BinaryLittleEndian,
    /// IEEE binary, big-endian
    Binary,
    /// Whitespace separated text values
    Ascii,
    /// Any other declaration; rejected at decode time
    Other(String),
}

impl DataFormat {
    /// Parse a format token from the header
    pub fn parse(token: &str) -> Self {
        match token {
            "BINARY-LITTLE-ENDIAN" => DataFormat::BinaryLittleEndian,
            "BINARY" => DataFormat::Binary,
            "ASCII" => DataFormat::Ascii,
            other => DataFormat::Other(other.to_string()),
        }
    }

    /// Header token for this format
    pub fn as_str(&self) -> &str {
        match self {
            DataFormat::BinaryLittleEndian => "BINARY-LITTLE-ENDIAN",
            DataFormat::Binary => "BINARY",
            DataFormat::Ascii => "ASCII",
            DataFormat::Other(name) => name,
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DataFormat {
    fn from(value: String) -> Self {
        DataFormat::parse(&value)
    }
}

impl From<DataFormat> for String {
    fn from(value: DataFormat) -> Self {
        value.as_str().to_string()
    }
}

/// Element type of the lattice samples
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    /// 32-bit floating point
    Float,
    /// Signed 16-bit integer
    Short,
    /// Unsigned 16-bit integer
    UShort,
    /// Unsigned 8-bit integer
    Byte,
    /// Declared but not decodable
    Other(String),
}

impl DataType {
    /// Parse a data type token from the header
    pub fn parse(token: &str) -> Self {
        match token {
            "float" => DataType::Float,
            "short" => DataType::Short,
            "ushort" => DataType::UShort,
            "byte" => DataType::Byte,
            other => DataType::Other(other.to_string()),
        }
    }

    /// Header token for this type
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Float => "float",
            DataType::Short => "short",
            DataType::UShort => "ushort",
            DataType::Byte => "byte",
            DataType::Other(name) => name,
        }
    }

    /// Size in bytes of one sample, `None` for unknown types
    pub fn size_in_bytes(&self) -> Option<usize> {
        match self {
            DataType::Float => Some(4),
            DataType::Short | DataType::UShort => Some(2),
            DataType::Byte => Some(1),
            DataType::Other(_) => None,
        }
    }

    /// Check if this is one of the decodable scalar types
    pub fn is_supported(&self) -> bool {
        !matches!(self, DataType::Other(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

/// Lattice encoding declared by the `Lattice` directive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Encoding {
    /// Uncompressed samples
    Raw,
    /// `HxByteRLE` descriptor, e.g. `@1(HxByteRLE1803306)`
    Rle(String),
}

impl Encoding {
    pub fn as_str(&self) -> &str {
        match self {
            Encoding::Raw => "raw",
            Encoding::Rle(descriptor) => descriptor,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Encoding::Raw)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Encoding {
    fn from(value: String) -> Self {
        if value == "raw" {
            Encoding::Raw
        } else {
            Encoding::Rle(value)
        }
    }
}

impl From<Encoding> for String {
    fn from(value: Encoding) -> Self {
        value.as_str().to_string()
    }
}

/// A scalar that can live in a decoded lattice.
///
/// Implemented for the four element types AmiraMesh volumes declare. Binary
/// payloads go through `read`/`write` with an explicit byte order, ASCII
/// payloads through `FromStr`/`Display`.
pub trait Sample:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + FromStr + AsPrimitive<f64> + Send + Sync
{
    /// Header type this sample corresponds to
    const DATA_TYPE: DataType;

    /// Encoded width in bytes
    const SIZE: usize;

    /// Read one sample from the front of `buf`
    fn read<B: ByteOrder>(buf: &[u8]) -> Self;

    /// Append the encoded sample to `out`
    fn write<B: ByteOrder>(self, out: &mut Vec<u8>);
}

impl Sample for f32 {
    const DATA_TYPE: DataType = DataType::Float;
    const SIZE: usize = 4;

    fn read<B: ByteOrder>(buf: &[u8]) -> Self {
        B::read_f32(buf)
    }

    fn write<B: ByteOrder>(self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        B::write_f32(&mut buf, self);
        out.extend_from_slice(&buf);
    }
}

impl Sample for i16 {
    const DATA_TYPE: DataType = DataType::Short;
    const SIZE: usize = 2;

    fn read<B: ByteOrder>(buf: &[u8]) -> Self {
        B::read_i16(buf)
    }

    fn write<B: ByteOrder>(self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 2];
        B::write_i16(&mut buf, self);
        out.extend_from_slice(&buf);
    }
}

impl Sample for u16 {
    const DATA_TYPE: DataType = DataType::UShort;
    const SIZE: usize = 2;

    fn read<B: ByteOrder>(buf: &[u8]) -> Self {
        B::read_u16(buf)
    }

    fn write<B: ByteOrder>(self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 2];
        B::write_u16(&mut buf, self);
        out.extend_from_slice(&buf);
    }
}

impl Sample for u8 {
    const DATA_TYPE: DataType = DataType::Byte;
    const SIZE: usize = 1;

    fn read<B: ByteOrder>(buf: &[u8]) -> Self {
        buf[0]
    }

    fn write<B: ByteOrder>(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}
