//! Decoded lattice data

use crate::layout::ArrayDimensions;
use crate::types::{DataType, Sample};
use crate::utils::format_bytes;
use ndarray::{Array3, Axis};
use num_traits::AsPrimitive;

/// A decoded lattice, shaped (z, y, x), in the element type the header declares
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    Float(Array3<f32>),
    Short(Array3<i16>),
    UShort(Array3<u16>),
    Byte(Array3<u8>),
}

macro_rules! impl_from_array {
    ($sample:ty, $variant:ident) => {
        impl From<Array3<$sample>> for VolumeData {
            fn from(array: Array3<$sample>) -> Self {
                VolumeData::$variant(array)
            }
        }
    };
}

impl_from_array!(f32, Float);
impl_from_array!(i16, Short);
impl_from_array!(u16, UShort);
impl_from_array!(u8, Byte);

impl VolumeData {
    /// Element type of the samples
    pub fn data_type(&self) -> DataType {
        match self {
            VolumeData::Float(_) => f32::DATA_TYPE,
            VolumeData::Short(_) => i16::DATA_TYPE,
            VolumeData::UShort(_) => u16::DATA_TYPE,
            VolumeData::Byte(_) => u8::DATA_TYPE,
        }
    }

    /// Shape in (z, y, x) order
    pub fn shape(&self) -> [usize; 3] {
        let dim = match self {
            VolumeData::Float(a) => a.dim(),
            VolumeData::Short(a) => a.dim(),
            VolumeData::UShort(a) => a.dim(),
            VolumeData::Byte(a) => a.dim(),
        };
        [dim.0, dim.1, dim.2]
    }

    /// Lattice dimensions matching the array shape
    pub fn dimensions(&self) -> ArrayDimensions {
        ArrayDimensions::from_shape(self.shape())
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reverse the array along z, the outermost axis
    pub fn flip_z(&mut self) {
        match self {
            VolumeData::Float(a) => a.invert_axis(Axis(0)),
            VolumeData::Short(a) => a.invert_axis(Axis(0)),
            VolumeData::UShort(a) => a.invert_axis(Axis(0)),
            VolumeData::Byte(a) => a.invert_axis(Axis(0)),
        }
    }

    /// Copy of the samples widened to `f64`
    pub fn to_f64(&self) -> Array3<f64> {
        match self {
            VolumeData::Float(a) => widen(a),
            VolumeData::Short(a) => widen(a),
            VolumeData::UShort(a) => widen(a),
            VolumeData::Byte(a) => widen(a),
        }
    }

    pub fn as_f32(&self) -> Option<&Array3<f32>> {
        match self {
            VolumeData::Float(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<&Array3<i16>> {
        match self {
            VolumeData::Short(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&Array3<u16>> {
        match self {
            VolumeData::UShort(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> Option<&Array3<u8>> {
        match self {
            VolumeData::Byte(a) => Some(a),
            _ => None,
        }
    }

    /// Get a summary string of the volume
    pub fn summary(&self) -> String {
        let [z, y, x] = self.shape();
        let bytes = self.len() * self.data_type().size_in_bytes().unwrap_or(0);
        format!(
            "{} x {} x {} (x, y, z) {} volume, {}",
            x,
            y,
            z,
            self.data_type(),
            format_bytes(bytes)
        )
    }
}

fn widen<T: Sample>(array: &Array3<T>) -> Array3<f64> {
    array.mapv(|v| v.as_())
}
