//! Lattice geometry - dimensions, bounding box and voxel resolution

use crate::error::{AmiraError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Spacing ratios inside this band count as the same spacing
const ISOTROPY_BAND: RangeInclusive<f64> = 0.99..=1.01;

/// Lattice extents from the `define` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayDimensions {
    #[serde(rename = "x_dimension")]
    pub x: usize,
    #[serde(rename = "y_dimension")]
    pub y: usize,
    #[serde(rename = "z_dimension")]
    pub z: usize,
}

impl ArrayDimensions {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Array shape in on-disk order (z, y, x)
    pub fn shape(&self) -> [usize; 3] {
        [self.z, self.y, self.x]
    }

    /// Build from an array shape in (z, y, x) order
    pub fn from_shape(shape: [usize; 3]) -> Self {
        Self {
            x: shape[2],
            y: shape[1],
            z: shape[0],
        }
    }

    /// Total number of voxels.
    ///
    /// Fails with `MalformedHeader` when the product does not fit in `usize`.
    pub fn num_elements(&self) -> Result<usize> {
        self.x
            .checked_mul(self.y)
            .and_then(|xy| xy.checked_mul(self.z))
            .ok_or_else(|| self.overflow("voxel count"))
    }

    /// Payload size in bytes for samples of `sample_size` bytes
    pub fn num_bytes(&self, sample_size: usize) -> Result<usize> {
        self.num_elements()?
            .checked_mul(sample_size)
            .ok_or_else(|| self.overflow("payload size"))
    }

    fn overflow(&self, what: &str) -> AmiraError {
        AmiraError::MalformedHeader {
            keyword: "define",
            reason: format!("{what} of {} x {} x {} overflows", self.x, self.y, self.z),
        }
    }

    /// Extents in axis order (x, y, z)
    pub fn as_xyz(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

/// Physical extent of the lattice from the `BoundingBox` directive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl BoundingBox {
    /// Build from the six header values `xmin xmax ymin ymax zmin zmax`
    pub fn from_values(values: [f64; 6]) -> Self {
        Self {
            x_min: values[0],
            x_max: values[1],
            y_min: values[2],
            y_max: values[3],
            z_min: values[4],
            z_max: values[5],
        }
    }

    /// Values in header order
    pub fn values(&self) -> [f64; 6] {
        [
            self.x_min, self.x_max, self.y_min, self.y_max, self.z_min, self.z_max,
        ]
    }

    /// Voxel spacing per axis in (x, y, z) order
    pub fn spacing(&self, dims: &ArrayDimensions) -> [f64; 3] {
        [
            axis_spacing(self.x_min, self.x_max, dims.x),
            axis_spacing(self.y_min, self.y_max, dims.y),
            axis_spacing(self.z_min, self.z_max, dims.z),
        ]
    }
}

/// Step between samples along one axis; zero for single-sample axes
pub fn axis_spacing(min: f64, max: f64, num_samples: usize) -> f64 {
    if num_samples > 1 {
        (max - min) / (num_samples - 1) as f64
    } else {
        0.0
    }
}

/// Voxel resolution derived from the bounding box and dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "zyx_value", rename_all = "lowercase")]
pub enum Resolution {
    /// Same spacing on every axis
    Isotropic(f64),
    /// Per-axis spacing in (z, y, x) order
    Anisotropic([f64; 3]),
}

impl Resolution {
    /// Classify the spacing implied by `bbox` over `dims`.
    ///
    /// The y and z spacings are compared to the x spacing; both ratios must
    /// fall in `[0.99, 1.01]` for the lattice to be isotropic.
    pub fn derive(dims: &ArrayDimensions, bbox: &BoundingBox) -> Self {
        let [x, y, z] = bbox.spacing(dims);
        if ISOTROPY_BAND.contains(&(y / x)) && ISOTROPY_BAND.contains(&(z / x)) {
            Resolution::Isotropic(x)
        } else {
            Resolution::Anisotropic([z, y, x])
        }
    }

    pub fn is_isotropic(&self) -> bool {
        matches!(self, Resolution::Isotropic(_))
    }

    /// Spacing in (z, y, x) order
    pub fn zyx(&self) -> [f64; 3] {
        match *self {
            Resolution::Isotropic(value) => [value; 3],
            Resolution::Anisotropic(zyx) => zyx,
        }
    }
}
