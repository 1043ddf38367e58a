//! AmiraMesh metadata record and header extraction
//!
//! Header values are addressed by position relative to a keyword token, so
//! each recognized directive is an entry in [`DIRECTIVES`] naming its keyword
//! and the handler that pulls values from fixed offsets.

use crate::access::LoadOptions;
use crate::error::{AmiraError, Result};
use crate::layout::{ArrayDimensions, BoundingBox, Resolution};
use crate::types::{DataFormat, DataType, Encoding};
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Units reported when the header does not name any
pub const DEFAULT_UNITS: &str = "pixels";

/// Everything the header declares about a lattice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Writer of the file, e.g. `AmiraMesh` or `Avizo`
    #[serde(rename = "software_src")]
    pub software_source: String,

    /// `3D` when the format declaration carries it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_prefix: Option<String>,

    pub data_format: DataFormat,

    pub data_format_version: String,

    /// From `define Lattice X Y Z`
    pub array_dimensions: Option<ArrayDimensions>,

    /// From `Content "... <type>, ..."`
    pub data_type: Option<DataType>,

    pub coord_type: Option<String>,

    pub coordinates: Option<String>,

    pub bounding_box: Option<BoundingBox>,

    /// Derived when the bounding box is read
    pub resolution: Option<Resolution>,

    pub units: String,

    /// From the `Lattice { ... }` declaration
    pub encoding: Option<Encoding>,
}

impl MetadataRecord {
    /// Create a record with only the format declaration filled in
    pub fn new(
        software_source: impl Into<String>,
        data_format: DataFormat,
        data_format_version: impl Into<String>,
    ) -> Self {
        Self {
            software_source: software_source.into(),
            format_prefix: None,
            data_format,
            data_format_version: data_format_version.into(),
            array_dimensions: None,
            data_type: None,
            coord_type: None,
            coordinates: None,
            bounding_box: None,
            resolution: None,
            units: DEFAULT_UNITS.to_string(),
            encoding: None,
        }
    }

    /// Set lattice dimensions
    pub fn with_dimensions(mut self, dims: ArrayDimensions) -> Self {
        self.array_dimensions = Some(dims);
        self
    }

    /// Set element type
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Set lattice encoding
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Set coordinate type, e.g. `uniform`
    pub fn with_coord_type(mut self, coord_type: impl Into<String>) -> Self {
        self.coord_type = Some(coord_type.into());
        self
    }

    /// Set the token written between software name and format, e.g. `3D`
    pub fn with_format_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.format_prefix = Some(prefix.into());
        self
    }

    /// Set the value of the `Units` directive
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Set coordinate units, e.g. `microns`
    pub fn with_coordinates(mut self, coordinates: impl Into<String>) -> Self {
        self.coordinates = Some(coordinates.into());
        self
    }

    /// Set the bounding box and derive the resolution from it
    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Result<Self> {
        self.set_bounding_box(bbox)?;
        Ok(self)
    }

    fn set_bounding_box(&mut self, bbox: BoundingBox) -> Result<()> {
        let dims = self
            .array_dimensions
            .ok_or(AmiraError::MissingDependency {
                directive: "BoundingBox",
                requires: "define",
            })?;
        self.bounding_box = Some(bbox);
        self.resolution = Some(Resolution::derive(&dims, &bbox));
        Ok(())
    }

    /// Lattice dimensions, required for decoding
    pub fn dimensions(&self) -> Result<ArrayDimensions> {
        self.array_dimensions
            .ok_or(AmiraError::MissingField("array_dimensions"))
    }

    /// Element type, required for decoding
    pub fn data_type(&self) -> Result<&DataType> {
        self.data_type
            .as_ref()
            .ok_or(AmiraError::MissingField("data_type"))
    }

    /// Lattice encoding, required for decoding
    pub fn encoding(&self) -> Result<&Encoding> {
        self.encoding
            .as_ref()
            .ok_or(AmiraError::MissingField("encoding"))
    }

    /// Render the record as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

type DirectiveHandler =
    fn(&mut MetadataRecord, &Directive, &[String], usize, &LoadOptions) -> Result<()>;

/// A recognized header directive
pub struct Directive {
    pub keyword: &'static str,
    /// Only match when the keyword is the first token
    pub anchored: bool,
    handler: DirectiveHandler,
}

impl Directive {
    /// Index of the keyword in `line` if this directive applies
    fn locate(&self, line: &[String]) -> Option<usize> {
        if self.anchored {
            line.first().filter(|t| *t == self.keyword).map(|_| 0)
        } else {
            line.iter().position(|t| t == self.keyword)
        }
    }

    fn value_at<'a>(&self, line: &'a [String], index: usize, offset: usize) -> Result<&'a str> {
        line.get(index + offset)
            .map(String::as_str)
            .ok_or_else(|| AmiraError::MalformedHeader {
                keyword: self.keyword,
                reason: format!(
                    "expected a value at offset +{offset}, line has {} tokens",
                    line.len()
                ),
            })
    }

    fn parse_at<T: FromStr>(&self, line: &[String], index: usize, offset: usize) -> Result<T> {
        let token = self.value_at(line, index, offset)?;
        token.parse().map_err(|_| AmiraError::MalformedHeader {
            keyword: self.keyword,
            reason: format!("cannot parse {token:?} at offset +{offset}"),
        })
    }
}

/// Directives in match priority order; the first one found in a line wins.
pub static DIRECTIVES: &[Directive] = &[
    Directive {
        keyword: "define",
        anchored: false,
        handler: apply_define,
    },
    Directive {
        keyword: "Content",
        anchored: false,
        handler: apply_content,
    },
    Directive {
        keyword: "CoordType",
        anchored: false,
        handler: apply_coord_type,
    },
    Directive {
        keyword: "BoundingBox",
        anchored: false,
        handler: apply_bounding_box,
    },
    Directive {
        keyword: "Units",
        anchored: false,
        handler: apply_units,
    },
    Directive {
        keyword: "Coordinates",
        anchored: false,
        handler: apply_coordinates,
    },
    Directive {
        keyword: "Lattice",
        anchored: true,
        handler: apply_lattice,
    },
];

fn apply_define(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    record.array_dimensions = Some(ArrayDimensions::new(
        directive.parse_at(line, index, 2)?,
        directive.parse_at(line, index, 3)?,
        directive.parse_at(line, index, 4)?,
    ));
    Ok(())
}

fn apply_content(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    record.data_type = Some(DataType::parse(directive.value_at(line, index, 2)?));
    Ok(())
}

fn apply_coord_type(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    record.coord_type = Some(directive.value_at(line, index, 1)?.to_string());
    Ok(())
}

fn apply_bounding_box(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    let mut values = [0.0f64; 6];
    for (offset, value) in values.iter_mut().enumerate() {
        *value = directive.parse_at(line, index, offset + 1)?;
    }
    record.set_bounding_box(BoundingBox::from_values(values))
}

fn apply_units(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    record.units = match directive.value_at(line, index, 2) {
        Ok(units) => units.to_string(),
        Err(_) => {
            debug!("Units value undefined, reverting to default of {DEFAULT_UNITS}");
            DEFAULT_UNITS.to_string()
        }
    };
    Ok(())
}

fn apply_coordinates(
    record: &mut MetadataRecord,
    directive: &Directive,
    line: &[String],
    index: usize,
    _options: &LoadOptions,
) -> Result<()> {
    record.coordinates = Some(directive.value_at(line, index, 1)?.to_string());
    Ok(())
}

/// `Lattice { byte Data } @1` is raw; `Lattice { byte Labels } <descriptor>`
/// carries an RLE descriptor. Other `Data` element types are raw only with
/// [`LoadOptions::typed_lattices`].
fn apply_lattice(
    record: &mut MetadataRecord,
    _directive: &Directive,
    line: &[String],
    _index: usize,
    options: &LoadOptions,
) -> Result<()> {
    let tokens: Vec<&str> = line.iter().map(String::as_str).collect();

    let encoding = match tokens.as_slice() {
        ["Lattice", "{", "byte", "Data", "}", "@1", ..] => Encoding::Raw,
        ["Lattice", "{", element, "Data", "}", "@1", ..]
            if options.typed_lattices && DataType::parse(element).is_supported() =>
        {
            Encoding::Raw
        }
        ["Lattice", "{", "byte", "Labels", "}", descriptor, ..] => {
            Encoding::Rle(descriptor.to_string())
        }
        _ => return Err(AmiraError::UnsupportedLatticeFormat(tokens.join(" "))),
    };
    record.encoding = Some(encoding);
    Ok(())
}

/// Build a [`MetadataRecord`] from tokenized header lines.
///
/// The first line is the format declaration `# <software> <format> <version>`,
/// with a `3D` token shifting format and version one place right. Every other
/// line is matched against [`DIRECTIVES`] independently, so directive order in
/// the header does not matter except that `define` must precede `BoundingBox`.
pub fn extract(tokens: &[Vec<String>]) -> Result<MetadataRecord> {
    extract_with(tokens, &LoadOptions::default())
}

/// [`extract`] with explicit options
pub fn extract_with(tokens: &[Vec<String>], options: &LoadOptions) -> Result<MetadataRecord> {
    let (first, rest) = tokens.split_first().ok_or(AmiraError::MalformedHeader {
        keyword: "AmiraMesh",
        reason: "header is empty".to_string(),
    })?;

    let token = |i: usize| {
        first
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| AmiraError::MalformedHeader {
                keyword: "AmiraMesh",
                reason: format!("format declaration has {} tokens", first.len()),
            })
    };

    let software_source = token(1)?;
    let shifted = token(2)? == "3D";
    let (format, version) = if shifted {
        (token(3)?, token(4)?)
    } else {
        (token(2)?, token(3)?)
    };
    let mut record = MetadataRecord::new(software_source, DataFormat::parse(format), version);
    if shifted {
        record.format_prefix = Some("3D".to_string());
    }

    for line in rest {
        let matched = DIRECTIVES
            .iter()
            .find_map(|directive| directive.locate(line).map(|index| (directive, index)));
        if let Some((directive, index)) = matched {
            (directive.handler)(&mut record, directive, line, index, options)?;
        }
    }

    debug!(
        "Extracted metadata: format={} type={:?} dims={:?} encoding={:?}",
        record.data_format,
        record.data_type.as_ref().map(DataType::as_str),
        record.array_dimensions.map(|d| d.as_xyz()),
        record.encoding.as_ref().map(Encoding::as_str)
    );
    Ok(record)
}
