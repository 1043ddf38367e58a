//! AmiraMesh encoding - the inverse of the load pipeline
//!
//! The header is laid out so that the extractor reads it back into an
//! equivalent [`MetadataRecord`]; dimensions and element type always come
//! from the volume being written.

use crate::compression::{get_compressor, rle_descriptor, CompressionMethod};
use crate::error::{AmiraError, Result};
use crate::io::DATA_SECTION_SENTINEL;
use crate::metadata::{MetadataRecord, DEFAULT_UNITS};
use crate::types::{DataFormat, DataType, Encoding, Sample};
use crate::volume::VolumeData;
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use ndarray::Array3;
use std::path::Path;

/// Encode `volume` as a complete AmiraMesh file.
///
/// `flip_z` must match the flag the volume was loaded with so the z axis is
/// written back in on-disk order.
pub fn encode_amiramesh(meta: &MetadataRecord, volume: &VolumeData, flip_z: bool) -> Result<Vec<u8>> {
    let mut volume = volume.clone();
    if flip_z {
        volume.flip_z();
    }

    let format = &meta.data_format;
    let encoding = meta.encoding.clone().unwrap_or(Encoding::Raw);
    let method = CompressionMethod::from_encoding(&encoding);

    let (payload, lattice) = match format {
        DataFormat::BinaryLittleEndian => {
            require_raw(&encoding, format)?;
            (binary_payload::<LittleEndian>(&volume), raw_lattice(&volume))
        }
        DataFormat::Binary => {
            let bytes = volume.as_u8().ok_or_else(|| AmiraError::UnsupportedType {
                data_type: volume.data_type().to_string(),
                data_format: format.to_string(),
            })?;
            let data: Vec<u8> = bytes.iter().copied().collect();
            let compressed = get_compressor(method).compress(&data)?;
            let lattice = match method {
                CompressionMethod::None => raw_lattice(&volume),
                CompressionMethod::HxByteRle => format!(
                    "Lattice {{ byte Labels }} {}",
                    rle_descriptor(compressed.len())
                ),
            };
            (compressed, lattice)
        }
        DataFormat::Ascii => {
            require_raw(&encoding, format)?;
            (ascii_payload(&volume), raw_lattice(&volume))
        }
        DataFormat::Other(name) => return Err(AmiraError::UnsupportedFormat(name.clone())),
    };

    let mut out = header_text(meta, &volume, &lattice).into_bytes();
    out.extend_from_slice(&payload);
    if !matches!(format, DataFormat::Ascii) {
        out.push(b'\n');
    }

    debug!(
        "Encoded AmiraMesh {}: {}, {} payload bytes",
        format,
        volume.summary(),
        payload.len()
    );
    Ok(out)
}

/// Encode `volume` and write it to `path`
pub fn write_amiramesh(
    path: impl AsRef<Path>,
    meta: &MetadataRecord,
    volume: &VolumeData,
    flip_z: bool,
) -> Result<()> {
    let bytes = encode_amiramesh(meta, volume, flip_z)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn require_raw(encoding: &Encoding, format: &DataFormat) -> Result<()> {
    if encoding.is_raw() {
        Ok(())
    } else {
        Err(AmiraError::UnsupportedEncoding {
            encoding: encoding.to_string(),
            data_format: format.to_string(),
        })
    }
}

fn raw_lattice(volume: &VolumeData) -> String {
    format!("Lattice {{ {} Data }} @1", volume.data_type())
}

fn header_text(meta: &MetadataRecord, volume: &VolumeData, lattice: &str) -> String {
    let dims = volume.dimensions();
    let data_type: DataType = volume.data_type();

    let declaration = match &meta.format_prefix {
        Some(prefix) => format!(
            "# {} {} {} {}",
            meta.software_source, prefix, meta.data_format, meta.data_format_version
        ),
        None => format!(
            "# {} {} {}",
            meta.software_source, meta.data_format, meta.data_format_version
        ),
    };

    let mut header = format!("{declaration}\n\n\n");
    header.push_str(&format!("define Lattice {} {} {}\n\n", dims.x, dims.y, dims.z));
    header.push_str("Parameters {\n");
    // Unit is read at offset +2 from `Units`; coordinates get their own line
    if meta.units != DEFAULT_UNITS {
        header.push_str(&format!("    Units {{ {} }}\n", meta.units));
    }
    if let Some(coordinates) = &meta.coordinates {
        header.push_str(&format!("    Coordinates \"{coordinates}\"\n"));
    }
    header.push_str(&format!(
        "    Content \"{}x{}x{} {}, uniform coordinates\",\n",
        dims.x, dims.y, dims.z, data_type
    ));
    if let Some(bbox) = &meta.bounding_box {
        let values: Vec<String> = bbox.values().iter().map(f64::to_string).collect();
        header.push_str(&format!("    BoundingBox {},\n", values.join(" ")));
    }
    if let Some(coord_type) = &meta.coord_type {
        header.push_str(&format!("    CoordType \"{coord_type}\"\n"));
    }
    header.push_str("}\n\n");
    header.push_str(&format!("{lattice}\n\n"));
    header.push_str(DATA_SECTION_SENTINEL);
    header.push_str("@1\n");
    header
}

fn binary_payload<B: ByteOrder>(volume: &VolumeData) -> Vec<u8> {
    match volume {
        VolumeData::Float(a) => write_samples::<f32, B>(a),
        VolumeData::Short(a) => write_samples::<i16, B>(a),
        VolumeData::UShort(a) => write_samples::<u16, B>(a),
        VolumeData::Byte(a) => write_samples::<u8, B>(a),
    }
}

fn write_samples<T: Sample, B: ByteOrder>(array: &Array3<T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(array.len() * T::SIZE);
    for &value in array.iter() {
        value.write::<B>(&mut out);
    }
    out
}

fn ascii_payload(volume: &VolumeData) -> Vec<u8> {
    match volume {
        VolumeData::Float(a) => ascii_samples(a),
        VolumeData::Short(a) => ascii_samples(a),
        VolumeData::UShort(a) => ascii_samples(a),
        VolumeData::Byte(a) => ascii_samples(a),
    }
}

/// Every value is followed by a space, rows end in newlines, and the text
/// closes with the two empty tokens the decoder discards.
fn ascii_samples<T: Sample>(array: &Array3<T>) -> Vec<u8> {
    let mut text = String::new();
    for row in array.rows() {
        for value in row.iter() {
            text.push_str(&value.to_string());
            text.push(' ');
        }
        text.push('\n');
    }
    text.push_str(" \n");
    text.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_payload;
    use crate::io::read_sections_from;
    use crate::layout::{ArrayDimensions, BoundingBox, Resolution};
    use crate::access::LoadOptions;
    use crate::metadata::extract_with;
    use crate::tokenizer::clean_header;
    use ndarray::array;
    use std::io::Cursor;

    fn reload(bytes: Vec<u8>, flip_z: bool) -> (MetadataRecord, VolumeData) {
        let (header, payload) = read_sections_from(Cursor::new(bytes)).unwrap();
        let options = LoadOptions::default().with_typed_lattices(true);
        let meta = extract_with(&clean_header(header.lines()), &options).unwrap();
        let volume = decode_payload(&payload, &meta, flip_z).unwrap();
        (meta, volume)
    }

    fn meta(format: DataFormat) -> MetadataRecord {
        MetadataRecord::new("AmiraMesh", format, "2.1")
    }

    #[test]
    fn test_header_layout() {
        let volume = VolumeData::from(Array3::<u16>::zeros((2, 3, 4)));
        let meta = meta(DataFormat::BinaryLittleEndian).with_coordinates("microns");
        let bytes = encode_amiramesh(&meta, &volume, false).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("# AmiraMesh BINARY-LITTLE-ENDIAN 2.1\n"));
        assert!(text.contains("define Lattice 4 3 2\n"));
        assert!(text.contains("Content \"4x3x2 ushort, uniform coordinates\","));
        assert!(text.contains("Coordinates \"microns\""));
        assert!(text.contains("Lattice { ushort Data } @1\n"));
        assert!(text.contains("# Data section follows\n@1\n"));
    }

    #[test]
    fn test_units_and_prefix_round_trip() {
        let volume = VolumeData::from(Array3::<u8>::zeros((1, 1, 2)));
        let meta = MetadataRecord::new("Avizo", DataFormat::Ascii, "2.0")
            .with_format_prefix("3D")
            .with_units("mm")
            .with_coordinates("microns");

        let bytes = encode_amiramesh(&meta, &volume, true).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("# Avizo 3D ASCII 2.0\n"));
        assert!(text.contains("    Units { mm }\n"));

        let (loaded_meta, loaded) = reload(bytes, true);
        assert_eq!(loaded, volume);
        assert_eq!(loaded_meta.units, "mm");
        assert_eq!(loaded_meta.coordinates.as_deref(), Some("microns"));
        assert_eq!(loaded_meta.format_prefix.as_deref(), Some("3D"));
        assert_eq!(loaded_meta.data_format, DataFormat::Ascii);
    }

    #[test]
    fn test_default_units_not_written() {
        let volume = VolumeData::from(Array3::<u8>::zeros((1, 1, 1)));
        let bytes = encode_amiramesh(&meta(DataFormat::Binary), &volume, false).unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains("Units"));
        assert_eq!(reload(bytes, false).0.units, DEFAULT_UNITS);
    }

    #[test]
    fn test_little_endian_round_trip() {
        let volume = VolumeData::from(array![[[1.5f32, -2.0]], [[3.25, 10.0]]]);
        let meta = meta(DataFormat::BinaryLittleEndian)
            .with_dimensions(ArrayDimensions::new(2, 1, 2))
            .with_bounding_box(BoundingBox::from_values([0.0, 1.0, 0.0, 0.0, 0.0, 2.0]))
            .unwrap()
            .with_coord_type("uniform");

        let (loaded_meta, loaded) = reload(encode_amiramesh(&meta, &volume, true).unwrap(), true);
        assert_eq!(loaded, volume);
        assert_eq!(loaded_meta.data_type, Some(DataType::Float));
        assert_eq!(loaded_meta.array_dimensions, Some(ArrayDimensions::new(2, 1, 2)));
        assert_eq!(loaded_meta.bounding_box, meta.bounding_box);
        assert_eq!(loaded_meta.coord_type.as_deref(), Some("uniform"));
        assert_eq!(
            loaded_meta.resolution,
            Some(Resolution::Anisotropic([2.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn test_rle_round_trip() {
        let labels = Array3::from_shape_fn((4, 5, 6), |(z, y, _)| (z * 2 + y / 3) as u8);
        let volume = VolumeData::from(labels);
        let meta = meta(DataFormat::Binary).with_encoding(Encoding::Rle(String::new()));

        let bytes = encode_amiramesh(&meta, &volume, false).unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Lattice { byte Labels } @1(HxByteRLE,"));

        let (loaded_meta, loaded) = reload(bytes, false);
        assert!(matches!(loaded_meta.encoding, Some(Encoding::Rle(_))));
        assert_eq!(loaded, volume);
    }

    #[test]
    fn test_ascii_round_trip() {
        let volume = VolumeData::from(array![[[1i16, -2, 3], [4, 5, -6]]]);
        let (_, loaded) = reload(encode_amiramesh(&meta(DataFormat::Ascii), &volume, false).unwrap(), false);
        assert_eq!(loaded, volume);
    }

    #[test]
    fn test_binary_requires_bytes() {
        let volume = VolumeData::from(Array3::<f32>::zeros((1, 1, 1)));
        let err = encode_amiramesh(&meta(DataFormat::Binary), &volume, false).unwrap_err();
        assert!(matches!(err, AmiraError::UnsupportedType { .. }));
    }

    #[test]
    fn test_write_to_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("out.am");
        let volume = VolumeData::from(array![[[1u8, 2]]]);
        write_amiramesh(&path, &meta(DataFormat::Binary), &volume, true).unwrap();
        let (_, loaded) = reload(std::fs::read(&path).unwrap(), true);
        assert_eq!(loaded, volume);
    }
}
