//! Payload decoding - raw data section bytes to a typed lattice

use crate::compression::{get_compressor, rle_byte_count, CompressionMethod};
use crate::error::{AmiraError, Result};
use crate::layout::ArrayDimensions;
use crate::metadata::MetadataRecord;
use crate::types::{DataFormat, DataType, Encoding, Sample};
use crate::utils::strip_trailing_newlines;
use crate::volume::VolumeData;
use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use ndarray::Array3;

/// Decode a data section according to `meta`.
///
/// Dispatches on the declared format:
/// - `BINARY-LITTLE-ENDIAN`: raw little-endian samples of any supported type
/// - `BINARY`: raw or `HxByteRLE` compressed bytes; only `byte` lattices
/// - `ASCII`: space separated values, the last two tokens dropped
///
/// The result is shaped (z, y, x) and reversed along z when `flip_z` is set.
pub fn decode_payload(raw: &[u8], meta: &MetadataRecord, flip_z: bool) -> Result<VolumeData> {
    let format = &meta.data_format;
    if let DataFormat::Other(name) = format {
        return Err(AmiraError::UnsupportedFormat(name.clone()));
    }

    let dims = meta.dimensions()?;
    let data_type = meta.data_type()?;
    let encoding = meta.encoding()?;

    let mut volume = match format {
        DataFormat::BinaryLittleEndian => {
            require_raw(encoding, format)?;
            decode_binary::<LittleEndian>(raw, &dims, data_type, format)?
        }
        DataFormat::Binary => {
            require_byte(data_type, format)?;
            let bytes = match encoding {
                Encoding::Raw => strip_trailing_newlines(raw, dims.num_elements()?).to_vec(),
                Encoding::Rle(descriptor) => {
                    let num_bytes = rle_byte_count(descriptor)?;
                    let compressed = strip_trailing_newlines(raw, num_bytes);
                    if compressed.len() != num_bytes {
                        return Err(AmiraError::SizeMismatch {
                            context: "HxByteRLE payload",
                            expected: num_bytes,
                            found: compressed.len(),
                        });
                    }
                    get_compressor(CompressionMethod::from_encoding(encoding))
                        .decompress(compressed, dims.num_elements()?)?
                }
            };
            VolumeData::Byte(reshape(bytes, &dims)?)
        }
        DataFormat::Ascii => {
            require_raw(encoding, format)?;
            decode_ascii(raw, &dims, data_type)?
        }
        DataFormat::Other(name) => return Err(AmiraError::UnsupportedFormat(name.clone())),
    };

    debug!("Decoded payload: {}", volume.summary());

    if flip_z {
        volume.flip_z();
    }
    Ok(volume)
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

fn require_byte(data_type: &DataType, format: &DataFormat) -> Result<()> {
    if *data_type == DataType::Byte {
        Ok(())
    } else {
        Err(unsupported_type(data_type, format))
    }
}

fn unsupported_type(data_type: &DataType, format: &DataFormat) -> AmiraError {
    AmiraError::UnsupportedType {
        data_type: data_type.to_string(),
        data_format: format.to_string(),
    }
}

fn decode_binary<B: ByteOrder>(
    raw: &[u8],
    dims: &ArrayDimensions,
    data_type: &DataType,
    format: &DataFormat,
) -> Result<VolumeData> {
    Ok(match data_type {
        DataType::Float => VolumeData::Float(read_samples::<f32, B>(raw, dims)?),
        DataType::Short => VolumeData::Short(read_samples::<i16, B>(raw, dims)?),
        DataType::UShort => VolumeData::UShort(read_samples::<u16, B>(raw, dims)?),
        DataType::Byte => VolumeData::Byte(read_samples::<u8, B>(raw, dims)?),
        DataType::Other(_) => return Err(unsupported_type(data_type, format)),
    })
}

fn read_samples<T: Sample, B: ByteOrder>(raw: &[u8], dims: &ArrayDimensions) -> Result<Array3<T>> {
    let expected = dims.num_bytes(T::SIZE)?;
    let data = strip_trailing_newlines(raw, expected);
    if data.len() % T::SIZE != 0 {
        return Err(AmiraError::SizeMismatch {
            context: "binary sample payload",
            expected,
            found: data.len(),
        });
    }
    let values = data.chunks_exact(T::SIZE).map(T::read::<B>).collect();
    reshape(values, dims)
}

fn decode_ascii(raw: &[u8], dims: &ArrayDimensions, data_type: &DataType) -> Result<VolumeData> {
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| *c != '\n')
        .collect();
    let mut tokens: Vec<&str> = text.split(' ').collect();
    tokens.truncate(tokens.len().saturating_sub(2));

    Ok(match data_type {
        DataType::Float => VolumeData::Float(parse_samples(&tokens, dims)?),
        DataType::Short => VolumeData::Short(parse_samples(&tokens, dims)?),
        DataType::UShort => VolumeData::UShort(parse_samples(&tokens, dims)?),
        DataType::Byte => VolumeData::Byte(parse_samples(&tokens, dims)?),
        DataType::Other(_) => return Err(unsupported_type(data_type, &DataFormat::Ascii)),
    })
}

fn parse_samples<T: Sample>(tokens: &[&str], dims: &ArrayDimensions) -> Result<Array3<T>> {
    let values = tokens
        .iter()
        .map(|token| {
            token.trim().parse::<T>().map_err(|_| AmiraError::InvalidValue {
                token: token.to_string(),
                data_type: T::DATA_TYPE.to_string(),
            })
        })
        .collect::<Result<Vec<T>>>()?;
    reshape(values, dims)
}

/// Shape a flat sample sequence as (z, y, x)
fn reshape<T>(values: Vec<T>, dims: &ArrayDimensions) -> Result<Array3<T>> {
    let expected = dims.num_elements()?;
    let found = values.len();
    Array3::from_shape_vec((dims.z, dims.y, dims.x), values).map_err(|_| AmiraError::ShapeMismatch {
        shape: dims.shape(),
        expected,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{encode_rle, rle_descriptor};
    use ndarray::array;

    fn meta(format: DataFormat, dims: (usize, usize, usize), data_type: DataType) -> MetadataRecord {
        MetadataRecord::new("AmiraMesh", format, "2.1")
            .with_dimensions(ArrayDimensions::new(dims.0, dims.1, dims.2))
            .with_data_type(data_type)
            .with_encoding(Encoding::Raw)
    }

    fn le_floats(values: &[f32]) -> Vec<u8> {
        let mut raw = Vec::new();
        for v in values {
            v.write::<LittleEndian>(&mut raw);
        }
        raw
    }

    #[test]
    fn test_little_endian_float() {
        let values = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut raw = le_floats(&values);
        raw.push(b'\n');
        let meta = meta(DataFormat::BinaryLittleEndian, (2, 2, 2), DataType::Float);

        let unflipped = decode_payload(&raw, &meta, false).unwrap();
        assert_eq!(
            unflipped.as_f32().unwrap(),
            &array![[[1.0f32, 2.0], [3.0, 4.0]], [[5.0, 6.0], [7.0, 8.0]]]
        );

        let flipped = decode_payload(&raw, &meta, true).unwrap();
        assert_eq!(
            flipped.as_f32().unwrap(),
            &array![[[5.0f32, 6.0], [7.0, 8.0]], [[1.0, 2.0], [3.0, 4.0]]]
        );
    }

    #[test]
    fn test_little_endian_integers() {
        let raw = [0x01, 0x00, 0xFF, 0xFF, b'\n'];
        let short = decode_payload(&raw, &meta(DataFormat::BinaryLittleEndian, (2, 1, 1), DataType::Short), false)
            .unwrap();
        assert_eq!(short.as_i16().unwrap(), &array![[[1i16, -1]]]);

        let ushort = decode_payload(&raw, &meta(DataFormat::BinaryLittleEndian, (2, 1, 1), DataType::UShort), false)
            .unwrap();
        assert_eq!(ushort.as_u16().unwrap(), &array![[[1u16, 65535]]]);
    }

    #[test]
    fn test_trailing_newline_sample_kept() {
        let raw = [0x01, b'\n', b'\n'];
        let volume = decode_payload(&raw, &meta(DataFormat::BinaryLittleEndian, (2, 1, 1), DataType::Byte), false)
            .unwrap();
        assert_eq!(volume.as_u8().unwrap(), &array![[[1u8, b'\n']]]);
    }

    #[test]
    fn test_little_endian_requires_raw() {
        let meta = meta(DataFormat::BinaryLittleEndian, (1, 1, 1), DataType::Byte)
            .with_encoding(Encoding::Rle(rle_descriptor(2)));
        let err = decode_payload(&[1, 1], &meta, true).unwrap_err();
        assert!(matches!(err, AmiraError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn test_big_endian_raw_bytes() {
        let raw = [7, 8, 9, 10, b'\n'];
        let volume = decode_payload(&raw, &meta(DataFormat::Binary, (2, 2, 1), DataType::Byte), false).unwrap();
        assert_eq!(volume.as_u8().unwrap(), &array![[[7u8, 8], [9, 10]]]);
    }

    #[test]
    fn test_big_endian_rejects_non_byte() {
        let err = decode_payload(&[0; 4], &meta(DataFormat::Binary, (2, 1, 1), DataType::Short), false)
            .unwrap_err();
        assert!(matches!(err, AmiraError::UnsupportedType { .. }));
    }

    #[test]
    fn test_big_endian_rle() {
        let labels: Vec<u8> = vec![0, 0, 0, 0, 1, 2, 3, 3, 3, 3, 3, 9];
        let compressed = encode_rle(&labels);
        let meta = meta(DataFormat::Binary, (3, 2, 2), DataType::Byte)
            .with_encoding(Encoding::Rle(rle_descriptor(compressed.len()).replace(',', "")));

        let mut raw = compressed.clone();
        raw.push(b'\n');
        let volume = decode_payload(&raw, &meta, false).unwrap();
        assert_eq!(
            volume.as_u8().unwrap(),
            &Array3::from_shape_vec((2, 2, 3), labels).unwrap()
        );
    }

    #[test]
    fn test_rle_size_mismatch() {
        let meta = meta(DataFormat::Binary, (3, 1, 1), DataType::Byte)
            .with_encoding(Encoding::Rle("@1(HxByteRLE5)".to_string()));
        let err = decode_payload(&[0x03, 0x01], &meta, false).unwrap_err();
        assert!(matches!(
            err,
            AmiraError::SizeMismatch {
                expected: 5,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_ascii_drops_trailing_tokens() {
        let raw = b"1.5 2.5 3.5 \n4.5 \n \n";
        let volume = decode_payload(raw, &meta(DataFormat::Ascii, (2, 2, 1), DataType::Float), false).unwrap();
        assert_eq!(volume.as_f32().unwrap(), &array![[[1.5f32, 2.5], [3.5, 4.5]]]);
    }

    #[test]
    fn test_ascii_invalid_value() {
        let raw = b"1 x 3  ";
        let err = decode_payload(raw, &meta(DataFormat::Ascii, (3, 1, 1), DataType::Byte), false).unwrap_err();
        assert!(matches!(err, AmiraError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_format() {
        let err = decode_payload(&[], &meta(DataFormat::parse("HDF5"), (1, 1, 1), DataType::Byte), true)
            .unwrap_err();
        assert!(matches!(err, AmiraError::UnsupportedFormat(name) if name == "HDF5"));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = decode_payload(&[1, 2, 3], &meta(DataFormat::Binary, (2, 2, 2), DataType::Byte), true)
            .unwrap_err();
        assert!(matches!(
            err,
            AmiraError::ShapeMismatch {
                expected: 8,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_dimensions() {
        let meta = MetadataRecord::new("AmiraMesh", DataFormat::Binary, "2.1");
        let err = decode_payload(&[1], &meta, true).unwrap_err();
        assert!(matches!(err, AmiraError::MissingField("array_dimensions")));
    }

    #[test]
    fn test_overflowing_dimensions() {
        let dims = (4294967296, 4294967296, 2);
        let cases = [
            meta(DataFormat::BinaryLittleEndian, dims, DataType::Float),
            meta(DataFormat::Binary, dims, DataType::Byte),
            meta(DataFormat::Binary, dims, DataType::Byte)
                .with_encoding(Encoding::Rle("@1(HxByteRLE2)".to_string())),
            meta(DataFormat::Ascii, dims, DataType::Byte),
        ];
        for meta in &cases {
            let err = decode_payload(&[0x05, 0x01], meta, true).unwrap_err();
            assert!(
                matches!(err, AmiraError::MalformedHeader { keyword: "define", .. }),
                "{:?}: {err:?}",
                meta.data_format
            );
        }
    }

    #[test]
    fn test_rle_dimensions_larger_than_stream() {
        let meta = meta(DataFormat::Binary, (100_000, 100_000, 100_000), DataType::Byte)
            .with_encoding(Encoding::Rle("@1(HxByteRLE2)".to_string()));
        let err = decode_payload(&[0x05, 0x01, b'\n'], &meta, true).unwrap_err();
        assert!(matches!(
            err,
            AmiraError::TruncatedStream { produced: 5, .. }
        ));
    }
}
