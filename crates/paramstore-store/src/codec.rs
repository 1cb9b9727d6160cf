//! Tensor record codec.
//!
//! A record is self-describing: it holds the data type and the shape of the tensor, so
//! decoding needs nothing but the bytes and an allocator.

use std::io::{self, Write};

use paramstore_tensor::{DType, Shape, TensorAllocator, TensorData};

use crate::CodecError;

/// Current version of the tensor record format.
pub const RECORD_VERSION: u8 = 1;

/// Size of the fixed part of the header: version, dtype tag and rank.
const FIXED_HEADER_SIZE: usize = 3;

/// Size of one dimension extent.
const EXTENT_SIZE: usize = 4;

/// Header of a tensor record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Element type.
    pub dtype: DType,
    /// Shape of the tensor.
    pub shape: Shape,
}

impl RecordHeader {
    /// Creates the header of a tensor with the given data type and shape.
    ///
    /// Fails if the shape cannot be represented: more than 255 dimensions, an empty
    /// dimension or an extent larger than `u32::MAX`.
    pub fn new(dtype: DType, shape: Shape) -> Result<Self, CodecError> {
        if shape.num_dims() > u8::MAX as usize {
            return Err(CodecError::Format(format!(
                "rank {} exceeds the maximum of {}",
                shape.num_dims(),
                u8::MAX
            )));
        }

        for (axis, extent) in shape.dims.iter().enumerate() {
            if *extent == 0 || *extent > u32::MAX as usize {
                return Err(CodecError::Format(format!(
                    "dimension {axis} has invalid extent {extent}"
                )));
            }
        }

        Ok(Self { dtype, shape })
    }

    /// Size of the encoded header in bytes.
    pub fn size(&self) -> usize {
        FIXED_HEADER_SIZE + self.shape.num_dims() * EXTENT_SIZE
    }

    /// Size of the element bytes following the header, or `None` if it overflows `usize`.
    pub fn payload_size(&self) -> Option<usize> {
        self.shape
            .checked_num_elements()
            .and_then(|num| num.checked_mul(self.dtype.size()))
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.push(RECORD_VERSION);
        bytes.push(self.dtype.tag());
        bytes.push(self.shape.num_dims() as u8);
        for extent in self.shape.dims.iter() {
            bytes.extend_from_slice(&(*extent as u32).to_le_bytes());
        }
        bytes
    }

    /// Parses a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(CodecError::TruncatedInput {
                expected: FIXED_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let version = bytes[0];
        if version != RECORD_VERSION {
            return Err(CodecError::Format(format!(
                "unsupported record version {version}"
            )));
        }

        let dtype = DType::from_tag(bytes[1])
            .ok_or_else(|| CodecError::Format(format!("unknown dtype tag {}", bytes[1])))?;

        let rank = bytes[2] as usize;
        let size = FIXED_HEADER_SIZE + rank * EXTENT_SIZE;
        if bytes.len() < size {
            return Err(CodecError::TruncatedInput {
                expected: size,
                actual: bytes.len(),
            });
        }

        let dims = bytes[FIXED_HEADER_SIZE..size]
            .chunks_exact(EXTENT_SIZE)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize)
            .collect::<Vec<_>>();

        Self::new(dtype, Shape::from(dims))
    }
}

/// Encodes a tensor into a record.
///
/// The output only depends on the tensor value, so equal tensors encode to equal bytes.
pub fn encode(tensor: &TensorData) -> Result<Vec<u8>, CodecError> {
    let header = RecordHeader::new(tensor.dtype(), tensor.shape().clone())?;

    let mut bytes = header.to_bytes();
    bytes.reserve_exact(tensor.size_in_bytes());
    bytes.extend_from_slice(tensor.as_bytes());

    Ok(bytes)
}

/// Streams the record of a tensor into `writer`.
///
/// Returns the number of bytes written. A tensor whose shape cannot be encoded is reported as
/// [InvalidInput](io::ErrorKind::InvalidInput) before anything is written.
pub fn encode_into<W: Write>(tensor: &TensorData, writer: &mut W) -> io::Result<usize> {
    let header = RecordHeader::new(tensor.dtype(), tensor.shape().clone())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let header = header.to_bytes();

    writer.write_all(&header)?;
    writer.write_all(tensor.as_bytes())?;

    Ok(header.len() + tensor.size_in_bytes())
}

/// Decodes a record into a tensor allocated by `allocator`.
///
/// The record must span `bytes` exactly: missing bytes are reported as truncated input and
/// trailing bytes as a format error. Nothing is allocated before the length is validated.
pub fn decode<A: TensorAllocator>(
    bytes: &[u8],
    allocator: &mut A,
) -> Result<TensorData, CodecError> {
    let header = RecordHeader::from_bytes(bytes)?;
    let header_size = header.size();

    let payload_size = header.payload_size().ok_or_else(|| {
        CodecError::Format(format!(
            "tensor of shape {} and data type {} is too large",
            header.shape, header.dtype
        ))
    })?;
    let expected = header_size.checked_add(payload_size).ok_or_else(|| {
        CodecError::Format(format!("record size overflow for shape {}", header.shape))
    })?;

    if bytes.len() < expected {
        return Err(CodecError::TruncatedInput {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::Format(format!(
            "record has {} trailing bytes",
            bytes.len() - expected
        )));
    }

    let mut tensor = allocator.allocate(header.shape, header.dtype)?;
    tensor
        .as_bytes_mut()
        .copy_from_slice(&bytes[header_size..expected]);

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramstore_tensor::HeapAllocator;

    #[test]
    fn encode_layout() {
        let tensor = TensorData::new(vec![0i32, 1, 2, 3], [4]);
        let bytes = encode(&tensor).unwrap();

        assert_eq!(
            bytes,
            vec![
                1, 5, 1, // version, dtype tag, rank
                4, 0, 0, 0, // extent
                0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0,
            ]
        );
    }

    #[test]
    fn encode_into_matches_encode() {
        let tensor = TensorData::new(vec![1.0f32, -1.0, 0.5, 8.0, 3.25, 0.0], [2, 3]);
        let mut bytes = Vec::new();

        let written = encode_into(&tensor, &mut bytes).unwrap();

        assert_eq!(written, bytes.len());
        assert_eq!(bytes, encode(&tensor).unwrap());
    }

    #[test]
    fn truncated_payload() {
        let bytes = encode(&TensorData::new(vec![7u64, 9], [2])).unwrap();

        assert_eq!(
            decode(&bytes[..bytes.len() - 3], &mut HeapAllocator::new()),
            Err(CodecError::TruncatedInput {
                expected: bytes.len(),
                actual: bytes.len() - 3,
            })
        );
    }

    #[test]
    fn header_round_trip() {
        let header = RecordHeader::new(DType::BF16, Shape::new([3, 1, 7])).unwrap();
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), header.size());
        assert_eq!(RecordHeader::from_bytes(&bytes).unwrap(), header);
        assert_eq!(header.payload_size(), Some(42));
    }

    #[test]
    fn unknown_version_is_a_format_error() {
        let mut bytes = encode(&TensorData::new(vec![1u8], [1])).unwrap();
        bytes[0] = 2;

        assert!(matches!(
            decode(&bytes, &mut HeapAllocator::new()),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn scalar_tensor_has_rank_zero() {
        let tensor = TensorData::new(vec![2.5f64], Shape::from(Vec::new()));
        let bytes = encode(&tensor).unwrap();

        assert_eq!(bytes.len(), 3 + 8);
        assert_eq!(decode(&bytes, &mut HeapAllocator::new()).unwrap(), tensor);
    }
}
