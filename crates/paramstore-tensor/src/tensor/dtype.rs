use core::fmt;

use serde::{Deserialize, Serialize};

/// Supported element types for tensors.
///
/// Every variant has a fixed byte width and a stable one-byte tag used by the tensor record
/// format. Tags must never be reassigned once released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 64-bit floating point
    F64,
    /// 32-bit floating point
    F32,
    /// 16-bit floating point
    F16,
    /// Brain floating point
    BF16,
    /// 64-bit integer
    I64,
    /// 32-bit integer
    I32,
    /// 16-bit integer
    I16,
    /// 8-bit integer
    I8,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit unsigned integer
    U32,
    /// 16-bit unsigned integer
    U16,
    /// 8-bit unsigned integer
    U8,
}

impl DType {
    /// All supported data types, ordered by tag.
    pub const ALL: [DType; 12] = [
        DType::F64,
        DType::F32,
        DType::F16,
        DType::BF16,
        DType::I64,
        DType::I32,
        DType::I16,
        DType::I8,
        DType::U64,
        DType::U32,
        DType::U16,
        DType::U8,
    ];

    /// Returns the size of one element in bytes.
    pub const fn size(&self) -> usize {
        match self {
            DType::F64 | DType::I64 | DType::U64 => 8,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F16 | DType::BF16 | DType::I16 | DType::U16 => 2,
            DType::I8 | DType::U8 => 1,
        }
    }

    /// Returns the tag identifying this data type in a tensor record.
    pub const fn tag(&self) -> u8 {
        match self {
            DType::F64 => 0,
            DType::F32 => 1,
            DType::F16 => 2,
            DType::BF16 => 3,
            DType::I64 => 4,
            DType::I32 => 5,
            DType::I16 => 6,
            DType::I8 => 7,
            DType::U64 => 8,
            DType::U32 => 9,
            DType::U16 => 10,
            DType::U8 => 11,
        }
    }

    /// Returns the data type for the given record tag, if it is known.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F64 => "f64",
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::I16 => "i16",
            DType::I8 => "i8",
            DType::U64 => "u64",
            DType::U32 => "u32",
            DType::U16 => "u16",
            DType::U8 => "u8",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn tags_are_dense_and_round_trip() {
        for (index, dtype) in DType::ALL.iter().enumerate() {
            assert_eq!(dtype.tag() as usize, index);
            assert_eq!(DType::from_tag(dtype.tag()), Some(*dtype));
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(DType::from_tag(12), None);
        assert_eq!(DType::from_tag(u8::MAX), None);
    }

    #[rstest]
    #[case(DType::F64, 8)]
    #[case(DType::BF16, 2)]
    #[case(DType::I32, 4)]
    #[case(DType::U8, 1)]
    fn sizes(#[case] dtype: DType, #[case] size: usize) {
        assert_eq!(dtype.size(), size);
    }

    #[test]
    fn display() {
        assert_eq!(DType::BF16.to_string(), "bf16");
        assert_eq!(DType::U32.to_string(), "u32");
    }
}
