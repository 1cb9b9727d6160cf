use core::fmt::Debug;

use half::{bf16, f16};
use num_traits::{NumCast, ToPrimitive, Zero};

use crate::DType;

/// Element trait for tensor data.
///
/// Elements are plain old data: they can be viewed as raw bytes and rebuilt from them, which is
/// what lets [`TensorData`](crate::TensorData) keep a single untyped buffer.
pub trait Element:
    bytemuck::Pod + NumCast + ToPrimitive + Zero + Debug + PartialEq + Send + Sync + 'static
{
    /// The data type matching this element.
    fn dtype() -> DType;
}

/// Element conversion trait for tensor.
pub trait ElementConversion {
    /// Converts the value into the given element type.
    ///
    /// Values that cannot be represented by the target (NaN or out of range for an integer
    /// kind) map to zero.
    fn elem<E: Element>(self) -> E;
}

impl ElementConversion for f64 {
    fn elem<E: Element>(self) -> E {
        <E as NumCast>::from(self).unwrap_or_else(E::zero)
    }
}

macro_rules! make_element {
    (
        ty $type:ident,
        dtype $dtype:expr
    ) => {
        impl Element for $type {
            #[inline(always)]
            fn dtype() -> DType {
                $dtype
            }
        }
    };
}

make_element!(ty f64, dtype DType::F64);
make_element!(ty f32, dtype DType::F32);
make_element!(ty f16, dtype DType::F16);
make_element!(ty bf16, dtype DType::BF16);
make_element!(ty i64, dtype DType::I64);
make_element!(ty i32, dtype DType::I32);
make_element!(ty i16, dtype DType::I16);
make_element!(ty i8, dtype DType::I8);
make_element!(ty u64, dtype DType::U64);
make_element!(ty u32, dtype DType::U32);
make_element!(ty u16, dtype DType::U16);
make_element!(ty u8, dtype DType::U8);
