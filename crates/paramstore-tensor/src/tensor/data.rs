use half::{bf16, f16};
use rand::RngCore;

use crate::{DType, Distribution, DistributionError, Element, ElementConversion, Shape};

/// Error that can occur when building or reading [tensor data](TensorData).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// The buffer length does not match the shape and data type.
    #[error(
        "Size mismatch: tensor of shape {shape} and data type {dtype} expected to be \
        {expected} bytes, got {actual} bytes."
    )]
    SizeMismatch {
        /// Shape of the tensor.
        shape: Shape,
        /// Data type of the tensor.
        dtype: DType,
        /// Expected buffer length in bytes.
        expected: usize,
        /// Actual buffer length in bytes.
        actual: usize,
    },

    /// The requested element type does not match the stored data type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Requested data type.
        expected: DType,
        /// Stored data type.
        found: DType,
    },
}

/// Data structure for tensors.
///
/// The buffer is contiguous, row-major and little-endian. Equality compares shape, data type
/// and raw bytes, so two tensors are equal only when they are bit-for-bit identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorData {
    bytes: Vec<u8>,
    shape: Shape,
    dtype: DType,
}

impl TensorData {
    /// Creates a new tensor data structure.
    ///
    /// # Panics
    ///
    /// If the number of values does not match the number of elements of the shape.
    pub fn new<E: Element, S: Into<Shape>>(values: Vec<E>, shape: S) -> Self {
        let shape = shape.into();
        assert_eq!(
            values.len(),
            shape.num_elements(),
            "Shape {shape} is invalid for input of size {}",
            values.len(),
        );

        let mut bytes = bytemuck::cast_slice::<E, u8>(&values).to_vec();
        swap_to_le(&mut bytes, E::dtype().size());

        Self {
            bytes,
            shape,
            dtype: E::dtype(),
        }
    }

    /// Creates a new tensor data structure from little-endian raw bytes.
    pub fn from_bytes<S: Into<Shape>>(
        bytes: Vec<u8>,
        shape: S,
        dtype: DType,
    ) -> Result<Self, DataError> {
        let shape = shape.into();
        let expected = shape.num_elements() * dtype.size();
        if bytes.len() != expected {
            return Err(DataError::SizeMismatch {
                shape,
                dtype,
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            bytes,
            shape,
            dtype,
        })
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros<S: Into<Shape>>(shape: S, dtype: DType) -> Self {
        let shape = shape.into();
        let bytes = vec![0; shape.num_elements() * dtype.size()];

        Self {
            bytes,
            shape,
            dtype,
        }
    }

    /// Creates a tensor filled with the given value, converted to the data type.
    pub fn full<S: Into<Shape>>(shape: S, value: f64, dtype: DType) -> Self {
        Self::from_fn(shape.into(), dtype, || value)
    }

    /// Creates a tensor with values sampled from the given distribution.
    pub fn random<S: Into<Shape>, R: RngCore>(
        shape: S,
        dtype: DType,
        distribution: Distribution,
        rng: &mut R,
    ) -> Result<Self, DistributionError> {
        let mut sampler = distribution.sampler(rng)?;
        Ok(Self::from_fn(shape.into(), dtype, || sampler.sample()))
    }

    fn from_fn<F: FnMut() -> f64>(shape: Shape, dtype: DType, mut f: F) -> Self {
        fn build<E: Element, F: FnMut() -> f64>(shape: Shape, f: &mut F) -> TensorData {
            let values = (0..shape.num_elements())
                .map(|_| f().elem::<E>())
                .collect::<Vec<E>>();
            TensorData::new(values, shape)
        }

        match dtype {
            DType::F64 => build::<f64, F>(shape, &mut f),
            DType::F32 => build::<f32, F>(shape, &mut f),
            DType::F16 => build::<f16, F>(shape, &mut f),
            DType::BF16 => build::<bf16, F>(shape, &mut f),
            DType::I64 => build::<i64, F>(shape, &mut f),
            DType::I32 => build::<i32, F>(shape, &mut f),
            DType::I16 => build::<i16, F>(shape, &mut f),
            DType::I8 => build::<i8, F>(shape, &mut f),
            DType::U64 => build::<u64, F>(shape, &mut f),
            DType::U32 => build::<u32, F>(shape, &mut f),
            DType::U16 => build::<u16, F>(shape, &mut f),
            DType::U8 => build::<u8, F>(shape, &mut f),
        }
    }

    /// Returns the values as a vector of the given element type.
    pub fn to_vec<E: Element>(&self) -> Result<Vec<E>, DataError> {
        if E::dtype() != self.dtype {
            return Err(DataError::TypeMismatch {
                expected: E::dtype(),
                found: self.dtype,
            });
        }

        let mut bytes = self.bytes.clone();
        swap_to_le(&mut bytes, self.dtype.size());

        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }

    /// Returns the shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the data type of the tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of elements in the tensor.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the size of the buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the raw little-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the raw little-endian bytes mutably, to be filled in place.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// Reorders element bytes between native and little-endian order, a no-op on little-endian
/// targets. The swap is its own inverse.
fn swap_to_le(bytes: &mut [u8], width: usize) {
    if cfg!(target_endian = "big") && width > 1 {
        bytes
            .chunks_exact_mut(width)
            .for_each(|element| element.reverse());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn new_stores_little_endian_bytes() {
        let data = TensorData::new(vec![1u32, 256], [2]);

        assert_eq!(data.as_bytes(), &[1, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(data.dtype(), DType::U32);
        assert_eq!(data.to_vec::<u32>().unwrap(), vec![1, 256]);
    }

    #[test]
    #[should_panic = "Shape [3] is invalid for input of size 2"]
    fn new_rejects_wrong_element_count() {
        let _ = TensorData::new(vec![1.0f32, 2.0], [3]);
    }

    #[test]
    fn from_bytes_checks_length() {
        let err = TensorData::from_bytes(vec![0; 7], [2], DType::F32).unwrap_err();

        assert_eq!(
            err,
            DataError::SizeMismatch {
                shape: Shape::new([2]),
                dtype: DType::F32,
                expected: 8,
                actual: 7,
            }
        );
    }

    #[test]
    fn to_vec_checks_dtype() {
        let data = TensorData::new(vec![1i64, 2, 3], [3]);

        assert_eq!(
            data.to_vec::<i32>(),
            Err(DataError::TypeMismatch {
                expected: DType::I32,
                found: DType::I64,
            })
        );
    }

    #[test]
    fn full_converts_to_dtype() {
        let data = TensorData::full([2, 2], 3.0, DType::F16);

        assert_eq!(data.to_vec::<f16>().unwrap(), vec![f16::from_f32(3.0); 4]);
    }

    #[test]
    fn zeros_and_full_zero_are_equal() {
        for dtype in DType::ALL {
            assert_eq!(
                TensorData::zeros([3, 2], dtype),
                TensorData::full([3, 2], 0.0, dtype)
            );
        }
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let distribution = Distribution::Uniform(-1.0, 1.0);
        let a = TensorData::random(
            [4, 4],
            DType::F32,
            distribution,
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        let b = TensorData::random(
            [4, 4],
            DType::F32,
            distribution,
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();

        assert_eq!(a, b);
        assert!(
            a.to_vec::<f32>()
                .unwrap()
                .iter()
                .all(|v| (-1.0..=1.0).contains(v))
        );
    }
}
