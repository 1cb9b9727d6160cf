use crate::{DType, Shape, TensorData};

/// Error returned by a [tensor allocator](TensorAllocator).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The byte size of the requested tensor does not fit in `usize`.
    #[error("Tensor of shape {shape} and data type {dtype} is too large to address")]
    Overflow {
        /// Requested shape.
        shape: Shape,
        /// Requested data type.
        dtype: DType,
    },

    /// The allocation would exceed the allocator budget.
    #[error("Allocation of {requested} bytes exceeds the remaining budget of {remaining} bytes")]
    LimitExceeded {
        /// Requested bytes.
        requested: usize,
        /// Bytes still available.
        remaining: usize,
    },
}

/// Provides storage for tensors created while decoding.
///
/// Allocation is passed explicitly to the decoder instead of relying on ambient global state,
/// so callers decide where tensor memory comes from and how much of it may be used.
pub trait TensorAllocator {
    /// Allocates a zero-filled tensor of the given shape and data type.
    fn allocate(&mut self, shape: Shape, dtype: DType) -> Result<TensorData, AllocError>;
}

/// Allocates tensors on the heap, optionally bounded by a total byte budget.
#[derive(Debug, Default, Clone)]
pub struct HeapAllocator {
    limit: Option<usize>,
    allocated: usize,
}

impl HeapAllocator {
    /// Creates an unbounded heap allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a heap allocator that refuses to hand out more than `limit` bytes in total.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            allocated: 0,
        }
    }

    /// Total number of bytes handed out so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

impl TensorAllocator for HeapAllocator {
    fn allocate(&mut self, shape: Shape, dtype: DType) -> Result<TensorData, AllocError> {
        let requested = shape
            .checked_num_elements()
            .and_then(|num| num.checked_mul(dtype.size()))
            .ok_or_else(|| AllocError::Overflow {
                shape: shape.clone(),
                dtype,
            })?;

        if let Some(limit) = self.limit {
            let remaining = limit.saturating_sub(self.allocated);
            if requested > remaining {
                return Err(AllocError::LimitExceeded {
                    requested,
                    remaining,
                });
            }
        }

        self.allocated += requested;
        Ok(TensorData::zeros(shape, dtype))
    }
}

impl<A: TensorAllocator + ?Sized> TensorAllocator for &mut A {
    fn allocate(&mut self, shape: Shape, dtype: DType) -> Result<TensorData, AllocError> {
        (**self).allocate(shape, dtype)
    }
}
