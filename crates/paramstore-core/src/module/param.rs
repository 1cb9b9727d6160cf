use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::nn::Initializer;
use crate::tensor::{DType, Shape, TensorData};

static PARAM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Parameter identity, assigned once when the parameter is created.
///
/// The id is never persisted nor used to compare parameters: a parameter restored from a
/// checkpoint keeps the id of the slot it was loaded into.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub struct ParamId {
    value: u64,
}

impl Default for ParamId {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamId {
    /// Create a new parameter ID.
    pub fn new() -> Self {
        Self {
            value: PARAM_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Declared shape of a parameter.
///
/// A dimension is `None` while it depends on an input size that is only known once the
/// network sees its first input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamShape {
    dims: Vec<Option<usize>>,
}

impl ParamShape {
    /// A shape whose dimensions may be deferred.
    pub fn new(dims: Vec<Option<usize>>) -> Self {
        Self { dims }
    }

    /// A fully known shape.
    pub fn known<S: Into<Shape>>(shape: S) -> Self {
        Self {
            dims: shape.into().dims.into_iter().map(Some).collect(),
        }
    }

    /// The declared dimensions.
    pub fn dims(&self) -> &[Option<usize>] {
        &self.dims
    }

    /// Returns true if no dimension is deferred.
    pub fn is_complete(&self) -> bool {
        self.dims.iter().all(Option::is_some)
    }

    /// Returns the concrete shape, if no dimension is deferred.
    pub fn to_shape(&self) -> Option<Shape> {
        self.dims
            .iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .map(Shape::from)
    }

    /// Resolves deferred dimensions with the feature count (last dimension) of the input.
    pub fn resolve(&self, input_shape: &Shape) -> Option<Shape> {
        if self.is_complete() {
            return self.to_shape();
        }

        let features = input_shape.last()?;
        Some(Shape::from(
            self.dims
                .iter()
                .map(|dim| dim.unwrap_or(features))
                .collect::<Vec<_>>(),
        ))
    }

    /// Returns true if `shape` has the same rank and agrees on every known dimension.
    pub fn is_compatible(&self, shape: &Shape) -> bool {
        self.dims.len() == shape.num_dims()
            && self
                .dims
                .iter()
                .zip(shape.dims.iter())
                .all(|(declared, actual)| declared.is_none_or(|d| d == *actual))
    }
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims
            .iter()
            .map(|dim| match dim {
                Some(dim) => dim.to_string(),
                None => "?".to_string(),
            })
            .collect::<Vec<_>>();

        write!(f, "[{}]", dims.join(", "))
    }
}

impl From<Shape> for ParamShape {
    fn from(shape: Shape) -> Self {
        Self::known(shape)
    }
}

impl<const D: usize> From<[usize; D]> for ParamShape {
    fn from(dims: [usize; D]) -> Self {
        Self::known(dims)
    }
}

impl<const D: usize> From<[Option<usize>; D]> for ParamShape {
    fn from(dims: [Option<usize>; D]) -> Self {
        Self::new(dims.to_vec())
    }
}

/// Initialization status of a [parameter](Param).
///
/// There is no way back to `Uninitialized` once a value has been assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamState {
    /// The parameter has no value yet.
    Uninitialized,
    /// The parameter holds a value, from an initializer or a checkpoint.
    Initialized,
}

/// A learnable tensor slot of a network.
#[derive(Debug, Clone)]
pub struct Param {
    id: ParamId,
    shape: ParamShape,
    dtype: DType,
    initializer: Option<Initializer>,
    value: Option<TensorData>,
}

impl Param {
    /// Creates a parameter without value, to be filled by an initializer or a checkpoint.
    pub fn uninitialized<S: Into<ParamShape>>(shape: S, dtype: DType) -> Self {
        Self {
            id: ParamId::new(),
            shape: shape.into(),
            dtype,
            initializer: None,
            value: None,
        }
    }

    /// Creates an initialized parameter holding the given value.
    pub fn initialized(value: TensorData) -> Self {
        Self {
            id: ParamId::new(),
            shape: ParamShape::known(value.shape()),
            dtype: value.dtype(),
            initializer: None,
            value: Some(value),
        }
    }

    /// Sets the initializer used for this parameter instead of the registry-wide one.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// The parameter id.
    pub fn id(&self) -> ParamId {
        self.id
    }

    /// The declared shape.
    pub fn shape(&self) -> &ParamShape {
        &self.shape
    }

    /// The element type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The initializer override, if any.
    pub fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }

    /// The current value, if initialized.
    pub fn value(&self) -> Option<&TensorData> {
        self.value.as_ref()
    }

    /// The initialization status.
    pub fn state(&self) -> ParamState {
        match self.value {
            Some(_) => ParamState::Initialized,
            None => ParamState::Uninitialized,
        }
    }

    /// Returns true if the parameter holds a value.
    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// Number of scalar values, or 0 while the shape is still deferred.
    pub fn num_params(&self) -> usize {
        match (&self.value, self.shape.to_shape()) {
            (Some(value), _) => value.num_elements(),
            (None, Some(shape)) => shape.num_elements(),
            (None, None) => 0,
        }
    }

    /// Replaces the value and resolves the declared shape. Callers check compatibility.
    pub(crate) fn assign(&mut self, value: TensorData) {
        self.shape = ParamShape::known(value.shape());
        self.value = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_ids_are_unique() {
        let a = ParamId::new();
        let b = ParamId::new();

        assert_ne!(a, b);
    }

    #[test]
    fn deferred_shape_resolves_from_input_features() {
        let shape = ParamShape::from([None, Some(256)]);

        assert!(!shape.is_complete());
        assert_eq!(shape.to_string(), "[?, 256]");
        assert_eq!(shape.resolve(&Shape::new([2, 20])), Some(Shape::new([20, 256])));
        assert_eq!(shape.resolve(&Shape::from(Vec::new())), None);
    }

    #[test]
    fn compatibility_ignores_deferred_dims() {
        let shape = ParamShape::from([None, Some(10)]);

        assert!(shape.is_compatible(&Shape::new([256, 10])));
        assert!(!shape.is_compatible(&Shape::new([256, 11])));
        assert!(!shape.is_compatible(&Shape::new([10])));
    }

    #[test]
    fn assign_moves_param_to_initialized() {
        let mut param = Param::uninitialized([None, Some(2)], DType::F32);
        assert_eq!(param.state(), ParamState::Uninitialized);
        assert_eq!(param.num_params(), 0);

        param.assign(TensorData::zeros([3, 2], DType::F32));

        assert_eq!(param.state(), ParamState::Initialized);
        assert_eq!(param.shape(), &ParamShape::known([3, 2]));
        assert_eq!(param.num_params(), 6);
    }
}
