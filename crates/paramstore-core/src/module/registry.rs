use hashbrown::HashMap;
use rand::RngCore;

use super::{Param, ParamShape};
use crate::nn::Initializer;
use crate::tensor::{DType, DistributionError, Shape, TensorData};

/// Error that can occur when using a [parameter registry](ParamRegistry).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A parameter with the same name is already registered.
    #[error("Parameter \"{0}\" is already registered")]
    DuplicateName(String),

    /// No parameter is registered under the name.
    #[error("Parameter \"{0}\" not found")]
    NotFound(String),

    /// A deferred dimension could not be resolved from the input shape.
    #[error("Cannot infer the shape {declared} of parameter \"{name}\" from input shape {input}")]
    ShapeInference {
        /// Parameter name.
        name: String,
        /// Declared shape of the parameter.
        declared: ParamShape,
        /// Input shape used for inference.
        input: Shape,
    },

    /// A value does not fit the declared shape of the parameter.
    #[error("Shape mismatch for parameter \"{name}\": declared {expected}, found {found}")]
    ShapeMismatch {
        /// Parameter name.
        name: String,
        /// Declared shape.
        expected: ParamShape,
        /// Shape of the value.
        found: Shape,
    },

    /// A value does not have the data type of the parameter.
    #[error("Type mismatch for parameter \"{name}\": declared {expected}, found {found}")]
    DTypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared data type.
        expected: DType,
        /// Data type of the value.
        found: DType,
    },

    /// The initializer could not produce a value.
    #[error("Failed to initialize parameter \"{name}\": {source}")]
    Initializer {
        /// Parameter name.
        name: String,
        /// Underlying distribution error.
        source: DistributionError,
    },
}

/// Ordered, name-keyed collection of the parameters of one network.
///
/// Iteration follows registration order, which is the construction order of the layers.
/// Every iteration is a fresh pass over the same sequence.
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    entries: Vec<(String, Param)>,
    index: HashMap<String, usize>,
}

impl ParamRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parameter under a unique name.
    pub fn register<N: Into<String>>(
        &mut self,
        name: N,
        param: Param,
    ) -> Result<&mut Param, RegistryError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let position = self.entries.len();
        self.index.insert(name.clone(), position);
        self.entries.push((name, param));

        Ok(&mut self.entries[position].1)
    }

    /// Gets the parameter registered under the name.
    pub fn get(&self, name: &str) -> Result<&Param, RegistryError> {
        self.index
            .get(name)
            .map(|position| &self.entries[*position].1)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Gets the parameter registered under the name mutably.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Param, RegistryError> {
        match self.index.get(name) {
            Some(position) => Ok(&mut self.entries[*position].1),
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    /// Returns true if a parameter is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates over the parameters in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Param)> + '_ {
        self.entries
            .iter()
            .map(|(name, param)| (name.as_str(), param))
    }

    /// The parameter names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parameter is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of scalar values over all parameters with a known shape.
    pub fn num_params(&self) -> usize {
        self.entries.iter().map(|(_, param)| param.num_params()).sum()
    }

    /// Returns true if every parameter holds a value.
    pub fn is_initialized(&self) -> bool {
        self.entries.iter().all(|(_, param)| param.is_initialized())
    }

    /// Overwrites the value of a parameter, marking it initialized.
    ///
    /// The value must have the parameter's data type and agree with every known dimension of
    /// its declared shape.
    pub fn set(&mut self, name: &str, value: TensorData) -> Result<(), RegistryError> {
        let param = self.get_mut(name)?;

        if value.dtype() != param.dtype() {
            return Err(RegistryError::DTypeMismatch {
                name: name.to_string(),
                expected: param.dtype(),
                found: value.dtype(),
            });
        }

        if !param.shape().is_compatible(value.shape()) {
            return Err(RegistryError::ShapeMismatch {
                name: name.to_string(),
                expected: param.shape().clone(),
                found: value.shape().clone(),
            });
        }

        param.assign(value);
        Ok(())
    }

    /// Initializes every uninitialized parameter, in registration order.
    ///
    /// Deferred dimensions are resolved from the feature count of `input_shape`. Parameters
    /// carrying their own initializer use it; the others use `initializer`. Parameters that
    /// already hold a value are left untouched.
    ///
    /// # Returns
    ///
    /// The number of parameters that were initialized by this call.
    pub fn initialize<R: RngCore>(
        &mut self,
        initializer: &Initializer,
        input_shape: &Shape,
        rng: &mut R,
    ) -> Result<usize, RegistryError> {
        let mut count = 0;

        for (name, param) in self.entries.iter_mut() {
            if param.is_initialized() {
                continue;
            }

            let shape = param.shape().resolve(input_shape).ok_or_else(|| {
                RegistryError::ShapeInference {
                    name: name.clone(),
                    declared: param.shape().clone(),
                    input: input_shape.clone(),
                }
            })?;

            let value = param
                .initializer()
                .unwrap_or(initializer)
                .init(shape, param.dtype(), rng)
                .map_err(|source| RegistryError::Initializer {
                    name: name.clone(),
                    source,
                })?;

            log::debug!("Initialized parameter {name} with shape {}", value.shape());
            param.assign(value);
            count += 1;
        }

        Ok(count)
    }
}

impl<'a> IntoIterator for &'a ParamRegistry {
    type Item = (&'a str, &'a Param);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Param)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ParamState;
    use crate::test_utils::rng;

    fn registry() -> ParamRegistry {
        let mut registry = ParamRegistry::new();
        registry
            .register("dense0.weight", Param::uninitialized([None, Some(4)], DType::F32))
            .unwrap();
        registry
            .register(
                "dense0.bias",
                Param::uninitialized([4], DType::F32).with_initializer(Initializer::Zeros),
            )
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register("dense0.bias", Param::uninitialized([4], DType::F32))
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateName("dense0.bias".to_string()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn get_unknown_name_fails() {
        let registry = registry();

        assert_eq!(
            registry.get("dense1.weight").unwrap_err(),
            RegistryError::NotFound("dense1.weight".to_string())
        );
    }

    #[test]
    fn iteration_is_ordered_and_restartable() {
        let registry = registry();
        let first = registry.iter().map(|(name, _)| name).collect::<Vec<_>>();
        let second = registry.iter().map(|(name, _)| name).collect::<Vec<_>>();

        assert_eq!(first, vec!["dense0.weight", "dense0.bias"]);
        assert_eq!(first, second);
        assert_eq!(registry.names(), first);
    }

    #[test]
    fn initialize_resolves_deferred_shapes_and_uses_overrides() {
        let mut registry = registry();
        let count = registry
            .initialize(
                &Initializer::Ones,
                &Shape::new([1, 3]),
                &mut rng(),
            )
            .unwrap();

        assert_eq!(count, 2);
        assert!(registry.is_initialized());
        assert_eq!(
            registry.get("dense0.weight").unwrap().value(),
            Some(&TensorData::full([3, 4], 1.0, DType::F32))
        );
        assert_eq!(
            registry.get("dense0.bias").unwrap().value(),
            Some(&TensorData::zeros([4], DType::F32))
        );
        assert_eq!(registry.num_params(), 16);
    }

    #[test]
    fn initialize_is_idempotent_per_param() {
        let mut registry = registry();
        registry
            .initialize(&Initializer::Ones, &Shape::new([3]), &mut rng())
            .unwrap();
        let before = registry.get("dense0.weight").unwrap().value().cloned();

        let count = registry
            .initialize(&Initializer::Zeros, &Shape::new([3]), &mut rng())
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(registry.get("dense0.weight").unwrap().value().cloned(), before);
    }

    #[test]
    fn initialize_without_features_fails() {
        let mut registry = registry();
        let err = registry
            .initialize(&Initializer::Ones, &Shape::from(Vec::new()), &mut rng())
            .unwrap_err();

        assert!(matches!(err, RegistryError::ShapeInference { name, .. } if name == "dense0.weight"));
        assert_eq!(
            registry.get("dense0.weight").unwrap().state(),
            ParamState::Uninitialized
        );
    }

    #[test]
    fn set_checks_dtype_and_shape() {
        let mut registry = registry();

        let err = registry
            .set("dense0.bias", TensorData::zeros([4], DType::F64))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DTypeMismatch { .. }));

        let err = registry
            .set("dense0.bias", TensorData::zeros([5], DType::F32))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ShapeMismatch { .. }));

        registry
            .set("dense0.weight", TensorData::zeros([7, 4], DType::F32))
            .unwrap();
        assert_eq!(
            registry.get("dense0.weight").unwrap().shape(),
            &ParamShape::known([7, 4])
        );
    }

    #[test]
    fn set_overwrites_initialized_value() {
        let mut registry = registry();
        registry
            .initialize(&Initializer::Ones, &Shape::new([2]), &mut rng())
            .unwrap();

        let value = TensorData::full([4], 3.0, DType::F32);
        registry.set("dense0.bias", value.clone()).unwrap();

        let param = registry.get("dense0.bias").unwrap();
        assert_eq!(param.state(), ParamState::Initialized);
        assert_eq!(param.value(), Some(&value));
    }
}
