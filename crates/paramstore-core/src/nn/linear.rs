use serde::{Deserialize, Serialize};

use super::{Initializer, ModuleError, functional};
use crate::config::Config;
use crate::module::{Param, ParamRegistry, ParamShape, RegistryError};
use crate::tensor::{DType, TensorData};

/// Configuration to create a [Linear](Linear) layer using the [init function](LinearConfig::init).
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    /// The size of the output features.
    pub d_output: usize,
    /// The size of the input features. `None` defers it until the first input shape is known.
    #[new(default)]
    #[serde(default)]
    pub d_input: Option<usize>,
    /// If a bias should be applied during the linear transformation.
    #[new(value = "true")]
    #[serde(default = "default_bias")]
    pub bias: bool,
    /// The type of function used to initialize the weight, overriding the registry-wide one.
    #[new(default)]
    #[serde(default)]
    pub initializer: Option<Initializer>,
    /// Element type of the parameters.
    #[new(value = "DType::F32")]
    #[serde(default = "default_dtype")]
    pub dtype: DType,
}

impl Config for LinearConfig {}

pub(crate) fn default_bias() -> bool {
    true
}

pub(crate) fn default_dtype() -> DType {
    DType::F32
}

impl LinearConfig {
    /// Sets the size of the input features.
    pub fn with_d_input(mut self, d_input: usize) -> Self {
        self.d_input = Some(d_input);
        self
    }

    /// Sets whether a bias is applied.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the weight initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Sets the element type of the parameters.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Registers the parameters of the layer under `name` and returns the layer.
    ///
    /// The weight is registered as `{name}.weight` with shape `[d_input, d_output]` and the
    /// bias, initialized to zeros, as `{name}.bias` with shape `[d_output]`. Both start
    /// uninitialized.
    pub fn init(&self, name: &str, params: &mut ParamRegistry) -> Result<Linear, RegistryError> {
        let weight_name = format!("{name}.weight");
        let mut weight = Param::uninitialized(
            ParamShape::new(vec![self.d_input, Some(self.d_output)]),
            self.dtype,
        );
        if let Some(initializer) = &self.initializer {
            weight = weight.with_initializer(initializer.clone());
        }
        params.register(weight_name.clone(), weight)?;

        let bias_name = if self.bias {
            let bias_name = format!("{name}.bias");
            let bias = Param::uninitialized([self.d_output], self.dtype)
                .with_initializer(Initializer::Zeros);
            params.register(bias_name.clone(), bias)?;
            Some(bias_name)
        } else {
            None
        };

        Ok(Linear {
            weight: weight_name,
            bias: bias_name,
            d_output: self.d_output,
        })
    }
}

/// Applies a linear transformation to the input tensor:
///
/// `O = IW + b`
///
/// The layer only knows the names of its parameters; their values live in the network's
/// [registry](ParamRegistry).
#[derive(Debug, Clone)]
pub struct Linear {
    weight: String,
    bias: Option<String>,
    d_output: usize,
}

impl Linear {
    /// Name of the weight parameter.
    pub fn weight_name(&self) -> &str {
        &self.weight
    }

    /// Name of the bias parameter, if any.
    pub fn bias_name(&self) -> Option<&str> {
        self.bias.as_deref()
    }

    /// The size of the output features.
    pub fn d_output(&self) -> usize {
        self.d_output
    }

    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., d_input]`
    /// - output: `[..., d_output]`
    pub fn forward(
        &self,
        params: &ParamRegistry,
        input: &TensorData,
    ) -> Result<TensorData, ModuleError> {
        let weight = value(params, &self.weight)?;
        let bias = match &self.bias {
            Some(name) => Some(value(params, name)?),
            None => None,
        };

        functional::linear(input, weight, bias)
    }
}

fn value<'a>(params: &'a ParamRegistry, name: &str) -> Result<&'a TensorData, ModuleError> {
    params
        .get(name)?
        .value()
        .ok_or_else(|| ModuleError::Uninitialized(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Shape;
    use crate::test_utils::rng;

    #[test]
    fn init_registers_weight_and_bias() {
        let mut params = ParamRegistry::new();
        let linear = LinearConfig::new(4).init("fc", &mut params).unwrap();

        assert_eq!(params.names(), vec!["fc.weight", "fc.bias"]);
        assert_eq!(linear.weight_name(), "fc.weight");
        assert_eq!(linear.bias_name(), Some("fc.bias"));
        assert_eq!(
            params.get("fc.weight").unwrap().shape(),
            &ParamShape::new(vec![None, Some(4)])
        );
    }

    #[test]
    fn init_without_bias() {
        let mut params = ParamRegistry::new();
        let linear = LinearConfig::new(4)
            .with_d_input(3)
            .with_bias(false)
            .init("fc", &mut params)
            .unwrap();

        assert_eq!(params.len(), 1);
        assert_eq!(linear.bias_name(), None);
        assert_eq!(params.num_params(), 12);
    }

    #[test]
    fn same_name_twice_is_rejected() {
        let mut params = ParamRegistry::new();
        LinearConfig::new(4).init("fc", &mut params).unwrap();

        let err = LinearConfig::new(2).init("fc", &mut params).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateName("fc.weight".to_string()));
    }

    #[test]
    fn forward_before_initialize_fails() {
        let mut params = ParamRegistry::new();
        let linear = LinearConfig::new(2).init("fc", &mut params).unwrap();
        let input = TensorData::zeros([1, 3], DType::F32);

        assert_eq!(
            linear.forward(&params, &input).unwrap_err(),
            ModuleError::Uninitialized("fc.weight".to_string())
        );
    }

    #[test]
    fn forward_with_constant_weights() {
        let mut params = ParamRegistry::new();
        let linear = LinearConfig::new(2)
            .with_initializer(Initializer::Constant { value: 2.0 })
            .init("fc", &mut params)
            .unwrap();
        params
            .initialize(&Initializer::Ones, &Shape::new([1, 3]), &mut rng())
            .unwrap();

        let input = TensorData::new(vec![1.0f32, 1.0, 1.0], [1, 3]);
        let output = linear.forward(&params, &input).unwrap();

        assert_eq!(output, TensorData::new(vec![6.0f32, 6.0], [1, 2]));
    }
}
