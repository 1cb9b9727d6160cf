use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::linear::{default_bias, default_dtype};
use super::{Activation, Initializer, Linear, LinearConfig, ModuleError};
use crate::config::Config;
use crate::module::{ParamRegistry, RegistryError};
use crate::tensor::{DType, Shape, TensorData};

/// Configuration to create a [multilayer perceptron](Mlp) using the [init function](MlpConfig::init).
#[derive(new, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Output size of every hidden layer, in order.
    pub hidden: Vec<usize>,
    /// Output size of the last layer.
    pub d_output: usize,
    /// Input size. `None` defers it until the network is initialized with an input shape.
    #[new(default)]
    #[serde(default)]
    pub d_input: Option<usize>,
    /// Activation applied after every hidden layer.
    #[new(default)]
    #[serde(default)]
    pub activation: Activation,
    /// If the dense layers have a bias.
    #[new(value = "true")]
    #[serde(default = "default_bias")]
    pub bias: bool,
    /// Initializer applied to every weight.
    #[new(default)]
    #[serde(default)]
    pub initializer: Initializer,
    /// Element type of the parameters.
    #[new(value = "DType::F32")]
    #[serde(default = "default_dtype")]
    pub dtype: DType,
}

impl Config for MlpConfig {}

impl MlpConfig {
    /// Sets the input size.
    pub fn with_d_input(mut self, d_input: usize) -> Self {
        self.d_input = Some(d_input);
        self
    }

    /// Sets the activation between layers.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets whether the dense layers have a bias.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the weight initializer.
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    /// Sets the element type of the parameters.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Builds the network with uninitialized parameters.
    ///
    /// Layers are named `dense0`, `dense1`, ... in order, so two networks built from equal
    /// configs have the same parameter names in the same order.
    pub fn init(&self) -> Result<Mlp, RegistryError> {
        let mut params = ParamRegistry::new();
        let mut layers = Vec::with_capacity(self.hidden.len() + 1);
        let mut d_input = self.d_input;

        for (index, d_output) in self.hidden.iter().chain([&self.d_output]).enumerate() {
            let mut config = LinearConfig::new(*d_output)
                .with_bias(self.bias)
                .with_dtype(self.dtype);
            config.d_input = d_input;

            layers.push(config.init(&format!("dense{index}"), &mut params)?);
            d_input = Some(*d_output);
        }

        Ok(Mlp {
            layers,
            activation: self.activation,
            initializer: self.initializer.clone(),
            params,
        })
    }
}

/// Multilayer perceptron: dense layers with an activation between them.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Linear>,
    activation: Activation,
    initializer: Initializer,
    params: ParamRegistry,
}

impl Mlp {
    /// The parameters of the network.
    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    /// The parameters of the network, mutably.
    pub fn params_mut(&mut self) -> &mut ParamRegistry {
        &mut self.params
    }

    /// The dense layers in order.
    pub fn layers(&self) -> &[Linear] {
        &self.layers
    }

    /// Initializes every parameter that has no value yet.
    ///
    /// Deferred input sizes are resolved from the feature count of `input_shape`.
    pub fn initialize<R: RngCore>(
        &mut self,
        input_shape: &Shape,
        rng: &mut R,
    ) -> Result<usize, RegistryError> {
        self.params.initialize(&self.initializer, input_shape, rng)
    }

    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., d_input]`
    /// - output: `[..., d_output]`
    pub fn forward(&self, input: &TensorData) -> Result<TensorData, ModuleError> {
        let last = self.layers.len().saturating_sub(1);
        let mut x = input.clone();

        for (index, layer) in self.layers.iter().enumerate() {
            x = layer.forward(&self.params, &x)?;
            if index < last {
                x = self.activation.forward(x)?;
            }
        }

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ParamShape;
    use crate::test_utils::rng;

    #[test]
    fn init_names_layers_in_order() {
        let mlp = MlpConfig::new(vec![256], 10).init().unwrap();

        assert_eq!(
            mlp.params().names(),
            vec!["dense0.weight", "dense0.bias", "dense1.weight", "dense1.bias"]
        );
        assert_eq!(
            mlp.params().get("dense1.weight").unwrap().shape(),
            &ParamShape::known([256, 10])
        );
        assert!(!mlp.params().is_initialized());
    }

    #[test]
    fn initialize_infers_input_size() {
        let mut mlp = MlpConfig::new(vec![256], 10).init().unwrap();

        let count = mlp.initialize(&Shape::new([2, 20]), &mut rng()).unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            mlp.params().get("dense0.weight").unwrap().shape(),
            &ParamShape::known([20, 256])
        );
        assert_eq!(mlp.params().num_params(), 20 * 256 + 256 + 256 * 10 + 10);
    }

    #[test]
    fn forward_produces_output_features() {
        let mut mlp = MlpConfig::new(vec![8], 3).with_d_input(4).init().unwrap();
        mlp.initialize(&Shape::new([4]), &mut rng()).unwrap();

        let input = TensorData::new(vec![0.5f32; 8], [2, 4]);
        let output = mlp.forward(&input).unwrap();

        assert_eq!(output.shape(), &Shape::new([2, 3]));
    }

    #[test]
    fn identity_activation_with_ones_is_a_sum() {
        let mut mlp = MlpConfig::new(vec![2], 1)
            .with_d_input(3)
            .with_activation(Activation::Identity)
            .with_initializer(Initializer::Ones)
            .init()
            .unwrap();
        mlp.initialize(&Shape::new([3]), &mut rng()).unwrap();

        let input = TensorData::new(vec![1.0f32, -2.0, 4.0], [3]);

        assert_eq!(
            mlp.forward(&input).unwrap(),
            TensorData::new(vec![6.0f32], [1])
        );
    }
}
