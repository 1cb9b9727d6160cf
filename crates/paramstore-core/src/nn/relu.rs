use serde::{Deserialize, Serialize};

use super::{ModuleError, functional};
use crate::tensor::TensorData;

/// Applies the rectified linear unit function element-wise:
///
/// `y = max(0, x)`
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    /// Create the module.
    pub fn new() -> Self {
        Self
    }

    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward(&self, input: &TensorData) -> Result<TensorData, ModuleError> {
        functional::relu(input)
    }
}

/// Activation applied between dense layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Rectified linear unit.
    #[default]
    Relu,
    /// No activation.
    Identity,
}

impl Activation {
    /// Applies the activation on the input tensor.
    pub fn forward(&self, input: TensorData) -> Result<TensorData, ModuleError> {
        match self {
            Activation::Relu => Relu::new().forward(&input),
            Activation::Identity => Ok(input),
        }
    }
}
