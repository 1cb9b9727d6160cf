use rand::RngCore;

use crate::config::Config;
use crate::tensor::{DType, Distribution, DistributionError, Shape, TensorData};

/// Enum specifying with what values a tensor should be initialized
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Initializer {
    /// Fills tensor with specified value everywhere
    Constant {
        /// The value to fill the tensor with
        value: f64,
    },
    /// Fills tensor with 1s everywhere
    Ones,
    /// Fills tensor with 0s everywhere
    Zeros,
    /// Fills tensor with values drawn uniformly between specified values
    Uniform {
        /// The minimum value to draw from
        min: f64,

        /// The maximum value to draw from
        max: f64,
    },
    /// Fills tensor with values drawn from normal distribution with specified mean and std
    Normal {
        /// The mean of the normal distribution
        mean: f64,

        /// The standard deviation of the normal distribution
        std: f64,
    },
    /// Fills tensor with values drawn uniformly between -sqrt(1/fan_in) and sqrt(1/fan_in).
    NormalizedUniform,
    /// Fills tensor with values according to the uniform version of Xavier Glorot initialization
    /// described in [Understanding the difficulty of training deep feedforward neural networks
    /// ](https://proceedings.mlr.press/v9/glorot10a/glorot10a.pdf)
    XavierUniform {
        /// The gain to use in initialization formula
        gain: f64,
    },
    /// Fills tensor with values according to the normal version of Xavier Glorot initialization
    /// described in [Understanding the difficulty of training deep feedforward neural networks
    /// ](https://proceedings.mlr.press/v9/glorot10a/glorot10a.pdf)
    XavierNormal {
        /// The gain to use in initialization formula
        gain: f64,
    },
}

impl Config for Initializer {}

impl Default for Initializer {
    fn default() -> Self {
        Self::XavierUniform { gain: 1.0 }
    }
}

impl Initializer {
    /// Inits a tensor of given shape and data type with values depending on initializer kind.
    ///
    /// # Params
    ///
    /// - shape: Shape of the initiated tensor. Rank-2 weights are laid out as
    ///   `[d_input, d_output]`.
    /// - dtype: Element type of the initiated tensor.
    /// - rng: Source of randomness.
    pub fn init<S: Into<Shape>, R: RngCore>(
        &self,
        shape: S,
        dtype: DType,
        rng: &mut R,
    ) -> Result<TensorData, DistributionError> {
        let shape = shape.into();
        let (fan_in, fan_out) = fans(&shape);

        let distribution = match self {
            Self::Constant { value } => return Ok(TensorData::full(shape, *value, dtype)),
            Self::Ones => return Ok(TensorData::full(shape, 1.0, dtype)),
            Self::Zeros => return Ok(TensorData::zeros(shape, dtype)),
            Self::Uniform { min, max } => Distribution::Uniform(*min, *max),
            Self::Normal { mean, std } => Distribution::Normal(*mean, *std),
            Self::NormalizedUniform => {
                let k = (1.0 / fan_in as f64).sqrt();
                Distribution::Uniform(-k, k)
            }
            Self::XavierUniform { gain } => {
                let a = gain * (6.0 / (fan_in + fan_out) as f64).sqrt();
                Distribution::Uniform(-a, a)
            }
            Self::XavierNormal { gain } => {
                let std = gain * (2.0 / (fan_in + fan_out) as f64).sqrt();
                Distribution::Normal(0.0, std)
            }
        };

        TensorData::random(shape, dtype, distribution, rng)
    }
}

/// Fan-in and fan-out of a tensor shape.
///
/// Rank-2 shapes are `[fan_in, fan_out]`, extra trailing dimensions form the receptive field,
/// rank-1 shapes use their extent for both and scalars count as one.
fn fans(shape: &Shape) -> (usize, usize) {
    match shape.dims.as_slice() {
        [] => (1, 1),
        [extent] => (*extent, *extent),
        [fan_in, fan_out, receptive @ ..] => {
            let receptive = receptive.iter().product::<usize>();
            (fan_in * receptive, fan_out * receptive)
        }
    }
}
