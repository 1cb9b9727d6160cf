use rand::{Rng, RngCore, distributions::Standard};

/// Distribution for random value of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Distribution {
    /// Uniform distribution from 0 (inclusive) to 1 (exclusive).
    Default,

    /// Uniform distribution. The range is inclusive.
    Uniform(f64, f64),

    /// Normal distribution with the given mean and standard deviation.
    Normal(f64, f64),
}

/// Error returned when a distribution is built with invalid parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The uniform range is empty or not finite.
    #[error("Invalid uniform range [{low}, {high}]")]
    InvalidRange {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },

    /// The normal standard deviation is negative or not finite.
    #[error("Invalid normal standard deviation {0}")]
    InvalidStd(f64),
}

/// Distribution sampler for random value of a tensor.
#[derive(new)]
pub struct DistributionSampler<'a, R>
where
    R: RngCore,
{
    kind: DistributionSamplerKind,
    rng: &'a mut R,
}

/// Distribution sampler kind for random value of a tensor.
pub enum DistributionSamplerKind {
    /// Standard distribution.
    Standard(Standard),

    /// Uniform distribution.
    Uniform(rand::distributions::Uniform<f64>),

    /// Normal distribution.
    Normal(rand_distr::Normal<f64>),
}

impl<R> DistributionSampler<'_, R>
where
    R: RngCore,
{
    /// Samples a random value from the distribution.
    pub fn sample(&mut self) -> f64 {
        match &self.kind {
            DistributionSamplerKind::Standard(distribution) => self.rng.sample(distribution),
            DistributionSamplerKind::Uniform(distribution) => self.rng.sample(distribution),
            DistributionSamplerKind::Normal(distribution) => self.rng.sample(distribution),
        }
    }
}

impl Distribution {
    /// Creates a new distribution sampler.
    ///
    /// # Arguments
    ///
    /// * `rng` - The random number generator.
    ///
    /// # Returns
    ///
    /// The distribution sampler, or an error if the distribution parameters are invalid.
    pub fn sampler<R>(self, rng: &'_ mut R) -> Result<DistributionSampler<'_, R>, DistributionError>
    where
        R: RngCore,
    {
        let kind = match self {
            Distribution::Default => DistributionSamplerKind::Standard(Standard),
            Distribution::Uniform(low, high) => {
                if !(low <= high && (high - low).is_finite()) {
                    return Err(DistributionError::InvalidRange { low, high });
                }
                DistributionSamplerKind::Uniform(rand::distributions::Uniform::new_inclusive(
                    low, high,
                ))
            }
            Distribution::Normal(mean, std) => {
                if !(std >= 0.0 && std.is_finite()) {
                    return Err(DistributionError::InvalidStd(std));
                }
                DistributionSamplerKind::Normal(
                    rand_distr::Normal::new(mean, std)
                        .map_err(|_| DistributionError::InvalidStd(std))?,
                )
            }
        };

        Ok(DistributionSampler::new(kind, rng))
    }
}
