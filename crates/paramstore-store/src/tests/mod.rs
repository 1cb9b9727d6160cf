
use paramstore_core::module::ParamRegistry;
use paramstore_core::nn::{Mlp, MlpConfig};
use paramstore_tensor::Shape;
use rand::{SeedableRng, rngs::StdRng};

use crate::save;

pub(crate) fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// MLP with one hidden layer of 256 units and 10 outputs. The input size is deferred.
pub(crate) fn mlp() -> Mlp {
    MlpConfig::new(vec![256], 10).init().unwrap()
}

/// Same network initialized for 20 input features.
pub(crate) fn initialized_mlp(seed: u64) -> Mlp {
    let mut mlp = mlp();
    mlp.initialize(&Shape::new([2, 20]), &mut rng(seed)).unwrap();
    mlp
}

pub(crate) fn to_bytes(registry: &ParamRegistry) -> Vec<u8> {
    let mut bytes = Vec::new();
    save(registry, &mut bytes).unwrap();
    bytes
}

/// Encodes one raw checkpoint entry.
pub(crate) fn entry(name: &str, record: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(name.len() as u32).to_le_bytes());
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend_from_slice(&(record.len() as u32).to_le_bytes());
    bytes.extend_from_slice(record);
    bytes
}
