use paramstore::config::Config;
use paramstore::module::{Param, ParamRegistry, RegistryError};
use paramstore::nn::{Activation, Initializer, MlpConfig};
use paramstore::store::{self, CheckpointError, FileCheckpointer};
use paramstore::tensor::{DType, Distribution, HeapAllocator, Shape, TensorData};
use rand::{SeedableRng, rngs::StdRng};
use tempfile::tempdir;

fn config() -> MlpConfig {
    MlpConfig::new(vec![256], 10)
        .with_activation(Activation::Relu)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
}

#[test]
fn integer_tensor_through_a_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x");
    let x = TensorData::new(vec![0i32, 1, 2, 3], [4]);

    std::fs::write(&path, store::encode(&x).unwrap()).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let x2 = store::decode(&bytes, &mut HeapAllocator::new()).unwrap();

    assert_eq!(x2, x);
    assert_eq!(x2.to_vec::<i32>().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn network_parameters_through_a_file() {
    let dir = tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let input = TensorData::random([2, 20], DType::F32, Distribution::Default, &mut rng).unwrap();

    let mut net = config().init().unwrap();
    net.initialize(input.shape(), &mut rng).unwrap();
    let expected = net.forward(&input).unwrap();

    let checkpointer = FileCheckpointer::new();
    checkpointer
        .save(net.params(), dir.path().join("mlp"))
        .unwrap();

    let mut net2 = config().init().unwrap();
    checkpointer
        .load(net2.params_mut(), dir.path().join("mlp"))
        .unwrap();

    for (name, param) in net.params() {
        let other = net2.params().get(name).unwrap();
        assert_eq!(param.value(), other.value());
        assert_ne!(param.id(), other.id());
    }
    assert_eq!(net2.forward(&input).unwrap(), expected);
}

#[test]
fn architecture_is_rebuilt_from_config() {
    let dir = tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let config = config().with_d_input(20);
    config.save(dir.path().join("mlp.json")).unwrap();

    let mut net = config.init().unwrap();
    net.initialize(&Shape::new([1, 20]), &mut rng).unwrap();
    let mut bytes = Vec::new();
    store::save(net.params(), &mut bytes).unwrap();

    let restored_config = MlpConfig::load(dir.path().join("mlp.json")).unwrap();
    assert_eq!(restored_config, config);

    let mut restored = restored_config.init().unwrap();
    store::load(bytes.as_slice(), restored.params_mut()).unwrap();
    assert!(restored.params().is_initialized());
}

#[test]
fn checkpoint_from_another_network_is_rejected() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut net = config().init().unwrap();
    net.initialize(&Shape::new([1, 20]), &mut rng).unwrap();
    let mut bytes = Vec::new();
    store::save(net.params(), &mut bytes).unwrap();

    let mut registry = ParamRegistry::new();
    registry
        .register("encoder.weight", Param::uninitialized([20, 256], DType::F32))
        .unwrap();

    let err = store::load(bytes.as_slice(), &mut registry).unwrap_err();
    assert!(matches!(err, CheckpointError::ArchitectureMismatch(_)));
    assert!(!registry.is_initialized());
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = ParamRegistry::new();
    registry
        .register("w", Param::uninitialized([2, 2], DType::F32))
        .unwrap();

    let err = registry
        .register("w", Param::uninitialized([2, 2], DType::F32))
        .unwrap_err();

    assert_eq!(err, RegistryError::DuplicateName("w".to_string()));
}
