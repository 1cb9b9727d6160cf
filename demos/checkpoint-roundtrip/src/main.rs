use std::path::PathBuf;

use clap::Parser;
use paramstore::config::Config;
use paramstore::nn::MlpConfig;
use paramstore::store::{FileCheckpointer, load_tensor, save_tensor};
use paramstore::tensor::{DType, Distribution, TensorData};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;

/// Saves a tensor and the parameters of a small network, then restores them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory receiving the files. A temporary directory is used when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed of the parameter initialization.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of input features.
    #[arg(long, default_value_t = 20)]
    features: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let temp = tempfile::tempdir()?;
    let dir = match &args.output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => temp.path().to_path_buf(),
    };

    tensor_roundtrip(&dir)?;
    network_roundtrip(&dir, &args)?;

    Ok(())
}

fn tensor_roundtrip(dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = dir.join("x.tensor");
    let x = TensorData::new(vec![0i32, 1, 2, 3], [4]);

    save_tensor(&path, &x)?;
    let x2 = load_tensor(&path)?;

    log::info!("{} -> {:?}", path.display(), x2.to_vec::<i32>()?);
    if x2 != x {
        return Err("tensor changed through the file".into());
    }

    Ok(())
}

fn network_roundtrip(dir: &std::path::Path, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let config = MlpConfig::new(vec![256], 10);
    config.save(dir.join("mlp.json"))?;

    let input = TensorData::random(
        [2, args.features],
        DType::F32,
        Distribution::Default,
        &mut rng,
    )?;

    let mut net = config.init()?;
    net.initialize(input.shape(), &mut rng)?;
    let y = net.forward(&input)?;

    let checkpointer = FileCheckpointer::new();
    let path = checkpointer.save(net.params(), dir.join("mlp"))?;

    let mut clone = MlpConfig::load(dir.join("mlp.json"))?.init()?;
    checkpointer.load(clone.params_mut(), &path)?;
    let y2 = clone.forward(&input)?;

    log::info!(
        "{} parameters restored from {}, outputs equal: {}",
        clone.params().num_params(),
        path.display(),
        y == y2
    );
    if y != y2 {
        return Err("restored network gives different outputs".into());
    }

    Ok(())
}
