use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use paramstore_core::module::ParamRegistry;
use paramstore_tensor::TensorData;

use crate::codec::{decode, encode};
use crate::writer::initialized_values;
use crate::{CheckpointError, load, save_tensors};

/// Saves and loads parameter checkpoints to and from files.
///
/// The file extension is always set to [EXTENSION](FileCheckpointer::EXTENSION).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCheckpointer;

impl FileCheckpointer {
    /// Extension of checkpoint files.
    pub const EXTENSION: &'static str = "params";

    /// Creates a file checkpointer.
    pub fn new() -> Self {
        Self
    }

    /// Path of the checkpoint file for `path`, with the checkpoint extension.
    pub fn file_path<P: Into<PathBuf>>(&self, path: P) -> PathBuf {
        let mut path = path.into();
        path.set_extension(Self::EXTENSION);
        path
    }

    /// Saves the parameters of the registry, replacing any existing file.
    ///
    /// Returns the path of the written file.
    pub fn save<P: Into<PathBuf>>(
        &self,
        registry: &ParamRegistry,
        path: P,
    ) -> Result<PathBuf, CheckpointError> {
        let tensors = initialized_values(registry)?;

        let path = self.file_path(path);
        let file = create(&path)?;

        let mut writer = BufWriter::new(file);
        save_tensors(tensors, &mut writer)?;

        let file = writer
            .into_inner()
            .map_err(|err| CheckpointError::IoWrite(err.into_error()))?;
        file.sync_all().map_err(CheckpointError::IoWrite)?;

        log::info!(
            "Saved {} parameters to {}",
            registry.len(),
            path.display()
        );

        Ok(path)
    }

    /// Loads the checkpoint file into the registry.
    ///
    /// Returns the names of the loaded parameters.
    pub fn load<P: Into<PathBuf>>(
        &self,
        registry: &mut ParamRegistry,
        path: P,
    ) -> Result<Vec<String>, CheckpointError> {
        let path = self.file_path(path);
        let file = open(&path)?;

        let loaded = load(BufReader::new(file), registry)?;
        log::info!("Loaded {} parameters from {}", loaded.len(), path.display());

        Ok(loaded)
    }
}

/// Saves a single tensor record to a file, replacing any existing file.
pub fn save_tensor<P: AsRef<Path>>(path: P, tensor: &TensorData) -> Result<(), CheckpointError> {
    let path = path.as_ref();
    let bytes = encode(tensor).map_err(|source| CheckpointError::Codec {
        name: path.display().to_string(),
        source,
    })?;

    let mut file = create(path)?;
    file.write_all(&bytes).map_err(CheckpointError::IoWrite)?;
    file.sync_all().map_err(CheckpointError::IoWrite)
}

/// Loads a single tensor record from a file.
pub fn load_tensor<P: AsRef<Path>>(path: P) -> Result<TensorData, CheckpointError> {
    let path = path.as_ref();

    let mut bytes = Vec::new();
    open(path)?
        .read_to_end(&mut bytes)
        .map_err(CheckpointError::IoRead)?;

    decode(&bytes, &mut paramstore_tensor::HeapAllocator::new()).map_err(|source| {
        CheckpointError::Codec {
            name: path.display().to_string(),
            source,
        }
    })
}

fn open(path: &Path) -> Result<File, CheckpointError> {
    File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CheckpointError::FileNotFound(path.display().to_string()),
        _ => CheckpointError::IoRead(err),
    })
}

fn create(path: &Path) -> Result<File, CheckpointError> {
    if path.exists() {
        log::info!("File exists, replacing");
        std::fs::remove_file(path).map_err(CheckpointError::IoWrite)?;
    }

    File::create(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => CheckpointError::FileNotFound(path.display().to_string()),
        _ => CheckpointError::IoWrite(err),
    })
}
