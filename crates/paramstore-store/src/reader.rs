use std::io::{ErrorKind, Read};

use hashbrown::HashSet;
use paramstore_core::module::ParamRegistry;
use paramstore_tensor::{HeapAllocator, TensorAllocator, TensorData};

use crate::codec::decode;
use crate::{CheckpointError, Mismatch};

/// Streaming reader of checkpoint entries.
///
/// Yields `(name, tensor)` pairs in file order until the source ends cleanly at an entry
/// boundary. After the first error the reader yields nothing more.
pub struct CheckpointReader<R: Read, A: TensorAllocator = HeapAllocator> {
    source: R,
    allocator: A,
    names: HashSet<String>,
    done: bool,
}

impl<R: Read> CheckpointReader<R> {
    /// Creates a reader allocating tensors on the heap.
    pub fn new(source: R) -> Self {
        Self::with_allocator(source, HeapAllocator::new())
    }
}

impl<R: Read, A: TensorAllocator> CheckpointReader<R, A> {
    /// Creates a reader using the given allocator for decoded tensors.
    pub fn with_allocator(source: R, allocator: A) -> Self {
        Self {
            source,
            allocator,
            names: HashSet::new(),
            done: false,
        }
    }

    /// Reads the next entry, or `None` at the end of the checkpoint.
    pub fn read_entry(&mut self) -> Result<Option<(String, TensorData)>, CheckpointError> {
        let Some(name_len) = self.read_len_or_eof()? else {
            return Ok(None);
        };

        let name = self.read_chunk(name_len, "entry name")?;
        let name = String::from_utf8(name)
            .map_err(|_| CheckpointError::Format("entry name is not valid UTF-8".to_string()))?;

        if self.names.contains(&name) {
            return Err(CheckpointError::Format(format!(
                "duplicate entry \"{name}\""
            )));
        }

        let record_len = self.read_len(&name)?;
        let record = self.read_chunk(record_len, &name)?;

        let tensor = decode(&record, &mut self.allocator).map_err(|source| {
            CheckpointError::Codec {
                name: name.clone(),
                source,
            }
        })?;

        log::debug!("Loaded {name} ({record_len} bytes)");
        self.names.insert(name.clone());

        Ok(Some((name, tensor)))
    }

    /// Reads a length prefix, returning `None` if the source is exhausted before its first byte.
    fn read_len_or_eof(&mut self) -> Result<Option<usize>, CheckpointError> {
        let mut bytes = [0u8; 4];
        let mut filled = 0;

        while filled < bytes.len() {
            match self.source.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CheckpointError::IoRead(err)),
            }
        }

        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_le_bytes(bytes) as usize)),
            _ => Err(CheckpointError::TruncatedInput(format!(
                "name length cut after {filled} of 4 bytes"
            ))),
        }
    }

    fn read_len(&mut self, name: &str) -> Result<usize, CheckpointError> {
        let mut bytes = [0u8; 4];
        self.source.read_exact(&mut bytes).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => CheckpointError::TruncatedInput(format!(
                "record length of \"{name}\" is missing"
            )),
            _ => CheckpointError::IoRead(err),
        })?;

        Ok(u32::from_le_bytes(bytes) as usize)
    }

    /// Reads exactly `len` bytes. The buffer grows with the bytes actually read, so a corrupt
    /// length cannot trigger a large allocation on its own.
    fn read_chunk(&mut self, len: usize, what: &str) -> Result<Vec<u8>, CheckpointError> {
        let mut buffer = Vec::new();
        (&mut self.source)
            .take(len as u64)
            .read_to_end(&mut buffer)
            .map_err(CheckpointError::IoRead)?;

        if buffer.len() < len {
            return Err(CheckpointError::TruncatedInput(format!(
                "{what}: expected {len} bytes, got {}",
                buffer.len()
            )));
        }

        Ok(buffer)
    }
}

impl<R: Read, A: TensorAllocator> Iterator for CheckpointReader<R, A> {
    type Item = Result<(String, TensorData), CheckpointError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Loads a checkpoint into the registry, binding entries to parameters by name.
///
/// Every parameter of the registry must be present in the checkpoint with its declared data
/// type and a compatible shape, and every entry must match a parameter. Deferred dimensions
/// are resolved from the loaded tensors.
///
/// Returns the names of the loaded parameters in checkpoint order. On failure, parameters
/// assigned before the error keep their new value.
pub fn load<R: Read>(source: R, registry: &mut ParamRegistry) -> Result<Vec<String>, CheckpointError> {
    load_with(source, registry, HeapAllocator::new())
}

/// Same as [load], with a custom allocator for decoded tensors.
pub fn load_with<R: Read, A: TensorAllocator>(
    source: R,
    registry: &mut ParamRegistry,
    allocator: A,
) -> Result<Vec<String>, CheckpointError> {
    let mut loaded = Vec::with_capacity(registry.len());

    let result = bind(
        CheckpointReader::with_allocator(source, allocator),
        registry,
        &mut loaded,
    );

    if let Err(err) = &result {
        if !loaded.is_empty() {
            log::warn!(
                "Checkpoint load failed after updating {} parameters: {err}",
                loaded.len()
            );
        }
    }

    result.map(|_| loaded)
}

fn bind<R: Read, A: TensorAllocator>(
    reader: CheckpointReader<R, A>,
    registry: &mut ParamRegistry,
    loaded: &mut Vec<String>,
) -> Result<(), CheckpointError> {
    for entry in reader {
        let (name, tensor) = entry?;

        if !registry.contains(&name) {
            return Err(Mismatch::UnexpectedParam(name).into());
        }
        registry.set(&name, tensor).map_err(Mismatch::Param)?;

        loaded.push(name);
    }

    if loaded.len() != registry.len() {
        let found = loaded.iter().map(String::as_str).collect::<HashSet<_>>();
        let missing = registry
            .names()
            .into_iter()
            .filter(|name| !found.contains(name))
            .map(str::to_string)
            .collect::<Vec<_>>();

        return Err(Mismatch::MissingParams(missing).into());
    }

    Ok(())
}

/// Loads every entry of a checkpoint, in file order, without binding them to a registry.
pub fn load_tensors<R: Read>(source: R) -> Result<Vec<(String, TensorData)>, CheckpointError> {
    load_tensors_with(source, HeapAllocator::new())
}

/// Same as [load_tensors], with a custom allocator for decoded tensors.
pub fn load_tensors_with<R: Read, A: TensorAllocator>(
    source: R,
    allocator: A,
) -> Result<Vec<(String, TensorData)>, CheckpointError> {
    CheckpointReader::with_allocator(source, allocator).collect()
}
