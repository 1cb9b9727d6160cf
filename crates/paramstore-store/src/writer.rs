use std::io::Write;

use hashbrown::HashSet;
use paramstore_core::module::ParamRegistry;
use paramstore_tensor::TensorData;

use crate::codec::{RecordHeader, encode_into};
use crate::{CheckpointError, CodecError};

/// Streaming writer of checkpoint entries.
///
/// Each entry is written as soon as it is given. If a write fails, the bytes already handed to
/// the sink do not form a valid checkpoint and must be discarded.
pub struct CheckpointWriter<W: Write> {
    sink: W,
    names: HashSet<String>,
}

impl<W: Write> CheckpointWriter<W> {
    /// Creates a writer over the given sink.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            names: HashSet::new(),
        }
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.names.len()
    }

    /// Writes one named tensor.
    ///
    /// Names must be unique within a checkpoint.
    pub fn write_entry(&mut self, name: &str, tensor: &TensorData) -> Result<(), CheckpointError> {
        if self.names.contains(name) {
            return Err(CheckpointError::Format(format!(
                "duplicate entry \"{name}\""
            )));
        }

        let name_len = u32::try_from(name.len()).map_err(|_| {
            CheckpointError::Format(format!("name of {} bytes is too long", name.len()))
        })?;

        let header = RecordHeader::new(tensor.dtype(), tensor.shape().clone()).map_err(
            |source| CheckpointError::Codec {
                name: name.to_string(),
                source,
            },
        )?;

        let record_len = header.size() + tensor.size_in_bytes();
        let record_len = u32::try_from(record_len).map_err(|_| CheckpointError::Codec {
            name: name.to_string(),
            source: CodecError::Format(format!(
                "record of {record_len} bytes does not fit a checkpoint entry"
            )),
        })?;

        self.write(&name_len.to_le_bytes())?;
        self.write(name.as_bytes())?;
        self.write(&record_len.to_le_bytes())?;
        encode_into(tensor, &mut self.sink).map_err(CheckpointError::IoWrite)?;

        log::debug!("Saved {name} ({record_len} bytes)");
        self.names.insert(name.to_string());

        Ok(())
    }

    /// Flushes the sink and returns it.
    pub fn finish(mut self) -> Result<W, CheckpointError> {
        self.sink.flush().map_err(CheckpointError::IoWrite)?;
        Ok(self.sink)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), CheckpointError> {
        self.sink.write_all(bytes).map_err(CheckpointError::IoWrite)
    }
}

/// Saves every parameter of the registry, in registration order, to the sink.
///
/// Fails before writing anything if a parameter is not initialized.
pub fn save<W: Write>(registry: &ParamRegistry, sink: W) -> Result<(), CheckpointError> {
    save_tensors(initialized_values(registry)?, sink)
}

/// Saves named tensors, in iteration order, to the sink.
pub fn save_tensors<'a, I, W>(tensors: I, sink: W) -> Result<(), CheckpointError>
where
    I: IntoIterator<Item = (&'a str, &'a TensorData)>,
    W: Write,
{
    let mut writer = CheckpointWriter::new(sink);
    for (name, tensor) in tensors {
        writer.write_entry(name, tensor)?;
    }
    writer.finish()?;

    Ok(())
}

/// Values of every parameter in registration order, or the name of the first one without value.
pub(crate) fn initialized_values(
    registry: &ParamRegistry,
) -> Result<Vec<(&str, &TensorData)>, CheckpointError> {
    registry
        .iter()
        .map(|(name, param)| match param.value() {
            Some(value) => Ok((name, value)),
            None => Err(CheckpointError::Uninitialized(name.to_string())),
        })
        .collect()
}
