//! Checksum side files.

use std::borrow::Cow;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::AssemblyResult;
use crate::sink::{sink_error, OutputSink};
use crate::structure::{FileNode, IndexStack, Writable};

/// Extension appended to the wrapped file's name for its checksum file
pub const CHECKSUM_EXTENSION: &str = "checksum";

/// Writes the wrapped file's bytes plus `<name>.checksum` holding the
/// lowercase hex SHA-256 of exactly those bytes.
///
/// When combined with [`SigningDecorator`](super::SigningDecorator), wrap the
/// signed file so the checksum covers the envelope actually on disk.
pub struct ChecksumDecorator<F> {
    file: F,
}

impl<F: FileNode> ChecksumDecorator<F> {
    pub fn new(file: F) -> Self {
        Self { file }
    }

    pub fn inner(&self) -> &F {
        &self.file
    }

    pub fn checksum_name(&self) -> String {
        format!("{}.{}", self.file.name(), CHECKSUM_EXTENSION)
    }

    /// Hex SHA-256 of the wrapped file's bytes
    pub fn checksum(&self) -> AssemblyResult<String> {
        let bytes = self.file.bytes()?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl<F: FileNode> Writable for ChecksumDecorator<F> {
    fn name(&self) -> &str {
        self.file.name()
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        self.file.prepare(indices)
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        // one resolution serves both files
        let bytes = self.file.bytes()?;
        let checksum = hex::encode(Sha256::digest(&bytes));

        let path = parent.join(self.file.name());
        sink.write_file(&path, &bytes).map_err(sink_error(&path))?;

        let path = parent.join(self.checksum_name());
        sink.write_file(&path, checksum.as_bytes())
            .map_err(sink_error(&path))
    }
}

impl<F: FileNode> FileNode for ChecksumDecorator<F> {
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>> {
        self.file.bytes()
    }
}
