//! Single-file tar bundles.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use tar::{Builder, Header};

use super::stack::IndexStack;
use super::{validate_name, FileNode, Writable};
use crate::error::{AssemblyError, AssemblyResult};
use crate::sink::{sink_error, OutputSink};

/// Mode of every archive entry
const ENTRY_MODE: u32 = 0o644;

/// A file whose content is a tar archive of the files it owns.
///
/// Entries are written in name order with zeroed timestamps and ownership,
/// so the same inputs always yield the same bytes.
pub struct Archive {
    name: String,
    files: BTreeMap<String, Box<dyn FileNode>>,
}

impl Archive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn add_file(&mut self, file: Box<dyn FileNode>) -> AssemblyResult<()> {
        let name = file.name().to_string();
        validate_name(&name)?;
        if self.files.contains_key(&name) {
            return Err(AssemblyError::NameCollision {
                directory: self.name.clone(),
                name,
            });
        }
        self.files.insert(name, file);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn build(&self) -> AssemblyResult<Vec<u8>> {
        let archive_error = |source| AssemblyError::Archive {
            archive: self.name.clone(),
            source,
        };

        let mut builder = Builder::new(Vec::new());
        for (name, file) in &self.files {
            let bytes = file.bytes()?;
            let mut header = Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(ENTRY_MODE);
            header.set_mtime(0);
            header.set_uid(0);
            header.set_gid(0);
            builder
                .append_data(&mut header, name, &bytes[..])
                .map_err(archive_error)?;
        }
        builder.into_inner().map_err(archive_error)
    }
}

impl Writable for Archive {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        for file in self.files.values_mut() {
            file.prepare(indices)?;
        }
        Ok(())
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        let bytes = self.build()?;
        let path = parent.join(&self.name);
        sink.write_file(&path, &bytes).map_err(sink_error(&path))
    }
}

impl FileNode for Archive {
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>> {
        Ok(Cow::Owned(self.build()?))
    }
}
