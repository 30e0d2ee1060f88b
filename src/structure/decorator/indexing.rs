//! Index listing for index directories.

use std::path::Path;

use tracing::debug;

use crate::error::AssemblyResult;
use crate::sink::OutputSink;
use crate::structure::{
    DirectoryNode, File, FileNode, IndexDirectory, IndexKey, IndexStack, Node, Writable,
};

/// Name of the listing file unless overridden
pub const DEFAULT_INDEX_FILE_NAME: &str = "index";

/// Adds a file listing the generated subdirectories of an [`IndexDirectory`]
/// as a JSON array of names, so clients can discover which index values
/// exist without listing the directory.
pub struct IndexingDecorator<T: IndexKey> {
    directory: IndexDirectory<T>,
    file_name: String,
}

impl<T: IndexKey> IndexingDecorator<T> {
    pub fn new(directory: IndexDirectory<T>) -> Self {
        Self {
            directory,
            file_name: DEFAULT_INDEX_FILE_NAME.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn inner(&self) -> &IndexDirectory<T> {
        &self.directory
    }
}

impl<T: IndexKey> Writable for IndexingDecorator<T> {
    fn name(&self) -> &str {
        self.directory.name()
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        self.directory.prepare(indices)?;

        let listing = serde_json::to_vec(self.directory.generated_names())?;
        debug!(
            directory = %self.directory.name(),
            entries = self.directory.generated_names().len(),
            "adding index listing"
        );
        self.directory
            .add_file(Box::new(File::new(self.file_name.clone(), listing)))
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        self.directory.write(sink, parent)
    }
}

impl<T: IndexKey> DirectoryNode for IndexingDecorator<T> {
    fn add_file(&mut self, file: Box<dyn FileNode>) -> AssemblyResult<()> {
        self.directory.add_file(file)
    }

    fn add_directory(&mut self, directory: Box<dyn DirectoryNode>) -> AssemblyResult<()> {
        self.directory.add_directory(directory)
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.directory.child(name)
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        self.directory.children()
    }
}
