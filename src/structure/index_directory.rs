//! Index-driven directory expansion.
//!
//! An [`IndexDirectory`] describes one level of a hierarchy declaratively:
//! "for every value the index function yields, create a directory named by
//! the formatter and fill it with these meta files and meta directories".
//! The value is pushed onto the ancestor stack for everything generated
//! below it, so nested index directories (region, then date, then hour) see
//! the full chain of values that led to them.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use tracing::{debug, instrument};

use super::directory::Directory;
use super::functional::{DirectoryFunction, FileFunction, Formatter, IndexFunction};
use super::stack::IndexStack;
use super::{validate_name, DirectoryNode, FileNode, Node, Writable};
use crate::error::{AssemblyError, AssemblyResult, BoxError};
use crate::sink::OutputSink;

/// Bounds for values an index function can yield
pub trait IndexKey: Ord + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> IndexKey for T where T: Ord + Clone + fmt::Debug + Send + Sync + 'static {}

/// A directory whose children are generated from an index function
pub struct IndexDirectory<T: IndexKey> {
    directory: Directory,
    index_function: IndexFunction<T>,
    formatter: Formatter<T>,
    meta_files: Vec<FileFunction>,
    meta_directories: Vec<DirectoryFunction>,
    generated: Vec<String>,
}

impl<T: IndexKey> IndexDirectory<T> {
    /// Create an index directory.
    ///
    /// `index_function` receives the stack of values from all index
    /// directories further up (top = closest) and returns this level's
    /// values; duplicates collapse. `formatter` turns each value into the
    /// name of its generated subdirectory.
    pub fn new<I, R, F>(name: impl Into<String>, index_function: I, formatter: F) -> Self
    where
        I: Fn(&IndexStack) -> Result<R, BoxError> + Send + Sync + 'static,
        R: IntoIterator<Item = T>,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            directory: Directory::new(name),
            index_function: Box::new(
                move |indices: &IndexStack| -> Result<BTreeSet<T>, BoxError> {
                    Ok(index_function(indices)?.into_iter().collect())
                },
            ),
            formatter: Box::new(formatter),
            meta_files: Vec::new(),
            meta_directories: Vec::new(),
            generated: Vec::new(),
        }
    }

    /// Register a file factory invoked once for every generated subdirectory
    pub fn add_file_to_all<F>(&mut self, factory: F)
    where
        F: Fn(&IndexStack) -> Box<dyn FileNode> + Send + Sync + 'static,
    {
        self.meta_files.push(Box::new(factory));
    }

    /// Register a directory factory invoked once for every generated subdirectory
    pub fn add_directory_to_all<F>(&mut self, factory: F)
    where
        F: Fn(&IndexStack) -> Box<dyn DirectoryNode> + Send + Sync + 'static,
    {
        self.meta_directories.push(Box::new(factory));
    }

    /// Evaluate the index function against `indices`
    pub fn index(&self, indices: &IndexStack) -> AssemblyResult<BTreeSet<T>> {
        (self.index_function)(indices).map_err(|source| AssemblyError::Index {
            directory: self.directory.name().to_string(),
            source,
        })
    }

    pub fn format(&self, value: &T) -> String {
        (self.formatter)(value)
    }

    /// Names of the subdirectories generated by the last `prepare`, in
    /// ascending index value order
    pub fn generated_names(&self) -> &[String] {
        &self.generated
    }

    fn expand(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        let index = self.index(indices)?;
        debug!(values = index.len(), "evaluated index");

        let mut generated = Vec::with_capacity(index.len());
        for value in index {
            let name = (self.formatter)(&value);
            validate_name(&name)?;
            if self.directory.contains(&name) {
                return Err(AssemblyError::NameCollision {
                    directory: self.directory.name().to_string(),
                    name,
                });
            }

            debug!(child = %name, value = ?value, "expanding index value");
            let child_indices = indices.push(value);
            let mut child = Directory::new(name.clone());

            for meta_file in &self.meta_files {
                let mut file = meta_file(&child_indices);
                file.prepare(&child_indices)?;
                child.add_file(file)?;
            }

            for meta_directory in &self.meta_directories {
                let mut directory = meta_directory(&child_indices);
                directory.prepare(&child_indices)?;
                child.add_directory(directory)?;
            }

            self.directory.add_directory(Box::new(child))?;
            generated.push(name);
        }

        self.generated = generated;
        Ok(())
    }
}

impl<T: IndexKey> Writable for IndexDirectory<T> {
    fn name(&self) -> &str {
        self.directory.name()
    }

    #[instrument(skip_all, fields(directory = %self.directory.name(), depth = indices.len()))]
    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        self.directory.prepare(indices)?;
        self.expand(indices)
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        self.directory.write(sink, parent)
    }
}

impl<T: IndexKey> DirectoryNode for IndexDirectory<T> {
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
