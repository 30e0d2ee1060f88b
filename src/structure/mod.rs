//! Output tree model
//!
//! A tree is built from [`Writable`] nodes in two passes. `prepare` walks the
//! tree top-down with the ancestor [`IndexStack`], letting index directories
//! expand into concrete children and lazy files compute their content.
//! `write` then serializes every node to an [`OutputSink`].

mod archive;
mod directory;
mod file;
mod functional;
mod index_directory;
mod stack;

pub mod decorator;

pub use archive::Archive;
pub use directory::Directory;
pub use file::File;
pub use functional::{ContentFunction, DirectoryFunction, FileFunction, Formatter, IndexFunction};
pub use index_directory::{IndexDirectory, IndexKey};
pub use stack::{IndexStack, IndexValue, Iter};

use std::borrow::Cow;
use std::path::Path;

use tracing::info;

use crate::error::{AssemblyError, AssemblyResult};
use crate::sink::OutputSink;

/// Capability shared by every node of the output tree
pub trait Writable: Send + Sync {
    /// Path segment this node occupies on disk
    fn name(&self) -> &str;

    /// Propagate the ancestor stack and compute stack-dependent state.
    ///
    /// Nodes are single-use: preparing the same node twice is not supported.
    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()>;

    /// Serialize this node below `parent`
    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()>;
}

/// A leaf node with byte content
pub trait FileNode: Writable {
    /// Content as it will be written, after any decorator transform
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>>;
}

/// A node owning uniquely named children
pub trait DirectoryNode: Writable {
    fn add_file(&mut self, file: Box<dyn FileNode>) -> AssemblyResult<()>;

    fn add_directory(&mut self, directory: Box<dyn DirectoryNode>) -> AssemblyResult<()>;

    fn child(&self, name: &str) -> Option<&Node>;

    /// Children in name order
    fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_>;

    fn contains(&self, name: &str) -> bool {
        self.child(name).is_some()
    }
}

impl<W: Writable + ?Sized> Writable for Box<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        (**self).prepare(indices)
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        (**self).write(sink, parent)
    }
}

impl<F: FileNode + ?Sized> FileNode for Box<F> {
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>> {
        (**self).bytes()
    }
}

impl<D: DirectoryNode + ?Sized> DirectoryNode for Box<D> {
    fn add_file(&mut self, file: Box<dyn FileNode>) -> AssemblyResult<()> {
        (**self).add_file(file)
    }

    fn add_directory(&mut self, directory: Box<dyn DirectoryNode>) -> AssemblyResult<()> {
        (**self).add_directory(directory)
    }

    fn child(&self, name: &str) -> Option<&Node> {
        (**self).child(name)
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        (**self).children()
    }
}

/// A child owned by a directory
pub enum Node {
    File(Box<dyn FileNode>),
    Directory(Box<dyn DirectoryNode>),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::File(file) => file.name(),
            Node::Directory(directory) => directory.name(),
        }
    }

    pub fn as_file(&self) -> Option<&dyn FileNode> {
        match self {
            Node::File(file) => Some(&**file),
            Node::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&dyn DirectoryNode> {
        match self {
            Node::Directory(directory) => Some(&**directory),
            Node::File(_) => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub(crate) fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        match self {
            Node::File(file) => file.prepare(indices),
            Node::Directory(directory) => directory.prepare(indices),
        }
    }

    pub(crate) fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        match self {
            Node::File(file) => file.write(sink, parent),
            Node::Directory(directory) => directory.write(sink, parent),
        }
    }
}

/// Reject names that are not a single path segment.
///
/// Every node name passes through here before it becomes part of a path, so
/// nothing can be written outside the sink root.
pub fn validate_name(name: &str) -> AssemblyResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));

    if invalid {
        return Err(AssemblyError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Run a full preparation pass from an empty stack, then write the tree.
///
/// Preparation completes before the sink sees anything, so index failures
/// leave the sink untouched. A failure during `write` (a signing error, for
/// example) stops at the failing node: files and directories written
/// before it stay in the sink. Write to a fresh location and discard it on
/// error when a partial tree must never be published.
pub fn assemble<W>(root: &mut W, sink: &mut dyn OutputSink) -> AssemblyResult<()>
where
    W: Writable + ?Sized,
{
    validate_name(root.name())?;
    info!(root = %root.name(), "preparing distribution tree");
    root.prepare(&IndexStack::new())?;
    info!(root = %root.name(), "writing distribution tree");
    root.write(sink, Path::new(""))
}
