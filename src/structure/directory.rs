//! Plain directories.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::trace;

use super::stack::IndexStack;
use super::{validate_name, DirectoryNode, FileNode, Node, Writable};
use crate::error::{AssemblyError, AssemblyResult};
use crate::sink::{sink_error, OutputSink};

/// A directory owning uniquely named children.
///
/// Children are kept sorted by name, which is also the order they are
/// prepared and written in.
pub struct Directory {
    name: String,
    children: BTreeMap<String, Node>,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn insert(&mut self, node: Node) -> AssemblyResult<()> {
        let name = node.name().to_string();
        validate_name(&name)?;
        if self.children.contains_key(&name) {
            return Err(AssemblyError::NameCollision {
                directory: self.name.clone(),
                name,
            });
        }
        self.children.insert(name, node);
        Ok(())
    }
}

impl Writable for Directory {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        for child in self.children.values_mut() {
            child.prepare(indices)?;
        }
        Ok(())
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        let path = parent.join(&self.name);
        trace!(path = %path.display(), children = self.children.len(), "writing directory");
        sink.create_directory(&path).map_err(sink_error(&path))?;
        for child in self.children.values() {
            child.write(sink, &path)?;
        }
        Ok(())
    }
}

impl DirectoryNode for Directory {
    fn add_file(&mut self, file: Box<dyn FileNode>) -> AssemblyResult<()> {
        self.insert(Node::File(file))
    }

    fn add_directory(&mut self, directory: Box<dyn DirectoryNode>) -> AssemblyResult<()> {
        self.insert(Node::Directory(directory))
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.children.values())
    }
}
