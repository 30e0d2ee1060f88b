//! Function types used to describe a tree declaratively.

use std::collections::BTreeSet;

use super::stack::IndexStack;
use super::{DirectoryNode, FileNode};
use crate::error::BoxError;

/// Computes the distinct index values of a directory level from its ancestors
pub type IndexFunction<T> =
    Box<dyn Fn(&IndexStack) -> Result<BTreeSet<T>, BoxError> + Send + Sync>;

/// Formats an index value into a directory name
pub type Formatter<T> = Box<dyn Fn(&T) -> String + Send + Sync>;

/// Produces a fresh meta file for every generated child
pub type FileFunction = Box<dyn Fn(&IndexStack) -> Box<dyn FileNode> + Send + Sync>;

/// Produces a fresh meta directory for every generated child
pub type DirectoryFunction = Box<dyn Fn(&IndexStack) -> Box<dyn DirectoryNode> + Send + Sync>;

/// Computes file content from the ancestor stack
pub type ContentFunction = Box<dyn Fn(&IndexStack) -> Result<Vec<u8>, BoxError> + Send + Sync>;
