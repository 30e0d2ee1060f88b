//! Node decorators
//!
//! A decorator wraps another node, forwards everything it does not change,
//! and transforms content on the way out. Decorated nodes are themselves
//! [`FileNode`](super::FileNode)s or [`DirectoryNode`](super::DirectoryNode)s,
//! so they can be nested; the caller picks the order by nesting.

mod checksum;
mod indexing;
mod signing;

pub use checksum::{ChecksumDecorator, CHECKSUM_EXTENSION};
pub use indexing::{IndexingDecorator, DEFAULT_INDEX_FILE_NAME};
pub use signing::SigningDecorator;
