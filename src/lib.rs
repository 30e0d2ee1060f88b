//! Distribution tree assembly
//!
//! Builds an on-disk distribution tree whose shape is computed from index
//! functions (one subtree per region, date, hour, ...), seeds every
//! generated directory with fresh meta files and directories, and wraps
//! designated files in signed envelopes that consumers can verify.

pub mod config;
pub mod crypto;
pub mod error;
pub mod formatters;
pub mod sink;
pub mod structure;

pub use config::{AssemblyConfig, ConfigError};
pub use crypto::{CryptoError, CryptoProvider, KeyProvider};
pub use error::{AssemblyError, AssemblyResult, BoxError};
pub use sink::{DiskSink, MemorySink, OutputSink};
pub use structure::{
    assemble, validate_name, Directory, DirectoryNode, File, FileNode, IndexDirectory, IndexStack, Writable,
};
