//! Output sinks
//!
//! The tree hands every directory and file to a sink during `write`. Paths
//! are relative to the sink root; directories are always created before the
//! files inside them.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::AssemblyError;

/// Mode of published files; staging files start out owner-only
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Destination of a written tree
pub trait OutputSink {
    fn create_directory(&mut self, path: &Path) -> io::Result<()>;

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

pub(crate) fn sink_error(path: &Path) -> impl FnOnce(io::Error) -> AssemblyError + '_ {
    move |source| AssemblyError::Sink {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes the tree below a root directory on the local filesystem.
///
/// Files are staged in a temporary file next to their destination and
/// renamed into place, so a failed write never leaves partial content.
/// Published files are world-readable (`0644` on Unix).
///
/// Files written before a failing node are not rolled back.
#[derive(Debug, Clone)]
pub struct DiskSink {
    root: PathBuf,
}

impl DiskSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for DiskSink {
    fn create_directory(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.root.join(path))
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let target = self.root.join(path);
        let dir = target.parent().unwrap_or(self.root.as_path());

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Records a written tree in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, path: &Path) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn has_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    /// Written files in path order
    pub fn files(&self) -> impl Iterator<Item = (&Path, &[u8])> {
        self.files
            .iter()
            .map(|(path, bytes)| (path.as_path(), bytes.as_slice()))
    }

    /// Created directories in path order
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.directories.iter().map(PathBuf::as_path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }
}

impl OutputSink for MemorySink {
    fn create_directory(&mut self, path: &Path) -> io::Result<()> {
        self.directories.insert(path.to_path_buf());
        Ok(())
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.directories.contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent directory {} was not created", parent.display()),
                ));
            }
        }
        self.files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
