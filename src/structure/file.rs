//! Leaf files with fixed or stack-dependent content.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::trace;

use super::functional::ContentFunction;
use super::stack::IndexStack;
use super::{FileNode, Writable};
use crate::error::{AssemblyError, AssemblyResult, BoxError};
use crate::sink::{sink_error, OutputSink};

enum Content {
    Fixed(Vec<u8>),
    Lazy {
        function: ContentFunction,
        resolved: Option<Vec<u8>>,
    },
}

/// A file owning a byte payload
pub struct File {
    name: String,
    content: Content,
}

impl File {
    /// File with content known up front
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: Content::Fixed(bytes.into()),
        }
    }

    /// File whose content is computed from the ancestor stack during `prepare`
    pub fn with_content<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&IndexStack) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            content: Content::Lazy {
                function: Box::new(function),
                resolved: None,
            },
        }
    }

    /// Lazy file holding the JSON encoding of a value derived from the stack
    pub fn json<S, F>(name: impl Into<String>, function: F) -> Self
    where
        S: Serialize,
        F: Fn(&IndexStack) -> S + Send + Sync + 'static,
    {
        Self::with_content(name, move |indices| Ok(serde_json::to_vec(&function(indices))?))
    }

    pub fn is_prepared(&self) -> bool {
        match &self.content {
            Content::Fixed(_) => true,
            Content::Lazy { resolved, .. } => resolved.is_some(),
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = match &self.content {
            Content::Fixed(bytes) => format!("{} bytes", bytes.len()),
            Content::Lazy {
                resolved: Some(bytes),
                ..
            } => format!("{} bytes (computed)", bytes.len()),
            Content::Lazy { resolved: None, .. } => "pending".to_string(),
        };
        f.debug_struct("File")
            .field("name", &self.name)
            .field("content", &content)
            .finish()
    }
}

impl Writable for File {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        if let Content::Lazy { function, resolved } = &mut self.content {
            let bytes = function(indices).map_err(|source| AssemblyError::Content {
                file: self.name.clone(),
                source,
            })?;
            *resolved = Some(bytes);
        }
        Ok(())
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        let bytes = self.bytes()?;
        let path = parent.join(&self.name);
        trace!(path = %path.display(), bytes = bytes.len(), "writing file");
        sink.write_file(&path, &bytes).map_err(sink_error(&path))
    }
}

impl FileNode for File {
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>> {
        match &self.content {
            Content::Fixed(bytes) => Ok(Cow::Borrowed(bytes)),
            Content::Lazy {
                resolved: Some(bytes),
                ..
            } => Ok(Cow::Borrowed(bytes)),
            Content::Lazy { resolved: None, .. } => {
                Err(AssemblyError::NotPrepared(self.name.clone()))
            }
        }
    }
}
