//! Signed envelope decorator.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use dist_envelope::SignedPayload;
use tracing::{info, instrument};

use crate::crypto::{sign_payload, KeyProvider};
use crate::error::{AssemblyError, AssemblyResult};
use crate::sink::{sink_error, OutputSink};
use crate::structure::{FileNode, IndexStack, Writable};

/// Replaces a file's content with a signed envelope around it.
///
/// The envelope is built completely before anything reaches the sink; a
/// signing failure leaves no file behind.
pub struct SigningDecorator<F> {
    file: F,
    provider: Arc<dyn KeyProvider>,
}

impl<F: FileNode> SigningDecorator<F> {
    pub fn new(file: F, provider: Arc<dyn KeyProvider>) -> Self {
        Self { file, provider }
    }

    /// The wrapped file
    pub fn inner(&self) -> &F {
        &self.file
    }

    /// Sign the wrapped file's current content
    #[instrument(skip_all, fields(file = %self.file.name()))]
    pub fn sign(&self) -> AssemblyResult<SignedPayload> {
        let payload = self.file.bytes()?;
        let envelope = sign_payload(self.provider.as_ref(), &payload).map_err(|source| {
            AssemblyError::Crypto {
                file: self.file.name().to_string(),
                source,
            }
        })?;
        info!(payload_bytes = payload.len(), "signed file");
        Ok(envelope)
    }
}

impl<F: FileNode> Writable for SigningDecorator<F> {
    fn name(&self) -> &str {
        self.file.name()
    }

    fn prepare(&mut self, indices: &IndexStack) -> AssemblyResult<()> {
        self.file.prepare(indices)
    }

    fn write(&self, sink: &mut dyn OutputSink, parent: &Path) -> AssemblyResult<()> {
        let bytes = self.bytes()?;
        let path = parent.join(self.name());
        sink.write_file(&path, &bytes).map_err(sink_error(&path))
    }
}

impl<F: FileNode> FileNode for SigningDecorator<F> {
    fn bytes(&self) -> AssemblyResult<Cow<'_, [u8]>> {
        Ok(Cow::Owned(self.sign()?.to_bytes()))
    }
}
