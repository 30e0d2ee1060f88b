//! Error types for envelope decoding and verification.

use thiserror::Error;

/// Errors from parsing or verifying a signed envelope
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("certificate chain is empty")]
    EmptyChain,

    #[error("invalid certificate: {0}")]
    Certificate(String),

    #[error("unsupported public key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signature does not match payload")]
    SignatureMismatch,

    #[error("fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },
}

/// Result type for envelope operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
