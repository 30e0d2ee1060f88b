//! Signed payload envelope
//!
//! Defines the three-field container written for every signed file in a
//! distribution tree, and the checks a consumer runs to trust its content:
//! the leaf certificate of the embedded chain carries the Ed25519 key that
//! produced the detached signature over the payload bytes.

pub mod certificate;
pub mod error;
pub mod payload;
pub mod verify;

pub use certificate::{leaf_verifying_key, parse_chain, verifying_key};
pub use error::{EnvelopeError, EnvelopeResult};
pub use payload::SignedPayload;
pub use verify::{compute_key_fingerprint, verify, verify_bytes, VerifiedPayload};

/// Signature algorithm identifier
pub const SIGNATURE_ALGORITHM: &str = "Ed25519";
