//! Envelope verification.
//!
//! A consumer trusts the payload of an envelope only if the signature
//! verifies under the leaf certificate's key. Callers that know which key
//! they expect can additionally pin its fingerprint.

use ed25519_dalek::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::certificate::{parse_chain, verifying_key};
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::payload::SignedPayload;

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    /// The authenticated payload bytes
    pub payload: Vec<u8>,

    /// SHA-256 fingerprint of the signer's public key (hex-encoded)
    pub signer_fingerprint: String,

    /// Number of certificates in the embedded chain
    pub certificate_count: usize,
}

/// Verify an envelope, optionally pinning the signer's key fingerprint
pub fn verify(
    envelope: &SignedPayload,
    pinned_fingerprint: Option<&str>,
) -> EnvelopeResult<VerifiedPayload> {
    let certificates = parse_chain(&envelope.certificate_chain)?;
    let key = verifying_key(&certificates[0])?;
    let signer_fingerprint = compute_key_fingerprint(&key);

    if let Some(pinned) = pinned_fingerprint {
        if !signer_fingerprint.eq_ignore_ascii_case(pinned) {
            return Err(EnvelopeError::FingerprintMismatch {
                expected: pinned.to_string(),
                actual: signer_fingerprint,
            });
        }
    }

    let signature = Signature::from_slice(&envelope.signature)
        .map_err(|e| EnvelopeError::InvalidSignature(e.to_string()))?;

    key.verify_strict(&envelope.payload, &signature)
        .map_err(|_| EnvelopeError::SignatureMismatch)?;

    Ok(VerifiedPayload {
        payload: envelope.payload.clone(),
        signer_fingerprint,
        certificate_count: certificates.len(),
    })
}

/// Decode and verify an envelope in its on-disk byte layout
pub fn verify_bytes(bytes: &[u8], pinned_fingerprint: Option<&str>) -> EnvelopeResult<VerifiedPayload> {
    let envelope = SignedPayload::from_bytes(bytes)?;
    verify(&envelope, pinned_fingerprint)
}

/// Compute SHA-256 fingerprint of an Ed25519 public key
pub fn compute_key_fingerprint(key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
