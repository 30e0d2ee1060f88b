//! Certificate chain handling.
//!
//! The chain is stored as DER certificates concatenated back to back, leaf
//! first. Only the leaf is used for verification; the remaining entries are
//! carried for consumers that validate trust up to their own root.

use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use x509_parser::oid_registry::OID_SIG_ED25519;
use x509_parser::prelude::*;

use crate::error::{EnvelopeError, EnvelopeResult};

/// Parse every certificate of a concatenated DER chain
pub fn parse_chain(chain: &[u8]) -> EnvelopeResult<Vec<X509Certificate<'_>>> {
    let mut rest = chain;
    let mut certificates = Vec::new();

    while !rest.is_empty() {
        let (remaining, certificate) = X509Certificate::from_der(rest)
            .map_err(|e| EnvelopeError::Certificate(e.to_string()))?;
        certificates.push(certificate);
        rest = remaining;
    }

    if certificates.is_empty() {
        return Err(EnvelopeError::EmptyChain);
    }
    Ok(certificates)
}

/// Extract the Ed25519 public key embedded in a certificate
pub fn verifying_key(certificate: &X509Certificate<'_>) -> EnvelopeResult<VerifyingKey> {
    let spki = certificate.public_key();
    if spki.algorithm.algorithm != OID_SIG_ED25519 {
        return Err(EnvelopeError::UnsupportedAlgorithm(
            spki.algorithm.algorithm.to_id_string(),
        ));
    }

    let key_bytes: [u8; PUBLIC_KEY_LENGTH] = spki
        .subject_public_key
        .data
        .as_ref()
        .try_into()
        .map_err(|_| EnvelopeError::InvalidKey("key must be 32 bytes".to_string()))?;

    VerifyingKey::from_bytes(&key_bytes).map_err(|e| EnvelopeError::InvalidKey(e.to_string()))
}

/// Public key of the first (leaf) certificate in a chain
pub fn leaf_verifying_key(chain: &[u8]) -> EnvelopeResult<VerifyingKey> {
    let certificates = parse_chain(chain)?;
    verifying_key(&certificates[0])
}
