//! Signing key material and Ed25519 envelope signing.
//!
//! The key provider only hands out already-available material: an Ed25519
//! private key and the DER certificate chain whose leaf carries the matching
//! public key. Consumers verify envelopes against that leaf certificate.

use std::fs;
use std::io;
use std::path::Path;

use dist_envelope::{compute_key_fingerprint, leaf_verifying_key, EnvelopeError, SignedPayload};
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signer, SigningKey};
use thiserror::Error;
use tracing::debug;
use x509_parser::pem::Pem;

/// PEM label of certificate blocks
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Errors from loading key material or signing
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no signing key configured")]
    MissingKey,

    #[error("no certificate configured")]
    MissingCertificate,

    #[error("certificate key does not match signing key: expected {expected}, got {actual}")]
    KeyMismatch { expected: String, actual: String },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid certificate: {0}")]
    Certificate(#[from] EnvelopeError),

    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("certificate generation failed: {0}")]
    Generation(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Source of the key material used to sign distribution files
pub trait KeyProvider: Send + Sync {
    fn signing_key(&self) -> CryptoResult<&SigningKey>;

    /// DER certificates, leaf first, concatenated
    fn certificate_chain(&self) -> CryptoResult<&[u8]>;
}

/// Key material loaded once and kept for the lifetime of the process
pub struct CryptoProvider {
    signing_key: SigningKey,
    certificate_chain: Vec<u8>,
}

impl CryptoProvider {
    /// Pair a signing key with its certificate chain.
    ///
    /// Fails if the leaf certificate does not carry the key's public half.
    pub fn new(signing_key: SigningKey, certificate_chain: Vec<u8>) -> CryptoResult<Self> {
        if certificate_chain.is_empty() {
            return Err(CryptoError::MissingCertificate);
        }

        let leaf_key = leaf_verifying_key(&certificate_chain)?;
        let expected = compute_key_fingerprint(&signing_key.verifying_key());
        let actual = compute_key_fingerprint(&leaf_key);
        if expected != actual {
            return Err(CryptoError::KeyMismatch { expected, actual });
        }

        debug!(fingerprint = %expected, "loaded signing key");
        Ok(Self {
            signing_key,
            certificate_chain,
        })
    }

    /// Load from a PKCS#8 PEM private key and a PEM certificate chain
    pub fn from_pem(private_key_pem: &str, certificate_pem: &str) -> CryptoResult<Self> {
        let signing_key = SigningKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let certificate_chain = certificate_chain_from_pem(certificate_pem.as_bytes())?;
        Self::new(signing_key, certificate_chain)
    }

    pub fn from_pem_files(private_key_path: &Path, certificate_path: &Path) -> CryptoResult<Self> {
        let private_key_pem = fs::read_to_string(private_key_path)?;
        let certificate_pem = fs::read_to_string(certificate_path)?;
        Self::from_pem(&private_key_pem, &certificate_pem)
    }

    /// SHA-256 fingerprint of the signing public key
    pub fn fingerprint(&self) -> String {
        compute_key_fingerprint(&self.signing_key.verifying_key())
    }
}

impl KeyProvider for CryptoProvider {
    fn signing_key(&self) -> CryptoResult<&SigningKey> {
        Ok(&self.signing_key)
    }

    fn certificate_chain(&self) -> CryptoResult<&[u8]> {
        Ok(&self.certificate_chain)
    }
}

/// Concatenate the DER contents of every certificate block, in file order
pub fn certificate_chain_from_pem(pem: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut chain = Vec::new();
    for block in Pem::iter_from_buffer(pem) {
        let block = block.map_err(|e| CryptoError::Pem(e.to_string()))?;
        if block.label == CERTIFICATE_LABEL {
            chain.extend_from_slice(&block.contents);
        }
    }

    if chain.is_empty() {
        return Err(CryptoError::MissingCertificate);
    }
    Ok(chain)
}

/// Sign `payload` and assemble the envelope around it
pub fn sign_payload(provider: &dyn KeyProvider, payload: &[u8]) -> CryptoResult<SignedPayload> {
    let signing_key = provider.signing_key()?;
    let certificate_chain = provider.certificate_chain()?;
    if certificate_chain.is_empty() {
        return Err(CryptoError::MissingCertificate);
    }

    let signature = signing_key
        .try_sign(payload)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    Ok(SignedPayload::new(
        certificate_chain.to_vec(),
        payload.to_vec(),
        signature.to_bytes().to_vec(),
    ))
}

/// Freshly generated self-signed Ed25519 identity, PEM encoded
pub struct GeneratedIdentity {
    pub private_key_pem: String,
    pub certificate_pem: String,
}

/// Generate an Ed25519 key and a self-signed certificate for it
pub fn generate_self_signed(common_name: &str) -> CryptoResult<GeneratedIdentity> {
    let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ED25519)
        .map_err(|e| CryptoError::Generation(e.to_string()))?;

    let mut params = rcgen::CertificateParams::new(vec![common_name.to_string()])
        .map_err(|e| CryptoError::Generation(e.to_string()))?;
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, common_name);

    let certificate = params
        .self_signed(&key_pair)
        .map_err(|e| CryptoError::Generation(e.to_string()))?;

    Ok(GeneratedIdentity {
        private_key_pem: key_pair.serialize_pem(),
        certificate_pem: certificate.pem(),
    })
}
