//! Signed envelopes as written into distribution trees
//!
//! Covers the consumer view of signing: what reaches the sink parses as an
//! envelope, verifies against its own certificate, and stops verifying as
//! soon as a single bit changes.

mod fixtures;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use dist_assembly::crypto::{CryptoError, CryptoResult, KeyProvider};
use dist_assembly::structure::decorator::{ChecksumDecorator, SigningDecorator};
use dist_assembly::structure::Archive;
use dist_assembly::{
    assemble, AssemblyError, Directory, DirectoryNode, DiskSink, File, FileNode,
    IndexDirectory, IndexStack, MemorySink, Writable,
};
use dist_envelope::{verify, verify_bytes, EnvelopeError, SignedPayload};
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

use fixtures::test_provider;

/// Provider with no key material, as seen before keys are configured
struct Unconfigured;

impl KeyProvider for Unconfigured {
    fn signing_key(&self) -> CryptoResult<&SigningKey> {
        Err(CryptoError::MissingKey)
    }

    fn certificate_chain(&self) -> CryptoResult<&[u8]> {
        Err(CryptoError::MissingCertificate)
    }
}

/// Sign `payload` as a standalone file and return the envelope
fn sign(payload: &[u8]) -> SignedPayload {
    let mut file = SigningDecorator::new(File::new("payload", payload.to_vec()), test_provider());
    file.prepare(&IndexStack::new()).unwrap();
    file.sign().unwrap()
}

// =============================================================================
// Test 1: Writing a signed file
// =============================================================================

#[test]
fn test_hello_reaches_sink_as_envelope() {
    let mut root = Directory::new("out");
    root.add_file(Box::new(SigningDecorator::new(
        File::new("hello", b"hello".to_vec()),
        test_provider(),
    )))
    .unwrap();

    let mut sink = MemorySink::new();
    assemble(&mut root, &mut sink).unwrap();

    let bytes = sink.file(Path::new("out/hello")).unwrap();
    let envelope = SignedPayload::from_bytes(bytes).unwrap();
    assert_eq!(envelope.payload, b"hello");
    assert!(!envelope.certificate_chain.is_empty());
    assert_eq!(envelope.signature.len(), 64);
}

// =============================================================================
// Test 2: Round trip through the embedded certificate
// =============================================================================

#[test]
fn test_payloads_round_trip() {
    let payloads: [&[u8]; 4] = [b"", b"hello", &[0u8; 1024], br#"{"keys":[]}"#];
    for payload in payloads {
        let envelope = sign(payload);
        let verified = verify_bytes(&envelope.to_bytes(), None).unwrap();
        assert_eq!(verified.payload, payload);
        assert_eq!(verified.certificate_count, 1);
    }
}

#[test]
fn test_pinned_fingerprint() {
    let provider = test_provider();
    let mut file = SigningDecorator::new(File::new("index", b"[]".to_vec()), provider.clone());
    file.prepare(&IndexStack::new()).unwrap();
    let envelope = file.sign().unwrap();

    let verified = verify(&envelope, Some(provider.fingerprint().as_str())).unwrap();
    assert_eq!(verified.signer_fingerprint, provider.fingerprint());

    let other = test_provider().fingerprint();
    assert!(matches!(
        verify(&envelope, Some(other.as_str())),
        Err(EnvelopeError::FingerprintMismatch { .. })
    ));
}

// =============================================================================
// Test 3: Any single bit flip breaks verification
// =============================================================================

#[test]
fn test_payload_bit_flips_detected() {
    let envelope = sign(b"distribution key 0001");

    for byte in 0..envelope.payload.len() {
        for bit in 0..8 {
            let mut tampered = envelope.clone();
            tampered.payload[byte] ^= 1 << bit;
            assert!(
                matches!(verify(&tampered, None), Err(EnvelopeError::SignatureMismatch)),
                "flip of bit {} in payload byte {} went unnoticed",
                bit,
                byte
            );
        }
    }
}

#[test]
fn test_signature_bit_flips_detected() {
    let envelope = sign(b"distribution key 0001");

    for byte in 0..envelope.signature.len() {
        for bit in 0..8 {
            let mut tampered = envelope.clone();
            tampered.signature[byte] ^= 1 << bit;
            assert!(
                verify(&tampered, None).is_err(),
                "flip of bit {} in signature byte {} went unnoticed",
                bit,
                byte
            );
        }
    }
}

#[test]
fn test_on_disk_payload_flip_detected() {
    let envelope = sign(b"hello");
    let mut bytes = envelope.to_bytes();

    let offset = bytes
        .windows(5)
        .position(|window| window == b"hello")
        .unwrap();
    bytes[offset] ^= 0x01;

    assert!(verify_bytes(&bytes, None).is_err());
}

// =============================================================================
// Test 4: Signing failures abort the build
// =============================================================================

#[test]
fn test_missing_key_aborts_build() {
    let mut root = Directory::new("out");
    root.add_file(Box::new(File::new("a", b"a".to_vec()))).unwrap();
    root.add_file(Box::new(SigningDecorator::new(
        File::new("b", b"b".to_vec()),
        Arc::new(Unconfigured),
    )))
    .unwrap();

    let mut sink = MemorySink::new();
    let err = assemble(&mut root, &mut sink).unwrap_err();

    assert!(matches!(
        err,
        AssemblyError::Crypto {
            ref file,
            source: CryptoError::MissingKey,
        } if file == "b"
    ));
    assert!(sink.file(Path::new("out/b")).is_none());
}

#[test]
fn test_failed_build_leaves_earlier_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut root = Directory::new("out");
    root.add_file(Box::new(File::new("a", b"a".to_vec()))).unwrap();
    root.add_file(Box::new(SigningDecorator::new(
        File::new("b", b"b".to_vec()),
        Arc::new(Unconfigured),
    )))
    .unwrap();

    let mut sink = DiskSink::new(dir.path());
    assert!(assemble(&mut root, &mut sink).is_err());

    // writing stops at the failing node without rolling back
    assert_eq!(std::fs::read(dir.path().join("out/a")).unwrap(), b"a");
    assert!(!dir.path().join("out/b").exists());
}

#[test]
fn test_missing_key_in_generated_subtree() {
    let mut dates = IndexDirectory::new(
        "date",
        |_: &IndexStack| Ok([1u32, 2]),
        |day: &u32| day.to_string(),
    );
    dates.add_file_to_all(|_| {
        Box::new(SigningDecorator::new(
            File::new("index", b"[]".to_vec()),
            Arc::new(Unconfigured),
        ))
    });

    let mut sink = MemorySink::new();
    let err = assemble(&mut dates, &mut sink).unwrap_err();

    assert!(matches!(err, AssemblyError::Crypto { .. }));
    assert!(sink.files().next().is_none());
}

// =============================================================================
// Test 5: Composition with checksums and archives
// =============================================================================

#[test]
fn test_checksum_covers_envelope() {
    let mut root = Directory::new("out");
    root.add_file(Box::new(ChecksumDecorator::new(SigningDecorator::new(
        File::new("index", b"[\"DE\"]".to_vec()),
        test_provider(),
    ))))
    .unwrap();

    let mut sink = MemorySink::new();
    assemble(&mut root, &mut sink).unwrap();

    let envelope = sink.file(Path::new("out/index")).unwrap();
    let checksum = sink.file(Path::new("out/index.checksum")).unwrap();
    assert_eq!(checksum, hex::encode(Sha256::digest(envelope)).as_bytes());
    assert_eq!(verify_bytes(envelope, None).unwrap().payload, b"[\"DE\"]");
}

#[test]
fn test_archive_of_signed_files() {
    let provider = test_provider();
    let mut dates = IndexDirectory::new(
        "date",
        |_: &IndexStack| Ok([7u32]),
        |day: &u32| day.to_string(),
    );
    dates.add_file_to_all(move |_| {
        let mut archive = Archive::new("export.tar");
        archive
            .add_file(Box::new(SigningDecorator::new(
                File::with_content("export.bin", |indices| {
                    Ok(format!("{:?}", indices.peek_as::<u32>()).into_bytes())
                }),
                provider.clone(),
            )))
            .unwrap();
        archive
            .add_file(Box::new(File::new("README", b"signed export".to_vec())))
            .unwrap();
        Box::new(archive)
    });

    let mut sink = MemorySink::new();
    assemble(&mut dates, &mut sink).unwrap();

    let bytes = sink.file(Path::new("date/7/export.tar")).unwrap();
    let mut archive = tar::Archive::new(bytes);
    let mut entries = archive.entries().unwrap();

    let readme = entries.next().unwrap().unwrap();
    assert_eq!(readme.path().unwrap().to_str(), Some("README"));

    let mut export = entries.next().unwrap().unwrap();
    assert_eq!(export.path().unwrap().to_str(), Some("export.bin"));
    let mut envelope = Vec::new();
    export.read_to_end(&mut envelope).unwrap();
    assert_eq!(verify_bytes(&envelope, None).unwrap().payload, b"Some(7)");
}

#[test]
fn test_envelope_bytes_are_stable() {
    let mut file = SigningDecorator::new(File::new("index", b"[]".to_vec()), test_provider());
    file.prepare(&IndexStack::new()).unwrap();

    // Ed25519 signatures are deterministic
    assert_eq!(file.bytes().unwrap(), file.bytes().unwrap());
}
