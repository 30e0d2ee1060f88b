//! Distribution assembly CLI
//!
//! Entry point for the `dist-assembly` command-line tool.

use base64::Engine;
use clap::{Parser, Subcommand};
use dist_assembly::config::DEFAULT_CONFIG_PATH;
use dist_assembly::crypto::{generate_self_signed, KeyProvider};
use dist_assembly::structure::decorator::{ChecksumDecorator, SigningDecorator};
use dist_assembly::{
    validate_name, AssemblyConfig, AssemblyResult, DiskSink, File, FileNode, OutputSink, Writable,
};
use dist_envelope::{verify, verify_bytes, SignedPayload};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "dist-assembly")]
#[command(about = "Assemble and verify signed distribution trees", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an Ed25519 key and a self-signed certificate
    Keygen {
        /// Directory to write private.pem and certificate.pem into
        #[arg(long, short = 'o', default_value = ".")]
        out_dir: PathBuf,

        /// Common name of the certificate subject
        #[arg(long, default_value = "dist-assembly")]
        common_name: String,
    },

    /// Wrap a file in a signed envelope
    Sign {
        /// File whose bytes become the envelope payload
        input: PathBuf,

        /// Name of the signed file (default: input file name)
        #[arg(long)]
        name: Option<String>,

        /// Output directory (default: output.directory from config)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Path to config file (default: dist-assembly.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// PKCS#8 PEM private key, overrides config
        #[arg(long)]
        key: Option<PathBuf>,

        /// PEM certificate chain, overrides config
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Also write a .checksum file next to the envelope
        #[arg(long)]
        checksum: bool,
    },

    /// Verify a signed envelope
    Verify {
        /// Envelope file
        envelope: PathBuf,

        /// Expected SHA-256 fingerprint of the signing key
        #[arg(long)]
        pin: Option<String>,

        /// Write the verified payload to this path
        #[arg(long)]
        extract: Option<PathBuf>,
    },

    /// Verify every envelope with a given file name below a directory
    VerifyTree {
        /// Root of the distribution tree
        root: PathBuf,

        /// File name of the signed files
        #[arg(long)]
        name: String,

        /// Expected SHA-256 fingerprint of the signing key
        #[arg(long)]
        pin: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen {
            out_dir,
            common_name,
        } => run_keygen(&out_dir, &common_name),
        Commands::Sign {
            input,
            name,
            output_dir,
            config,
            key,
            cert,
            checksum,
        } => run_sign(&input, name, output_dir, config, key, cert, checksum),
        Commands::Verify {
            envelope,
            pin,
            extract,
        } => run_verify(&envelope, pin.as_deref(), extract.as_deref()),
        Commands::VerifyTree { root, name, pin } => run_verify_tree(&root, &name, pin.as_deref()),
    }
}

fn run_keygen(out_dir: &Path, common_name: &str) {
    let identity = match generate_self_signed(common_name) {
        Ok(identity) => identity,
        Err(e) => {
            eprintln!("Error generating key: {}", e);
            process::exit(1);
        }
    };

    let key_path = out_dir.join("private.pem");
    let cert_path = out_dir.join("certificate.pem");
    if key_path.exists() || cert_path.exists() {
        eprintln!(
            "Refusing to overwrite existing key material in {}",
            out_dir.display()
        );
        process::exit(1);
    }

    let written = fs::create_dir_all(out_dir)
        .and_then(|_| fs::write(&key_path, &identity.private_key_pem))
        .and_then(|_| fs::write(&cert_path, &identity.certificate_pem));
    if let Err(e) = written {
        eprintln!("Error writing key material: {}", e);
        process::exit(1);
    }

    println!("Wrote: {}", key_path.display());
    println!("Wrote: {}", cert_path.display());
}

fn run_sign(
    input: &Path,
    name: Option<String>,
    output_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    key: Option<PathBuf>,
    cert: Option<PathBuf>,
    checksum: bool,
) {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = match AssemblyConfig::load_or_default(&config_path)
        .and_then(|config| config.with_signing_overrides(key, cert))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let Some(signing) = config.signing.as_ref() else {
        eprintln!("No signing key configured (use --key and --cert or a [signing] section)");
        process::exit(1);
    };
    let provider = match signing.load_provider() {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            eprintln!("Error loading signing key: {}", e);
            process::exit(1);
        }
    };

    let name = match name.or_else(|| input.file_name().map(|n| n.to_string_lossy().to_string())) {
        Some(name) => name,
        None => {
            eprintln!("Cannot derive a file name from {}", input.display());
            process::exit(1);
        }
    };
    let payload = match fs::read(input) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    };

    let output_dir = output_dir.unwrap_or(config.output.directory.clone());
    let mut sink = DiskSink::new(&output_dir);
    if let Err(e) = sink.create_directory(Path::new("")) {
        eprintln!("Error creating {}: {}", output_dir.display(), e);
        process::exit(1);
    }

    let fingerprint = provider.fingerprint();
    let result = signed_file(&name, payload, provider, checksum)
        .and_then(|file| file.write(&mut sink, Path::new("")));
    if let Err(e) = result {
        eprintln!("Error signing {}: {}", input.display(), e);
        process::exit(1);
    }

    let report = serde_json::json!({
        "path": output_dir.join(&name).display().to_string(),
        "signer_fingerprint": fingerprint,
        "checksum": checksum,
    });
    println!("{}", report);
}

/// Envelope file for `sign`, rejecting names that would escape the output
/// directory
fn signed_file(
    name: &str,
    payload: Vec<u8>,
    provider: Arc<dyn KeyProvider>,
    checksum: bool,
) -> AssemblyResult<Box<dyn FileNode>> {
    validate_name(name)?;
    let signed = SigningDecorator::new(File::new(name, payload), provider);
    if checksum {
        Ok(Box::new(ChecksumDecorator::new(signed)))
    } else {
        Ok(Box::new(signed))
    }
}

fn run_verify(envelope_path: &Path, pin: Option<&str>, extract: Option<&Path>) {
    let bytes = match fs::read(envelope_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {}", envelope_path.display(), e);
            process::exit(1);
        }
    };

    let (envelope, verified) = match SignedPayload::from_bytes(&bytes)
        .and_then(|envelope| verify(&envelope, pin).map(|verified| (envelope, verified)))
    {
        Ok(pair) => pair,
        Err(e) => {
            let report = serde_json::json!({
                "path": envelope_path.display().to_string(),
                "verified": false,
                "error": e.to_string(),
            });
            println!("{}", report);
            process::exit(1);
        }
    };
    let signature = base64::engine::general_purpose::STANDARD.encode(&envelope.signature);

    if let Some(extract) = extract {
        if let Err(e) = fs::write(extract, &verified.payload) {
            eprintln!("Error writing {}: {}", extract.display(), e);
            process::exit(1);
        }
    }

    let report = serde_json::json!({
        "path": envelope_path.display().to_string(),
        "verified": true,
        "signature_algorithm": dist_envelope::SIGNATURE_ALGORITHM,
        "signature": signature,
        "signer_fingerprint": verified.signer_fingerprint,
        "certificate_count": verified.certificate_count,
        "payload_bytes": verified.payload.len(),
    });
    println!("{}", report);
}

fn run_verify_tree(root: &Path, name: &str, pin: Option<&str>) {
    let mut verified = 0usize;
    let mut failures = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Error walking {}: {}", root.display(), e);
                process::exit(1);
            }
        };
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy() != name {
            continue;
        }

        let result = fs::read(entry.path())
            .map_err(|e| e.to_string())
            .and_then(|bytes| verify_bytes(&bytes, pin).map_err(|e| e.to_string()));
        match result {
            Ok(_) => verified += 1,
            Err(error) => failures.push(serde_json::json!({
                "path": entry.path().display().to_string(),
                "error": error,
            })),
        }
    }

    let report = serde_json::json!({
        "root": root.display().to_string(),
        "name": name,
        "verified": verified,
        "failed": failures,
    });
    println!("{}", report);

    if !failures.is_empty() {
        process::exit(1);
    }
}
