//! Assembly configuration (dist-assembly.toml)
//!
//! Names where the tree is written and where the signing material lives.
//! CLI flags take precedence over values from the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::{CryptoProvider, CryptoResult};
use crate::structure::decorator::{IndexingDecorator, DEFAULT_INDEX_FILE_NAME};
use crate::structure::{validate_name, IndexDirectory, IndexKey};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "dist-assembly.toml";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Output location settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the tree is written below
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Name of the listing file added to indexed directories
    #[serde(default = "default_index_file_name")]
    pub index_file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            index_file_name: default_index_file_name(),
        }
    }
}

impl OutputConfig {
    /// Wrap an index directory so it lists its children under the
    /// configured file name
    pub fn indexed<T: IndexKey>(&self, directory: IndexDirectory<T>) -> IndexingDecorator<T> {
        IndexingDecorator::new(directory).with_file_name(self.index_file_name.clone())
    }
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("out")
}

fn default_index_file_name() -> String {
    DEFAULT_INDEX_FILE_NAME.to_string()
}

/// Signing material locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningConfig {
    /// PKCS#8 PEM Ed25519 private key
    pub private_key: PathBuf,

    /// PEM certificate chain, leaf first
    pub certificate: PathBuf,
}

impl SigningConfig {
    pub fn load_provider(&self) -> CryptoResult<CryptoProvider> {
        CryptoProvider::from_pem_files(&self.private_key, &self.certificate)
    }
}

/// Configuration from dist-assembly.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    #[serde(default)]
    pub output: OutputConfig,

    /// Signing is unavailable when absent
    pub signing: Option<SigningConfig>,
}

impl AssemblyConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AssemblyConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.directory.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.directory must not be empty".to_string(),
            ));
        }

        if validate_name(&self.output.index_file_name).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "output.index_file_name is not a valid file name: {:?}",
                self.output.index_file_name
            )));
        }

        if let Some(signing) = &self.signing {
            if signing.private_key.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "signing.private_key must not be empty".to_string(),
                ));
            }
            if signing.certificate.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "signing.certificate must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Apply CLI overrides for the signing material
    pub fn with_signing_overrides(
        mut self,
        private_key: Option<PathBuf>,
        certificate: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        match (private_key, certificate, self.signing.take()) {
            (None, None, signing) => self.signing = signing,
            (Some(private_key), Some(certificate), _) => {
                self.signing = Some(SigningConfig {
                    private_key,
                    certificate,
                })
            }
            (private_key, certificate, Some(existing)) => {
                self.signing = Some(SigningConfig {
                    private_key: private_key.unwrap_or(existing.private_key),
                    certificate: certificate.unwrap_or(existing.certificate),
                })
            }
            (_, _, None) => {
                return Err(ConfigError::ValidationError(
                    "both --key and --cert are required when no [signing] section is configured"
                        .to_string(),
                ))
            }
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::structure::{assemble, IndexStack};
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[output]
directory = "dist"
index_file_name = "index.json"

[signing]
private_key = "keys/private.pem"
certificate = "keys/certificate.pem"
"#;
        let config = AssemblyConfig::from_toml(toml).unwrap();

        assert_eq!(config.output.directory, PathBuf::from("dist"));
        assert_eq!(config.output.index_file_name, "index.json");
        let signing = config.signing.unwrap();
        assert_eq!(signing.private_key, PathBuf::from("keys/private.pem"));
        assert_eq!(signing.certificate, PathBuf::from("keys/certificate.pem"));
    }

    #[test]
    fn test_defaults() {
        let config = AssemblyConfig::from_toml("").unwrap();

        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.output.index_file_name, DEFAULT_INDEX_FILE_NAME);
        assert!(config.signing.is_none());
    }

    #[test]
    fn test_invalid_index_file_name() {
        let toml = r#"
[output]
index_file_name = "a/b"
"#;
        let result = AssemblyConfig::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_index_file_name_rejects_path_separators() {
        for name in ["a\\\\b", "nul\\u0000", ".."] {
            let toml = format!("[output]\nindex_file_name = \"{}\"\n", name);
            let result = AssemblyConfig::from_toml(&toml);
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_indexed_uses_configured_file_name() {
        let config =
            AssemblyConfig::from_toml("[output]\nindex_file_name = \"index.json\"\n").unwrap();
        let months = IndexDirectory::new(
            "months",
            |_: &IndexStack| Ok(["2021-01".to_string()]),
            |month: &String| month.clone(),
        );

        let mut root = config.output.indexed(months);
        let mut sink = MemorySink::new();
        assemble(&mut root, &mut sink).unwrap();

        assert_eq!(
            sink.file(Path::new("months/index.json")).unwrap(),
            br#"["2021-01"]"#
        );
        assert!(sink.file(Path::new("months/index")).is_none());
    }

    #[test]
    fn test_signing_requires_both_paths() {
        let toml = r#"
[signing]
private_key = "keys/private.pem"
"#;
        let result = AssemblyConfig::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_signing_overrides() {
        let toml = r#"
[signing]
private_key = "keys/private.pem"
certificate = "keys/certificate.pem"
"#;
        let config = AssemblyConfig::from_toml(toml)
            .unwrap()
            .with_signing_overrides(Some(PathBuf::from("other.pem")), None)
            .unwrap();

        let signing = config.signing.unwrap();
        assert_eq!(signing.private_key, PathBuf::from("other.pem"));
        assert_eq!(signing.certificate, PathBuf::from("keys/certificate.pem"));
    }

    #[test]
    fn test_partial_override_without_section() {
        let result = AssemblyConfig::default()
            .with_signing_overrides(Some(PathBuf::from("private.pem")), None);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_or_default() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(
            AssemblyConfig::load_or_default(&missing).unwrap(),
            AssemblyConfig::default()
        );

        let path = dir.path().join("dist-assembly.toml");
        fs::write(&path, "[output]\ndirectory = \"public\"\n").unwrap();
        let config = AssemblyConfig::load_or_default(&path).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("public"));
    }
}
