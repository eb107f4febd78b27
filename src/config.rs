//! Configuration file support for the bidding tools.
//!
//! TOML configuration consumed by the setup/prover/verifier binaries;
//! every field has a default so a missing file or section still yields a
//! working configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_MAX_REGISTRY_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_PROOF_FILE_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub proof: ProofConfig,
    #[serde(default)]
    pub keys: KeysConfig,
}

/// Limits on the registered-participant file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_max_registry_file_size")]
    pub max_file_size: u64,
    #[serde(default)]
    pub default_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofConfig {
    #[serde(default = "default_max_proof_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_proof_output_file")]
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_REGISTRY_FILE_SIZE,
            default_file: None,
        }
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_PROOF_FILE_SIZE,
            output_file: PathBuf::from("proof.json"),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("keys.json"),
        }
    }
}

fn default_max_registry_file_size() -> u64 {
    DEFAULT_MAX_REGISTRY_FILE_SIZE
}

fn default_max_proof_file_size() -> u64 {
    DEFAULT_MAX_PROOF_FILE_SIZE
}

fn default_proof_output_file() -> PathBuf {
    PathBuf::from("proof.json")
}

fn default_key_file() -> PathBuf {
    PathBuf::from("keys.json")
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.registry.max_file_size,
            DEFAULT_MAX_REGISTRY_FILE_SIZE
        );
        assert_eq!(config.proof.max_file_size, DEFAULT_MAX_PROOF_FILE_SIZE);
        assert_eq!(config.keys.key_file, PathBuf::from("keys.json"));
    }

    #[test]
    fn test_serialize_deserialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.registry.max_file_size,
            deserialized.registry.max_file_size
        );
        assert_eq!(config.proof.output_file, deserialized.proof.output_file);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.proof.output_file = PathBuf::from("round_trip.json");
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.proof.output_file, PathBuf::from("round_trip.json"));
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let path = PathBuf::from("/nonexistent/zk-bidding/config.toml");
        let config = Config::load_from_file_or_default(&path);
        assert_eq!(config.keys.key_file, PathBuf::from("keys.json"));
    }

    #[test]
    fn test_custom_config() {
        let config_toml = r#"
            [registry]
            max_file_size = 20485760

            [proof]
            output_file = "custom_proof.json"

            [keys]
            key_file = "ceremony_keys.json"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.registry.max_file_size, 20485760);
        assert_eq!(config.proof.output_file, PathBuf::from("custom_proof.json"));
        assert_eq!(config.keys.key_file, PathBuf::from("ceremony_keys.json"));
    }
}
