use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Name of the marker file recording the configuration a mirror was built with
const CONFIG_MARKER: &str = ".snapmirror-config";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the effective configuration
///
/// The hash covers the canonical TOML serialization of the in-memory config
/// rather than any file on disk, so runs driven purely by CLI flags hash the
/// same way as runs driven by a config file.
pub fn compute_config_hash(config: &Config) -> Result<String, ConfigError> {
    let canonical = toml::to_string(config)
        .map_err(|e| ConfigError::Validation(format!("Failed to serialize config: {}", e)))?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Records the configuration hash in the output directory
///
/// A resumed run compares against this marker to detect that it is being
/// continued with different settings.
pub fn record_config_hash(output_dir: &Path, hash: &str) -> Result<(), ConfigError> {
    std::fs::create_dir_all(output_dir)?;
    std::fs::write(output_dir.join(CONFIG_MARKER), hash)?;
    Ok(())
}

/// Reads the configuration hash a previous run recorded, if any
pub fn previous_config_hash(output_dir: &Path) -> Option<String> {
    std::fs::read_to_string(output_dir.join(CONFIG_MARKER))
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{CaptureConfig, Config};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn minimal_config() -> Config {
        Config {
            capture: CaptureConfig {
                url: "http://example.com".to_string(),
                snapshot: "20240417160532".to_string(),
            },
            crawler: Default::default(),
            network: Default::default(),
            output: Default::default(),
        }
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[capture]
url = "http://example.com"
snapshot = "20240417160532"

[crawler]
max-level = 2
max-concurrency = 4
sequential-assets = true

[network]
proxy = "http://proxy.example.com:8080"

[output]
directory = "./mirror"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.capture.snapshot, "20240417160532");
        assert_eq!(config.crawler.max_level, 2);
        assert_eq!(config.crawler.max_concurrency, 4);
        assert!(config.crawler.sequential_assets);
        assert!(config.crawler.download_assets);
        assert_eq!(
            config.network.proxy.as_deref(),
            Some("http://proxy.example.com:8080")
        );
        assert_eq!(config.output.directory.as_deref(), Some("./mirror"));
    }

    #[test]
    fn test_defaults_applied() {
        let config_content = r#"
[capture]
url = "http://example.com"
snapshot = "20240417160532"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_level, 1);
        assert_eq!(config.crawler.max_concurrency, 1);
        assert_eq!(config.crawler.max_attempts, 5);
        assert!(config.crawler.download_assets);
        assert!(!config.crawler.sequential_assets);
        assert!(config.network.proxy.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/mirror.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[capture]
url = "http://example.com"
snapshot = "20240417160532"

[crawler]
max-concurrency = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_config_hash_is_stable() {
        let config = minimal_config();
        let hash1 = compute_config_hash(&config).unwrap();
        let hash2 = compute_config_hash(&config).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_config_different_hash() {
        let a = minimal_config();
        let mut b = minimal_config();
        b.crawler.max_level = 3;

        assert_ne!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }

    #[test]
    fn test_config_marker_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(previous_config_hash(dir.path()), None);

        record_config_hash(dir.path(), "abc123").unwrap();
        assert_eq!(previous_config_hash(dir.path()), Some("abc123".to_string()));
    }
}
