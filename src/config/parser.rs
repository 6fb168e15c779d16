use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `store.connection-string`
pub const ENV_STORE_CONNECTION: &str = "HARVEST_STORE_CONNECTION";
/// Environment variable overriding `store.username`
pub const ENV_STORE_USERNAME: &str = "HARVEST_STORE_USERNAME";
/// Environment variable overriding `store.password`
pub const ENV_STORE_PASSWORD: &str = "HARVEST_STORE_PASSWORD";
/// Environment variable overriding `output.root-dir`
pub const ENV_OUTPUT_DIR: &str = "HARVEST_OUTPUT_DIR";
/// Environment variable overriding `fetcher.max-concurrent-fetches`
pub const ENV_MAX_CONCURRENT: &str = "HARVEST_MAX_CONCURRENT";

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys fall back to their defaults. Environment
/// overrides are applied before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Store: {}", config.store.connection_string);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration from defaults and the process environment only
pub fn load_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Applies `HARVEST_*` overrides on top of an already-parsed configuration
///
/// `lookup` resolves a variable name to its value; production code passes
/// `std::env::var`, tests pass a map.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_STORE_CONNECTION) {
        config.store.connection_string = value;
    }
    if let Some(value) = lookup(ENV_STORE_USERNAME) {
        config.store.username = value;
    }
    if let Some(value) = lookup(ENV_STORE_PASSWORD) {
        config.store.password = value;
    }
    if let Some(value) = lookup(ENV_OUTPUT_DIR) {
        config.output.root_dir = value;
    }
    if let Some(value) = lookup(ENV_MAX_CONCURRENT) {
        config.fetcher.max_concurrent_fetches =
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_MAX_CONCURRENT.to_string(),
                    value: value.clone(),
                })?;
    }
    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be matched to the configuration they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
