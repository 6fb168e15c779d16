//! Configuration module for Site-Harvest
//!
//! Configuration comes from an optional TOML file, then `HARVEST_*`
//! environment variables, then validation. Every key has a default.
//!
//! # Example
//!
//! ```no_run
//! use site_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Downloads go under: {}", config.output.root_dir);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, FetcherConfig, OutputConfig, StoreConfig};

pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, load_from_env,
    ENV_MAX_CONCURRENT, ENV_OUTPUT_DIR, ENV_STORE_CONNECTION, ENV_STORE_PASSWORD,
    ENV_STORE_USERNAME,
};
pub use validation::{validate, MAX_CONCURRENT_FETCHES};
