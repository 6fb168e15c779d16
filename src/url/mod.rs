//! URL handling module for Site-Harvest
//!
//! This module provides the syntactic URL check used to gate seeds and
//! extracted links, seed normalization, host extraction, and the mapping
//! from resource URL to on-disk file name.

mod host;
mod validate;

pub use host::{extract_host, resource_file_name, DEFAULT_FILE_NAME, UNKNOWN_HOST};
pub use validate::{is_valid_url, normalize_seed};
