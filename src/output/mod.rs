//! Output module for the on-disk download directory and crawl statistics
//!
//! This module handles:
//! - Creating the per-host download directory
//! - Measuring the total size of what was downloaded
//! - Summarizing recorded sites and resources

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics, SiteSummary};

use std::path::{Path, PathBuf};

/// Creates `<root>/<host>` (and any missing parents) and returns its path
///
/// An existing directory is reused as-is; files from earlier runs stay in
/// place and are overwritten only when a new download has the same name.
pub fn prepare_output_dir(root: &Path, host: &str) -> std::io::Result<PathBuf> {
    let dir = root.join(host);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Sums the sizes of the regular files directly inside `dir`, in kilobytes
///
/// Subdirectories are not descended into. The byte total is divided by 1024
/// once, so many small files still add up.
pub fn directory_size_kb(dir: &Path) -> std::io::Result<i64> {
    let mut total_bytes: u64 = 0;

    for entry in std::fs::read_dir(dir)? {
        let metadata = entry?.metadata()?;
        if metadata.is_file() {
            total_bytes += metadata.len();
        }
    }

    Ok((total_bytes / 1024) as i64)
}
