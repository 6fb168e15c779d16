//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! per-site download statistics from the storage layer.

use crate::storage::{ResourceRecord, SiteRecord, Storage};
use crate::HarvestError;

/// Per-site slice of the statistics
#[derive(Debug, Clone)]
pub struct SiteSummary {
    /// The site record as stored
    pub site: SiteRecord,

    /// Number of resources recorded for the site
    pub resource_count: u64,

    /// Sum of the recorded resource sizes (KB)
    pub resource_size_kb: i64,

    /// The resource that took longest to download
    pub slowest: Option<ResourceRecord>,
}

/// Harvest statistics summary
#[derive(Debug, Clone, Default)]
pub struct HarvestStatistics {
    /// Every site in the store, oldest first
    pub sites: Vec<SiteSummary>,

    /// Resources recorded across all sites
    pub total_resources: u64,

    /// Sites whose run never reached finalization
    pub unfinalized_sites: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    let mut stats = HarvestStatistics::default();

    for site in storage.list_sites()? {
        let resources = storage.list_resources(site.id)?;

        let summary = SiteSummary {
            resource_count: resources.len() as u64,
            resource_size_kb: resources.iter().map(|r| r.size_kb).sum(),
            slowest: resources.iter().max_by_key(|r| r.elapsed_ms).cloned(),
            site,
        };

        stats.total_resources += summary.resource_count;
        if !summary.site.is_finalized() {
            stats.unfinalized_sites += 1;
        }
        stats.sites.push(summary);
    }

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Sites: {}", stats.sites.len());
    println!("  Resources recorded: {}", stats.total_resources);
    println!("  Unfinished runs: {}", stats.unfinalized_sites);
    println!();

    for summary in &stats.sites {
        let site = &summary.site;
        println!("[{}] {}", site.id, site.host);
        println!("  Started: {}", site.started_at.to_rfc3339());

        match (site.finished_at, site.elapsed_ms, site.total_size_kb) {
            (Some(finished), Some(elapsed), Some(size)) => {
                println!("  Finished: {}", finished.to_rfc3339());
                println!("  Elapsed: {} ms", elapsed);
                println!("  Downloaded: {} KB", size);
            }
            _ => println!("  Finished: never (run aborted before finalization)"),
        }

        println!(
            "  Resources: {} ({} KB)",
            summary.resource_count, summary.resource_size_kb
        );
        if let Some(slowest) = &summary.slowest {
            println!("  Slowest: {} ({} ms)", slowest.url, slowest.elapsed_ms);
        }
        println!();
    }
}
