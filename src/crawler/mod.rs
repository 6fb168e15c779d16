//! Crawler module for one-hop site harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching and writing documents to disk
//! - HTML parsing and link extraction
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    harvest, DownloadedResource, HarvestReport, HarvestStage, Harvester, LinkError, LinkFailure,
    HOMEPAGE_FILE,
};
pub use fetcher::{
    build_http_client, is_document_type, save_page, FetchError, HttpFetcher, PageFetcher,
    SavedPage,
};
pub use parser::{extract_links, parse_links};
