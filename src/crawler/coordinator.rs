//! Harvest coordinator - main orchestration logic
//!
//! This module sequences one harvest run:
//! - Validating the seed and deriving the host
//! - Preparing the output directory and opening the store
//! - Fetching the homepage and extracting its links
//! - Downloading every link, tolerating per-link failures
//! - Finalizing the site record

use crate::config::Config;
use crate::crawler::fetcher::{FetchError, HttpFetcher, PageFetcher, SavedPage};
use crate::crawler::parser::extract_links;
use crate::output::{directory_size_kb, prepare_output_dir};
use crate::storage::{open_storage, SiteId, Storage, StorageError, StorageResult};
use crate::url::{extract_host, is_valid_url, normalize_seed, resource_file_name};
use crate::{HarvestError, UrlError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

/// File name the seed page is saved under
pub const HOMEPAGE_FILE: &str = "home.html";

/// Where a harvest run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStage {
    Idle,
    ValidatingSeed,
    PreparingOutput,
    ConnectingStore,
    FetchingHome,
    ExtractingLinks,
    /// Working on the link at this index of the extracted sequence
    FetchingLinks(usize),
    Finalizing,
    Done,
    Aborted,
}

impl fmt::Display for HarvestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchingLinks(i) => write!(f, "FetchingLinks({})", i),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Why a single link produced no resource record
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no file name for link: {0}")]
    FileName(#[from] UrlError),

    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("downloaded but not recorded: {0}")]
    Record(#[from] StorageError),

    #[error("download task ended without a result")]
    Worker,
}

/// A link that was downloaded and recorded
#[derive(Debug, Clone)]
pub struct DownloadedResource {
    /// Position of the link in the extracted sequence
    pub index: usize,
    pub url: String,
    pub path: PathBuf,
    pub elapsed_ms: i64,
    pub size_kb: i64,
}

/// A link attempt that did not end in a resource record
#[derive(Debug)]
pub struct LinkFailure {
    /// Position of the link in the extracted sequence
    pub index: usize,
    pub url: String,
    pub error: LinkError,
}

/// Outcome of a completed harvest run
#[derive(Debug)]
pub struct HarvestReport {
    pub site_id: SiteId,
    pub host: String,
    pub output_dir: PathBuf,
    pub homepage: PathBuf,
    /// Number of links that passed validation on the homepage
    pub links_found: usize,
    /// Successful downloads, in link order
    pub downloaded: Vec<DownloadedResource>,
    /// Failed attempts, in link order
    pub failures: Vec<LinkFailure>,
    pub total_size_kb: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestReport {
    /// Wall-clock duration of the run in milliseconds
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Completion event produced by a link download task
struct LinkAttempt {
    index: usize,
    url: String,
    elapsed: Duration,
    result: Result<SavedPage, FetchError>,
}

/// Runs harvests with a given page source
pub struct Harvester<F: PageFetcher> {
    fetcher: Arc<F>,
    output_root: PathBuf,
    max_concurrent: usize,
    stage: HarvestStage,
}

impl<F: PageFetcher> Harvester<F> {
    /// Creates a sequential harvester writing under `output_root`
    pub fn new(fetcher: F, output_root: impl Into<PathBuf>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            output_root: output_root.into(),
            max_concurrent: 1,
            stage: HarvestStage::Idle,
        }
    }

    /// Allows up to `max_concurrent` link downloads in flight (minimum 1)
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// The stage the last (or current) run reached
    pub fn stage(&self) -> HarvestStage {
        self.stage
    }

    fn advance(&mut self, next: HarvestStage) {
        tracing::debug!("Harvest stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Runs one harvest of `seed`
    ///
    /// `connect` opens the store. It is called once, after the seed has been
    /// validated and the output directory prepared; the connection is
    /// dropped when this method returns, whatever the outcome.
    ///
    /// A homepage failure aborts the run after the site record has been
    /// created, leaving that record unfinalized.
    pub async fn run<S, C>(&mut self, seed: &str, connect: C) -> Result<HarvestReport, HarvestError>
    where
        S: Storage,
        C: FnOnce() -> StorageResult<S>,
    {
        self.stage = HarvestStage::Idle;

        match self.run_stages(seed, connect).await {
            Ok(report) => {
                self.advance(HarvestStage::Done);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Harvest aborted during {}: {}", self.stage, e);
                self.advance(HarvestStage::Aborted);
                Err(e)
            }
        }
    }

    async fn run_stages<S, C>(&mut self, seed: &str, connect: C) -> Result<HarvestReport, HarvestError>
    where
        S: Storage,
        C: FnOnce() -> StorageResult<S>,
    {
        // Reject bad seeds before anything touches disk or the store
        self.advance(HarvestStage::ValidatingSeed);
        let seed = seed.trim();
        if !is_valid_url(seed) {
            return Err(HarvestError::InvalidSeed {
                url: seed.to_string(),
            });
        }

        // Schemeless seeds become https so host extraction sees an absolute URL
        let seed_url = normalize_seed(seed);
        let page_url = Url::parse(&seed_url).map_err(|source| UrlError::Parse {
            url: seed_url.clone(),
            source,
        })?;
        let host = extract_host(&seed_url)?;

        // An existing host directory is reused
        self.advance(HarvestStage::PreparingOutput);
        let output_dir = prepare_output_dir(&self.output_root, &host)?;

        self.advance(HarvestStage::ConnectingStore);
        let mut storage = connect()?;
        let site_id = storage.create_site(&host)?;

        // Elapsed time is measured from the start the store recorded
        let started_at = storage.get_site(site_id)?.started_at;
        tracing::info!("Harvesting {} into {} (site {})", host, output_dir.display(), site_id);

        // From here on a failure leaves the site row unfinalized
        self.advance(HarvestStage::FetchingHome);
        let home = self
            .fetcher
            .fetch(page_url.as_str(), &output_dir, HOMEPAGE_FILE)
            .await
            .map_err(|source| HarvestError::Fetch {
                url: page_url.to_string(),
                source,
            })?;
        tracing::info!("Homepage stored at: {}", home.path.display());

        // Relative links resolve against where the homepage was served from,
        // which differs from the seed after a redirect
        self.advance(HarvestStage::ExtractingLinks);
        let base = home.final_url.clone().unwrap_or_else(|| page_url.clone());
        if base != page_url {
            tracing::info!("Homepage redirected: {} -> {}", page_url, base);
        }
        let links = extract_links(&home.path, &base)?;
        tracing::info!("Found {} links on {}", links.len(), base);

        let (downloaded, failures) = self
            .fetch_links(site_id, &links, &output_dir, &mut storage)
            .await;

        // Every link attempt has completed; close out the site record
        self.advance(HarvestStage::Finalizing);
        let finished_at = Utc::now().max(started_at);
        let total_size_kb = directory_size_kb(&output_dir)?;
        storage.finalize_site(site_id, started_at, finished_at, total_size_kb)?;

        tracing::info!(
            "Harvest of {} finished: {} downloaded, {} failed, {} KB",
            host,
            downloaded.len(),
            failures.len(),
            total_size_kb
        );

        Ok(HarvestReport {
            site_id,
            host,
            output_dir,
            homepage: home.path,
            links_found: links.len(),
            downloaded,
            failures,
            total_size_kb,
            started_at,
            finished_at,
        })
    }

    /// Downloads every link, keeping at most `max_concurrent` in flight
    ///
    /// Each task times only its own fetch. Recording happens here, on the
    /// coordinator, as completion events arrive. Returns once every attempt
    /// has completed.
    async fn fetch_links<S: Storage>(
        &mut self,
        site_id: SiteId,
        links: &[String],
        output_dir: &Path,
        storage: &mut S,
    ) -> (Vec<DownloadedResource>, Vec<LinkFailure>) {
        let mut downloaded = Vec::new();
        let mut failures = Vec::new();
        let mut in_flight = JoinSet::new();
        let mut unsettled: BTreeMap<usize, String> = BTreeMap::new();
        let mut pending = links.iter().enumerate();

        loop {
            // Top up the pool from the pending links
            while in_flight.len() < self.max_concurrent {
                let Some((index, url)) = pending.next() else {
                    break;
                };
                self.advance(HarvestStage::FetchingLinks(index));
                tracing::info!("Downloading: {}", url);

                let filename = match resource_file_name(url) {
                    Ok(name) => name,
                    Err(e) => {
                        tracing::warn!("Error downloading: {}: {}", url, e);
                        failures.push(LinkFailure {
                            index,
                            url: url.clone(),
                            error: e.into(),
                        });
                        continue;
                    }
                };

                // Track the link until its completion event arrives
                unsettled.insert(index, url.clone());
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                let directory = output_dir.to_path_buf();

                in_flight.spawn(async move {
                    let started = Instant::now();
                    let result = fetcher.fetch(&url, &directory, &filename).await;
                    LinkAttempt {
                        index,
                        url,
                        elapsed: started.elapsed(),
                        result,
                    }
                });
            }

            // Pool drained and nothing left to start
            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok(attempt) => {
                    unsettled.remove(&attempt.index);
                    settle_attempt(attempt, site_id, storage, &mut downloaded, &mut failures);
                }
                Err(e) => tracing::error!("Link download task failed: {}", e),
            }
        }

        // Whatever never reported back died inside its task
        for (index, url) in unsettled {
            tracing::warn!("Error downloading: {}: task ended without a result", url);
            failures.push(LinkFailure {
                index,
                url,
                error: LinkError::Worker,
            });
        }

        // Completion order is arbitrary with more than one worker
        downloaded.sort_by_key(|d| d.index);
        failures.sort_by_key(|f| f.index);
        (downloaded, failures)
    }
}

/// Records a successful attempt, or files it as a failure
fn settle_attempt<S: Storage>(
    attempt: LinkAttempt,
    site_id: SiteId,
    storage: &mut S,
    downloaded: &mut Vec<DownloadedResource>,
    failures: &mut Vec<LinkFailure>,
) {
    let LinkAttempt {
        index,
        url,
        elapsed,
        result,
    } = attempt;
    // Fetch time only; recording below is not counted
    let elapsed_ms = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);

    let saved = match result {
        Ok(saved) => saved,
        Err(e) => {
            if e.is_network() {
                tracing::warn!("Error downloading: {}: network failure: {}", url, e);
            } else {
                tracing::warn!("Error downloading: {}: {}", url, e);
            }
            failures.push(LinkFailure {
                index,
                url,
                error: e.into(),
            });
            return;
        }
    };

    let size_kb = saved.size_kb();
    tracing::info!(
        "Resource fetched: {} ({} KB) in {} ms",
        url,
        size_kb,
        elapsed_ms
    );

    // A store failure costs this link only, not the run
    match storage.record_resource(site_id, &url, elapsed_ms, size_kb) {
        Ok(_) => downloaded.push(DownloadedResource {
            index,
            url,
            path: saved.path,
            elapsed_ms,
            size_kb,
        }),
        Err(e) => {
            tracing::warn!("Failed to record {}: {}", url, e);
            failures.push(LinkFailure {
                index,
                url,
                error: e.into(),
            });
        }
    }
}

/// Runs a harvest of `seed` over HTTP with the given configuration
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::Config;
/// use site_harvest::crawler::harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = harvest(&Config::default(), "https://example.com").await?;
/// println!("{} resources downloaded", report.downloaded.len());
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: &Config, seed: &str) -> Result<HarvestReport, HarvestError> {
    let fetcher = HttpFetcher::from_config(&config.fetcher)?;
    let mut harvester = Harvester::new(fetcher, &config.output.root_dir)
        .with_max_concurrent(config.fetcher.max_concurrent_fetches);

    harvester.run(seed, || open_storage(&config.store)).await
}
