use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Site-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub fetcher: FetcherConfig,
    pub output: OutputConfig,
}

/// Persistent store connection settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where the store lives: a file path, `sqlite://<path>`, or `:memory:`
    #[serde(rename = "connection-string")]
    pub connection_string: String,

    /// Account name used when connecting
    pub username: String,

    /// Account password used when connecting
    pub password: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: "./harvest.db".to_string(),
            username: "harvest".to_string(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("connection_string", &self.connection_string)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP fetching behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum number of link downloads in flight; 1 means sequential
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("site-harvest/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_concurrent_fetches: 1,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory under which the per-host download directory is created
    #[serde(rename = "root-dir")]
    pub root_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
        }
    }
}
