/// Configuration management for catalog-service
///
/// Loads `.env` if present, then reads `CATALOG_*` environment variables.
use serde::Deserialize;
use video_core::constants::DEFAULT_BASE_URL_VIDEOS;

const ENV_PREFIX: &str = "CATALOG_";

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    /// Absent means an in-process cache
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_base_url_videos")]
    pub base_url_videos: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_max_connections() -> u32 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    video_cache::ttl::VIDEO_LIST
}

fn default_base_url_videos() -> String {
    DEFAULT_BASE_URL_VIDEOS.to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::prefixed(ENV_PREFIX).from_env()
    }

    /// Load configuration from explicit `CATALOG_*` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX).from_iter(pairs)
    }
}
