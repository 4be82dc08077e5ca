/// Catalog cache warmup
///
/// Loads the video list and every video's segment list from the store into
/// the list cache, then exits.
use catalog_service::{bootstrap, telemetry, Config};
use prometheus::Registry;
use tracing::info;
use video_cache::CacheMetrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format)?;

    let registry = Registry::new();
    CacheMetrics::register(&registry)?;

    info!(
        max_connections = config.database_max_connections,
        ttl_secs = config.cache_ttl_secs,
        "Starting catalog warmup"
    );

    let catalog = bootstrap::build(&config).await?;
    let summary = catalog.warm().await?;

    let writes: f64 = registry
        .gather()
        .iter()
        .filter(|family| family.get_name() == "video_cache_writes_total")
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_counter().get_value())
        .sum();

    info!(
        videos = summary.videos,
        segments = summary.segments,
        cache_writes = writes,
        "Catalog warmup complete"
    );
    Ok(())
}
