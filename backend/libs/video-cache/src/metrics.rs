//! Prometheus counters for list cache traffic
//!
//! One counter family per [`CacheEvent`], labelled by the key's entity
//! segment (`videos`, `segments`). Families are created once per process and
//! can be registered on any number of registries.

use crate::keys::CacheKey;
use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

/// Something a cache backend did with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Hit,
    Miss,
    Write,
    Invalidation,
    Error,
}

impl CacheEvent {
    const ALL: [CacheEvent; 5] = [
        CacheEvent::Hit,
        CacheEvent::Miss,
        CacheEvent::Write,
        CacheEvent::Invalidation,
        CacheEvent::Error,
    ];

    fn metric_name(self) -> &'static str {
        match self {
            CacheEvent::Hit => "video_cache_hits_total",
            CacheEvent::Miss => "video_cache_misses_total",
            CacheEvent::Write => "video_cache_writes_total",
            CacheEvent::Invalidation => "video_cache_invalidations_total",
            CacheEvent::Error => "video_cache_errors_total",
        }
    }

    fn help(self) -> &'static str {
        match self {
            CacheEvent::Hit => "List cache reads answered from cache",
            CacheEvent::Miss => "List cache reads that found nothing",
            CacheEvent::Write => "List cache entries written",
            CacheEvent::Invalidation => "List cache entries evicted",
            CacheEvent::Error => "List cache backend failures",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

static FAMILIES: OnceLock<[CounterVec; 5]> = OnceLock::new();

fn families() -> &'static [CounterVec; 5] {
    FAMILIES.get_or_init(|| {
        CacheEvent::ALL.map(|event| {
            CounterVec::new(Opts::new(event.metric_name(), event.help()), &["entity"])
                .expect("valid metric definition")
        })
    })
}

fn entity_label(key: &str) -> &str {
    CacheKey::entity_type(key).unwrap_or("unknown")
}

/// Handle for recording cache events; all handles share the same counters
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register every counter family with `registry`
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        for family in families() {
            registry.register(Box::new(family.clone()))?;
        }
        Ok(())
    }

    pub fn record(&self, key: &str, event: CacheEvent) {
        families()[event.index()]
            .with_label_values(&[entity_label(key)])
            .inc();
    }

    /// Current count of `event` for an entity label
    pub fn count(&self, entity: &str, event: CacheEvent) -> u64 {
        families()[event.index()]
            .with_label_values(&[entity])
            .get() as u64
    }
}
