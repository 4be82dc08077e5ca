//! Catalog Service
//!
//! Read-through video catalog: list reads are served from the TTL caches,
//! writes go to the authoritative store and invalidate through its hook.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod telemetry;

// Public re-exports
pub use catalog::{VideoCatalog, WarmupSummary};
pub use config::{Config, LogFormat};
pub use error::{AppError, Result};
