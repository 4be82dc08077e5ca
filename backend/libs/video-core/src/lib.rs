//! Video catalog core models and types
//!
//! Shared data structures for the catalog store, cache and service crates:
//! videos, their segments, representation tiers and the read shapes exposed
//! to API handlers.

pub mod constants;
pub mod error;
pub mod models;
pub mod representation;
pub mod views;

pub use error::{ModelError, ModelResult};
pub use models::*;
pub use representation::{DefaultRepresentations, Representation, RepresentationSlot};
pub use views::{VideoSegmentView, VideoView};
