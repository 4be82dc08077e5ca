//! Representation (quality tier) value object
//!
//! A video offers up to three representations. Each one is stored as four
//! columns that are either all set or all NULL; in memory an unset slot is
//! simply `None`, so a half-filled representation cannot exist.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_REPRESENTATION_NAME_LENGTH;
use crate::error::{ModelError, ModelResult};

/// Fixed bitrate/resolution encoding tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RepresentationFields")]
pub struct Representation {
    name: String,
    bandwidth: i32, // bits per second
    width: i32,
    height: i32,
}

impl Representation {
    pub fn new(
        name: impl Into<String>,
        bandwidth: i32,
        width: i32,
        height: i32,
    ) -> ModelResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::InvalidRepresentation(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_REPRESENTATION_NAME_LENGTH {
            return Err(ModelError::InvalidRepresentation(format!(
                "name exceeds {MAX_REPRESENTATION_NAME_LENGTH} characters"
            )));
        }
        if bandwidth <= 0 || width <= 0 || height <= 0 {
            return Err(ModelError::InvalidRepresentation(format!(
                "{name}: bandwidth, width and height must be positive"
            )));
        }

        Ok(Self {
            name,
            bandwidth,
            width,
            height,
        })
    }

    /// Build a slot from its four nullable columns.
    ///
    /// All absent yields `Ok(None)`; a mix of present and absent fields is
    /// rejected with [`ModelError::PartialRepresentation`].
    pub fn from_parts(
        name: Option<String>,
        bandwidth: Option<i32>,
        width: Option<i32>,
        height: Option<i32>,
    ) -> ModelResult<Option<Self>> {
        match (name, bandwidth, width, height) {
            (None, None, None, None) => Ok(None),
            (Some(name), Some(bandwidth), Some(width), Some(height)) => {
                Self::new(name, bandwidth, width, height).map(Some)
            }
            _ => Err(ModelError::PartialRepresentation),
        }
    }

    /// Split a slot back into its four nullable columns.
    pub fn into_parts(
        slot: Option<&Self>,
    ) -> (Option<&str>, Option<i32>, Option<i32>, Option<i32>) {
        match slot {
            Some(r) => (
                Some(r.name.as_str()),
                Some(r.bandwidth),
                Some(r.width),
                Some(r.height),
            ),
            None => (None, None, None, None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bandwidth(&self) -> i32 {
        self.bandwidth
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

/// Unvalidated wire form, checked through [`Representation::new`] on deserialize
#[derive(Deserialize)]
struct RepresentationFields {
    name: String,
    bandwidth: i32,
    width: i32,
    height: i32,
}

impl TryFrom<RepresentationFields> for Representation {
    type Error = ModelError;

    fn try_from(fields: RepresentationFields) -> ModelResult<Self> {
        Representation::new(fields.name, fields.bandwidth, fields.width, fields.height)
    }
}

/// Position of a representation on a video (1, 2 or 3).
///
/// By convention slot 1 is the highest quality and slot 3 the lowest; the
/// model itself does not enforce any ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepresentationSlot {
    First,
    Second,
    Third,
}

impl RepresentationSlot {
    pub const ALL: [RepresentationSlot; 3] = [
        RepresentationSlot::First,
        RepresentationSlot::Second,
        RepresentationSlot::Third,
    ];

    /// 1-based slot number, matching the `representation_N` column names
    pub fn number(self) -> usize {
        match self {
            RepresentationSlot::First => 1,
            RepresentationSlot::Second => 2,
            RepresentationSlot::Third => 3,
        }
    }
}

/// Tiers assigned to new videos by the ingestion endpoint
pub struct DefaultRepresentations;

impl DefaultRepresentations {
    pub fn high() -> Representation {
        Representation {
            name: "high".to_string(),
            bandwidth: 3_000_000,
            width: 1280,
            height: 720,
        }
    }

    pub fn medium() -> Representation {
        Representation {
            name: "medium".to_string(),
            bandwidth: 1_500_000,
            width: 854,
            height: 480,
        }
    }

    pub fn low() -> Representation {
        Representation {
            name: "low".to_string(),
            bandwidth: 500_000,
            width: 426,
            height: 240,
        }
    }
}
