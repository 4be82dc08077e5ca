//! Model validation errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A representation slot had some, but not all, of its four fields set
    #[error("Partial representation: name, bandwidth, width and height must be set together")]
    PartialRepresentation,

    #[error("Invalid representation: {0}")]
    InvalidRepresentation(String),

    #[error("Unknown {kind} value: {value}")]
    UnknownStatus { kind: &'static str, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::UnknownStatus {
            kind: "video status",
            value: "DONE".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown video status value: DONE");

        let err = ModelError::Validation("title must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: title must not be empty");
    }
}
