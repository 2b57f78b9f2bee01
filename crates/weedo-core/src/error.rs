//! # Validation Errors
//!
//! Errors raised while parsing addressing primitives. They carry the
//! rejected input so a caller can log exactly what it was handed.
//! None of these are retryable: the same input always fails the same way.

use thiserror::Error;

/// Validation errors for weedo identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The string is not a `{volume},{key}{cookie}` file identifier.
    #[error("malformed file id \"{value}\": {reason}")]
    MalformedFileId {
        /// The string that failed to parse.
        value: String,
        /// Which rule it broke.
        reason: &'static str,
    },

    /// The string is not an unsigned 32-bit decimal volume id.
    #[error("invalid volume id \"{0}\" (expected an unsigned 32-bit decimal integer)")]
    InvalidVolumeId(String),
}

impl ValidationError {
    pub(crate) fn malformed(value: &str, reason: &'static str) -> Self {
        Self::MalformedFileId {
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_file_id_display_carries_input_and_reason() {
        let err = ValidationError::malformed("3,short", "key segment too short");
        let msg = format!("{err}");
        assert!(msg.contains("3,short"));
        assert!(msg.contains("key segment too short"));
    }

    #[test]
    fn invalid_volume_id_display() {
        let err = ValidationError::InvalidVolumeId("abc".to_string());
        assert!(format!("{err}").contains("abc"));
        assert!(format!("{err}").contains("32-bit"));
    }
}
