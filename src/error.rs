//! Error types for the context engine
//!
//! Errors are classified by who has to act:
//! - CallerBug: malformed drafts/patches from a collaborator module
//! - Recoverable: persistence or configuration problems, retry after fixing
//!
//! Unknown ids are never errors. Updates on them are no-ops and queries
//! return empty results.

use thiserror::Error;

/// Error types for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    // Caller bugs
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Confidence must be within [0, 1], got {0}")]
    InvalidConfidence(f64),

    // Recoverable
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Returns true if the error points at a collaborator sending bad input
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            EngineError::MissingField(_)
                | EngineError::InvalidValue { .. }
                | EngineError::InvalidConfidence(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EngineError::MissingField(_) => "Provide the missing field and resend the event.",
            EngineError::InvalidValue { .. } => "Use one of the documented values for this field.",
            EngineError::InvalidConfidence(_) => "Clamp the confidence into [0, 1] before emitting.",
            EngineError::Io(_) => "Check file permissions and disk space.",
            EngineError::Serialization(_) => "Check the stored file is valid JSON.",
            EngineError::Persistence(_) => "Retry the save; the in-memory state is unaffected.",
            EngineError::Config(_) => "Check your configuration in ~/.contextos/config.json",
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Serializable error representation for IPC hosts
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub message: String,
    pub error_kind: ErrorKind,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    CallerBug,
    Recoverable,
}

impl From<&EngineError> for CommandError {
    fn from(err: &EngineError) -> Self {
        let error_kind = if err.is_caller_bug() {
            ErrorKind::CallerBug
        } else {
            ErrorKind::Recoverable
        };

        CommandError {
            message: err.to_string(),
            error_kind,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_caller_bug() {
        let err = EngineError::MissingField("title");
        assert!(err.is_caller_bug());
        assert_eq!(err.to_string(), "Missing required field: title");
    }

    #[test]
    fn test_io_error_is_recoverable() {
        let err: EngineError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(!err.is_caller_bug());
        let payload = CommandError::from(&err);
        assert_eq!(payload.error_kind, ErrorKind::Recoverable);
        assert!(payload.message.contains("disk full"));
    }
}
