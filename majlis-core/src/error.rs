//! Error types for the Majlis core library.
//!
//! The conversation pipeline never fails: a missing speaker, a missing
//! pattern or a closed interval gate all surface as `None`. Errors are
//! reserved for configuration problems, unknown ids and lifecycle misuse.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Config | Config files, environment and validation errors |
//! | E2001-E2099 | Participant | Unknown participants and status changes |
//! | E3001-E3099 | Engine | Engine and meeting lifecycle errors |
//! | E9001-E9099 | General | Internal, IO and serialization errors |

use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// The main error type for the Majlis core library.
#[derive(Debug, Error)]
pub enum MajlisError {
    // ========================================================================
    // Configuration Errors (E1001-E1099)
    // ========================================================================
    /// Environment variable has an invalid value
    #[error("[E1001] Invalid environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Configuration file parse error
    #[error("[E1002] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E1003] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Participant Errors (E2001-E2099)
    // ========================================================================
    /// Participant id is not part of the pool
    #[error("[E2001] Participant not found: {0}")]
    ParticipantNotFound(String),

    /// Unknown personality tag
    #[error("[E2002] Unknown personality: {0}")]
    UnknownPersonality(String),

    /// Unknown participant status
    #[error("[E2003] Unknown participant status: {0}")]
    UnknownStatus(String),

    // ========================================================================
    // Engine Errors (E3001-E3099)
    // ========================================================================
    /// Engine was destroyed and cannot be used again
    #[error("[E3001] Conversation engine is stopped")]
    EngineStopped,

    /// Engine ticker is already running
    #[error("[E3002] Conversation engine already running")]
    EngineAlreadyRunning,

    /// Meeting id is not registered
    #[error("[E3003] Meeting not found: {0}")]
    MeetingNotFound(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("[E9002] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9003] Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for Majlis operations.
pub type MajlisResult<T> = Result<T, MajlisError>;

impl From<serde_json::Error> for MajlisError {
    fn from(err: serde_json::Error) -> Self {
        MajlisError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for MajlisError {
    fn from(err: std::io::Error) -> Self {
        MajlisError::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for MajlisError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => MajlisError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => MajlisError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => MajlisError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => MajlisError::ConfigParseError(err.to_string()),
        }
    }
}

impl MajlisError {
    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            MajlisError::InvalidEnvVar { .. }
                | MajlisError::ConfigParseError(_)
                | MajlisError::InvalidConfigValue { .. }
        )
    }

    pub fn is_participant_error(&self) -> bool {
        matches!(
            self,
            MajlisError::ParticipantNotFound(_)
                | MajlisError::UnknownPersonality(_)
                | MajlisError::UnknownStatus(_)
        )
    }

    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            MajlisError::EngineStopped
                | MajlisError::EngineAlreadyRunning
                | MajlisError::MeetingNotFound(_)
        )
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            MajlisError::InvalidEnvVar { .. } => "E1001",
            MajlisError::ConfigParseError(_) => "E1002",
            MajlisError::InvalidConfigValue { .. } => "E1003",
            MajlisError::ParticipantNotFound(_) => "E2001",
            MajlisError::UnknownPersonality(_) => "E2002",
            MajlisError::UnknownStatus(_) => "E2003",
            MajlisError::EngineStopped => "E3001",
            MajlisError::EngineAlreadyRunning => "E3002",
            MajlisError::MeetingNotFound(_) => "E3003",
            MajlisError::Internal(_) => "E9001",
            MajlisError::IoError(_) => "E9002",
            MajlisError::SerializationError(_) => "E9003",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            MajlisError::InvalidConfigValue { .. } | MajlisError::ConfigParseError(_) => {
                Some("Run 'majlis config' to inspect the effective configuration")
            }
            MajlisError::UnknownPersonality(_) => Some(
                "Use one of: professional, friendly, technical, creative, manager",
            ),
            MajlisError::UnknownStatus(_) => Some("Use one of: active, away, offline"),
            MajlisError::ParticipantNotFound(_) => {
                Some("Run 'majlis participants' to list participant ids")
            }
            MajlisError::EngineStopped => {
                Some("Open a new meeting; a destroyed engine cannot be restarted")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_participant_error() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Participant error: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

/// Format an error for CLI display with its suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a MajlisError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a MajlisError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl<'a> fmt::Display for CliErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MajlisError::ParticipantNotFound("abc".to_string());
        assert!(err.to_string().contains("E2001"));
        assert!(err.to_string().contains("abc"));

        let err = MajlisError::InvalidConfigValue {
            key: "simulation.seed".to_string(),
            message: "bad".to_string(),
        };
        assert!(err.to_string().contains("E1003"));
        assert!(err.to_string().contains("simulation.seed"));
    }

    #[test]
    fn test_error_categorization() {
        assert!(MajlisError::ConfigParseError("x".into()).is_config_error());
        assert!(!MajlisError::EngineStopped.is_config_error());
        assert!(MajlisError::UnknownStatus("x".into()).is_participant_error());
        assert!(MajlisError::EngineStopped.is_lifecycle_error());
        assert!(MajlisError::MeetingNotFound("m".into()).is_lifecycle_error());
    }

    #[test]
    fn test_error_codes_match_display() {
        let errors = vec![
            MajlisError::InvalidEnvVar {
                name: "MAJLIS_SEED".into(),
                message: "nan".into(),
            },
            MajlisError::ParticipantNotFound("p".into()),
            MajlisError::EngineAlreadyRunning,
            MajlisError::Internal("boom".into()),
        ];

        for err in errors {
            assert!(err.to_string().contains(err.error_code()));
        }
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MajlisError = io.into();
        assert_eq!(err.error_code(), "E9002");
    }

    #[test]
    fn test_cli_error_display() {
        let err = MajlisError::UnknownPersonality("poet".to_string());
        let rendered = CliErrorDisplay::new(&err).to_string();
        assert!(rendered.contains("poet"));
        assert!(rendered.contains("Suggestion"));

        let rendered = CliErrorDisplay::new(&err).without_suggestion().to_string();
        assert!(!rendered.contains("Suggestion"));
    }
}
