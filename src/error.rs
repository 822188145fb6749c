//! Error types for the video bot.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Operation {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Backup failed: {0}")]
    Backup(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("API error {code} on channel {name}: {message}")]
    Api {
        name: String,
        code: i64,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// Why a date input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("date is not a calendar date in dd.mm.yyyy form")]
    Format,

    #[error("date lies in the future")]
    Future,
}

/// Why a child name input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name is shorter than {min} characters")]
    TooShort { min: usize },

    #[error("name is longer than {max} characters")]
    TooLong { max: usize },

    #[error("name contains characters other than letters, spaces and hyphens")]
    InvalidChars,
}

/// User input that failed validation. Always recoverable: the user is
/// re-prompted and the conversation state stays where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid date: {0}")]
    Date(#[from] DateError),

    #[error("invalid name: {0}")]
    Name(#[from] NameError),
}

/// Failures that escape a conversation handler and reach the dispatcher's
/// recovery boundary.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Preference for user {user_id} was not saved")]
    PreferenceNotSaved { user_id: i64 },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_convert_upward() {
        let err: ValidationError = DateError::Future.into();
        assert_eq!(err.to_string(), "invalid date: date lies in the future");

        let err: Error = ValidationError::from(NameError::TooShort { min: 2 }).into();
        assert!(matches!(err, Error::Validation(ValidationError::Name(_))));
        assert!(err.to_string().contains("shorter than 2"));
    }

    #[test]
    fn storage_errors_reach_dispatch() {
        let err: DispatchError = DatabaseError::Timeout {
            operation: "insert_submission",
            timeout: Duration::from_secs(30),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Storage error: Operation insert_submission timed out after 30s"
        );
        let err: Error = err.into();
        assert!(matches!(err, Error::Dispatch(DispatchError::Storage(_))));
    }
}
