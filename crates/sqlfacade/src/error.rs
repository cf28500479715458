//! Error types for sqlfacade

use crate::config::DbType;
use std::fmt;
use thiserror::Error;

/// Result type alias for sqlfacade operations
pub type DbResult<T> = Result<T, DbError>;

/// Fatal errors raised by the facade.
///
/// Safemode trips and empty statements are not errors; they come back as
/// [`Outcome::GuardRejected`](crate::Outcome::GuardRejected) and
/// [`Outcome::EmptyStatement`](crate::Outcome::EmptyStatement).
#[derive(Debug, Error)]
pub enum DbError {
    /// The backend connect call failed
    #[error("Connection error ({backend}): {message}")]
    Connection { backend: DbType, message: String },

    /// The backend rejected a statement (syntax, constraint, lost link, ...)
    #[error("Statement error ({backend}): {message}")]
    Statement { backend: DbType, message: String },

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Create a connection error carrying the backend's native text.
    pub fn connection(backend: DbType, message: impl fmt::Display) -> Self {
        Self::Connection {
            backend,
            message: message.to_string(),
        }
    }

    /// Create a statement error carrying the backend's native text.
    pub fn statement(backend: DbType, message: impl fmt::Display) -> Self {
        Self::Statement {
            backend,
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a connection failure
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Check if this is a statement failure
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement { .. })
    }

    /// The native diagnostic text reported by the backend, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Connection { message, .. } | Self::Statement { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for DbError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
