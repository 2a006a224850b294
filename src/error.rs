//! Error types and handling for the `lifecost` application

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for the `lifecost` application
#[derive(Error, Debug)]
pub enum LifeCostError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A city (or other reference record) is not in the store
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Reference-data store errors
    #[error("Store error: {message}")]
    Store { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl LifeCostError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            LifeCostError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            LifeCostError::Api { .. } => {
                "Unable to reach the data providers. Please check your internet connection."
                    .to_string()
            }
            LifeCostError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            LifeCostError::NotFound { message } => {
                format!("{message}. Please try refreshing the data.")
            }
            LifeCostError::Store { .. } => {
                "Unable to read the city database. Please check the store location.".to_string()
            }
            LifeCostError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            LifeCostError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            LifeCostError::General { message } => message.clone(),
        }
    }
}

impl From<fjall::Error> for LifeCostError {
    fn from(err: fjall::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<postcard::Error> for LifeCostError {
    fn from(err: postcard::Error) -> Self {
        Self::store(format!("Corrupt record: {err}"))
    }
}

impl From<tokio::task::JoinError> for LifeCostError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::general(format!("Background task failed: {err}"))
    }
}

impl From<LifeCostError> for StatusCode {
    fn from(err: LifeCostError) -> Self {
        match err {
            LifeCostError::Validation { .. } => StatusCode::BAD_REQUEST,
            LifeCostError::NotFound { .. } => StatusCode::NOT_FOUND,
            LifeCostError::Api { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
