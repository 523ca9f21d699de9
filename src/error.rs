//! Error types for Glypho live

use thiserror::Error;

/// Result type alias for Glypho live operations
pub type Result<T> = std::result::Result<T, GlyphoError>;

/// Main error type for Glypho live
#[derive(Error, Debug)]
pub enum GlyphoError {
    #[error("HTTP request error: {0}")]
    #[cfg(feature = "client")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(not(feature = "client"))]
    Http(String),

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Unexpected content type from {url}: {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    #[cfg(feature = "client")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Post-processing command `{command}` failed: {message}")]
    Hook { command: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GlyphoError {
    /// Check if the push channel should reconnect after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            GlyphoError::Http(_) | GlyphoError::Io(_) => true,
            GlyphoError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
