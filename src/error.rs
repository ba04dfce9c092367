use thiserror::Error;

use crate::buckets::BucketError;
use crate::client::pagination::PaginationError;

#[derive(Debug, Error)]
pub enum AppErrors {
    // -- General error
    #[error("Error: {0}")]
    Error(String),

    #[error("Can't set tracing Global Default")]
    SetGlobalDefaultError(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Can't set the logger")]
    SetLoggerError(#[from] tracing_log::log::SetLoggerError),

    // -- Transport error
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("GitHub returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Invalid header value {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Request canceled")]
    Canceled,

    // -- Decode error
    #[error("Failed to decode page at `{path}`: {message}")]
    Decode { path: String, message: String },

    // -- Bucketing error
    #[error("Bucketing error: {0}")]
    Bucket(#[from] BucketError),

    // -- File error
    #[error("Failed to open file")]
    FileError(#[from] std::io::Error),

    #[error("Configuration error")]
    ConfigurationError(#[from] config::ConfigError),

    // -- Output error
    #[error("Failed to write csv")]
    CsvError(#[from] csv::Error),

    #[error("Failed to serialise json")]
    JsonError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for AppErrors {
    fn from(error: reqwest::Error) -> Self {
        AppErrors::TransportError(error.to_string())
    }
}
