// src/error/types.rs
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Item is not public domain")]
    RightsRejected,

    #[error("Resource not found")]
    NotFound,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Identifier pool exhausted")]
    PoolExhausted,

    #[error("Unknown source tag: {0}")]
    UnknownSource(String),

    #[error("All sources failed to list identifiers")]
    AllSourcesFailed,

    #[error("Another navigation is already in progress")]
    Busy,

    #[error("No earlier entry in history")]
    NoHistory,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl AppError {
    /// Failures absorbed during pool building and sampling.
    /// Anything else (programming errors, serialization) still propagates.
    pub fn is_absorbable(&self) -> bool {
        matches!(
            self,
            AppError::SourceUnavailable(_)
                | AppError::RightsRejected
                | AppError::NotFound
                | AppError::Malformed(_)
                | AppError::Http(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
