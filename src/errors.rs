// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Service request failed with status {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Service returned an error: {0}")]
    ApiResponse(String),

    #[error("Unexpected response structure: {0}")]
    UnexpectedResponse(String),

    #[error("Could not reach page: {0}")]
    PageUnreachable(String),

    #[error("{message}")]
    Extraction {
        message: String,
        details: Option<String>,
    },

    #[error("No problem has been extracted yet")]
    NoCachedProblem,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoachError {
    /// True for failures that happened on the way to or inside the analysis service.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            CoachError::Request(_)
                | CoachError::JsonParse(_)
                | CoachError::ApiError { .. }
                | CoachError::ApiResponse(_)
                | CoachError::UnexpectedResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;
