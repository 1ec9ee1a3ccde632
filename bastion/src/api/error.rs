use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {status} with body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("{resource} is not available with api version {version}")]
    UnsupportedVersion { resource: String, version: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn unexpected(status: u16, body: impl Into<String>) -> Self {
        ApiError::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::ParseError(e.to_string())
    }
}
