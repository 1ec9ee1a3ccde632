use crate::api::ApiError;
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

/// Status and body of one appliance response, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Reads succeed on 200 only
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Writes succeed on 200 or 204
    pub fn is_write_success(&self) -> bool {
        self.status == 200 || self.status == 204
    }

    pub fn into_error(self) -> ApiError {
        ApiError::unexpected(self.status, self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(ApiError::from)
    }

    /// Fails with the raw status and body unless the read succeeded
    pub fn expect_ok(self) -> Result<Self, ApiError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Fails with the raw status and body unless the write succeeded
    pub fn expect_write(self) -> Result<Self, ApiError> {
        if self.is_write_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }
}

/// One HTTP exchange with the appliance. Implementations do not retry and
/// do not interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ApiError>;

    /// API version the appliance was configured with, e.g. `v3.3`
    fn api_version(&self) -> &str;
}
