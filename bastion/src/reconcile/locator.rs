use super::transport::Transport;
use crate::api::common::id_of;
use crate::api::ApiError;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// Resolves a natural identity to the appliance-assigned id
#[async_trait]
pub trait Locator: Send + Sync {
    async fn find(&self, transport: &dyn Transport, identity: &str)
        -> Result<Option<String>, ApiError>;
}

/// GET a list endpoint and return the id of the first entry whose `field`
/// equals the identity exactly
#[derive(Debug, Clone)]
pub struct ListLocator {
    path: String,
    field: &'static str,
}

impl ListLocator {
    pub fn new(path: impl Into<String>, field: &'static str) -> Self {
        Self {
            path: path.into(),
            field,
        }
    }
}

#[async_trait]
impl Locator for ListLocator {
    async fn find(
        &self,
        transport: &dyn Transport,
        identity: &str,
    ) -> Result<Option<String>, ApiError> {
        let response = transport
            .request(&self.path, Method::GET, None)
            .await?
            .expect_ok()?;
        let entries: Vec<Value> = response.json()?;

        let found = entries
            .iter()
            .find(|entry| entry.get(self.field).and_then(Value::as_str) == Some(identity));

        match found {
            Some(entry) => id_of(entry).map(Some).ok_or_else(|| {
                ApiError::ParseError(format!("{} {} has no usable id", self.field, identity))
            }),
            None => Ok(None),
        }
    }
}
