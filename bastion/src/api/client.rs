use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use std::sync::Arc;

use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, ConnectionPoolManager};
use crate::reconcile::{RawResponse, Transport};

const AUTH_USER_HEADER: &str = "X-Auth-User";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Connection settings for one appliance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme, host and port, e.g. `https://bastion.example.com:443`
    pub endpoint: String,
    pub user: String,
    pub token: String,
    pub api_version: String,
    pub insecure: bool,
    pub pool: ConnectionPoolConfig,
}

impl ClientConfig {
    pub fn new(
        endpoint: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            user: user.into(),
            token: token.into(),
            api_version: api_version.into(),
            insecure: false,
            pool: ConnectionPoolConfig::default(),
        }
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}

/// Bastion REST API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    user: String,
    token: String,
    api_version: String,
    pool_manager: ConnectionPoolManager,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let endpoint = config.endpoint.trim_end_matches('/');
        let parsed =
            url::Url::parse(endpoint).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        if parsed.host_str().is_none() {
            return Err(ApiError::InvalidUrl(format!("{}: missing host", endpoint)));
        }
        if config.user.is_empty() || config.token.is_empty() {
            return Err(ApiError::InvalidConfig(
                "user and token must not be empty".to_string(),
            ));
        }

        let pool_manager = ConnectionPoolManager::new(config.pool);
        let http_client = pool_manager.build_client(config.insecure)?;

        let base_url = format!("{}/api/{}", endpoint, config.api_version);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                user: config.user,
                token: config.token,
                api_version: config.api_version,
                pool_manager,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }
}

#[async_trait]
impl Transport for Client {
    async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);

        tracing::debug!("{} request to: {}", method, url);

        let mut builder = self
            .inner
            .http_client
            .request(method, &url)
            .header(AUTH_USER_HEADER, &self.inner.user)
            .header(AUTH_TOKEN_HEADER, &self.inner.token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let stats = self.inner.pool_manager.record_failure().await;
                tracing::debug!(
                    "Request to {} failed ({} of {} requests failed)",
                    url,
                    stats.failed_requests,
                    stats.total_requests
                );
                return Err(ApiError::Request(e));
            }
        };

        let status = response.status().as_u16();
        let stats = self.inner.pool_manager.record_response(status).await;
        tracing::debug!(
            "Response status: {} (requests: {}, failed: {}, not found: {})",
            status,
            stats.total_requests,
            stats.failed_requests,
            stats.not_found
        );

        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    fn api_version(&self) -> &str {
        &self.inner.api_version
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(url: String) -> Client {
        Client::new(ClientConfig::new(url, "admin", "secret-token", "v3.3")).unwrap()
    }

    #[tokio::test]
    async fn client_sends_auth_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3.3/applications/42")
            .match_header("x-auth-user", "admin")
            .match_header("x-auth-token", "secret-token")
            .match_header("content-type", "application/json")
            .with_body(r#"{"id":"42"}"#)
            .create_async()
            .await;

        let client = client_for(server.url());
        let response = client
            .request("/applications/42", Method::GET, None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"id":"42"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_sends_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v3.3/applications/")
            .match_body(Matcher::Json(serde_json::json!({"application_name": "app1"})))
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(server.url());
        let response = client
            .request(
                "/applications/",
                Method::POST,
                Some(serde_json::json!({"application_name": "app1"})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 204);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_returns_error_statuses_uninterpreted() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/v3.3/applications/42")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = client_for(server.url());
        let response = client
            .request("/applications/42", Method::DELETE, None)
            .await
            .unwrap();

        assert_eq!(response, RawResponse::new(403, "forbidden"));
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3.3/externalauths/corp")
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(format!("{}/", server.url()));
        assert_eq!(client.base_url(), format!("{}/api/v3.3", server.url()));

        let _ = client.request("/externalauths/corp", Method::GET, None).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_handles_network_errors() {
        let client = client_for("http://127.0.0.1:1".to_string());

        let result = client.request("/applications/", Method::GET, None).await;
        assert!(matches!(result, Err(ApiError::Request(_))));
    }

    #[test]
    fn client_rejects_invalid_configuration() {
        assert!(matches!(
            Client::new(ClientConfig::new("not a url", "admin", "token", "v3.3")),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            Client::new(ClientConfig::new("https://bastion:443", "", "token", "v3.3")),
            Err(ApiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn client_reports_configured_version() {
        let client = Client::new(
            ClientConfig::new("https://bastion.example.com:443", "admin", "t", "v3.12")
                .insecure(true),
        )
        .unwrap();
        assert_eq!(client.api_version(), "v3.12");
        assert_eq!(
            client.base_url(),
            "https://bastion.example.com:443/api/v3.12"
        );
    }
}
