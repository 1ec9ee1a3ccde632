//! Device, local domain, account and credential endpoints

use super::common::{deserialize_id, segment};
use super::ApiError;
use crate::reconcile::Transport;
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const CREDENTIAL_PASSWORD: &str = "password";
pub const CREDENTIAL_SSH_KEY: &str = "ssh_key";

/// Account credential. Secrets are write-only and never come back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credential {
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_id"
    )]
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub passphrase: String,
}

pub fn device_path(device_id: &str) -> String {
    format!("/devices/{}", segment(device_id))
}

pub fn local_domain_path(device_id: &str, domain_id: &str) -> String {
    format!("{}/localdomains/{}", device_path(device_id), segment(domain_id))
}

pub fn account_path(device_id: &str, domain_id: &str, account_id: &str) -> String {
    format!(
        "{}/accounts/{}",
        local_domain_path(device_id, domain_id),
        segment(account_id)
    )
}

pub fn credentials_path(device_id: &str, domain_id: &str, account_id: &str) -> String {
    format!("{}/credentials/", account_path(device_id, domain_id, account_id))
}

pub fn credential_path(device_id: &str, domain_id: &str, account_id: &str, id: &str) -> String {
    format!(
        "{}{}",
        credentials_path(device_id, domain_id, account_id),
        segment(id)
    )
}

/// 200 is present, 404 is absent, anything else is an error
pub async fn exists(transport: &dyn Transport, path: &str) -> Result<bool, ApiError> {
    let response = transport.request(path, Method::GET, None).await?;
    match response.status {
        200 => Ok(true),
        404 => Ok(false),
        _ => Err(response.into_error()),
    }
}
