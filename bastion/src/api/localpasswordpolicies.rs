//! Local password policy endpoints

use super::common::{deserialize_id, ApiQueryParams};
use super::ApiError;
use crate::reconcile::Transport;
use reqwest::Method;
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "/localpasswordpolicies/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalPasswordPolicy {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub password_policy_name: String,
    pub allow_same_user_and_password: bool,
    pub password_expiration: i64,
    pub password_warning_days: i64,
    pub password_min_length: i64,
    pub password_min_lower_chars: i64,
    pub password_min_upper_chars: i64,
    pub password_min_digit_chars: i64,
    pub password_min_special_chars: i64,
    pub last_passwords_to_reject: i64,
    pub max_auth_failures: i64,
    pub ssh_rsa_min_length: i64,
    pub forbidden_passwords: Vec<String>,
    pub ssh_key_algos_allowed: Vec<String>,
}

pub fn search_path(name: &str) -> String {
    let query = ApiQueryParams::new()
        .add("q", format!("password_policy_name={}", name))
        .to_query_string();
    format!("{}{}", COLLECTION, query)
}

/// First policy whose name matches the query, if any
pub async fn find_by_name(
    transport: &dyn Transport,
    name: &str,
) -> Result<Option<LocalPasswordPolicy>, ApiError> {
    let response = transport
        .request(&search_path(name), Method::GET, None)
        .await?
        .expect_ok()?;
    let policies: Vec<LocalPasswordPolicy> = response.json()?;
    Ok(policies.into_iter().next())
}
