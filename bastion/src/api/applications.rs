//! Application endpoints

use super::common::{deserialize_id, segment, ApiQueryParams};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "/applications/";

/// Application record as sent to and returned by `/applications/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_id"
    )]
    pub id: String,
    pub application_name: String,
    pub connection_policy: String,
    pub description: String,
    pub parameters: String,
    pub target: String,
    /// Always serialized, `[]` when empty
    pub global_domains: Vec<String>,
    pub paths: Vec<ApplicationPath>,
    /// Returned by the appliance only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_domains: Option<Vec<ApplicationLocalDomain>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationPath {
    pub target: String,
    pub program: String,
    pub working_dir: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationLocalDomain {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub admin_account: String,
    pub domain_name: String,
    pub description: String,
    pub enable_password_change: bool,
    pub password_change_policy: String,
    pub password_change_plugin: String,
    /// Plugin-defined payload, passed through uninterpreted
    pub password_change_plugin_parameters: serde_json::Value,
}

pub fn item_path(id: &str) -> String {
    format!("{}{}", COLLECTION, segment(id))
}

/// Updates are forced so the appliance accepts changes to in-use applications
pub fn update_path(id: &str) -> String {
    format!("{}?force=true", item_path(id))
}

/// Name and id of every application, unpaginated
pub fn search_path() -> String {
    let query = ApiQueryParams::new()
        .add("fields", "application_name,id")
        .add("limit", -1)
        .to_query_string();
    format!("{}{}", COLLECTION, query)
}
