//! External authentication endpoints

use super::common::{deserialize_id, segment};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "/externalauths/";

/// Every LDAP record is posted with this type
pub const LDAP_TYPE: &str = "LDAP";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalAuthLdap {
    #[serde(
        skip_serializing_if = "String::is_empty",
        deserialize_with = "deserialize_id"
    )]
    pub id: String,
    pub authentication_name: String,
    #[serde(rename = "type")]
    pub auth_type: String,
    pub host: String,
    pub port: i64,
    pub timeout: f64,
    pub cn_attribute: String,
    pub ldap_base: String,
    pub login_attribute: String,
    pub ca_certificate: String,
    pub certificate: String,
    pub description: String,
    pub is_active_directory: bool,
    pub is_anonymous_access: bool,
    pub is_protected_user: bool,
    pub is_ssl: bool,
    pub is_starttls: bool,
    pub use_primary_auth_domain: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub login: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub private_key: String,
}

pub fn item_path(id: &str) -> String {
    format!("{}{}", COLLECTION, segment(id))
}

/// Lookup by name answers with an array of matching configurations
pub fn search_path(authentication_name: &str) -> String {
    item_path(authentication_name)
}
