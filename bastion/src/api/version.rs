//! API version gate
//!
//! Every operation checks the connected API version against the set its
//! resource accepts before issuing any request.

use super::ApiError;

pub const V3_3: &str = "v3.3";
pub const V3_6: &str = "v3.6";
pub const V3_8: &str = "v3.8";
pub const V3_12: &str = "v3.12";

/// Versions accepted by resources validated only against the oldest API
pub const ONLY_V3_3: &[&str] = &[V3_3];

pub fn default_versions() -> &'static [&'static str] {
    &[V3_3, V3_6, V3_8, V3_12]
}

pub fn check(resource: &str, connected: &str, accepted: &[&str]) -> Result<(), ApiError> {
    if accepted.contains(&connected) {
        return Ok(());
    }

    Err(ApiError::UnsupportedVersion {
        resource: resource.to_string(),
        version: connected.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_listed_version() {
        assert!(check("bastion_application", "v3.3", ONLY_V3_3).is_ok());
        assert!(check("bastion_localpasswordpolicy", "v3.12", default_versions()).is_ok());
    }

    #[test]
    fn rejects_unlisted_version() {
        let err = check("bastion_application", "v3.8", ONLY_V3_3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bastion_application is not available with api version v3.8"
        );
    }

    #[test]
    fn comparison_is_exact() {
        assert!(check("bastion_application", "v3.30", ONLY_V3_3).is_err());
        assert!(check("bastion_application", "V3.3", ONLY_V3_3).is_err());
        assert!(check("bastion_application", "", ONLY_V3_3).is_err());
    }
}
