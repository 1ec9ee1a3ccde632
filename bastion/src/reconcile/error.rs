use crate::api::ApiError;
use thiserror::Error;

/// Failure of one reconciliation step. Every variant names the resource type
/// and, where one is known, the identity being reconciled.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Rejected by the version gate before any request
    #[error(transparent)]
    UnsupportedVersion(ApiError),

    #[error("{resource} {identity}: {source}")]
    Api {
        resource: String,
        identity: String,
        #[source]
        source: ApiError,
    },

    #[error("{resource} {identity} already exists")]
    AlreadyExists { resource: String, identity: String },

    #[error("{resource} {identity} can't be found after POST")]
    NotLocatable { resource: String, identity: String },

    #[error("{resource}: don't find {identity}")]
    NotFound { resource: String, identity: String },

    #[error("{resource} {identity} disappeared right after being written")]
    Vanished { resource: String, identity: String },

    #[error("{resource}: missing required attributes: {}", attributes.join(", "))]
    MissingRequired {
        resource: String,
        attributes: Vec<String>,
    },

    #[error("{resource} {identity}: {message}")]
    Precondition {
        resource: String,
        identity: String,
        message: String,
    },

    #[error("{resource}: invalid import id {key:?}: {detail}")]
    InvalidImportKey {
        resource: String,
        key: String,
        detail: String,
    },

    #[error("{resource} {identity}: changing {} requires replacement", attributes.join(", "))]
    ReplacementRequired {
        resource: String,
        identity: String,
        attributes: Vec<String>,
    },

    #[error("{resource} {identity}: {message}")]
    Codec {
        resource: String,
        identity: String,
        message: String,
    },

    #[error("{resource}: operation cancelled")]
    Cancelled { resource: String },
}

impl ReconcileError {
    pub fn api(resource: &str, identity: &str, source: ApiError) -> Self {
        ReconcileError::Api {
            resource: resource.to_string(),
            identity: identity.to_string(),
            source,
        }
    }

    pub fn codec(resource: &str, identity: &str, message: impl ToString) -> Self {
        ReconcileError::Codec {
            resource: resource.to_string(),
            identity: identity.to_string(),
            message: message.to_string(),
        }
    }

    pub fn precondition(resource: &str, identity: &str, message: impl Into<String>) -> Self {
        ReconcileError::Precondition {
            resource: resource.to_string(),
            identity: identity.to_string(),
            message: message.into(),
        }
    }
}
