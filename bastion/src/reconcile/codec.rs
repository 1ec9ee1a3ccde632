//! Per-resource mapping between Terraform state and appliance records

use super::error::ReconcileError;
use super::locator::Locator;
use super::transport::Transport;
use crate::api::version::ONLY_V3_3;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tfplug::{AttributePath, Dynamic, Schema, State, TfplugError};

/// Why a record is being encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Update,
}

/// A resource managed through a REST collection on the appliance.
///
/// Implementations are stateless: every method derives what it needs from
/// the state it is handed.
#[async_trait]
pub trait RestResource: Send + Sync {
    type Record: Serialize + DeserializeOwned + Send + Sync;

    fn type_name(&self) -> &'static str;

    fn accepted_versions(&self) -> &'static [&'static str] {
        ONLY_V3_3
    }

    fn schema(&self) -> Schema;

    /// Attribute whose value the locator matches and bare import ids set
    fn identity_attribute(&self) -> &'static str;

    fn identity(&self, state: &State) -> tfplug::Result<String> {
        state.get_string(&AttributePath::new(self.identity_attribute()))
    }

    /// The identity as it reads in messages, e.g. `application_name app1`
    fn describe(&self, state: &State) -> String {
        let identity = self.identity(state).unwrap_or_default();
        format!("{} {}", self.identity_attribute(), identity)
    }

    fn locator(&self, state: &State) -> tfplug::Result<Box<dyn Locator>>;

    fn collection_path(&self, state: &State) -> tfplug::Result<String>;

    fn item_path(&self, state: &State, id: &str) -> tfplug::Result<String>;

    fn update_path(&self, state: &State, id: &str) -> tfplug::Result<String> {
        self.item_path(state, id)
    }

    fn encode(&self, state: &State, intent: Intent) -> tfplug::Result<Self::Record>;

    /// Writes the remote record into `state`, leaving local secrets alone
    fn decode(&self, record: &Self::Record, state: &mut State) -> tfplug::Result<()>;

    /// Resource-specific checks run before any write
    async fn check_preconditions(
        &self,
        _transport: &dyn Transport,
        _state: &State,
        _intent: Intent,
    ) -> Result<(), ReconcileError> {
        Ok(())
    }

    /// State holding the identity attributes named by an import id. The
    /// whole id is the identity, `/` included.
    fn parse_import_key(&self, key: &str) -> tfplug::Result<State> {
        let attribute = self.identity_attribute();
        if key.is_empty() {
            return Err(TfplugError::ImportFailed(format!(
                "id must be <{}>",
                attribute
            )));
        }
        let mut state = State::object();
        state.set_string(&AttributePath::new(attribute), key.to_string())?;
        Ok(state)
    }
}

pub fn id_path() -> AttributePath {
    AttributePath::new("id")
}

/// Absent or null reads as the empty string
pub fn optional_string(state: &State, name: &str) -> tfplug::Result<String> {
    Ok(state
        .get_optional_string(&AttributePath::new(name))?
        .unwrap_or_default())
}

pub fn optional_bool(state: &State, name: &str) -> tfplug::Result<bool> {
    Ok(state
        .get_optional_bool(&AttributePath::new(name))?
        .unwrap_or(false))
}

pub fn optional_number(state: &State, name: &str) -> tfplug::Result<f64> {
    Ok(state
        .get_optional_number(&AttributePath::new(name))?
        .unwrap_or(0.0))
}

/// Like `optional_number`, but a fractional value is a type mismatch
pub fn optional_integer(state: &State, name: &str) -> tfplug::Result<i64> {
    let n = optional_number(state, name)?;
    if n.fract() != 0.0 {
        return Err(TfplugError::TypeMismatch {
            expected: "integer".to_string(),
            actual: n.to_string(),
        });
    }
    Ok(n as i64)
}

/// Elements of a string set, sorted for a stable wire order
pub fn string_set(state: &State, name: &str) -> tfplug::Result<Vec<String>> {
    let mut values = state
        .get_optional_list(&AttributePath::new(name))?
        .unwrap_or_default()
        .iter()
        .map(|v| {
            v.as_string()
                .map(str::to_string)
                .ok_or_else(|| TfplugError::TypeMismatch {
                    expected: "string".to_string(),
                    actual: v.type_name().to_string(),
                })
        })
        .collect::<tfplug::Result<Vec<_>>>()?;
    values.sort();
    Ok(values)
}

/// Sets an attribute, except that a zero value does not overwrite an
/// attribute the practitioner never set
pub fn put(state: &mut State, name: &str, value: Dynamic) -> tfplug::Result<()> {
    let path = AttributePath::new(name);
    if value.is_zero() && state.is_unset(&path) {
        return Ok(());
    }
    state.set(&path, value)
}

pub fn put_string(state: &mut State, name: &str, value: &str) -> tfplug::Result<()> {
    put(state, name, Dynamic::from(value))
}

pub fn put_bool(state: &mut State, name: &str, value: bool) -> tfplug::Result<()> {
    put(state, name, Dynamic::Bool(value))
}

pub fn put_number(state: &mut State, name: &str, value: f64) -> tfplug::Result<()> {
    put(state, name, Dynamic::Number(value))
}

pub fn put_strings(state: &mut State, name: &str, values: &[String]) -> tfplug::Result<()> {
    put(
        state,
        name,
        Dynamic::List(values.iter().map(|v| Dynamic::from(v.as_str())).collect()),
    )
}

/// Secrets are only written when the appliance returned a value
pub fn put_secret(state: &mut State, name: &str, value: &str) -> tfplug::Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    state.set_string(&AttributePath::new(name), value.to_string())
}

/// Canonical string form of an opaque JSON payload. Object keys come out
/// sorted; an absent payload reads as `null`.
pub fn canonical_json(value: &serde_json::Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
