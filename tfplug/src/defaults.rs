//! Default value providers for attributes
//!
//! Default providers are evaluated during planning when an attribute is not
//! set in the configuration. They only run when the value is absent or null.

use crate::types::Dynamic;
use std::env;

/// Default provides default values for optional attributes
pub trait Default: Send + Sync {
    /// Human-readable description
    fn description(&self) -> String;
    /// Provide the default; `Dynamic::Null` leaves the attribute unset
    fn default_value(&self) -> Dynamic;
}

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    /// Create a new static default provider with the given value
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self) -> Dynamic {
        self.value.clone()
    }
}

/// Kind of value an environment variable is parsed into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvKind {
    String,
    Number,
    Bool,
}

/// EnvDefault gets the default value from an environment variable
pub struct EnvDefault {
    env_var: String,
    kind: EnvKind,
    fallback: Option<Dynamic>,
}

impl EnvDefault {
    /// String variable with a fallback when unset
    pub fn create(env_var: &str, fallback: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::String,
            fallback: Some(Dynamic::String(fallback.to_string())),
        })
    }

    /// String variable without a fallback
    pub fn create_required(env_var: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind: EnvKind::String,
            fallback: None,
        })
    }

    /// Variable parsed as `kind`, falling back to `fallback` when unset or
    /// unparsable
    pub fn typed(env_var: &str, kind: EnvKind, fallback: Option<Dynamic>) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            kind,
            fallback,
        })
    }

    fn parse(&self, raw: String) -> Option<Dynamic> {
        match self.kind {
            EnvKind::String => Some(Dynamic::String(raw)),
            EnvKind::Number => raw.trim().parse::<f64>().ok().map(Dynamic::Number),
            EnvKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(Dynamic::Bool(true)),
                "0" | "false" | "no" => Some(Dynamic::Bool(false)),
                _ => None,
            },
        }
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!(
                "default from environment variable {} (fallback: {:?})",
                self.env_var, fallback
            ),
            None => format!("default from environment variable {}", self.env_var),
        }
    }

    fn default_value(&self) -> Dynamic {
        env::var(&self.env_var)
            .ok()
            .and_then(|raw| self.parse(raw))
            .or_else(|| self.fallback.clone())
            .unwrap_or(Dynamic::Null)
    }
}
