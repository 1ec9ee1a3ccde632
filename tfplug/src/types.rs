//! Core type system for tfplug
//!
//! This module provides the core types used throughout the framework,
//! including Dynamic values, attribute paths and diagnostics.

use crate::error::{Result, TfplugError};
use std::collections::HashMap;

/// Dynamic represents Terraform values that can be of any type
/// This is the core type for all configuration and state data
/// IMPORTANT: Always use type-safe accessors instead of matching directly
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    /// Explicit null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (all numbers are f64 to match Terraform)
    Number(f64),
    /// String value
    String(String),
    /// List of values (lists and sets share this representation)
    List(Vec<Dynamic>),
    /// Map of string keys to values (objects are represented as Maps)
    Map(HashMap<String, Dynamic>),
    /// Value not yet known (during planning)
    Unknown,
}

impl Dynamic {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Dynamic>> {
        match self {
            Dynamic::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// Null, empty string, false, zero and empty collections
    pub fn is_zero(&self) -> bool {
        match self {
            Dynamic::Null => true,
            Dynamic::Bool(b) => !b,
            Dynamic::Number(n) => *n == 0.0,
            Dynamic::String(s) => s.is_empty(),
            Dynamic::List(l) => l.is_empty(),
            Dynamic::Map(m) => m.is_empty(),
            Dynamic::Unknown => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Dynamic::String(s.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Dynamic::String(s)
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Dynamic::Bool(b)
    }
}

impl From<f64> for Dynamic {
    fn from(n: f64) -> Self {
        Dynamic::Number(n)
    }
}

impl From<i64> for Dynamic {
    fn from(n: i64) -> Self {
        Dynamic::Number(n as f64)
    }
}

/// DynamicValue wraps Dynamic and provides path access
/// This is what gets passed between Terraform and the provider
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    /// An empty object, the usual starting point for building state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::Unknown,
        }
    }

    /// Raw access; `None` when the path does not resolve
    pub fn get(&self, path: &AttributePath) -> Option<&Dynamic> {
        self.navigate_path(path).ok()
    }

    /// True when the attribute is absent or explicitly null
    pub fn is_unset(&self, path: &AttributePath) -> bool {
        self.get(path).map_or(true, Dynamic::is_null)
    }

    /// Type-safe accessors - ALWAYS use these instead of pattern matching
    /// These handle path navigation and type checking
    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            _ => Err(TfplugError::TypeMismatch {
                expected: "string".to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Number(n) => Ok(*n),
            _ => Err(TfplugError::TypeMismatch {
                expected: "number".to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::Bool(b) => Ok(*b),
            _ => Err(TfplugError::TypeMismatch {
                expected: "bool".to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        let value = self.navigate_path(path)?;
        match value {
            Dynamic::List(l) => Ok(l.clone()),
            _ => Err(TfplugError::TypeMismatch {
                expected: "list".to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }

    /// Optional accessors: absent or null yields `Ok(None)`, a wrong type is
    /// still an error
    pub fn get_optional_string(&self, path: &AttributePath) -> Result<Option<String>> {
        if self.is_unset(path) {
            return Ok(None);
        }
        self.get_string(path).map(Some)
    }

    pub fn get_optional_bool(&self, path: &AttributePath) -> Result<Option<bool>> {
        if self.is_unset(path) {
            return Ok(None);
        }
        self.get_bool(path).map(Some)
    }

    pub fn get_optional_number(&self, path: &AttributePath) -> Result<Option<f64>> {
        if self.is_unset(path) {
            return Ok(None);
        }
        self.get_number(path).map(Some)
    }

    pub fn get_optional_list(&self, path: &AttributePath) -> Result<Option<Vec<Dynamic>>> {
        if self.is_unset(path) {
            return Ok(None);
        }
        self.get_list(path).map(Some)
    }

    /// Raw setter, creating intermediate maps as needed
    pub fn set(&mut self, path: &AttributePath, value: Dynamic) -> Result<()> {
        self.set_value(path, value)
    }

    /// Type-safe setters - Use for building state/config objects
    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Dynamic::Null)
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m
                    .get(name)
                    .ok_or_else(|| TfplugError::AttributeNotFound(name.clone()))?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    let idx = *idx as usize;
                    l.get(idx).ok_or_else(|| {
                        TfplugError::InvalidPath(format!("list index {} out of bounds", idx))
                    })?
                }
                (Dynamic::Null, AttributePathStep::AttributeName(name)) => {
                    return Err(TfplugError::AttributeNotFound(name.clone()))
                }
                _ => return Err(TfplugError::InvalidPath(format!("{:?}", path))),
            };
        }

        Ok(current)
    }

    fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        if path.steps.is_empty() {
            self.value = new_value;
            return Ok(());
        }

        // For non-empty paths, ensure we have a map at the root
        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        let last_idx = path.steps.len() - 1;

        for (idx, step) in path.steps.iter().enumerate() {
            if idx == last_idx {
                return match (current, step) {
                    (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                    | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                        m.insert(name.clone(), new_value);
                        Ok(())
                    }
                    (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                        let i = *i as usize;
                        match l.get_mut(i) {
                            Some(slot) => {
                                *slot = new_value;
                                Ok(())
                            }
                            None => Err(TfplugError::InvalidPath(format!(
                                "list index {} out of bounds",
                                i
                            ))),
                        }
                    }
                    _ => Err(TfplugError::InvalidPath(format!("{:?}", path))),
                };
            }

            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    m.entry(name.clone()).or_insert_with(|| match path.steps.get(idx + 1) {
                        Some(AttributePathStep::ElementKeyInt(_)) => Dynamic::List(Vec::new()),
                        _ => Dynamic::Map(HashMap::new()),
                    })
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(i)) => {
                    let i = *i as usize;
                    l.get_mut(i).ok_or_else(|| {
                        TfplugError::InvalidPath(format!("list index {} out of bounds", i))
                    })?
                }
                _ => return Err(TfplugError::InvalidPath(format!("{:?}", path))),
            };
        }

        Err(TfplugError::InvalidPath(format!("{:?}", path)))
    }
}

/// AttributePath represents a path to an attribute within a DynamicValue
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[\"{}\"]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Individual step in an AttributePath
#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    /// Access attribute by name in object/map
    AttributeName(String),
    /// Access element by string key (for maps)
    ElementKeyString(String),
    /// Access element by integer index (for lists)
    ElementKeyInt(i64),
}

/// Diagnostic represents a warning or error from the provider
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// True when any diagnostic in the slice is an error
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

/// ClientCapabilities indicates Terraform client capabilities
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    pub deferral_allowed: bool,
    pub write_only_attributes_allowed: bool,
}

/// Config represents configuration values
pub type Config = DynamicValue;

/// State represents resource state values
pub type State = DynamicValue;
