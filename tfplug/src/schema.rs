//! Schema types and builders for tfplug
//!
//! A schema declares the attributes of a provider, resource or data source
//! together with the behaviour attached to each one: validators, defaults
//! and plan modifiers.

use crate::defaults::Default;
use crate::plan_modifier::{PlanModifier, PlanModifyRequest};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use crate::validator::Validator;
use std::sync::Arc;

pub use crate::attribute_type::AttributeType;

/// Schema is returned by providers/resources/data sources
/// Version is used for state migration
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub deprecated: bool,
}

/// Attribute represents a single configuration attribute
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
    pub deprecated: bool,
}

// Manual Debug implementation since validators/modifiers don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .field(
                "plan_modifiers",
                &format!("{} plan modifiers", self.plan_modifiers.len()),
            )
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .field("deprecated", &self.deprecated)
            .finish()
    }
}

impl Attribute {
    /// A change to this attribute can only be applied by replacement
    pub fn forces_replacement(&self) -> bool {
        self.plan_modifiers.iter().any(|m| m.forces_replacement())
    }
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.block.attributes.iter()
    }

    /// Required attributes that are absent or null in `config`
    pub fn missing_required(&self, config: &DynamicValue) -> Vec<String> {
        self.attributes()
            .filter(|a| a.required)
            .filter(|a| config.is_unset(&AttributePath::new(&a.name)))
            .map(|a| a.name.clone())
            .collect()
    }

    /// Force-replace attributes whose planned value differs from the prior one
    pub fn requires_replace(&self, prior: &DynamicValue, planned: &DynamicValue) -> Vec<String> {
        let mut changed = Vec::new();

        for attr in self.attributes().filter(|a| a.forces_replacement()) {
            let path = AttributePath::new(&attr.name);
            let state = prior.get(&path).cloned().unwrap_or(Dynamic::Null);
            let plan = planned.get(&path).cloned().unwrap_or(Dynamic::Null);

            let replace = attr.plan_modifiers.iter().any(|modifier| {
                modifier
                    .modify_plan(PlanModifyRequest {
                        state: state.clone(),
                        plan: plan.clone(),
                        config: plan.clone(),
                        attribute_path: attr.name.clone(),
                        attribute_type: attr.r#type.clone(),
                    })
                    .requires_replace
            });

            if replace {
                tracing::debug!("{} changed and forces replacement", attr.name);
                changed.push(attr.name.clone());
            }
        }

        changed
    }

    /// Run every attribute's validators against the values set in `config`
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for attr in self.attributes() {
            let path = AttributePath::new(&attr.name);
            let Some(value) = config.get(&path) else {
                continue;
            };
            if value.is_null() || matches!(value, Dynamic::Unknown) {
                continue;
            }

            let start = diagnostics.len();
            for validator in &attr.validators {
                validator.validate(value, &attr.name, &mut diagnostics);
            }
            for diag in diagnostics.iter_mut().skip(start) {
                if diag.attribute.is_none() {
                    diag.attribute = Some(path.clone());
                }
            }
        }

        diagnostics
    }

    /// Fill absent or null attributes from their defaults
    pub fn apply_defaults(&self, value: &mut DynamicValue) -> crate::Result<()> {
        for attr in self.attributes() {
            let Some(default) = &attr.default else {
                continue;
            };
            let path = AttributePath::new(&attr.name);
            if !value.is_unset(&path) {
                continue;
            }
            let default_value = default.default_value();
            if !default_value.is_null() {
                value.set(&path, default_value)?;
            }
        }
        Ok(())
    }
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
                deprecated: false,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.attribute.validators.push(Arc::from(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: Box<dyn PlanModifier>) -> Self {
        self.attribute.plan_modifiers.push(Arc::from(modifier));
        self
    }

    /// Shorthand for the `RequiresReplaceIfChanged` plan modifier
    pub fn requires_replace(self) -> Self {
        self.plan_modifier(Box::new(crate::plan_modifier::RequiresReplaceIfChanged))
    }

    pub fn default(mut self, default: Box<dyn Default>) -> Self {
        self.attribute.default = Some(Arc::from(default));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    description: String::new(),
                    deprecated: false,
                },
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.schema.block.deprecated = true;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
