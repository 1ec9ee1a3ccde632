//! tfplug - Terraform Plugin Framework for Rust
//!
//! The provider-facing half of the Terraform plugin framework: the dynamic
//! value model, schemas with validators, defaults and plan modifiers, and the
//! provider/resource/data source traits a provider implements.

// Core modules
pub mod attribute_type;
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

// Re-exports for convenience
pub use attribute_type::AttributeType;
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::split_import_id;
pub use provider::{ConfigureProviderRequest, ConfigureProviderResponse, Provider};
pub use resource::{ManagedResource, Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{AttributeBuilder, Schema, SchemaBuilder};
pub use types::{AttributePath, Config, Diagnostic, Dynamic, DynamicValue, State};
