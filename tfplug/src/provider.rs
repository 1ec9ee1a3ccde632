//! Provider trait
//!
//! The provider owns configuration and hands out resource and data source
//! instances through factory functions. Data produced by `configure` is
//! passed to every instance through its own `configure` call.

use crate::context::Context;
use crate::data_source::DataSourceWithConfigure;
use crate::resource::ManagedResource;
use crate::schema::Schema;
use crate::types::{Config, Diagnostic};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

pub type ResourceFactory = fn() -> Box<dyn ManagedResource>;
pub type DataSourceFactory = fn() -> Box<dyn DataSourceWithConfigure>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider type name, the prefix of every resource type name
    fn type_name(&self) -> &str;

    fn schema(&self) -> Schema;

    /// Validate the provider block and build the shared provider data
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    fn resources(&self) -> HashMap<String, ResourceFactory>;

    fn data_sources(&self) -> HashMap<String, DataSourceFactory>;
}

pub struct ConfigureProviderRequest {
    pub config: Config,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    /// Downcast by resources and data sources in their `configure`
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}
