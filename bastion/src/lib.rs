pub mod api;
pub mod data_sources;
pub mod provider_data;
pub mod reconcile;
pub mod resources;

pub use provider_data::BastionProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::defaults::{EnvDefault, EnvKind};
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ResourceFactory,
};
use tfplug::resource::ManagedResource;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{NumberRangeValidator, StringPatternValidator, WholeNumberValidator};

use crate::data_sources::LocalPasswordPolicyDataSource;
use crate::reconcile::{RestResource, Transport};
use crate::resources::{ApplicationCodec, BastionResource, CredentialCodec, LdapCodec};

const REQUIRED_SETTINGS: [(&str, &str); 3] = [
    ("ip", "BASTION_HOST"),
    ("user", "BASTION_USER"),
    ("token", "BASTION_TOKEN"),
];

pub struct BastionProvider {
    provider_data: Option<BastionProviderData>,
}

impl Default for BastionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BastionProvider {
    pub fn new() -> Self {
        Self {
            provider_data: None,
        }
    }

    /// Set once `configure` succeeds
    pub fn provider_data(&self) -> Option<&BastionProviderData> {
        self.provider_data.as_ref()
    }
}

fn resource_factory<C: RestResource + Default + 'static>() -> Box<dyn ManagedResource> {
    Box::new(BastionResource::<C>::new())
}

fn local_password_policy() -> Box<dyn DataSourceWithConfigure> {
    Box::new(LocalPasswordPolicyDataSource::new())
}

fn api_version_attribute() -> AttributeBuilder {
    let builder = AttributeBuilder::new("api_version", AttributeType::String)
        .description("API version of the appliance, e.g. v3.3")
        .optional()
        .default(EnvDefault::create("BASTION_API_VERSION", "v3.3"));
    match StringPatternValidator::new(r"^v\d+\.\d+$", "a version like v3.3") {
        Ok(validator) => builder.validator(Box::new(validator)),
        Err(_) => builder,
    }
}

fn setting(config: &DynamicValue, name: &str) -> Option<String> {
    config
        .get_optional_string(&AttributePath::new(name))
        .ok()
        .flatten()
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl Provider for BastionProvider {
    fn type_name(&self) -> &str {
        "bastion"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Bastion/PAM appliance provider")
            .attribute(
                AttributeBuilder::new("ip", AttributeType::String)
                    .description("Host name or address of the appliance")
                    .optional()
                    .default(EnvDefault::create_required("BASTION_HOST"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .description("HTTPS port of the appliance")
                    .optional()
                    .default(EnvDefault::typed(
                        "BASTION_PORT",
                        EnvKind::Number,
                        Some(Dynamic::Number(443.0)),
                    ))
                    .validator(Box::new(NumberRangeValidator {
                        min: Some(1.0),
                        max: Some(65535.0),
                    }))
                    .validator(Box::new(WholeNumberValidator))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user", AttributeType::String)
                    .description("API user")
                    .optional()
                    .default(EnvDefault::create_required("BASTION_USER"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("API token of the user")
                    .optional()
                    .sensitive()
                    .default(EnvDefault::create_required("BASTION_TOKEN"))
                    .build(),
            )
            .attribute(api_version_attribute().build())
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip verification of the appliance certificate")
                    .optional()
                    .default(EnvDefault::typed(
                        "BASTION_INSECURE",
                        EnvKind::Bool,
                        Some(Dynamic::Bool(true)),
                    ))
                    .build(),
            )
            .build()
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let schema = self.schema();
        let mut config = request.config;
        if config.is_null() {
            config = DynamicValue::object();
        }

        let mut diagnostics = vec![];
        if let Err(e) = schema.apply_defaults(&mut config) {
            diagnostics.push(Diagnostic::error(
                "Invalid provider configuration",
                e.to_string(),
            ));
        }
        diagnostics.extend(schema.validate(&config));

        for (name, env_var) in REQUIRED_SETTINGS {
            if setting(&config, name).is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} is required", name),
                        format!(
                            "Set {} in the provider block or the {} environment variable",
                            name, env_var
                        ),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
        }

        if has_errors(&diagnostics) {
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        }

        let ip = setting(&config, "ip").unwrap_or_default();
        let user = setting(&config, "user").unwrap_or_default();
        let token = setting(&config, "token").unwrap_or_default();
        let api_version =
            setting(&config, "api_version").unwrap_or_else(|| api::version::V3_3.to_string());
        let port = config
            .get_optional_number(&AttributePath::new("port"))
            .ok()
            .flatten()
            .unwrap_or(443.0) as u16;
        let insecure = config
            .get_optional_bool(&AttributePath::new("insecure"))
            .ok()
            .flatten()
            .unwrap_or(true);

        let endpoint = format!("https://{}:{}", ip, port);
        let client_config =
            api::ClientConfig::new(endpoint, user, token, api_version).insecure(insecure);

        match api::Client::new(client_config) {
            Ok(client) => {
                tracing::info!(
                    "Configured bastion provider for {}:{} (api {})",
                    ip,
                    port,
                    client.api_version()
                );
                let data = BastionProviderData::new(client);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            ApplicationCodec.type_name().to_string(),
            resource_factory::<ApplicationCodec>,
        );
        resources.insert(
            LdapCodec.type_name().to_string(),
            resource_factory::<LdapCodec>,
        );
        resources.insert(
            CredentialCodec.type_name().to_string(),
            resource_factory::<CredentialCodec>,
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "bastion_localpasswordpolicy".to_string(),
            local_password_policy,
        );
        data_sources
    }
}
