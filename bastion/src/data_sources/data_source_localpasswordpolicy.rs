//! Local password policy data source

use crate::api::localpasswordpolicies::{self, LocalPasswordPolicy};
use crate::api::version;
use crate::provider_data::BastionProviderData;
use crate::reconcile::codec::{id_path, optional_string};
use crate::reconcile::{ReconcileError, Transport};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue, State};

const TYPE_NAME: &str = "bastion_localpasswordpolicy";

const COUNTERS: [&str; 10] = [
    "last_passwords_to_reject",
    "max_auth_failures",
    "password_expiration",
    "password_min_digit_chars",
    "password_min_length",
    "password_min_lower_chars",
    "password_min_special_chars",
    "password_min_upper_chars",
    "password_warning_days",
    "ssh_rsa_min_length",
];

#[derive(Default)]
pub struct LocalPasswordPolicyDataSource {
    provider_data: Option<BastionProviderData>,
}

impl LocalPasswordPolicyDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy_schema() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Reads a local password policy")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password_policy_name", AttributeType::String)
                    .description("Policy to read")
                    .optional()
                    .default(StaticDefault::string("default"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_same_user_and_password", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "forbidden_passwords",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "ssh_key_algos_allowed",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .computed()
                .build(),
            );
        for name in COUNTERS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::Number)
                    .computed()
                    .build(),
            );
        }
        builder.build()
    }
}

fn strings(values: &[String]) -> Dynamic {
    let mut sorted = values.to_vec();
    sorted.sort();
    Dynamic::List(sorted.into_iter().map(Dynamic::String).collect())
}

fn fill(policy: &LocalPasswordPolicy, state: &mut State) -> tfplug::Result<()> {
    state.set_string(&id_path(), policy.id.clone())?;
    state.set_bool(
        &AttributePath::new("allow_same_user_and_password"),
        policy.allow_same_user_and_password,
    )?;
    state.set(
        &AttributePath::new("forbidden_passwords"),
        strings(&policy.forbidden_passwords),
    )?;
    state.set(
        &AttributePath::new("ssh_key_algos_allowed"),
        strings(&policy.ssh_key_algos_allowed),
    )?;

    let counters = [
        policy.last_passwords_to_reject,
        policy.max_auth_failures,
        policy.password_expiration,
        policy.password_min_digit_chars,
        policy.password_min_length,
        policy.password_min_lower_chars,
        policy.password_min_special_chars,
        policy.password_min_upper_chars,
        policy.password_warning_days,
        policy.ssh_rsa_min_length,
    ];
    for (name, value) in COUNTERS.iter().zip(counters) {
        state.set_number(&AttributePath::new(name), value as f64)?;
    }
    Ok(())
}

/// Resolve the named policy and build the data source state from it
pub async fn read_policy(
    ctx: &Context,
    transport: &dyn Transport,
    config: &DynamicValue,
) -> Result<State, ReconcileError> {
    if ctx.is_cancelled() {
        return Err(ReconcileError::Cancelled {
            resource: TYPE_NAME.to_string(),
        });
    }
    version::check(
        TYPE_NAME,
        transport.api_version(),
        version::default_versions(),
    )
    .map_err(ReconcileError::UnsupportedVersion)?;

    let mut state = config.clone();
    if state.is_null() {
        state = DynamicValue::object();
    }
    let schema = LocalPasswordPolicyDataSource::policy_schema();
    schema
        .apply_defaults(&mut state)
        .map_err(|e| ReconcileError::codec(TYPE_NAME, "password_policy_name", e))?;

    let name = optional_string(&state, "password_policy_name")
        .map_err(|e| ReconcileError::codec(TYPE_NAME, "password_policy_name", e))?;
    let who = format!("password_policy_name {}", name);

    let policy = localpasswordpolicies::find_by_name(transport, &name)
        .await
        .map_err(|e| ReconcileError::api(TYPE_NAME, &who, e))?
        .ok_or_else(|| ReconcileError::NotFound {
            resource: TYPE_NAME.to_string(),
            identity: who.clone(),
        })?;

    fill(&policy, &mut state).map_err(|e| ReconcileError::codec(TYPE_NAME, &who, e))?;
    tracing::debug!("Read {} {} (id {})", TYPE_NAME, who, policy.id);
    Ok(state)
}

#[async_trait]
impl DataSource for LocalPasswordPolicyDataSource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::policy_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: Self::policy_schema().validate(&request.config),
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Provider not configured",
                        "Provider data was not properly configured",
                    )],
                };
            }
        };

        match read_policy(&ctx, provider_data.transport(), &request.config).await {
            Ok(state) => ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            },
            Err(e) => {
                tracing::error!("Failed to read {}: {}", TYPE_NAME, e);
                ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        format!("Failed to read {}", TYPE_NAME),
                        e.to_string(),
                    )],
                }
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for LocalPasswordPolicyDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<BastionProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                tracing::error!("Failed to downcast provider data to BastionProviderData");
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract BastionProviderData from provider data",
                ));
            }
        } else {
            tracing::warn!("No provider data provided to {} data source", TYPE_NAME);
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            ));
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
