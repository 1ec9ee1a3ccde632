//! Resource implementations
//!
//! Each resource is a [`RestResource`] codec wrapped in [`BastionResource`],
//! which adapts the reconciler to the tfplug resource traits.

pub mod resource_application;
pub mod resource_credential;
pub mod resource_externalauth_ldap;

pub use resource_application::{ApplicationCodec, ApplicationResource};
pub use resource_credential::{CredentialCodec, CredentialResource};
pub use resource_externalauth_ldap::{LdapCodec, LdapResource};

use crate::provider_data::BastionProviderData;
use crate::reconcile::{ReconcileError, Reconciler, RestResource, Transport};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    UpdateResourceRequest, UpdateResourceResponse, ValidateResourceConfigRequest,
    ValidateResourceConfigResponse,
};
use tfplug::types::Diagnostic;

#[derive(Default)]
pub struct BastionResource<C: RestResource> {
    codec: C,
    provider_data: Option<BastionProviderData>,
}

impl<C: RestResource + Default> BastionResource<C> {
    pub fn new() -> Self {
        Self {
            codec: C::default(),
            provider_data: None,
        }
    }
}

impl<C: RestResource> BastionResource<C> {
    fn transport(&self) -> Result<&dyn Transport, Diagnostic> {
        match &self.provider_data {
            Some(data) => Ok(data.transport()),
            None => Err(Diagnostic::error(
                "Provider not configured",
                "Provider data was not properly configured",
            )),
        }
    }

    fn failure(&self, operation: &str, err: &ReconcileError) -> Diagnostic {
        tracing::error!("Failed to {} {}: {}", operation, self.codec.type_name(), err);
        Diagnostic::error(
            format!("Failed to {} {}", operation, self.codec.type_name()),
            err.to_string(),
        )
    }
}

#[async_trait]
impl<C: RestResource> Resource for BastionResource<C> {
    fn type_name(&self) -> &str {
        self.codec.type_name()
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: self.codec.schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: self.codec.schema().validate(&request.config),
        }
    }

    async fn create(&self, ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };

        match Reconciler::new(&self.codec, transport)
            .create(&ctx, &request.planned_state)
            .await
        {
            Ok(new_state) => CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => CreateResourceResponse {
                diagnostics: vec![self.failure("create", &e)],
                new_state: request.planned_state,
            },
        }
    }

    async fn read(&self, ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        match Reconciler::new(&self.codec, transport)
            .read(&ctx, &request.current_state)
            .await
        {
            Ok(new_state) => ReadResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                diagnostics: vec![self.failure("read", &e)],
                new_state: Some(request.current_state),
            },
        }
    }

    async fn update(&self, ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };

        match Reconciler::new(&self.codec, transport)
            .update(&ctx, &request.prior_state, &request.planned_state)
            .await
        {
            Ok(new_state) => UpdateResourceResponse {
                new_state,
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                diagnostics: vec![self.failure("update", &e)],
                new_state: request.prior_state,
            },
        }
    }

    async fn delete(&self, ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };

        let diagnostics = match Reconciler::new(&self.codec, transport)
            .delete(&ctx, &request.prior_state)
            .await
        {
            Ok(()) => vec![],
            Err(e) => vec![self.failure("delete", &e)],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<C: RestResource> ResourceWithConfigure for BastionResource<C> {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        if let Some(data) = request.provider_data {
            if let Some(provider_data) = data.downcast_ref::<BastionProviderData>() {
                self.provider_data = Some(provider_data.clone());
            } else {
                diagnostics.push(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract BastionProviderData from provider data",
                ));
            }
        } else {
            diagnostics.push(Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            ));
        }

        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl<C: RestResource> ResourceWithImportState for BastionResource<C> {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(diag) => {
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics: vec![diag],
                }
            }
        };

        match Reconciler::new(&self.codec, transport)
            .import(&ctx, &request.id)
            .await
        {
            Ok(state) => ImportResourceStateResponse {
                imported_resources: vec![ImportedResource {
                    type_name: request.type_name,
                    state,
                }],
                diagnostics: vec![],
            },
            Err(e) => ImportResourceStateResponse {
                imported_resources: vec![],
                diagnostics: vec![self.failure("import", &e)],
            },
        }
    }
}
