//! Create, read, update, delete and import over a REST collection

use super::codec::{id_path, Intent, RestResource};
use super::error::ReconcileError;
use super::transport::{RawResponse, Transport};
use crate::api::version;
use reqwest::Method;
use tfplug::{Context, State, TfplugError};

/// Drives one resource's codec against the appliance. Holds no state of
/// its own; every call starts from the state it is given.
pub struct Reconciler<'a, R: RestResource> {
    resource: &'a R,
    transport: &'a dyn Transport,
}

impl<'a, R: RestResource> Reconciler<'a, R> {
    pub fn new(resource: &'a R, transport: &'a dyn Transport) -> Self {
        Self {
            resource,
            transport,
        }
    }

    fn name(&self) -> &'static str {
        self.resource.type_name()
    }

    /// Cancellation and version checks, before any request
    fn gate(&self, ctx: &Context) -> Result<(), ReconcileError> {
        if ctx.is_cancelled() {
            return Err(ReconcileError::Cancelled {
                resource: self.name().to_string(),
            });
        }
        version::check(
            self.name(),
            self.transport.api_version(),
            self.resource.accepted_versions(),
        )
        .map_err(ReconcileError::UnsupportedVersion)
    }

    fn codec_error(&self, state: &State, err: impl ToString) -> ReconcileError {
        ReconcileError::codec(self.name(), &self.resource.describe(state), err)
    }

    fn api_error(&self, who: &str, err: crate::api::ApiError) -> ReconcileError {
        ReconcileError::api(self.name(), who, err)
    }

    fn state_id(&self, state: &State) -> Result<String, ReconcileError> {
        match state.get_optional_string(&id_path()) {
            Ok(Some(id)) if !id.is_empty() => Ok(id),
            Ok(_) => Err(self.codec_error(state, "state has no id")),
            Err(e) => Err(self.codec_error(state, e)),
        }
    }

    async fn send(
        &self,
        who: &str,
        path: &str,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ReconcileError> {
        self.transport
            .request(path, method, body)
            .await
            .map_err(|e| self.api_error(who, e))
    }

    async fn locate(&self, state: &State) -> Result<Option<String>, ReconcileError> {
        let who = self.resource.describe(state);
        let identity = self
            .resource
            .identity(state)
            .map_err(|e| self.codec_error(state, e))?;
        let locator = self
            .resource
            .locator(state)
            .map_err(|e| self.codec_error(state, e))?;
        locator
            .find(self.transport, &identity)
            .await
            .map_err(|e| self.api_error(&who, e))
    }

    fn encode(&self, state: &State, intent: Intent) -> Result<serde_json::Value, ReconcileError> {
        let record = self
            .resource
            .encode(state, intent)
            .map_err(|e| self.codec_error(state, e))?;
        serde_json::to_value(&record).map_err(|e| self.codec_error(state, e))
    }

    fn check_required(&self, state: &State) -> Result<(), ReconcileError> {
        let missing = self.resource.schema().missing_required(state);
        if missing.is_empty() {
            return Ok(());
        }
        Err(ReconcileError::MissingRequired {
            resource: self.name().to_string(),
            attributes: missing,
        })
    }

    /// GET the item with `id` and decode it over `base`. `None` when the
    /// appliance answers 404.
    async fn fetch(&self, base: &State, id: &str) -> Result<Option<State>, ReconcileError> {
        let who = self.resource.describe(base);
        let path = self
            .resource
            .item_path(base, id)
            .map_err(|e| self.codec_error(base, e))?;

        let response = self.send(&who, &path, Method::GET, None).await?;
        if response.is_not_found() {
            tracing::warn!("{} {} (id {}) not found on the appliance", self.name(), who, id);
            return Ok(None);
        }
        let response = response.expect_ok().map_err(|e| {
            tracing::error!("Unexpected response reading {} {}: {}", self.name(), who, e);
            self.api_error(&who, e)
        })?;
        let record: R::Record = response.json().map_err(|e| self.api_error(&who, e))?;

        let mut state = base.clone();
        self.resource
            .decode(&record, &mut state)
            .map_err(|e| self.codec_error(base, e))?;
        state
            .set_string(&id_path(), id.to_string())
            .map_err(|e| self.codec_error(base, e))?;
        Ok(Some(state))
    }

    pub async fn create(&self, ctx: &Context, planned: &State) -> Result<State, ReconcileError> {
        self.gate(ctx)?;
        self.check_required(planned)?;
        let who = self.resource.describe(planned);

        self.resource
            .check_preconditions(self.transport, planned, Intent::Create)
            .await?;

        if self.locate(planned).await?.is_some() {
            return Err(ReconcileError::AlreadyExists {
                resource: self.name().to_string(),
                identity: who,
            });
        }

        let body = self.encode(planned, Intent::Create)?;
        let path = self
            .resource
            .collection_path(planned)
            .map_err(|e| self.codec_error(planned, e))?;
        self.send(&who, &path, Method::POST, Some(body))
            .await?
            .expect_write()
            .map_err(|e| self.api_error(&who, e))?;

        let id = self
            .locate(planned)
            .await?
            .ok_or_else(|| ReconcileError::NotLocatable {
                resource: self.name().to_string(),
                identity: who.clone(),
            })?;
        tracing::info!("Created {} {} with id {}", self.name(), who, id);

        let mut state = planned.clone();
        state
            .set_string(&id_path(), id.clone())
            .map_err(|e| self.codec_error(planned, e))?;

        self.fetch(&state, &id)
            .await?
            .ok_or(ReconcileError::Vanished {
                resource: self.name().to_string(),
                identity: who,
            })
    }

    pub async fn read(&self, ctx: &Context, current: &State) -> Result<Option<State>, ReconcileError> {
        self.gate(ctx)?;
        let id = self.state_id(current)?;
        self.fetch(current, &id).await
    }

    pub async fn update(
        &self,
        ctx: &Context,
        prior: &State,
        planned: &State,
    ) -> Result<State, ReconcileError> {
        self.gate(ctx)?;
        let who = self.resource.describe(prior);

        let replace = self.resource.schema().requires_replace(prior, planned);
        if !replace.is_empty() {
            return Err(ReconcileError::ReplacementRequired {
                resource: self.name().to_string(),
                identity: who,
                attributes: replace,
            });
        }
        self.check_required(planned)?;
        let id = self.state_id(prior)?;

        self.resource
            .check_preconditions(self.transport, planned, Intent::Update)
            .await?;

        let body = self.encode(planned, Intent::Update)?;
        let path = self
            .resource
            .update_path(planned, &id)
            .map_err(|e| self.codec_error(planned, e))?;
        self.send(&who, &path, Method::PUT, Some(body))
            .await?
            .expect_write()
            .map_err(|e| self.api_error(&who, e))?;
        tracing::info!("Updated {} {} (id {})", self.name(), who, id);

        self.fetch(planned, &id)
            .await?
            .ok_or(ReconcileError::Vanished {
                resource: self.name().to_string(),
                identity: who,
            })
    }

    pub async fn delete(&self, ctx: &Context, prior: &State) -> Result<(), ReconcileError> {
        self.gate(ctx)?;
        let who = self.resource.describe(prior);
        let id = self.state_id(prior)?;
        let path = self
            .resource
            .item_path(prior, &id)
            .map_err(|e| self.codec_error(prior, e))?;

        self.send(&who, &path, Method::DELETE, None)
            .await?
            .expect_write()
            .map_err(|e| self.api_error(&who, e))?;
        tracing::info!("Deleted {} {} (id {})", self.name(), who, id);
        Ok(())
    }

    pub async fn import(&self, ctx: &Context, key: &str) -> Result<State, ReconcileError> {
        self.gate(ctx)?;
        let seeded = self
            .resource
            .parse_import_key(key)
            .map_err(|e| ReconcileError::InvalidImportKey {
                resource: self.name().to_string(),
                key: key.to_string(),
                detail: match e {
                    TfplugError::ImportFailed(detail) => detail,
                    other => other.to_string(),
                },
            })?;
        let who = self.resource.describe(&seeded);
        let not_found = || ReconcileError::NotFound {
            resource: self.name().to_string(),
            identity: who.clone(),
        };

        let id = self.locate(&seeded).await?.ok_or_else(not_found)?;
        let state = self.fetch(&seeded, &id).await?.ok_or_else(not_found)?;
        tracing::info!("Imported {} {} (id {})", self.name(), who, id);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::codec::{optional_string, put_string};
    use crate::reconcile::testing::RecordingTransport;
    use crate::reconcile::{ListLocator, Locator};
    use serde::{Deserialize, Serialize};
    use tfplug::schema::AttributeType;
    use tfplug::{AttributeBuilder, AttributePath, Schema, SchemaBuilder};

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Widget {
        name: String,
        color: String,
    }

    #[derive(Default)]
    struct WidgetCodec;

    impl RestResource for WidgetCodec {
        type Record = Widget;

        fn type_name(&self) -> &'static str {
            "bastion_widget"
        }

        fn schema(&self) -> Schema {
            SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("name", AttributeType::String)
                        .required()
                        .requires_replace()
                        .build(),
                )
                .attribute(AttributeBuilder::new("color", AttributeType::String).optional().build())
                .attribute(AttributeBuilder::new("id", AttributeType::String).computed().build())
                .build()
        }

        fn identity_attribute(&self) -> &'static str {
            "name"
        }

        fn locator(&self, _state: &State) -> tfplug::Result<Box<dyn Locator>> {
            Ok(Box::new(ListLocator::new("/widgets/", "name")))
        }

        fn collection_path(&self, _state: &State) -> tfplug::Result<String> {
            Ok("/widgets/".to_string())
        }

        fn item_path(&self, _state: &State, id: &str) -> tfplug::Result<String> {
            Ok(format!("/widgets/{}", id))
        }

        fn encode(&self, state: &State, _intent: Intent) -> tfplug::Result<Widget> {
            Ok(Widget {
                name: optional_string(state, "name")?,
                color: optional_string(state, "color")?,
            })
        }

        fn decode(&self, record: &Widget, state: &mut State) -> tfplug::Result<()> {
            put_string(state, "color", &record.color)
        }
    }

    fn widget(name: &str, color: &str) -> State {
        let mut state = State::object();
        state
            .set_string(&AttributePath::new("name"), name.to_string())
            .unwrap();
        state
            .set_string(&AttributePath::new("color"), color.to_string())
            .unwrap();
        state
    }

    #[tokio::test]
    async fn create_finds_posts_finds_and_reads() {
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(200, "[]"))
            .respond(RawResponse::new(204, ""))
            .respond(RawResponse::new(200, r#"[{"name": "w", "id": "1"}]"#))
            .respond(RawResponse::new(200, r#"{"name": "w", "color": "blue"}"#));

        let state = Reconciler::new(&WidgetCodec, &transport)
            .create(&Context::new(), &widget("w", "red"))
            .await
            .unwrap();

        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "1");
        assert_eq!(state.get_string(&AttributePath::new("color")).unwrap(), "blue");
        assert_eq!(
            transport.methods(),
            vec![Method::GET, Method::POST, Method::GET, Method::GET]
        );
        assert_eq!(
            transport.calls()[1].body,
            Some(serde_json::json!({"name": "w", "color": "red"}))
        );
    }

    #[tokio::test]
    async fn vanishing_after_create_is_fatal() {
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(200, "[]"))
            .respond(RawResponse::new(200, ""))
            .respond(RawResponse::new(200, r#"[{"name": "w", "id": "1"}]"#))
            .respond(RawResponse::new(404, ""));

        let err = Reconciler::new(&WidgetCodec, &transport)
            .create(&Context::new(), &widget("w", "red"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Vanished { .. }));
    }

    #[tokio::test]
    async fn rejected_post_surfaces_status_and_body() {
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(200, "[]"))
            .respond(RawResponse::new(400, r#"{"error":"bad color"}"#));

        let err = Reconciler::new(&WidgetCodec, &transport)
            .create(&Context::new(), &widget("w", "red"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 400"));
        assert!(err.to_string().contains("bad color"));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_required_issues_no_requests() {
        let transport = RecordingTransport::new("v3.3");
        let mut state = State::object();
        state
            .set_string(&AttributePath::new("color"), "red".to_string())
            .unwrap();

        let err = Reconciler::new(&WidgetCodec, &transport)
            .create(&Context::new(), &state)
            .await
            .unwrap_err();
        match err {
            ReconcileError::MissingRequired { attributes, .. } => {
                assert_eq!(attributes, vec!["name".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelled_context_issues_no_requests() {
        let transport = RecordingTransport::new("v3.3");
        let ctx = Context::new();
        ctx.cancel();

        let err = Reconciler::new(&WidgetCodec, &transport)
            .read(&ctx, &widget("w", "red"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Cancelled { .. }));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn read_without_id_is_error() {
        let transport = RecordingTransport::new("v3.3");
        let err = Reconciler::new(&WidgetCodec, &transport)
            .read(&Context::new(), &widget("w", "red"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("state has no id"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_accepts_200_and_204_only() {
        let mut state = widget("w", "red");
        state
            .set_string(&AttributePath::new("id"), "1".to_string())
            .unwrap();
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(204, ""))
            .respond(RawResponse::new(404, "gone"));
        let reconciler = Reconciler::new(&WidgetCodec, &transport);

        reconciler.delete(&Context::new(), &state).await.unwrap();
        assert!(reconciler.delete(&Context::new(), &state).await.is_err());
        assert_eq!(transport.calls()[0].path, "/widgets/1");
    }

    #[tokio::test]
    async fn import_of_unknown_name_is_not_found() {
        let transport =
            RecordingTransport::new("v3.3").respond(RawResponse::new(200, r#"[{"name": "x", "id": "1"}]"#));

        let err = Reconciler::new(&WidgetCodec, &transport)
            .import(&Context::new(), "w")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bastion_widget: don't find name w");
    }
}
