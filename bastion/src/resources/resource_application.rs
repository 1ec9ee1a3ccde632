//! Application resource

use super::BastionResource;
use crate::api::applications::{self, Application, ApplicationLocalDomain, ApplicationPath};
use crate::reconcile::codec::{
    canonical_json, optional_string, put_string, put_strings, string_set,
};
use crate::reconcile::{Intent, ListLocator, Locator, RestResource};
use std::collections::HashMap;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Dynamic, State};
use tfplug::validator::{ListLengthValidator, StringLengthValidator};
use tfplug::TfplugError;

pub type ApplicationResource = BastionResource<ApplicationCodec>;

#[derive(Debug, Default, Clone, Copy)]
pub struct ApplicationCodec;

fn path_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("target".to_string(), AttributeType::String),
        ("program".to_string(), AttributeType::String),
        ("working_dir".to_string(), AttributeType::String),
    ]))
}

fn local_domain_type() -> AttributeType {
    AttributeType::Object(HashMap::from([
        ("id".to_string(), AttributeType::String),
        ("admin_account".to_string(), AttributeType::String),
        ("domain_name".to_string(), AttributeType::String),
        ("description".to_string(), AttributeType::String),
        ("enable_password_change".to_string(), AttributeType::Bool),
        ("password_change_policy".to_string(), AttributeType::String),
        ("password_change_plugin".to_string(), AttributeType::String),
        (
            "password_change_plugin_parameters".to_string(),
            AttributeType::String,
        ),
    ]))
}

/// String field of a nested block; absent or null is empty
fn field(block: &HashMap<String, Dynamic>, name: &str) -> tfplug::Result<String> {
    match block.get(name) {
        None | Some(Dynamic::Null) => Ok(String::new()),
        Some(Dynamic::String(s)) => Ok(s.clone()),
        Some(other) => Err(TfplugError::TypeMismatch {
            expected: "string".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

fn encode_paths(state: &State) -> tfplug::Result<Vec<ApplicationPath>> {
    let mut paths = state
        .get_optional_list(&AttributePath::new("paths"))?
        .unwrap_or_default()
        .iter()
        .map(|entry| {
            let block = entry.as_map().ok_or_else(|| TfplugError::TypeMismatch {
                expected: "object".to_string(),
                actual: entry.type_name().to_string(),
            })?;
            Ok(ApplicationPath {
                target: field(block, "target")?,
                program: field(block, "program")?,
                working_dir: field(block, "working_dir")?,
            })
        })
        .collect::<tfplug::Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

fn decode_path(path: &ApplicationPath) -> Dynamic {
    let mut block = HashMap::from([
        ("target".to_string(), Dynamic::from(path.target.as_str())),
        ("program".to_string(), Dynamic::from(path.program.as_str())),
    ]);
    if !path.working_dir.is_empty() {
        block.insert(
            "working_dir".to_string(),
            Dynamic::from(path.working_dir.as_str()),
        );
    }
    Dynamic::Map(block)
}

fn decode_local_domain(domain: &ApplicationLocalDomain) -> Dynamic {
    Dynamic::Map(HashMap::from([
        ("id".to_string(), Dynamic::from(domain.id.as_str())),
        (
            "admin_account".to_string(),
            Dynamic::from(domain.admin_account.as_str()),
        ),
        (
            "domain_name".to_string(),
            Dynamic::from(domain.domain_name.as_str()),
        ),
        (
            "description".to_string(),
            Dynamic::from(domain.description.as_str()),
        ),
        (
            "enable_password_change".to_string(),
            Dynamic::Bool(domain.enable_password_change),
        ),
        (
            "password_change_policy".to_string(),
            Dynamic::from(domain.password_change_policy.as_str()),
        ),
        (
            "password_change_plugin".to_string(),
            Dynamic::from(domain.password_change_plugin.as_str()),
        ),
        (
            "password_change_plugin_parameters".to_string(),
            Dynamic::String(canonical_json(&domain.password_change_plugin_parameters)),
        ),
    ]))
}

impl RestResource for ApplicationCodec {
    type Record = Application;

    fn type_name(&self) -> &'static str {
        "bastion_application"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an application published through the bastion")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Application id assigned by the appliance")
                    .computed()
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("application_name", AttributeType::String)
                    .description("Unique application name")
                    .required()
                    .validator(Box::new(StringLengthValidator {
                        min: Some(1),
                        max: None,
                    }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("connection_policy", AttributeType::String)
                    .description("Connection policy applied to sessions")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("paths", AttributeType::Set(Box::new(path_type())))
                    .description("Programs the application can start, with their targets")
                    .required()
                    .validator(Box::new(ListLengthValidator {
                        min: Some(1),
                        max: None,
                    }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("target", AttributeType::String)
                    .description("Target the application runs on")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "global_domains",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("Global domains the application belongs to")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("parameters", AttributeType::String)
                    .description("Command line parameters")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "local_domains",
                    AttributeType::List(Box::new(local_domain_type())),
                )
                .description("Local domains defined on the application")
                .computed()
                .build(),
            )
            .build()
    }

    fn identity_attribute(&self) -> &'static str {
        "application_name"
    }

    fn locator(&self, _state: &State) -> tfplug::Result<Box<dyn Locator>> {
        Ok(Box::new(ListLocator::new(
            applications::search_path(),
            "application_name",
        )))
    }

    fn collection_path(&self, _state: &State) -> tfplug::Result<String> {
        Ok(applications::COLLECTION.to_string())
    }

    fn item_path(&self, _state: &State, id: &str) -> tfplug::Result<String> {
        Ok(applications::item_path(id))
    }

    fn update_path(&self, _state: &State, id: &str) -> tfplug::Result<String> {
        Ok(applications::update_path(id))
    }

    fn encode(&self, state: &State, _intent: Intent) -> tfplug::Result<Application> {
        Ok(Application {
            id: String::new(),
            application_name: optional_string(state, "application_name")?,
            connection_policy: optional_string(state, "connection_policy")?,
            description: optional_string(state, "description")?,
            parameters: optional_string(state, "parameters")?,
            target: optional_string(state, "target")?,
            global_domains: string_set(state, "global_domains")?,
            paths: encode_paths(state)?,
            local_domains: None,
        })
    }

    fn decode(&self, record: &Application, state: &mut State) -> tfplug::Result<()> {
        put_string(state, "application_name", &record.application_name)?;
        put_string(state, "connection_policy", &record.connection_policy)?;
        put_string(state, "target", &record.target)?;
        put_string(state, "description", &record.description)?;
        put_string(state, "parameters", &record.parameters)?;

        let mut global_domains = record.global_domains.clone();
        global_domains.sort();
        put_strings(state, "global_domains", &global_domains)?;

        let mut paths = record.paths.clone();
        paths.sort();
        state.set_list(
            &AttributePath::new("paths"),
            paths.iter().map(decode_path).collect(),
        )?;

        let local_domains = record
            .local_domains
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(decode_local_domain)
            .collect();
        state.set_list(&AttributePath::new("local_domains"), local_domains)
    }
}
