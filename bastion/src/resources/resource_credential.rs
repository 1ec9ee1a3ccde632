//! Credential of an account in a device local domain

use super::BastionResource;
use crate::api::devices::{self, Credential, CREDENTIAL_PASSWORD, CREDENTIAL_SSH_KEY};
use crate::reconcile::codec::{optional_string, put_string};
use crate::reconcile::{Intent, ListLocator, Locator, ReconcileError, RestResource, Transport};
use async_trait::async_trait;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, State};
use tfplug::validator::StringOneOfValidator;
use tfplug::split_import_id;

pub type CredentialResource = BastionResource<CredentialCodec>;

/// Marks a private key the appliance generates itself, e.g. `generate:RSA_4096`
pub const GENERATE_PREFIX: &str = "generate:";

const IMPORT_KEY: [&str; 4] = ["device_id", "domain_id", "account_id", "type"];

#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialCodec;

struct Parents {
    device_id: String,
    domain_id: String,
    account_id: String,
}

fn parents(state: &State) -> tfplug::Result<Parents> {
    Ok(Parents {
        device_id: state.get_string(&AttributePath::new("device_id"))?,
        domain_id: state.get_string(&AttributePath::new("domain_id"))?,
        account_id: state.get_string(&AttributePath::new("account_id"))?,
    })
}

#[async_trait]
impl RestResource for CredentialCodec {
    type Record = Credential;

    fn type_name(&self) -> &'static str {
        "bastion_device_localdomain_account_credential"
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a credential of a device local domain account")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .build(),
            );
        for name in ["device_id", "domain_id", "account_id"] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            );
        }
        builder
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Credential type: password or ssh_key")
                    .required()
                    .requires_replace()
                    .validator(Box::new(StringOneOfValidator::new(&[
                        CREDENTIAL_PASSWORD,
                        CREDENTIAL_SSH_KEY,
                    ])))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("private_key", AttributeType::String)
                    .description("Private key, or generate:<algorithm> to let the appliance create one")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("passphrase", AttributeType::String)
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("public_key", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build()
    }

    fn identity_attribute(&self) -> &'static str {
        "type"
    }

    fn describe(&self, state: &State) -> String {
        let value = |name: &str| optional_string(state, name).unwrap_or_default();
        format!(
            "credential type {} on account_id {}, domain_id {}, device_id {}",
            value("type"),
            value("account_id"),
            value("domain_id"),
            value("device_id")
        )
    }

    fn locator(&self, state: &State) -> tfplug::Result<Box<dyn Locator>> {
        let p = parents(state)?;
        Ok(Box::new(ListLocator::new(
            devices::credentials_path(&p.device_id, &p.domain_id, &p.account_id),
            "type",
        )))
    }

    fn collection_path(&self, state: &State) -> tfplug::Result<String> {
        let p = parents(state)?;
        Ok(devices::credentials_path(
            &p.device_id,
            &p.domain_id,
            &p.account_id,
        ))
    }

    fn item_path(&self, state: &State, id: &str) -> tfplug::Result<String> {
        let p = parents(state)?;
        Ok(devices::credential_path(
            &p.device_id,
            &p.domain_id,
            &p.account_id,
            id,
        ))
    }

    /// Only the secret matching the type is sent. A generated private key is
    /// sent once, at creation.
    fn encode(&self, state: &State, intent: Intent) -> tfplug::Result<Credential> {
        let credential_type = optional_string(state, "type")?;
        let mut record = Credential {
            credential_type: credential_type.clone(),
            ..Default::default()
        };

        match credential_type.as_str() {
            CREDENTIAL_PASSWORD => {
                record.password = optional_string(state, "password")?;
            }
            CREDENTIAL_SSH_KEY => {
                let private_key = optional_string(state, "private_key")?;
                if intent == Intent::Create || !private_key.starts_with(GENERATE_PREFIX) {
                    record.private_key = private_key;
                    record.passphrase = optional_string(state, "passphrase")?;
                }
            }
            _ => {}
        }
        Ok(record)
    }

    fn decode(&self, record: &Credential, state: &mut State) -> tfplug::Result<()> {
        put_string(state, "type", &record.credential_type)?;
        put_string(state, "public_key", &record.public_key)
    }

    /// Device, local domain and account must all exist before a credential
    /// can be attached
    async fn check_preconditions(
        &self,
        transport: &dyn Transport,
        state: &State,
        intent: Intent,
    ) -> Result<(), ReconcileError> {
        if intent != Intent::Create {
            return Ok(());
        }
        let who = self.describe(state);
        let p = parents(state).map_err(|e| ReconcileError::codec(self.type_name(), &who, e))?;

        let checks = [
            (
                devices::device_path(&p.device_id),
                format!("device with ID {} doesn't exist", p.device_id),
            ),
            (
                devices::local_domain_path(&p.device_id, &p.domain_id),
                format!(
                    "domain_id with ID {} on device_id {} doesn't exist",
                    p.domain_id, p.device_id
                ),
            ),
            (
                devices::account_path(&p.device_id, &p.domain_id, &p.account_id),
                format!(
                    "account_id with ID {} on domain_id {}, device_id {} doesn't exist",
                    p.account_id, p.domain_id, p.device_id
                ),
            ),
        ];

        for (path, missing) in checks {
            let present = devices::exists(transport, &path)
                .await
                .map_err(|e| ReconcileError::api(self.type_name(), &who, e))?;
            if !present {
                return Err(ReconcileError::precondition(self.type_name(), &who, missing));
            }
        }
        Ok(())
    }

    fn parse_import_key(&self, key: &str) -> tfplug::Result<State> {
        let segments = split_import_id(key, &IMPORT_KEY)?;
        let mut state = State::object();
        for (name, value) in IMPORT_KEY.iter().zip(segments) {
            state.set_string(&AttributePath::new(name), value)?;
        }
        Ok(state)
    }
}
