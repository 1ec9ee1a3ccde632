//! LDAP external authentication resource

use super::BastionResource;
use crate::api::externalauths::{self, ExternalAuthLdap, LDAP_TYPE};
use crate::reconcile::codec::{
    optional_bool, optional_integer, optional_number, optional_string, put_bool, put_number,
    put_secret, put_string,
};
use crate::reconcile::{Intent, ListLocator, Locator, ReconcileError, RestResource, Transport};
use async_trait::async_trait;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::State;
use tfplug::validator::{NumberRangeValidator, StringLengthValidator, WholeNumberValidator};

pub type LdapResource = BastionResource<LdapCodec>;

#[derive(Debug, Default, Clone, Copy)]
pub struct LdapCodec;

const REQUIRED_STRINGS: [&str; 4] = ["cn_attribute", "host", "ldap_base", "login_attribute"];
const OPTIONAL_STRINGS: [&str; 5] = [
    "ca_certificate",
    "certificate",
    "description",
    "login",
    "private_key",
];
const FLAGS: [&str; 6] = [
    "is_active_directory",
    "is_anonymous_access",
    "is_protected_user",
    "is_ssl",
    "is_starttls",
    "use_primary_auth_domain",
];

#[async_trait]
impl RestResource for LdapCodec {
    type Record = ExternalAuthLdap;

    fn type_name(&self) -> &'static str {
        "bastion_externalauth_ldap"
    }

    fn schema(&self) -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages an LDAP external authentication")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(Box::new(UseStateForUnknown))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("authentication_name", AttributeType::String)
                    .description("Unique name of the authentication")
                    .required()
                    .requires_replace()
                    .validator(Box::new(StringLengthValidator {
                        min: Some(1),
                        max: None,
                    }))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .required()
                    .validator(Box::new(NumberRangeValidator {
                        min: Some(1.0),
                        max: Some(65535.0),
                    }))
                    .validator(Box::new(WholeNumberValidator))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout", AttributeType::Number)
                    .description("Connection timeout in seconds")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("Password of the bind account")
                    .optional()
                    .sensitive()
                    .build(),
            );

        for name in REQUIRED_STRINGS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .required()
                    .build(),
            );
        }
        for name in OPTIONAL_STRINGS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .optional()
                    .build(),
            );
        }
        for name in FLAGS {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::Bool)
                    .optional()
                    .build(),
            );
        }

        builder.build()
    }

    fn identity_attribute(&self) -> &'static str {
        "authentication_name"
    }

    fn locator(&self, state: &State) -> tfplug::Result<Box<dyn Locator>> {
        let name = self.identity(state)?;
        Ok(Box::new(ListLocator::new(
            externalauths::search_path(&name),
            "authentication_name",
        )))
    }

    fn collection_path(&self, _state: &State) -> tfplug::Result<String> {
        Ok(externalauths::COLLECTION.to_string())
    }

    fn item_path(&self, _state: &State, id: &str) -> tfplug::Result<String> {
        Ok(externalauths::item_path(id))
    }

    fn encode(&self, state: &State, _intent: Intent) -> tfplug::Result<ExternalAuthLdap> {
        Ok(ExternalAuthLdap {
            id: String::new(),
            authentication_name: optional_string(state, "authentication_name")?,
            auth_type: LDAP_TYPE.to_string(),
            host: optional_string(state, "host")?,
            port: optional_integer(state, "port")?,
            timeout: optional_number(state, "timeout")?,
            cn_attribute: optional_string(state, "cn_attribute")?,
            ldap_base: optional_string(state, "ldap_base")?,
            login_attribute: optional_string(state, "login_attribute")?,
            ca_certificate: optional_string(state, "ca_certificate")?,
            certificate: optional_string(state, "certificate")?,
            description: optional_string(state, "description")?,
            is_active_directory: optional_bool(state, "is_active_directory")?,
            is_anonymous_access: optional_bool(state, "is_anonymous_access")?,
            is_protected_user: optional_bool(state, "is_protected_user")?,
            is_ssl: optional_bool(state, "is_ssl")?,
            is_starttls: optional_bool(state, "is_starttls")?,
            use_primary_auth_domain: optional_bool(state, "use_primary_auth_domain")?,
            login: optional_string(state, "login")?,
            password: optional_string(state, "password")?,
            private_key: optional_string(state, "private_key")?,
        })
    }

    fn decode(&self, record: &ExternalAuthLdap, state: &mut State) -> tfplug::Result<()> {
        put_string(state, "host", &record.host)?;
        put_number(state, "port", record.port as f64)?;
        put_number(state, "timeout", record.timeout)?;
        put_string(state, "cn_attribute", &record.cn_attribute)?;
        put_string(state, "ldap_base", &record.ldap_base)?;
        put_string(state, "login_attribute", &record.login_attribute)?;
        put_string(state, "ca_certificate", &record.ca_certificate)?;
        put_string(state, "certificate", &record.certificate)?;
        put_string(state, "description", &record.description)?;
        put_string(state, "login", &record.login)?;
        put_bool(state, "is_active_directory", record.is_active_directory)?;
        put_bool(state, "is_anonymous_access", record.is_anonymous_access)?;
        put_bool(state, "is_protected_user", record.is_protected_user)?;
        put_bool(state, "is_ssl", record.is_ssl)?;
        put_bool(state, "is_starttls", record.is_starttls)?;
        put_bool(state, "use_primary_auth_domain", record.use_primary_auth_domain)?;
        put_secret(state, "private_key", &record.private_key)
    }

    /// Binding requires a login and password unless anonymous access is on
    async fn check_preconditions(
        &self,
        _transport: &dyn Transport,
        state: &State,
        _intent: Intent,
    ) -> Result<(), ReconcileError> {
        let fields = || -> tfplug::Result<(bool, String, String)> {
            Ok((
                optional_bool(state, "is_anonymous_access")?,
                optional_string(state, "login")?,
                optional_string(state, "password")?,
            ))
        };
        let (anonymous, login, password) =
            fields().map_err(|e| ReconcileError::codec(self.type_name(), &self.describe(state), e))?;

        if !anonymous && (login.is_empty() || password.is_empty()) {
            let name = self.identity(state).unwrap_or_default();
            return Err(ReconcileError::precondition(
                self.type_name(),
                &self.describe(state),
                format!(
                    "missing 'login' and/or 'password' on externalauth_ldap {}",
                    name
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::testing::RecordingTransport;
    use crate::reconcile::{RawResponse, Reconciler};
    use reqwest::Method;
    use tfplug::types::AttributePath;
    use tfplug::Context;

    fn planned(anonymous: bool) -> State {
        let mut state = State::object();
        for (name, value) in [
            ("authentication_name", "corp ldap"),
            ("cn_attribute", "cn"),
            ("host", "ldap.corp"),
            ("ldap_base", "dc=corp"),
            ("login_attribute", "uid"),
        ] {
            state
                .set_string(&AttributePath::new(name), value.to_string())
                .unwrap();
        }
        state.set_number(&AttributePath::new("port"), 636.0).unwrap();
        state.set_number(&AttributePath::new("timeout"), 2.5).unwrap();
        if anonymous {
            state
                .set_bool(&AttributePath::new("is_anonymous_access"), true)
                .unwrap();
        }
        state
    }

    fn with_credentials(mut state: State) -> State {
        state
            .set_string(&AttributePath::new("login"), "binder".to_string())
            .unwrap();
        state
            .set_string(&AttributePath::new("password"), "s3cret".to_string())
            .unwrap();
        state
    }

    const REMOTE: &str = r#"{
        "id": "5",
        "authentication_name": "corp ldap",
        "type": "LDAP",
        "host": "ldap.corp",
        "port": 636,
        "timeout": 2.5,
        "cn_attribute": "cn",
        "ldap_base": "dc=corp",
        "login_attribute": "uid",
        "login": "binder",
        "is_ssl": false
    }"#;

    #[tokio::test]
    async fn create_posts_ldap_record() {
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(200, "[]"))
            .respond(RawResponse::new(204, ""))
            .respond(RawResponse::new(
                200,
                r#"[{"authentication_name": "corp ldap", "id": "5"}]"#,
            ))
            .respond(RawResponse::new(200, REMOTE));

        let state = Reconciler::new(&LdapCodec, &transport)
            .create(&Context::new(), &with_credentials(planned(false)))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].path, "/externalauths/corp%20ldap");
        assert_eq!(calls[1].path, "/externalauths/");
        let body = calls[1].body.as_ref().unwrap();
        assert_eq!(body["type"], "LDAP");
        assert_eq!(body["port"], 636);
        assert_eq!(body["password"], "s3cret");
        assert_eq!(calls[3].path, "/externalauths/5");

        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "5");
        assert_eq!(
            state.get_string(&AttributePath::new("password")).unwrap(),
            "s3cret"
        );
        assert!(state.is_unset(&AttributePath::new("is_ssl")));
    }

    #[tokio::test]
    async fn missing_bind_credentials_rejected_before_io() {
        let transport = RecordingTransport::new("v3.3");
        let err = Reconciler::new(&LdapCodec, &transport)
            .create(&Context::new(), &planned(false))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "bastion_externalauth_ldap authentication_name corp ldap: \
             missing 'login' and/or 'password' on externalauth_ldap corp ldap"
        );
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn anonymous_access_needs_no_credentials() {
        let transport = RecordingTransport::new("v3.3").respond(RawResponse::new(
            200,
            r#"[{"authentication_name": "corp ldap", "id": "5"}]"#,
        ));
        let err = Reconciler::new(&LdapCodec, &transport)
            .create(&Context::new(), &planned(true))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::AlreadyExists { .. }));
        assert_eq!(transport.methods(), vec![Method::GET]);
    }

    #[tokio::test]
    async fn renaming_requires_replacement_without_io() {
        let mut prior = with_credentials(planned(false));
        prior
            .set_string(&AttributePath::new("id"), "5".to_string())
            .unwrap();
        let mut renamed = prior.clone();
        renamed
            .set_string(
                &AttributePath::new("authentication_name"),
                "other".to_string(),
            )
            .unwrap();

        let transport = RecordingTransport::new("v3.3");
        let err = Reconciler::new(&LdapCodec, &transport)
            .update(&Context::new(), &prior, &renamed)
            .await
            .unwrap_err();

        match err {
            ReconcileError::ReplacementRequired { attributes, .. } => {
                assert_eq!(attributes, vec!["authentication_name".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn update_puts_item_and_rereads() {
        let mut prior = with_credentials(planned(false));
        prior
            .set_string(&AttributePath::new("id"), "5".to_string())
            .unwrap();
        let mut planned = prior.clone();
        planned
            .set_string(&AttributePath::new("host"), "ldap2.corp".to_string())
            .unwrap();

        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(200, "{}"))
            .respond(RawResponse::new(200, REMOTE.replace("ldap.corp", "ldap2.corp")));

        let state = Reconciler::new(&LdapCodec, &transport)
            .update(&Context::new(), &prior, &planned)
            .await
            .unwrap();

        assert_eq!(transport.methods(), vec![Method::PUT, Method::GET]);
        assert_eq!(transport.calls()[0].path, "/externalauths/5");
        assert_eq!(
            state.get_string(&AttributePath::new("host")).unwrap(),
            "ldap2.corp"
        );
    }

    #[tokio::test]
    async fn import_takes_whole_id_as_name() {
        let transport = RecordingTransport::new("v3.3")
            .respond(RawResponse::new(
                200,
                r#"[{"authentication_name": "eu/corp", "id": "5"}]"#,
            ))
            .respond(RawResponse::new(200, REMOTE));

        let state = Reconciler::new(&LdapCodec, &transport)
            .import(&Context::new(), "eu/corp")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].path, "/externalauths/eu%2Fcorp");
        assert_eq!(calls[1].path, "/externalauths/5");
        assert_eq!(
            state
                .get_string(&AttributePath::new("authentication_name"))
                .unwrap(),
            "eu/corp"
        );
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "5");
    }

    #[tokio::test]
    async fn empty_import_id_rejected_without_io() {
        let transport = RecordingTransport::new("v3.3");
        let err = Reconciler::new(&LdapCodec, &transport)
            .import(&Context::new(), "")
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::InvalidImportKey { .. }));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn decode_restores_encoded_fields_except_password() {
        let mut local = with_credentials(planned(false));
        local.set_bool(&AttributePath::new("is_ssl"), true).unwrap();
        local
            .set_string(&AttributePath::new("description"), "corp".to_string())
            .unwrap();

        let record = LdapCodec.encode(&local, Intent::Create).unwrap();
        let mut wire = serde_json::to_value(record).unwrap();
        wire.as_object_mut().unwrap().remove("password");
        let record: ExternalAuthLdap = serde_json::from_value(wire).unwrap();

        let mut refreshed = State::object();
        LdapCodec.decode(&record, &mut refreshed).unwrap();

        for name in REQUIRED_STRINGS.iter().chain(["description", "login"].iter()) {
            let path = AttributePath::new(name);
            assert_eq!(refreshed.get(&path), local.get(&path), "{}", name);
        }
        for name in ["port", "timeout", "is_ssl"] {
            let path = AttributePath::new(name);
            assert_eq!(refreshed.get(&path), local.get(&path), "{}", name);
        }
        assert!(refreshed.is_unset(&AttributePath::new("password")));
    }

    #[test]
    fn fractional_port_rejected() {
        let mut config = with_credentials(planned(false));
        config.set_number(&AttributePath::new("port"), 636.9).unwrap();

        let diagnostics = LdapCodec.schema().validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "port must be a whole number");
        assert!(LdapCodec.encode(&config, Intent::Create).is_err());
    }

    #[tokio::test]
    async fn fractional_port_never_posted() {
        let mut state = with_credentials(planned(false));
        state.set_number(&AttributePath::new("port"), 636.9).unwrap();
        let transport = RecordingTransport::new("v3.3").respond(RawResponse::new(200, "[]"));

        let err = Reconciler::new(&LdapCodec, &transport)
            .create(&Context::new(), &state)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Codec { .. }));
        assert_eq!(transport.methods(), vec![Method::GET]);
    }

    #[test]
    fn empty_authentication_name_rejected() {
        let mut config = with_credentials(planned(false));
        config
            .set_string(&AttributePath::new("authentication_name"), String::new())
            .unwrap();

        let diagnostics = LdapCodec.schema().validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some(AttributePath::new("authentication_name"))
        );
    }

    #[test]
    fn port_range_validated() {
        let mut config = planned(true);
        config.set_number(&AttributePath::new("port"), 70000.0).unwrap();
        let diagnostics = LdapCodec.schema().validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some(AttributePath::new("port"))
        );
    }
}
