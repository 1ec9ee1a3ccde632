use bastion::api::{Client, ClientConfig};
use bastion::{BastionProvider, BastionProviderData};
use mockito::{Matcher, Server, ServerGuard};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest,
};
use tfplug::types::ClientCapabilities;
use tfplug::{AttributePath, Context, Dynamic, ManagedResource, Provider, State};

const APP1: &str = r#"{
    "id": "42",
    "application_name": "app1",
    "connection_policy": "RDP",
    "target": "srv1",
    "description": "",
    "parameters": "",
    "global_domains": [],
    "paths": [{"target": "t", "program": "/usr/bin/prog", "working_dir": ""}],
    "local_domains": []
}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn search_query() -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("fields".into(), "application_name,id".into()),
        Matcher::UrlEncoded("limit".into(), "-1".into()),
    ])
}

fn provider_data(server: &ServerGuard, api_version: &str) -> Arc<dyn Any + Send + Sync> {
    let client = Client::new(ClientConfig::new(
        server.url(),
        "admin",
        "secret",
        api_version,
    ))
    .unwrap();
    Arc::new(BastionProviderData::new(client))
}

async fn application(data: Arc<dyn Any + Send + Sync>) -> Box<dyn ManagedResource> {
    let factory = BastionProvider::new().resources()["bastion_application"];
    let mut resource = factory();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

fn planned_app1() -> State {
    let mut state = State::object();
    for (name, value) in [
        ("application_name", "app1"),
        ("connection_policy", "RDP"),
        ("target", "srv1"),
    ] {
        state
            .set_string(&AttributePath::new(name), value.to_string())
            .unwrap();
    }
    state
        .set_list(
            &AttributePath::new("paths"),
            vec![Dynamic::Map(HashMap::from([
                ("target".to_string(), Dynamic::from("t")),
                ("program".to_string(), Dynamic::from("/usr/bin/prog")),
            ]))],
        )
        .unwrap();
    state
}

#[tokio::test(flavor = "multi_thread")]
async fn application_lifecycle_with_mock_server() {
    init_tracing();
    let mut server = Server::new_async().await;

    let searches = Arc::new(AtomicUsize::new(0));
    let counter = searches.clone();
    let search = server
        .mock("GET", "/api/v3.3/applications/")
        .match_query(search_query())
        .match_header("x-auth-user", "admin")
        .match_header("x-auth-token", "secret")
        .with_body_from_request(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                b"[]".to_vec()
            } else {
                br#"[{"application_name": "app1", "id": 42}]"#.to_vec()
            }
        })
        .expect(3)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/api/v3.3/applications/")
        .match_body(Matcher::PartialJsonString(
            r#"{"application_name": "app1", "global_domains": []}"#.to_string(),
        ))
        .with_status(204)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/v3.3/applications/42")
        .with_body(APP1)
        .expect(3)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/v3.3/applications/42")
        .with_status(204)
        .create_async()
        .await;

    let resource = application(provider_data(&server, "v3.3")).await;

    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "bastion_application".to_string(),
                planned_state: planned_app1(),
                config: planned_app1(),
            },
        )
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(
        created
            .new_state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "42"
    );

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "bastion_application".to_string(),
                current_state: created.new_state.clone(),
            },
        )
        .await;
    assert!(read.diagnostics.is_empty());
    let state = read.new_state.unwrap();
    assert_eq!(
        state
            .get_string(&AttributePath::new("connection_policy"))
            .unwrap(),
        "RDP"
    );

    let imported = resource
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "bastion_application".to_string(),
                id: "app1".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(imported.diagnostics.is_empty(), "{:?}", imported.diagnostics);
    assert_eq!(imported.imported_resources.len(), 1);
    assert_eq!(
        imported.imported_resources[0]
            .state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "42"
    );

    let deleted = resource
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "bastion_application".to_string(),
                prior_state: state,
            },
        )
        .await;
    assert!(deleted.diagnostics.is_empty(), "{:?}", deleted.diagnostics);

    search.assert_async().await;
    post.assert_async().await;
    get.assert_async().await;
    delete.assert_async().await;
    assert_eq!(searches.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn application_gone_upstream_is_removed_from_state() {
    init_tracing();
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/api/v3.3/applications/42")
        .with_status(404)
        .create_async()
        .await;

    let resource = application(provider_data(&server, "v3.3")).await;
    let mut current = planned_app1();
    current
        .set_string(&AttributePath::new("id"), "42".to_string())
        .unwrap();

    let read = resource
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "bastion_application".to_string(),
                current_state: current,
            },
        )
        .await;

    assert!(read.diagnostics.is_empty());
    assert!(read.new_state.is_none());
    get.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn api_errors_surface_status_and_body() {
    init_tracing();
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/api/v3.3/applications/")
        .match_query(search_query())
        .with_status(403)
        .with_body(r#"{"error": "forbidden"}"#)
        .create_async()
        .await;

    let resource = application(provider_data(&server, "v3.3")).await;
    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "bastion_application".to_string(),
                planned_state: planned_app1(),
                config: planned_app1(),
            },
        )
        .await;

    assert_eq!(created.diagnostics.len(), 1);
    assert_eq!(
        created.diagnostics[0].summary,
        "Failed to create bastion_application"
    );
    let detail = &created.diagnostics[0].detail;
    assert!(detail.contains("403"), "{}", detail);
    assert!(detail.contains("forbidden"), "{}", detail);
    search.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_version_never_reaches_the_server() {
    init_tracing();
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resource = application(provider_data(&server, "v3.8")).await;
    let created = resource
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "bastion_application".to_string(),
                planned_state: planned_app1(),
                config: planned_app1(),
            },
        )
        .await;

    assert_eq!(created.diagnostics.len(), 1);
    assert!(created.diagnostics[0].detail.contains("v3.8"));
    any.assert_async().await;
}
