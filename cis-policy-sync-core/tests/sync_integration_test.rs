//! End-to-end synchronization against a mock RHACS Central.

use std::time::Duration;

use cis_policy_sync_core::{
    Catalog, CentralClient, ClientError, ConnectionSettings, PolicyApi, PolicySyncError,
    PolicySynchronizer, SkipReason, SyncOptions,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> CentralClient {
    CentralClient::new(&ConnectionSettings {
        central_url: server.uri(),
        api_token: "integration-token".to_string(),
        timeout: Duration::from_secs(5),
        accept_invalid_certs: false,
    })
    .expect("client should build")
}

fn sample_catalog() -> Catalog {
    Catalog::from_json_str(
        &json!({
            "kubernetes_policies": [
                {
                    "name": "CIS 5.2.1 - Privileged containers",
                    "severity": "HIGH",
                    "lifecycleStages": ["DEPLOY"],
                    "enforcementActions": ["SCALE_TO_ZERO_ENFORCEMENT"],
                    "policySections": [{"policyGroups": [{"fieldName": "Privileged Container", "values": [{"value": "true"}]}]}]
                },
                {
                    "name": "CIS 5.2.6 - Root containers",
                    "severity": "MEDIUM",
                    "lifecycleStages": ["DEPLOY"]
                }
            ],
            "docker_policies": [
                {
                    "name": "CIS Docker 4.1 - Non-root user",
                    "severity": "MEDIUM",
                    "lifecycleStages": ["BUILD", "DEPLOY"]
                }
            ]
        })
        .to_string(),
    )
    .expect("catalog should parse")
}

async fn post_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| serde_json::from_slice(&r.body).expect("json body"))
        .collect()
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    let catalog = sample_catalog();
    let names: Vec<Value> = catalog
        .entries()
        .map(|(_, p)| json!({"id": format!("id-{}", p.name), "name": p.name}))
        .collect();

    // First listing is empty; later listings include everything created.
    Mock::given(method("GET"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policies": []})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policies": names})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "new"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let sync = PolicySynchronizer::new(&client, SyncOptions::default());

    let first = sync.run(&catalog).await.expect("first run");
    assert_eq!(first.created_count(), 3);
    assert_eq!(first.skipped_count(), 0);

    let second = sync.run(&catalog).await.expect("second run");
    assert_eq!(second.created_count(), 0);
    assert_eq!(second.skipped_count(), catalog.len());
    assert_eq!(post_bodies(&server).await.len(), 3, "no creates on rerun");
}

#[tokio::test]
async fn test_failed_entry_does_not_block_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policies": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .and(body_partial_json(json!({"name": "CIS 5.2.6 - Root containers"})))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "internal error"})),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ok"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = PolicySynchronizer::new(&client, SyncOptions::default())
        .run(&sample_catalog())
        .await
        .expect("run completes");

    assert_eq!(result.created_count(), 2);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].name, "CIS 5.2.6 - Root containers");
    assert!(result.failed[0].error.contains("internal error"));

    let attempted: Vec<String> = post_bodies(&server)
        .await
        .iter()
        .map(|b| b["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        attempted,
        vec![
            "CIS 5.2.1 - Privileged containers",
            "CIS 5.2.6 - Root containers",
            "CIS Docker 4.1 - Non-root user"
        ]
    );
}

#[tokio::test]
async fn test_existing_names_are_skipped_and_conflicts_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "policies": [{"id": "1", "name": "CIS 5.2.1 - Privileged containers"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .and(body_partial_json(json!({"name": "CIS Docker 4.1 - Non-root user"})))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "exists"})))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ok"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = PolicySynchronizer::new(&client, SyncOptions::default())
        .run(&sample_catalog())
        .await
        .expect("run completes");

    assert_eq!(result.created, vec!["CIS 5.2.6 - Root containers"]);
    let reasons: Vec<SkipReason> = result.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(reasons, vec![SkipReason::AlreadyExists, SkipReason::Conflict]);
    assert!(!result.has_failures());
    assert_eq!(post_bodies(&server).await.len(), 2);
}

#[tokio::test]
async fn test_unauthorized_listing_aborts_without_creates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/policies"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = PolicySynchronizer::new(&client, SyncOptions::default())
        .run(&sample_catalog())
        .await;

    assert!(
        matches!(
            result,
            Err(PolicySyncError::Client(ClientError::Auth { status: 401 }))
        ),
        "got: {result:?}"
    );
    assert!(post_bodies(&server).await.is_empty());
}

#[tokio::test]
async fn test_check_connection_uses_metadata_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "4.5.0"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .check_connection()
        .await
        .expect("metadata reachable");
}
