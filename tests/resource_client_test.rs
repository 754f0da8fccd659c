//! Integration tests for the FHIR resource client against a mock server
//!
//! These tests pin down the HTTP contract: paths, headers, retry counts and
//! how response statuses map onto error variants.

use mockito::{Matcher, Server};
use rosetta::client::ResourceClient;
use rosetta::config::{RetryConfig, ServerConfig};
use rosetta::domain::{Resource, RosettaError};
use serde_json::json;

/// Server config with fast retries so retry tests finish quickly
fn test_config(base_url: &str) -> ServerConfig {
    ServerConfig::new(base_url).with_retry(RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
    })
}

fn client_for(base_url: &str) -> ResourceClient {
    ResourceClient::new(&test_config(base_url)).unwrap()
}

fn operation_outcome(diagnostics: &str) -> String {
    json!({
        "resourceType": "OperationOutcome",
        "issue": [{"severity": "error", "code": "processing", "diagnostics": diagnostics}]
    })
    .to_string()
}

#[tokio::test]
async fn test_read_returns_resource() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient/123")
        .match_header("accept", "application/fhir+json")
        .with_status(200)
        .with_header("content-type", "application/fhir+json")
        .with_body(r#"{"resourceType": "Patient", "id": "123", "active": true}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let patient = client.read("Patient", "123").await.unwrap();

    assert_eq!(patient.resource_type(), "Patient");
    assert_eq!(patient.id(), Some("123"));
    assert_eq!(patient.reference(), Some("Patient/123".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_twice_returns_identical_content() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient/123")
        .with_status(200)
        .with_body(
            json!({
                "resourceType": "Patient",
                "id": "123",
                "meta": {"versionId": "1"},
                "name": [{"family": "Garcia", "given": ["Maria"]}]
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let first = client.read("Patient", "123").await.unwrap();
    let second = client.read("Patient", "123").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_missing_resource_is_not_found_without_retry() {
    let mut server = Server::new_async().await;
    // expect(1) pins down that 4xx responses are not retried
    let mock = server
        .mock("GET", "/Patient/missing")
        .with_status(404)
        .with_body(operation_outcome("Resource Patient/missing is not known"))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.read("Patient", "missing").await.unwrap_err();

    match err {
        RosettaError::ResourceNotFound { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not known"));
        }
        other => panic!("expected ResourceNotFound, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bad_request_maps_to_validation_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient/bad")
        .with_status(400)
        .with_body(operation_outcome("Invalid search parameter"))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.read("Patient", "bad").await.unwrap_err();

    match err {
        RosettaError::Validation { status, message } => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "Invalid search parameter");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_map_to_authentication() {
    let mut server = Server::new_async().await;
    let unauthorized = server
        .mock("GET", "/Patient/secret")
        .with_status(401)
        .with_body(operation_outcome("Authentication required"))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.read("Patient", "secret").await.unwrap_err();
    match err {
        RosettaError::Authentication { status, .. } => assert_eq!(status, 401),
        other => panic!("expected Authentication, got {other:?}"),
    }
    unauthorized.assert_async().await;

    let forbidden = server
        .mock("GET", "/Patient/locked")
        .with_status(403)
        .with_body("")
        .expect(1)
        .create_async()
        .await;

    let err = client.read("Patient", "locked").await.unwrap_err();
    match err {
        RosettaError::Authentication { status, .. } => assert_eq!(status, 403),
        other => panic!("expected Authentication, got {other:?}"),
    }
    forbidden.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_retry_until_attempts_exhausted() {
    let mut server = Server::new_async().await;
    // expect(3) pins down one initial call plus two retries
    let mock = server
        .mock("GET", "/Patient/flaky")
        .with_status(503)
        .with_body(operation_outcome("Database unavailable"))
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.read("Patient", "flaky").await.unwrap_err();

    match &err {
        RosettaError::Operation { status, message } => {
            assert_eq!(*status, Some(503));
            assert!(message.contains("Database unavailable"));
        }
        other => panic!("expected Operation, got {other:?}"),
    }
    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_maps_to_connection_error() {
    // Nothing listens on the discard port
    let client = client_for("http://127.0.0.1:1");
    let err = client.read("Patient", "123").await.unwrap_err();

    match err {
        RosettaError::Connection(message) => {
            assert!(!message.is_empty());
        }
        other => panic!("expected Connection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_posts_to_type_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/Patient")
        .match_header("content-type", "application/fhir+json")
        .match_body(Matcher::PartialJson(json!({"resourceType": "Patient"})))
        .with_status(201)
        .with_body(r#"{"resourceType": "Patient", "id": "new-1"}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let resource = Resource::new(json!({
        "resourceType": "Patient",
        "name": [{"family": "Garcia", "given": ["Maria"]}]
    }))
    .unwrap();

    let created = client.create(&resource).await.unwrap();
    assert_eq!(created.id(), Some("new-1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_puts_to_instance_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/Patient/123")
        .match_body(Matcher::PartialJson(json!({"id": "123"})))
        .with_status(200)
        .with_body(r#"{"resourceType": "Patient", "id": "123", "active": false}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let resource = Resource::new(json!({
        "resourceType": "Patient",
        "id": "123",
        "active": false
    }))
    .unwrap();

    let updated = client.update(&resource).await.unwrap();
    assert_eq!(updated.get("active"), Some(&json!(false)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_without_id_fails_before_any_request() {
    let client = client_for("http://127.0.0.1:1");
    let resource = Resource::new(json!({"resourceType": "Patient"})).unwrap();

    // A connection error here would mean a request was actually sent
    let err = client.update(&resource).await.unwrap_err();
    match err {
        RosettaError::Validation { status, message } => {
            assert_eq!(status, None);
            assert!(message.contains("without an id"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_returns_true_on_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/Patient/123")
        .with_status(204)
        .with_body("")
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert!(client.delete("Patient", "123").await.unwrap());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_missing_resource_is_not_found() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/Patient/missing")
        .with_status(404)
        .with_body(operation_outcome("Not found"))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.delete("Patient", "missing").await.unwrap_err();
    assert!(matches!(err, RosettaError::ResourceNotFound { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_sends_parameters_and_parses_bundle() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Observation")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("patient".into(), "123".into()),
            Matcher::UrlEncoded("code".into(), "29463-7".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "total": 2,
                "entry": [
                    {"resource": {"resourceType": "Observation", "id": "obs-1"}},
                    {"resource": {"resourceType": "Observation", "id": "obs-2"}}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server.url());
    let bundle = client
        .search("Observation", &[("patient", "123"), ("code", "29463-7")])
        .await
        .unwrap();

    assert_eq!(bundle.total(), 2);
    let ids: Vec<_> = bundle.resources().filter_map(|r| r.id()).collect();
    assert_eq!(ids, vec!["obs-1", "obs-2"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_with_no_matches_returns_empty_bundle() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient")
        .match_query(Matcher::UrlEncoded("name".into(), "nobody".into()))
        .with_status(200)
        .with_body(
            json!({"resourceType": "Bundle", "type": "searchset", "total": 0}).to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server.url());
    let bundle = client.search("Patient", &[("name", "nobody")]).await.unwrap();

    // An empty bundle is a successful search, not an error
    assert!(bundle.is_empty());
    assert_eq!(bundle.total(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let mut server = Server::new_async().await;
    // base64("user:pass")
    let mock = server
        .mock("GET", "/Patient/123")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .with_status(200)
        .with_body(r#"{"resourceType": "Patient", "id": "123"}"#)
        .create_async()
        .await;

    let config = test_config(&server.url()).with_basic_auth("user", "pass");
    let client = ResourceClient::new(&config).unwrap();
    client.read("Patient", "123").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_capability_statement_fetches_metadata() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/metadata")
        .with_status(200)
        .with_body(
            json!({
                "resourceType": "CapabilityStatement",
                "status": "active",
                "fhirVersion": "4.0.1",
                "software": {"name": "HAPI FHIR", "version": "6.2.0"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server.url());
    let statement = client.capability_statement().await.unwrap();

    assert_eq!(statement.resource_type(), "CapabilityStatement");
    assert_eq!(
        statement.as_value().pointer("/software/name").unwrap(),
        "HAPI FHIR"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_json_success_body_is_protocol_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient/123")
        .with_status(200)
        .with_body("<html>login page</html>")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.read("Patient", "123").await.unwrap_err();
    assert!(matches!(err, RosettaError::Protocol(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_bundle_search_response_is_protocol_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/Patient")
        .with_status(200)
        .with_body(r#"{"resourceType": "Patient", "id": "123"}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.search("Patient", &[]).await.unwrap_err();
    assert!(matches!(err, RosettaError::Protocol(_)));
    mock.assert_async().await;
}
