use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use l2_sdk::{Error, HttpTransport, SubmissionGateway, TransportConfig};

fn gateway(server: &MockServer) -> SubmissionGateway {
    let transport = HttpTransport::new(&TransportConfig::new(&server.uri())).unwrap();
    SubmissionGateway::new(Arc::new(transport))
}

#[tokio::test]
async fn submit_posts_tx_as_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(query_param("tx_cbor", "84a40081825820"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server).submit("84a40081825820").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn server_error_is_transport_error_and_unhealthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gw = gateway(&server);
    let err = gw.submit("84a4").await.unwrap_err();
    assert!(matches!(err, Error::Transport { status: 500, .. }), "{err:?}");
    assert!(!gw.health_check().await);
}

#[tokio::test]
async fn health_requires_explicit_healthy_status() {
    for (body, expected) in [
        (json!({"status": "healthy"}), true),
        (json!({"status": "HEALTHY"}), false),
        (json!({"status": "degraded"}), false),
        (json!({"healthy": true}), false),
        (json!(["healthy"]), false),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;
        assert_eq!(gateway(&server).health_check().await, expected, "{body}");
    }
}

#[tokio::test]
async fn unreachable_backend_is_unhealthy() {
    let transport = HttpTransport::new(&TransportConfig::new("http://127.0.0.1:9")).unwrap();
    let gw = SubmissionGateway::new(Arc::new(transport));
    assert!(!gw.health_check().await);
}
