use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use l2_sdk::{ChainInfoProvider, Error, HttpTransport, TransportConfig};

async fn provider_with(route: &str, response: ResponseTemplate) -> (MockServer, ChainInfoProvider) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    let transport = HttpTransport::new(&TransportConfig::new(&server.uri())).unwrap();
    (server, ChainInfoProvider::new(Arc::new(transport)))
}

#[tokio::test]
async fn latest_epoch_defaults_missing_fields() {
    let (_server, provider) = provider_with(
        "/epochs/latest",
        ResponseTemplate::new(200).set_body_json(json!({
            "epoch": 123, "startTime": 1640995200, "endTime": 1641427200, "txCount": "9"
        })),
    )
    .await;

    let epoch = provider.latest_epoch().await.unwrap();
    assert_eq!(epoch.epoch, 123);
    assert_eq!(epoch.first_block_time, 1_640_995_200);
    assert_eq!(epoch.last_block_time, 1_641_427_200);
    assert_eq!(epoch.tx_count, "9");
    assert_eq!(epoch.block_count, "0");
}

#[tokio::test]
async fn network_info_passes_through() {
    let body = json!({
        "supply": {"max": "45000000000000000", "total": "1", "circulating": "1", "locked": "0"},
        "stake": {"live": "0", "active": "0"}
    });
    let (_server, provider) =
        provider_with("/network", ResponseTemplate::new(200).set_body_json(body)).await;

    let info = provider.network_info().await.unwrap();
    assert_eq!(info.supply.max, "45000000000000000");
    assert_eq!(info.stake.active, "0");
}

#[tokio::test]
async fn block_lookup_fills_defaults() {
    let (_server, provider) = provider_with(
        "/blocks/3114963",
        ResponseTemplate::new(200).set_body_json(json!({
            "time": 1640995200, "height": 3114963, "hash": "0dbe46", "slot": 43905372, "epoch": 123
        })),
    )
    .await;

    let block = provider.block("3114963").await.unwrap();
    assert_eq!(block.height, 3_114_963);
    assert_eq!(block.slot_leader, "pool1dummy");
    assert_eq!(block.previous_block, "genesis");
}

#[tokio::test]
async fn latest_block_tip() {
    let (_server, provider) = provider_with(
        "/blocks/latest",
        ResponseTemplate::new(200)
            .set_body_json(json!({"blockNo": 3114963, "slot": 43905372, "hash": "0dbe46"})),
    )
    .await;

    let tip = provider.latest_block().await.unwrap();
    assert_eq!(tip.block_no, 3_114_963);
    assert_eq!(tip.hash, "0dbe46");
}

#[tokio::test]
async fn failures_are_errors_not_synthetic_data() {
    let (_server, provider) =
        provider_with("/epochs/latest", ResponseTemplate::new(502)).await;
    assert_eq!(provider.latest_epoch().await.unwrap_err().status(), Some(502));

    let (_server, provider) = provider_with(
        "/network",
        ResponseTemplate::new(200).set_body_json(json!({"supply": {}})),
    )
    .await;
    assert!(matches!(
        provider.network_info().await,
        Err(Error::InvalidResponse(_))
    ));

    assert!(matches!(
        provider.block("../submit").await,
        Err(Error::InvalidInput(_))
    ));
}
