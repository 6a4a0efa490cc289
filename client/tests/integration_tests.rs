//! Integration tests for the liquidation harness client
//!
//! These tests use mock servers to simulate Horizon and Soroban RPC responses.

use assert_matches::assert_matches;
use health_history::{HealthFactor, HealthStatus, HistoryError, NO_DEBT_SENTINEL};
use liquidation_harness_client::{
    onchain::health_recorded_topic, scval, HarnessClient, HarnessConfig, HarnessError, Network,
    PositionAction, PositionConfig, PositionId, WatchOutcome,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stellar_xdr::curr::{ScMap, ScMapEntry, ScVal, ScVec};
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const QUERY_XDR: &str = "AAAAAgAAAAA=";
const HF_1_92: u128 = 1_920_000_000_000_000_000;
const HF_0_96: u128 = 960_000_000_000_000_000;

/// Helper to create test config with custom URLs
fn create_test_config(horizon_url: String, soroban_url: String) -> Arc<HarnessConfig> {
    Arc::new(
        HarnessConfig::custom(
            horizon_url,
            soroban_url,
            "Test SDF Network ; September 2015".to_string(),
        )
        .unwrap()
        .with_request_timeout(Duration::from_secs(5))
        .with_max_retries(3)
        .with_retry_config(10, 50, 2.0)
        .with_watch_config(10, 1),
    )
}

fn ledger_page(sequence: u64, closed_at: &str) -> serde_json::Value {
    json!({
        "_links": {},
        "_embedded": {
            "records": [
                { "id": "abc", "sequence": sequence, "closed_at": closed_at }
            ]
        }
    })
}

fn simulation_result(raw: u128) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "transactionData": "AAAA",
            "minResourceFee": "58181",
            "results": [ { "auth": [], "xdr": scval::encode(&scval::from_u128(raw)).unwrap() } ],
            "latestLedger": 1000
        }
    })
}

async fn mount_ledger(server: &MockServer, sequence: u64, closed_at: &str) {
    Mock::given(method("GET"))
        .and(path("/ledgers"))
        .and(query_param("order", "desc"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ledger_page(sequence, closed_at)))
        .mount(server)
        .await;
}

async fn mount_health_factor(server: &MockServer, raw: u128) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "simulateTransaction" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(simulation_result(raw)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_creation_and_validation() {
    let config = Arc::new(HarnessConfig::testnet());
    assert!(HarnessClient::new(config).is_ok());

    let invalid_config = HarnessConfig::custom(
        "".to_string(),
        "https://soroban.test".to_string(),
        "Test".to_string(),
    );
    assert!(invalid_config.is_err());
}

#[tokio::test]
async fn test_network_configurations() {
    let testnet = HarnessConfig::testnet();
    assert_eq!(testnet.network, Network::Testnet);
    assert!(testnet.horizon_url.contains("testnet"));

    let mainnet = HarnessConfig::mainnet();
    assert_eq!(mainnet.network, Network::Mainnet);
    assert!(mainnet.horizon_url.contains("horizon.stellar.org"));

    let futurenet = HarnessConfig::futurenet();
    assert_eq!(futurenet.network, Network::Futurenet);
}

#[tokio::test]
async fn test_horizon_latest_ledger() {
    let horizon = MockServer::start().await;
    mount_ledger(&horizon, 51234, "2024-03-01T12:00:05Z").await;

    let config = create_test_config(horizon.uri(), "http://soroban.test".to_string());
    let client = HarnessClient::new(config).unwrap();

    let stamp = client.latest_ledger().await.unwrap();
    assert_eq!(stamp.sequence, 51234);
    assert_eq!(stamp.timestamp(), 1_709_294_405);
}

#[tokio::test]
async fn test_horizon_empty_ledger_page() {
    let horizon = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ledgers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "_embedded": { "records": [] } })),
        )
        .mount(&horizon)
        .await;

    let config = create_test_config(horizon.uri(), "http://soroban.test".to_string());
    let client = HarnessClient::new(config).unwrap();

    assert_matches!(
        client.latest_ledger().await,
        Err(HarnessError::InvalidResponse(_))
    );
}

#[tokio::test]
async fn test_soroban_rpc_error_response() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "invalid parameters" }
        })))
        .mount(&rpc)
        .await;

    let config = create_test_config("http://horizon.test".to_string(), rpc.uri());
    let client = HarnessClient::new(config).unwrap();

    let err = client.soroban_rpc().get_latest_ledger().await.unwrap_err();
    assert!(err.to_string().contains("invalid parameters"));
}

#[tokio::test]
async fn test_soroban_rpc_retries_unavailable_node() {
    let rpc = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&rpc)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getLatestLedger" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "id": "abc", "protocolVersion": 22, "sequence": 777 }
        })))
        .mount(&rpc)
        .await;

    let config = create_test_config("http://horizon.test".to_string(), rpc.uri());
    let client = HarnessClient::new(config).unwrap();

    assert_eq!(client.soroban_rpc().get_latest_ledger().await.unwrap(), 777);
}

#[tokio::test]
async fn test_health_check() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;
    mount_ledger(&horizon, 100, "2024-01-01T00:00:00Z").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getHealth" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "status": "healthy", "latestLedger": 100 }
        })))
        .mount(&rpc)
        .await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_track_position_through_price_crash() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;
    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let mut tracker = client.track_position(PositionId::from("CPROBE"), QUERY_XDR);

    // Supply: no debt yet
    mount_ledger(&horizon, 100, "2024-01-01T00:00:00Z").await;
    mount_health_factor(&rpc, NO_DEBT_SENTINEL).await;
    let supply = tracker.observe(PositionAction::Supply).await.unwrap();
    assert_eq!(supply.health_factor(), HealthFactor::NoDebt);
    assert_eq!(supply.status, HealthStatus::Healthy);

    // Borrow
    horizon.reset().await;
    rpc.reset().await;
    mount_ledger(&horizon, 101, "2024-01-01T00:00:05Z").await;
    mount_health_factor(&rpc, HF_1_92).await;
    let borrow = tracker.observe(PositionAction::Borrow).await.unwrap();
    assert_eq!(borrow.status, HealthStatus::Healthy);

    // Collateral price halves
    horizon.reset().await;
    rpc.reset().await;
    mount_ledger(&horizon, 104, "2024-01-01T00:00:20Z").await;
    mount_health_factor(&rpc, HF_0_96).await;
    let crash = tracker.observe(PositionAction::PriceUpdate).await.unwrap();
    assert_eq!(crash.status, HealthStatus::AtRisk);
    assert!(crash.entered_at_risk());

    let report = tracker.report();
    assert_eq!(report.observations.len(), 3);
    assert_eq!(report.first_at_risk.unwrap().block_height(), 104);
    assert_eq!(
        report.latest_health_factor,
        Some(HealthFactor::Ratio(HF_0_96))
    );
    for pair in report.observations.windows(2) {
        assert!(pair[0].block_height() <= pair[1].block_height());
        assert!(pair[0].timestamp() <= pair[1].timestamp());
        assert!(pair[0].timestamp() > 0);
    }
}

#[tokio::test]
async fn test_reverted_simulation_is_not_recorded() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;
    mount_ledger(&horizon, 100, "2024-01-01T00:00:00Z").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "simulateTransaction" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "error": "HostError: Error(Contract, #2)",
                "latestLedger": 1000
            }
        })))
        .mount(&rpc)
        .await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let mut tracker = client.track_position(PositionId::from("CPROBE"), QUERY_XDR);

    assert_matches!(
        tracker.observe(PositionAction::Supply).await,
        Err(HarnessError::SimulationFailed(msg)) if msg.contains("#2")
    );
    assert!(tracker.history().is_empty());
}

#[tokio::test]
async fn test_ledger_going_backwards_is_rejected() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;
    mount_health_factor(&rpc, HF_1_92).await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let mut tracker = client.track_position(PositionId::from("CPROBE"), QUERY_XDR);

    mount_ledger(&horizon, 200, "2024-01-01T00:10:00Z").await;
    tracker.observe(PositionAction::Borrow).await.unwrap();

    // A lagging Horizon node behind a load balancer
    horizon.reset().await;
    mount_ledger(&horizon, 199, "2024-01-01T00:09:55Z").await;
    assert_matches!(
        tracker.observe(PositionAction::Poll).await,
        Err(HarnessError::History(HistoryError::OrderingViolation { previous: 200, attempted: 199, .. }))
    );
    assert_eq!(tracker.history().len(), 1);
}

#[tokio::test]
async fn test_watch_until_at_risk() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;
    mount_ledger(&horizon, 300, "2024-01-01T01:00:00Z").await;

    // Two healthy reads before the pool catches up with the oracle
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "simulateTransaction" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(simulation_result(HF_1_92)),
        )
        .up_to_n_times(2)
        .mount(&rpc)
        .await;
    mount_health_factor(&rpc, HF_0_96).await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let mut tracker = client.track_position(PositionId::from("CPROBE"), QUERY_XDR);

    let outcome = client.watch(&mut tracker).await.unwrap();
    assert_matches!(outcome, WatchOutcome::AtRisk(ref report) if report.observation.sequence_index() == 2);
    assert_eq!(tracker.history().len(), 3);
}

const PROBE_ID: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2";

/// `getEvents` entry shaped like the probe's `HealthRecordedEvent`
fn health_recorded_event(index: u32, ledger: u32, timestamp: u64, raw: u128, action: &str) -> serde_json::Value {
    let entry = |key: &str, val: ScVal| ScMapEntry {
        key: scval::symbol(key).unwrap(),
        val,
    };
    let action = ScVal::Vec(Some(ScVec(vec![scval::symbol(action).unwrap()].try_into().unwrap())));
    let data = ScVal::Map(Some(ScMap(
        vec![
            entry("action", action),
            entry("block_number", ScVal::U32(ledger)),
            entry("health_factor", scval::from_u128(raw)),
            entry("index", ScVal::U32(index)),
            entry("timestamp", ScVal::U64(timestamp)),
        ]
        .try_into()
        .unwrap(),
    )));

    json!({
        "type": "contract",
        "ledger": ledger,
        "ledgerClosedAt": "2024-03-01T12:00:00Z",
        "contractId": PROBE_ID,
        "id": format!("{:019}-0000000001", ledger),
        "pagingToken": format!("{:019}-0000000001", ledger),
        "topic": health_recorded_topic().unwrap(),
        "value": scval::encode(&data).unwrap(),
        "inSuccessfulContractCall": true,
        "txHash": "00"
    })
}

#[tokio::test]
async fn test_onchain_history_rebuilt_from_events() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "getEvents",
            "params": {
                "startLedger": 100,
                "filters": [ { "type": "contract", "contractIds": [PROBE_ID] } ]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "events": [
                    health_recorded_event(0, 100, 1_000, NO_DEBT_SENTINEL, "Supply"),
                    health_recorded_event(1, 101, 1_005, HF_1_92, "Borrow"),
                    health_recorded_event(2, 102, 1_010, HF_0_96, "PriceUpdate"),
                ],
                "latestLedger": 110
            }
        })))
        .expect(1)
        .mount(&rpc)
        .await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let position = PositionConfig {
        probe_contract: PROBE_ID.to_string(),
    };

    let history = client.onchain_history(&position, 100).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.at(0).unwrap().health_factor(), HealthFactor::NoDebt);
    assert_eq!(history.first_at_risk().unwrap().sequence_index(), 2);
    assert_eq!(history.latest_health_factor(), Some(HealthFactor::Ratio(HF_0_96)));
}

#[tokio::test]
async fn test_onchain_history_from_late_start_ledger_is_rejected() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getEvents" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "events": [ health_recorded_event(2, 102, 1_010, HF_0_96, "PriceUpdate") ],
                "latestLedger": 110
            }
        })))
        .mount(&rpc)
        .await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let position = PositionConfig {
        probe_contract: PROBE_ID.to_string(),
    };

    assert_matches!(
        client.onchain_history(&position, 102).await,
        Err(HarnessError::History(HistoryError::NonContiguousIndex { expected: 0, found: 2 }))
    );
}

#[tokio::test]
async fn test_malformed_events_payload_is_a_serialization_error() {
    let horizon = MockServer::start().await;
    let rpc = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getEvents" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "events": [ { "ledger": "not a number" } ], "latestLedger": 110 }
        })))
        .mount(&rpc)
        .await;

    let client = HarnessClient::new(create_test_config(horizon.uri(), rpc.uri())).unwrap();
    let result = client.soroban_rpc().get_events(100, &[], &[], 10).await;
    assert_matches!(result, Err(HarnessError::SerializationError(_)));
}
