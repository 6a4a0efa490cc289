//! Soroban RPC client.
//!
//! Health factors are read by simulating read-only contract invocations, so
//! nothing here signs or submits transactions. The client speaks JSON-RPC 2.0
//! over a single POST endpoint.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::retry::RetryStrategy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// JSON-RPC request ID type
type RequestId = u64;

/// Soroban RPC client
#[derive(Clone)]
pub struct SorobanRpcClient {
    client: Client,
    base_url: String,
    retry_strategy: RetryStrategy,
    request_id: Arc<AtomicU64>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: RequestId,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Contract event as returned by `getEvents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    /// Ledger the event was emitted in
    pub ledger: u64,
    /// Close time of that ledger, RFC 3339
    pub ledger_closed_at: String,
    /// Emitting contract strkey
    pub contract_id: String,
    /// Topic segments, base64 `ScVal` XDR
    pub topic: Vec<String>,
    /// Event data, base64 `ScVal` XDR
    pub value: String,
}

/// Transaction simulation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateTransactionResult {
    /// Return value of the invoked function, base64 `ScVal` XDR
    pub result_xdr: Option<String>,
    /// Soroban transaction data XDR, absent when the simulation failed
    pub transaction_data: Option<String>,
    /// Resource fee estimate in stroops
    pub min_resource_fee: String,
    /// Ledger the simulation ran against
    pub latest_ledger: u64,
    /// Host error message if the simulation failed
    pub error: Option<String>,
}

impl SimulateTransactionResult {
    /// Whether the simulated invocation succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Return value XDR, or `SimulationFailed` carrying the host error
    pub fn into_result_xdr(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(HarnessError::SimulationFailed(error));
        }
        self.result_xdr.ok_or_else(|| {
            HarnessError::InvalidResponse("Simulation returned no result".to_string())
        })
    }
}

impl SorobanRpcClient {
    /// Create a new Soroban RPC client
    pub fn new(config: Arc<HarnessConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(HarnessError::NetworkError)?;

        Ok(Self {
            client,
            base_url: config.soroban_rpc_url.clone(),
            retry_strategy: RetryStrategy::from_config(&config),
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    fn next_request_id(&self) -> RequestId {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call_rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id(),
            method,
            params: &params,
        };

        debug!("Soroban RPC request: {} (id: {})", method, request.id);

        self.retry_strategy
            .retry(|| async {
                let response = self
                    .client
                    .post(&self.base_url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(HarnessError::NetworkError)?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(HarnessError::SorobanRpcError(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }

                let rpc_response: JsonRpcResponse = response
                    .json()
                    .await
                    .map_err(|e| HarnessError::InvalidResponse(e.to_string()))?;

                if let Some(error) = rpc_response.error {
                    error!("Soroban RPC error: {} (code: {})", error.message, error.code);
                    return Err(HarnessError::SorobanRpcError(format!(
                        "{} (code: {})",
                        error.message, error.code
                    )));
                }

                rpc_response.result.ok_or_else(|| {
                    HarnessError::SorobanRpcError("Missing result in response".to_string())
                })
            })
            .await
    }

    /// Latest ledger sequence known to the RPC node
    pub async fn get_latest_ledger(&self) -> Result<u64> {
        let result = self.call_rpc("getLatestLedger", json!({})).await?;

        let sequence = result["sequence"].as_u64().ok_or_else(|| {
            HarnessError::InvalidResponse("Missing sequence in ledger response".to_string())
        })?;

        debug!("Latest ledger: {}", sequence);
        Ok(sequence)
    }

    /// Simulate a transaction envelope (base64 XDR)
    pub async fn simulate_transaction(
        &self,
        transaction_xdr: &str,
    ) -> Result<SimulateTransactionResult> {
        let result = self
            .call_rpc(
                "simulateTransaction",
                json!({ "transaction": transaction_xdr }),
            )
            .await?;

        let simulation = SimulateTransactionResult {
            result_xdr: result["results"][0]["xdr"].as_str().map(str::to_string),
            transaction_data: result["transactionData"].as_str().map(str::to_string),
            min_resource_fee: result["minResourceFee"]
                .as_str()
                .unwrap_or("0")
                .to_string(),
            latest_ledger: result["latestLedger"].as_u64().unwrap_or(0),
            error: result["error"].as_str().map(str::to_string),
        };

        debug!(
            "Simulation at ledger {}: success: {}, fee: {}",
            simulation.latest_ledger,
            simulation.is_success(),
            simulation.min_resource_fee
        );
        Ok(simulation)
    }

    /// Contract events from `start_ledger`, filtered by emitting contracts and
    /// topic segments (base64 `ScVal` XDR, `*` as wildcard)
    pub async fn get_events(
        &self,
        start_ledger: u64,
        contract_ids: &[String],
        topics: &[Vec<String>],
        limit: u32,
    ) -> Result<Vec<ContractEvent>> {
        debug!("Fetching events from ledger {}", start_ledger);

        let mut filter = json!({ "type": "contract" });
        if !contract_ids.is_empty() {
            filter["contractIds"] = json!(contract_ids);
        }
        if !topics.is_empty() {
            filter["topics"] = json!(topics);
        }

        let params = json!({
            "startLedger": start_ledger,
            "filters": [filter],
            "pagination": { "limit": limit }
        });

        let mut result = self.call_rpc("getEvents", params).await?;
        let events: Vec<ContractEvent> = match result.get_mut("events") {
            Some(events) => serde_json::from_value(events.take())?,
            None => Vec::new(),
        };
        debug!("Fetched {} events", events.len());
        Ok(events)
    }

    /// Health check - verify connection to Soroban RPC
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Performing Soroban RPC health check");

        let result = self.call_rpc("getHealth", json!({})).await;
        match result {
            Ok(body) if body["status"] == "healthy" => {
                info!("Soroban RPC health check passed");
                Ok(true)
            }
            Ok(body) => {
                let status = body["status"].as_str().unwrap_or("unknown").to_string();
                error!("Soroban RPC reports status {}", status);
                Err(HarnessError::SorobanRpcError(format!(
                    "Node status: {}",
                    status
                )))
            }
            Err(e) => {
                error!("Soroban RPC health check failed: {}", e);
                Err(e)
            }
        }
    }
}
