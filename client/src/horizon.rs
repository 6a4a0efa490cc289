//! Horizon API client.
//!
//! The harness only needs Horizon for ledger clock reads: the latest closed
//! ledger's sequence number and close time stamp every health observation.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::retry::RetryStrategy;
use crate::types::LedgerStamp;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Ledger record as returned by `/ledgers`
#[derive(Debug, Deserialize)]
struct LedgerRecord {
    sequence: u64,
    closed_at: String,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

/// Paged Horizon collection
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

/// Horizon API client
#[derive(Clone)]
pub struct HorizonClient {
    client: Client,
    base_url: String,
    retry_strategy: RetryStrategy,
}

impl HorizonClient {
    /// Create a new Horizon client
    pub fn new(config: Arc<HarnessConfig>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(HarnessError::NetworkError)?;

        Ok(Self {
            client,
            base_url: config.horizon_url.trim_end_matches('/').to_string(),
            retry_strategy: RetryStrategy::from_config(&config),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.retry_strategy
            .retry(|| async {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(HarnessError::NetworkError)?;

                let status = response.status();
                if status == 429 {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1);
                    return Err(HarnessError::RateLimitExceeded(retry_after));
                }
                if !status.is_success() {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(HarnessError::HorizonError(format!(
                        "Status {}: {}",
                        status, error_text
                    )));
                }

                response
                    .json()
                    .await
                    .map_err(|e| HarnessError::InvalidResponse(e.to_string()))
            })
            .await
    }

    /// Sequence and close time of the most recently closed ledger
    pub async fn latest_ledger(&self) -> Result<LedgerStamp> {
        let url = format!("{}/ledgers?order=desc&limit=1", self.base_url);
        let page: Page<LedgerRecord> = self.get_json(&url).await?;

        let record = page.embedded.records.into_iter().next().ok_or_else(|| {
            HarnessError::InvalidResponse("Ledger page has no records".to_string())
        })?;

        let stamp = LedgerStamp {
            sequence: record.sequence,
            closed_at: parse_closed_at(&record.closed_at)?,
        };
        debug!(
            "Latest ledger: {} (closed at {})",
            stamp.sequence, stamp.closed_at
        );
        Ok(stamp)
    }

    /// Health check - verify connection to Horizon
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Performing Horizon health check");

        match self.latest_ledger().await {
            Ok(_) => {
                info!("Horizon health check passed");
                Ok(true)
            }
            Err(e) => {
                error!("Horizon health check failed: {}", e);
                Err(e)
            }
        }
    }
}

fn parse_closed_at(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| HarnessError::InvalidResponse(format!("Bad closed_at {:?}: {}", value, e)))
}
