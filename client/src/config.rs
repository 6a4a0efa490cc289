//! Network and position configuration for the harness.
//!
//! [`HarnessConfig`] describes how to reach a Stellar network (Horizon and
//! Soroban RPC endpoints, retry and polling behaviour). [`PositionConfig`]
//! names the probe contract holding one tracked lending position.

use crate::error::{HarnessError, Result};
use crate::types::PositionId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    /// Stellar testnet
    Testnet,
    /// Stellar mainnet (public network)
    Mainnet,
    /// Stellar futurenet (for testing upcoming features)
    Futurenet,
    /// Custom network with user-defined endpoints
    Custom,
}

impl Network {
    /// Get the network passphrase
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Testnet => "Test SDF Network ; September 2015",
            Network::Mainnet => "Public Global Stellar Network ; September 2015",
            Network::Futurenet => "Test SDF Future Network ; October 2022",
            Network::Custom => "Custom Network",
        }
    }

    /// Get the default Horizon URL for this network
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Mainnet => "https://horizon.stellar.org",
            Network::Futurenet => "https://horizon-futurenet.stellar.org",
            Network::Custom => "",
        }
    }

    /// Get the default Soroban RPC URL for this network
    pub fn default_soroban_rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://soroban-testnet.stellar.org",
            Network::Mainnet => "https://soroban-mainnet.stellar.org",
            Network::Futurenet => "https://rpc-futurenet.stellar.org",
            Network::Custom => "",
        }
    }
}

impl FromStr for Network {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "public" => Ok(Network::Mainnet),
            "futurenet" => Ok(Network::Futurenet),
            "custom" => Ok(Network::Custom),
            other => Err(HarnessError::InvalidNetwork(other.to_string())),
        }
    }
}

/// Configuration for harness network clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Network to connect to
    pub network: Network,

    /// Horizon API endpoint URL
    pub horizon_url: String,

    /// Soroban RPC endpoint URL
    pub soroban_rpc_url: String,

    /// Network passphrase
    pub network_passphrase: String,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Maximum number of retries for failed requests
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,

    /// Interval between health polls while watching a position (in milliseconds)
    pub watch_poll_interval_ms: u64,

    /// How long to watch a position before giving up (in seconds)
    pub watch_timeout_secs: u64,
}

impl HarnessConfig {
    /// Create a new configuration for the specified network
    pub fn new(network: Network) -> Self {
        Self::with_endpoints(
            network,
            network.default_horizon_url().to_string(),
            network.default_soroban_rpc_url().to_string(),
            network.passphrase().to_string(),
        )
    }

    fn with_endpoints(
        network: Network,
        horizon_url: String,
        soroban_rpc_url: String,
        network_passphrase: String,
    ) -> Self {
        Self {
            network,
            horizon_url,
            soroban_rpc_url,
            network_passphrase,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
            watch_poll_interval_ms: 5000,
            watch_timeout_secs: 600,
        }
    }

    /// Create configuration for testnet
    pub fn testnet() -> Self {
        Self::new(Network::Testnet)
    }

    /// Create configuration for mainnet
    pub fn mainnet() -> Self {
        Self::new(Network::Mainnet)
    }

    /// Create configuration for futurenet
    pub fn futurenet() -> Self {
        Self::new(Network::Futurenet)
    }

    /// Create a custom configuration
    pub fn custom(
        horizon_url: String,
        soroban_rpc_url: String,
        network_passphrase: String,
    ) -> Result<Self> {
        let config = Self::with_endpoints(
            Network::Custom,
            horizon_url,
            soroban_rpc_url,
            network_passphrase,
        );
        config.check_endpoints()?;
        Ok(config)
    }

    /// Load configuration from the process environment.
    ///
    /// `STELLAR_NETWORK` selects the network (default `testnet`).
    /// `HORIZON_URL`, `SOROBAN_RPC_URL` and `NETWORK_PASSPHRASE` override the
    /// network defaults and are required for `custom`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network = match lookup("STELLAR_NETWORK") {
            Some(value) => value.parse()?,
            None => Network::Testnet,
        };

        let mut config = Self::new(network);
        if let Some(url) = lookup("HORIZON_URL") {
            config.horizon_url = url;
        }
        if let Some(url) = lookup("SOROBAN_RPC_URL") {
            config.soroban_rpc_url = url;
        }
        if let Some(passphrase) = lookup("NETWORK_PASSPHRASE") {
            config.network_passphrase = passphrase;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    /// Set position watch polling configuration
    pub fn with_watch_config(mut self, poll_interval_ms: u64, timeout_secs: u64) -> Self {
        self.watch_poll_interval_ms = poll_interval_ms;
        self.watch_timeout_secs = timeout_secs;
        self
    }

    fn check_endpoints(&self) -> Result<()> {
        if self.horizon_url.is_empty() {
            return Err(HarnessError::ConfigError(
                "Horizon URL cannot be empty".to_string(),
            ));
        }
        if self.soroban_rpc_url.is_empty() {
            return Err(HarnessError::ConfigError(
                "Soroban RPC URL cannot be empty".to_string(),
            ));
        }
        if self.network_passphrase.is_empty() {
            return Err(HarnessError::ConfigError(
                "Network passphrase cannot be empty".to_string(),
            ));
        }
        Url::parse(&self.horizon_url)?;
        Url::parse(&self.soroban_rpc_url)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.check_endpoints()?;

        if self.max_retries == 0 {
            return Err(HarnessError::ConfigError(
                "Max retries must be greater than 0".to_string(),
            ));
        }
        if self.retry_initial_delay_ms == 0 {
            return Err(HarnessError::ConfigError(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_multiplier <= 1.0 {
            return Err(HarnessError::ConfigError(
                "Retry multiplier must be greater than 1.0".to_string(),
            ));
        }
        if self.watch_poll_interval_ms == 0 {
            return Err(HarnessError::ConfigError(
                "Watch poll interval must be greater than 0".to_string(),
            ));
        }
        if self.watch_timeout_secs == 0 {
            return Err(HarnessError::ConfigError(
                "Watch timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Deployed probe contract holding one tracked lending position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionConfig {
    /// Liquidation probe contract strkey
    pub probe_contract: String,
}

impl PositionConfig {
    /// Load from `PROBE_CONTRACT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let probe_contract = lookup("PROBE_CONTRACT")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                HarnessError::ConfigError("Missing environment variable: PROBE_CONTRACT".to_string())
            })?;

        let config = Self { probe_contract };
        config.validate()?;
        Ok(config)
    }

    /// Check the probe id is a well-formed contract strkey
    pub fn validate(&self) -> Result<()> {
        if !is_contract_id(&self.probe_contract) {
            return Err(HarnessError::ConfigError(format!(
                "probe_contract is not a contract id: {}",
                self.probe_contract
            )));
        }
        Ok(())
    }

    /// Position id the tracker uses for this probe
    pub fn position_id(&self) -> PositionId {
        PositionId::new(self.probe_contract.clone())
    }
}

/// Whether `value` looks like a `C...` contract strkey
pub fn is_contract_id(value: &str) -> bool {
    value.len() == 56
        && value.starts_with('C')
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT_A: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const CONTRACT_B: &str = "CBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB2";

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_network_passphrase() {
        assert_eq!(
            Network::Testnet.passphrase(),
            "Test SDF Network ; September 2015"
        );
        assert_eq!(
            Network::Mainnet.passphrase(),
            "Public Global Stellar Network ; September 2015"
        );
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("public".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("stagenet".parse::<Network>().is_err());
    }

    #[test]
    fn test_testnet_config() {
        let config = HarnessConfig::testnet();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(
            config.soroban_rpc_url,
            "https://soroban-testnet.stellar.org"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_config_empty_urls() {
        let result = HarnessConfig::custom(
            "".to_string(),
            "https://soroban.example.com".to_string(),
            "Custom".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_config_rejects_malformed_url() {
        let result = HarnessConfig::custom(
            "not a url".to_string(),
            "https://soroban.example.com".to_string(),
            "Custom".to_string(),
        );
        assert!(matches!(result, Err(HarnessError::UrlParseError(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = HarnessConfig::testnet()
            .with_request_timeout(Duration::from_secs(60))
            .with_max_retries(5)
            .with_retry_config(200, 10000, 2.5)
            .with_watch_config(2000, 120);

        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_initial_delay_ms, 200);
        assert_eq!(config.retry_multiplier, 2.5);
        assert_eq!(config.watch_poll_interval_ms, 2000);
        assert_eq!(config.watch_timeout_secs, 120);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HarnessConfig::testnet();
        assert!(config.validate().is_ok());

        config.max_retries = 0;
        assert!(config.validate().is_err());

        config.max_retries = 3;
        config.retry_multiplier = 0.5;
        assert!(config.validate().is_err());

        config.retry_multiplier = 2.0;
        config.watch_poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup_defaults_to_testnet() {
        let config = HarnessConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.network, Network::Testnet);
    }

    #[test]
    fn test_from_lookup_custom_requires_endpoints() {
        let result = HarnessConfig::from_lookup(lookup_from(&[("STELLAR_NETWORK", "custom")]));
        assert!(result.is_err());

        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("STELLAR_NETWORK", "custom"),
            ("HORIZON_URL", "http://localhost:8000"),
            ("SOROBAN_RPC_URL", "http://localhost:8000/soroban/rpc"),
            ("NETWORK_PASSPHRASE", "Standalone Network ; February 2017"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Custom);
        assert_eq!(config.horizon_url, "http://localhost:8000");
    }

    #[test]
    fn test_position_config_from_lookup() {
        let config =
            PositionConfig::from_lookup(lookup_from(&[("PROBE_CONTRACT", CONTRACT_A)])).unwrap();
        assert_eq!(config.probe_contract, CONTRACT_A);
        assert_eq!(config.position_id().as_str(), CONTRACT_A);
    }

    #[test]
    fn test_position_config_names_missing_variable() {
        let err = PositionConfig::from_lookup(lookup_from(&[("PROBE_CONTRACT", "  ")])).unwrap_err();
        assert!(err.to_string().contains("PROBE_CONTRACT"));
    }

    #[test]
    fn test_position_config_rejects_account_ids() {
        let account = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
        let err =
            PositionConfig::from_lookup(lookup_from(&[("PROBE_CONTRACT", account)])).unwrap_err();
        assert!(err.to_string().contains("probe_contract"));
    }

    #[test]
    fn test_is_contract_id() {
        assert!(is_contract_id(CONTRACT_A));
        assert!(is_contract_id(CONTRACT_B));
        assert!(!is_contract_id("CSHORT"));
        assert!(!is_contract_id(&CONTRACT_A.to_lowercase()));
    }
}
