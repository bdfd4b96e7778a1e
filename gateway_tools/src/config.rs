use std::time::Duration;

use log::*;
use ops_common::Secret;

use crate::GatewayApiError;

pub const DEFAULT_GATEWAY_URL: &str = "https://api.sandbox.paygate.example.com";
/// The value shipped in `.env.sample`. Starting the server without replacing it is a
/// configuration error on every gateway-calling path, not a silent no-op.
pub const PLACEHOLDER_SERVER_KEY: &str = "SB-server-xxxxxxxxxxxxxxxx";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway API, without a trailing slash. e.g. "https://api.paygate.example.com"
    pub base_url: String,
    /// The merchant server key. Doubles as the shared secret in the webhook signature formula.
    pub server_key: Secret<String>,
    /// Timeout applied to every gateway call. A timeout is an ambiguous outcome, not a failure.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            server_key: Secret::new(PLACEHOLDER_SERVER_KEY.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("OPS_GATEWAY_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                warn!("OPS_GATEWAY_URL not set, using the sandbox default");
                DEFAULT_GATEWAY_URL.to_string()
            });
        let server_key = Secret::new(std::env::var("OPS_GATEWAY_SERVER_KEY").unwrap_or_else(|_| {
            warn!("OPS_GATEWAY_SERVER_KEY not set. Gateway calls will fail until it is configured.");
            PLACEHOLDER_SERVER_KEY.to_string()
        }));
        let timeout = std::env::var("OPS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self { base_url, server_key, timeout }
    }

    /// Checks that the credentials are present and not placeholder values. Every gateway-calling
    /// path runs this before touching the network.
    pub fn validate(&self) -> Result<(), GatewayApiError> {
        let key = self.server_key.reveal();
        if key.trim().is_empty() {
            return Err(GatewayApiError::Configuration("the server key is empty".to_string()));
        }
        if key == PLACEHOLDER_SERVER_KEY || key.contains("xxxxxxxx") {
            return Err(GatewayApiError::Configuration("the server key is a placeholder".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(GatewayApiError::Configuration("the gateway URL is empty".to_string()));
        }
        Ok(())
    }
}
