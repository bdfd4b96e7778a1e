use std::{env, time::Duration};

use gateway_tools::GatewayConfig;
use log::*;
use ops_common::{parse_boolean_flag, Secret};

const DEFAULT_OPS_HOST: &str = "127.0.0.1";
const DEFAULT_OPS_PORT: u16 = 8460;
const DEFAULT_NOTIFY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_NOTIFY_BACKOFF_MS: u64 = 2_000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Connection settings and credentials for the payment gateway.
    pub gateway: GatewayConfig,
    /// Retry policy for the confirmation-notification worker.
    pub notifications: NotificationConfig,
    /// If false, webhook signature verification is skipped. Local development only. **DANGER**
    pub webhook_signature_checks: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OPS_HOST.to_string(),
            port: DEFAULT_OPS_PORT,
            database_url: String::default(),
            gateway: GatewayConfig::default(),
            notifications: NotificationConfig::default(),
            webhook_signature_checks: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OPS_HOST").ok().unwrap_or_else(|| DEFAULT_OPS_HOST.into());
        let port = env::var("OPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OPS_PORT. {e} Using the default, {DEFAULT_OPS_PORT}, instead."
                    );
                    DEFAULT_OPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OPS_PORT);
        let database_url = env::var("OPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ OPS_DATABASE_URL is not set. Please set it to the URL for the order store database.");
            String::default()
        });
        let gateway = GatewayConfig::new_from_env_or_default();
        let notifications = NotificationConfig::from_env_or_default();
        let webhook_signature_checks =
            parse_boolean_flag(env::var("OPS_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!(
                "🚨️ Webhook signature verification is DISABLED. Anyone can move your orders around. Do not run \
                 production like this. 🚨️"
            );
        }
        Self { host, port, database_url, gateway, notifications, webhook_signature_checks }
    }
}

//---------------------------------------- NotificationConfig --------------------------------------------------------
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// How many delivery attempts before a confirmation is parked in the dead-letter table.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent attempt.
    pub initial_backoff: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_NOTIFY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_NOTIFY_BACKOFF_MS),
        }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let max_attempts = env::var("OPS_NOTIFY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_NOTIFY_MAX_ATTEMPTS);
        let initial_backoff = env::var("OPS_NOTIFY_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_NOTIFY_BACKOFF_MS));
        Self { max_attempts, initial_backoff }
    }
}

//------------------------------------------- WebhookAuth ------------------------------------------------------------
/// The shared secret the webhook handler verifies notification signatures against. Kept separate
/// from [`GatewayConfig`] so the handler's app data carries exactly what it needs and nothing
/// more.
#[derive(Clone, Debug)]
pub struct WebhookAuth {
    pub server_key: Secret<String>,
    /// If false, the signature check always passes. Local development only.
    pub signature_checks: bool,
}

impl WebhookAuth {
    pub fn new(server_key: Secret<String>, signature_checks: bool) -> Self {
        Self { server_key, signature_checks }
    }
}
