use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize gateway client: {0}")]
    Initialization(String),
    #[error(
        "Gateway credentials are missing or still set to their placeholder value: {0}. Set OPS_GATEWAY_SERVER_KEY to \
         the server key issued for your merchant account."
    )]
    Configuration(String),
    #[error("Invalid charge request: {0}")]
    Validation(String),
    #[error(
        "The gateway rejected our credentials (HTTP 401). Check that OPS_GATEWAY_SERVER_KEY matches the environment \
         (sandbox keys do not work against production). {0}"
    )]
    AuthenticationFailed(String),
    #[error("The gateway rejected the request payload (HTTP 400). {0}")]
    RejectedPayload(String),
    #[error("The gateway is throttling this merchant account (HTTP 429). Back off before retrying. {0}")]
    RateLimited(String),
    #[error(
        "Timed out waiting for the gateway. The outcome of the call is unknown; query the transaction status before \
         assuming it failed. {0}"
    )]
    Timeout(String),
    #[error("Could not reach the gateway: {0}. The outcome of the call is unknown.")]
    Network(String),
    #[error("Ambiguous gateway failure. Error {status}. {message}")]
    Remote { status: u16, message: String },
    #[error("Could not deserialize the gateway response: {0}")]
    JsonError(String),
}

impl GatewayApiError {
    /// True for failures where the remote outcome is unknown. Callers must not mutate local order
    /// state in response to an ambiguous failure — only on a definitive success or a definitive,
    /// recognised error.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_) | Self::Remote { .. })
    }
}
