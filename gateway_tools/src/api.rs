use std::sync::Arc;

use log::*;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{ChargeRequest, ChargeResponse, TransactionStatusResponse},
    GatewayApiError,
};

/// The calls the reconciliation service makes against the payment gateway.
///
/// [`GatewayApi`] is the production implementation; tests substitute their own so that request
/// construction and response handling can be asserted without network access.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a remote transaction for the charge and returns the payment token and redirect
    /// URL. Not idempotent: callers must check for an existing stored token first.
    async fn create_transaction(&self, charge: &ChargeRequest) -> Result<ChargeResponse, GatewayApiError>;

    /// Queries the current transaction status. `Ok(None)` means the gateway has no record of the
    /// order — common for transactions that expired or were never finalised, and not an error.
    async fn get_transaction_status(
        &self,
        order_id: &str,
    ) -> Result<Option<TransactionStatusResponse>, GatewayApiError>;

    /// Asks the gateway to cancel the transaction. Safe to retry; a transaction the gateway no
    /// longer knows about counts as cancelled.
    async fn cancel_transaction(&self, order_id: &str) -> Result<(), GatewayApiError>;
}

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Sends one authenticated request and maps the response. `Ok(None)` is a 404; recognised
    /// client errors become their specific variants; everything else is ambiguous.
    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, GatewayApiError> {
        self.config.validate()?;
        let url = self.url(path);
        trace!("💳️ Gateway request: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(self.config.server_key.reveal(), Some(""))
            .header("Accept", "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayApiError::Timeout(e.to_string())
            } else {
                GatewayApiError::Network(e.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            trace!("💳️ Gateway call successful: {status}");
            let parsed = response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))?;
            return Ok(Some(parsed));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let message = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => GatewayApiError::AuthenticationFailed(message),
            400 => GatewayApiError::RejectedPayload(message),
            429 => GatewayApiError::RateLimited(message),
            s => GatewayApiError::Remote { status: s, message },
        })
    }
}

impl PaymentGateway for GatewayApi {
    async fn create_transaction(&self, charge: &ChargeRequest) -> Result<ChargeResponse, GatewayApiError> {
        let order_id = &charge.transaction_details.order_id;
        debug!("💳️ Creating gateway transaction for order {order_id}");
        let response: ChargeResponse = self
            .send(Method::POST, "/snap/v1/transactions", Some(charge))
            .await?
            .ok_or_else(|| GatewayApiError::Remote {
                status: 404,
                message: format!("transaction-creation endpoint not found for order {order_id}"),
            })?;
        info!("💳️ Gateway transaction created for order {order_id}");
        Ok(response)
    }

    async fn get_transaction_status(
        &self,
        order_id: &str,
    ) -> Result<Option<TransactionStatusResponse>, GatewayApiError> {
        debug!("💳️ Querying gateway status for order {order_id}");
        let result =
            self.send::<TransactionStatusResponse, ()>(Method::GET, &format!("/v2/{order_id}/status"), None).await?;
        if result.is_none() {
            debug!("💳️ Gateway has no transaction for order {order_id}");
        }
        Ok(result)
    }

    async fn cancel_transaction(&self, order_id: &str) -> Result<(), GatewayApiError> {
        debug!("💳️ Requesting gateway cancel for order {order_id}");
        let result = self
            .send::<serde_json::Value, ()>(Method::POST, &format!("/v2/{order_id}/cancel"), None)
            .await?;
        if result.is_none() {
            // Nothing to cancel remotely; the local cancellation proceeds regardless.
            info!("💳️ Gateway has no transaction for order {order_id}; treating the cancel as a no-op");
        } else {
            info!("💳️ Gateway transaction for order {order_id} cancelled");
        }
        Ok(())
    }
}
