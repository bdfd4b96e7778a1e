//! Client for the external payment gateway.
//!
//! Covers the three calls the reconciliation service makes — transaction creation, status query
//! and cancellation — plus the pure logic around them: itemised charge construction with exact
//! amount reconciliation, and the webhook signature formula.
//!
//! The client is an explicit value constructed from [`GatewayConfig`]; nothing in this crate
//! reads global state, so tests can substitute any [`PaymentGateway`] implementation and assert
//! on the requests it receives.

mod api;
mod config;
pub mod data_objects;
mod error;
pub mod helpers;

pub use api::{GatewayApi, PaymentGateway};
pub use config::GatewayConfig;
pub use data_objects::{ChargeLineItem, ChargeRequest, ChargeResponse, CustomerDetails, TransactionStatusResponse};
pub use error::GatewayApiError;
