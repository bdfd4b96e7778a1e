//! # Order payment server
//!
//! The HTTP surface of the order–payment reconciliation service. It is responsible for:
//! * Listening for payment-status webhooks pushed by the gateway, verifying their signature and
//!   feeding them into the engine's shared reconciliation routine.
//! * The customer-facing checkout, status-check and cancellation endpoints, which feed the same
//!   routine from the pull side.
//! * Dispatching order confirmations through the notification worker, decoupled from the webhook
//!   response deadline with retry, backoff and a dead-letter table.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod integrations;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
