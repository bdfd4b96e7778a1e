//! The engine's public API.
//!
//! Backends implement the [`traits`](crate::traits) contracts; these APIs add the flow logic on
//! top (event publication, the shared reconciliation entry point) and are what the server binds
//! as application state.

pub mod order_flow_api;
pub mod order_objects;

pub use order_flow_api::OrderFlowApi;
pub use order_objects::OrderResult;
