//! Order Payment Engine
//!
//! The core of the storefront's order–payment reconciliation service. This library owns the order
//! and inventory records and keeps them consistent with the state of the remote payment gateway.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@sqlite`] and the contracts in [`mod@traits`]). SQLite is the supported
//!    backend; callers should go through the public API rather than the database modules, except
//!    for the data types in [`mod@db_types`], which are public.
//! 2. The reconciliation core ([`mod@reconciliation`]): the single mapping from gateway
//!    transaction states to local order state, applied under a per-order optimistic guard so the
//!    compensating stock restore and the paid notification each fire at most once no matter how
//!    many notification paths observe the same transition.
//! 3. The engine public API ([`mod@ope_api`]), which the server binds as application state.
//!
//! The engine also emits an [`events::OrderPaidEvent`] through a small hook system when an order
//! transitions into the paid state, so that confirmation dispatch stays decoupled from the
//! reconciliation transaction.

pub mod db_types;
pub mod events;
pub mod helpers;
mod ope_api;
pub mod reconciliation;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use ope_api::{order_objects, OrderFlowApi, OrderResult};
pub use traits::{OrderFlowDatabase, OrderFlowError, OrderManagement, TransitionOutcome};
