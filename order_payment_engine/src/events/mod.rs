//! Event hooks for order lifecycle notifications.
//!
//! The engine emits an [`OrderPaidEvent`] when reconciliation moves an order into the paid state.
//! Subscribers (the confirmation-notification dispatcher, in practice) register async handlers via
//! [`EventHooks`]; publication is fire-and-forget so a slow or failing subscriber can never delay
//! or roll back the reconciliation that produced the event.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::OrderPaidEvent;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
