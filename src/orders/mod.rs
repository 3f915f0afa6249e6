//! Order lifecycle: the status transition table and the engine that applies it

pub mod engine;
pub mod lifecycle;

pub use engine::{CompletionRequest, Invoicing, OrderLifecycleEngine};
pub use lifecycle::OrderEvent;
pub use crate::tasks::InvoiceSettings;
