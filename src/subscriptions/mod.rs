//! Subscription storage: per-publisher tables and the reverse index.
//!
//! All subscription state lives here, in an external side-table owned
//! by the registry — publishers are never mutated. Two structures are
//! kept in lockstep:
//! - publisher -> event name -> subscription id -> callback record
//! - subscription id -> (publisher, event, context)
//!
//! The second is the fast path for handle-based unsubscribe; every
//! mutation updates both sides together.

mod tables;
mod types;

pub use tables::Tables;
pub use types::{Binding, CallbackRecord};
