//! Internal subscription records.

use crate::types::{ActorId, Handler};

/// A registered callback together with its captured execution context.
#[derive(Clone)]
pub struct CallbackRecord {
    /// Caller-supplied function.
    pub handler: Handler,

    /// Subscriber identity captured at subscribe time. `None` for
    /// anonymous subscriptions, which stack instead of replacing.
    pub context: Option<ActorId>,
}

/// Reverse-lookup entry: where a subscription handle points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub publisher: ActorId,
    pub event: String,
    pub context: Option<ActorId>,
}
