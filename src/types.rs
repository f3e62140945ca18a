//! Core types for the pub/sub registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity token for a caller-side object.
///
/// Actors stand in for the objects on whose behalf events are published
/// and subscriptions are made. The registry mints them (see
/// [`Registry::actor`](crate::Registry::actor)); callers hold and
/// compare them by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle identifying a single subscription.
///
/// Handles are monotonically increasing per registry, starting at 0,
/// and never reused. A handle that is not currently registered is
/// simply absent: operations against it are no-ops.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single event delivery handed to a callback.
#[derive(Clone, Debug, Serialize)]
pub struct Delivery {
    /// Publisher the event was fired on.
    pub publisher: ActorId,

    /// Event name as passed to `publish`.
    pub event: String,

    /// Positional arguments, in publish order.
    pub args: Vec<serde_json::Value>,

    /// Subscriber identity captured at subscribe time, if any.
    ///
    /// Anonymous subscriptions see `None`. The value is fixed when the
    /// subscription is made, not when the callback runs.
    pub context: Option<ActorId>,
}

/// Callback invoked once per delivery, on the dispatch thread.
pub type Handler = Arc<dyn Fn(&Delivery) + Send + Sync>;
