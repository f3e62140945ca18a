//! # Herald
//!
//! An identity-aware, in-process publish/subscribe registry with
//! deferred fan-out delivery.
//!
//! ## Core Concepts
//!
//! - **Actors**: lightweight identity tokens standing in for the
//!   objects that publish and subscribe
//! - **Events**: named, carrying an arbitrary positional argument list
//! - **Subscriptions**: integer handles, monotonic and never reused;
//!   at most one live subscription per (publisher, event, identity)
//! - **Deferred delivery**: callbacks never run inside `publish` — they
//!   run on a dispatch thread after the publishing call has returned
//!
//! ## Example
//!
//! ```
//! use herald::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! let sensor = registry.actor();
//!
//! registry.subscribe(sensor, "reading", None, |delivery| {
//!     println!("reading: {:?}", delivery.args);
//! });
//!
//! registry.publish(sensor, "reading", vec![json!(21.5)]);
//! registry.settle();
//! ```

mod dispatch;
pub mod error;
pub mod registry;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{RegistryError, Result};
pub use registry::Registry;
pub use subscriptions::{Binding, CallbackRecord, Tables};
pub use types::{ActorId, Delivery, Handler, SubscriptionId};
