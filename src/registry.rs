//! Main Registry struct tying storage and dispatch together.

use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::dispatch::{Dispatcher, Invocation};
use crate::error::{RegistryError, Result};
use crate::subscriptions::{Binding, CallbackRecord, Tables};
use crate::types::{ActorId, Delivery, Handler, SubscriptionId};

/// In-process publish/subscribe registry.
///
/// Provides a unified interface for:
/// - Minting identity tokens for publishers and subscribers
/// - Subscribing callbacks to named events on a publisher
/// - Publishing events with positional arguments, delivered off-thread
/// - Unsubscribing by handle or by identity
/// - Republishing (forwarding) events between publishers
/// - Bulk cancellation of a publisher's subscriptions
///
/// Cloning is cheap; clones share the same state. All methods take
/// `&self` and are safe to call from any thread.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    /// Subscriber tables plus the reverse-lookup index. One lock, so
    /// the two sides always change together.
    tables: RwLock<Tables>,

    /// Next subscription handle. Monotonic, never reused.
    next_subscription: AtomicU64,

    /// Next actor token.
    next_actor: AtomicU64,

    /// Deferred-execution worker.
    dispatcher: Dispatcher,
}

impl RegistryInner {
    /// Fan an event out to everything currently subscribed.
    ///
    /// The callback list is snapshotted here: a subscription removed
    /// after this point still receives the deliveries already queued.
    fn publish(&self, publisher: ActorId, event: &str, args: Vec<Value>) {
        let records = self.tables.read().snapshot(publisher, event);
        if records.is_empty() {
            tracing::trace!(%publisher, event, "publish with no subscribers");
            return;
        }

        tracing::trace!(%publisher, event, count = records.len(), "publishing");
        for record in records {
            let delivery = Delivery {
                publisher,
                event: event.to_string(),
                args: args.clone(),
                context: record.context,
            };
            self.dispatcher.dispatch(Invocation {
                handler: record.handler,
                delivery,
            });
        }
    }

    fn subscribe(
        &self,
        publisher: ActorId,
        event: &str,
        context: Option<ActorId>,
        handler: Handler,
    ) -> SubscriptionId {
        let mut tables = self.tables.write();

        // One live subscription per (publisher, event, identity):
        // a fresh identity-bound subscribe replaces, never stacks.
        if let Some(context) = context {
            if let Some(existing) = tables.find_by_context(publisher, event, context) {
                tables.remove(existing);
                tracing::debug!(%publisher, event, %context, replaced = %existing, "subscription replaced");
            }
        }

        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        tables.insert(
            id,
            Binding {
                publisher,
                event: event.to_string(),
                context,
            },
            CallbackRecord { handler, context },
        );
        tracing::debug!(%publisher, event, subscription = %id, "subscribed");
        id
    }
}

impl Registry {
    /// Create an empty registry with its own dispatch thread.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                tables: RwLock::new(Tables::new()),
                next_subscription: AtomicU64::new(0),
                next_actor: AtomicU64::new(0),
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    /// Mint a fresh identity token.
    ///
    /// Callers hold one per object that publishes or subscribes.
    pub fn actor(&self) -> ActorId {
        ActorId(self.inner.next_actor.fetch_add(1, Ordering::SeqCst))
    }

    /// Register `handler` to run whenever `event` fires on `publisher`.
    ///
    /// `context` is the subscriber identity. With `Some(identity)`, any
    /// existing subscription by that identity to the same
    /// `(publisher, event)` is replaced; with `None` the subscription is
    /// anonymous and stacks freely. The captured context is handed back
    /// on every [`Delivery`].
    ///
    /// Returns the subscription handle for later [`unsubscribe`].
    ///
    /// [`unsubscribe`]: Registry::unsubscribe
    pub fn subscribe<F>(
        &self,
        publisher: ActorId,
        event: &str,
        context: Option<ActorId>,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(&Delivery) + Send + Sync + 'static,
    {
        self.inner.subscribe(publisher, event, context, Arc::new(handler))
    }

    /// Publish `event` on `publisher` with positional `args`.
    ///
    /// Every currently-subscribed callback is scheduled for invocation
    /// on the dispatch thread; none runs before this call returns.
    /// Publishing with no subscribers (or no subscriber table at all)
    /// is a silent no-op.
    pub fn publish(&self, publisher: ActorId, event: &str, args: Vec<Value>) {
        self.inner.publish(publisher, event, args);
    }

    /// Remove a subscription by handle. Unknown handles are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(binding) = self.inner.tables.write().remove(id) {
            tracing::debug!(
                publisher = %binding.publisher,
                event = %binding.event,
                subscription = %id,
                "unsubscribed"
            );
        }
    }

    /// Remove `identity`'s subscription to `(publisher, event)`.
    ///
    /// No-op when the publisher has no table, the event was never
    /// subscribed to, or the identity holds no subscription there.
    pub fn unsubscribe_from(&self, publisher: ActorId, event: &str, identity: ActorId) {
        let mut tables = self.inner.tables.write();
        if let Some(id) = tables.find_by_context(publisher, event, identity) {
            tables.remove(id);
            tracing::debug!(%publisher, event, %identity, subscription = %id, "unsubscribed");
        }
    }

    /// Forward `event` from `publisher` to `republisher`'s own
    /// subscribers under the same name.
    ///
    /// Implemented as a subscription held by `republisher`, so it obeys
    /// the replace rule: republishing the same `(publisher, event)`
    /// twice swaps the forwarder instead of stacking a second one.
    /// Arguments pass through positionally.
    pub fn republish(
        &self,
        republisher: ActorId,
        publisher: ActorId,
        event: &str,
    ) -> SubscriptionId {
        let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        let name = event.to_string();
        let forward: Handler = Arc::new(move |delivery: &Delivery| {
            if let Some(inner) = weak.upgrade() {
                inner.publish(republisher, &name, delivery.args.clone());
            }
        });
        self.inner.subscribe(publisher, event, Some(republisher), forward)
    }

    /// Bulk-remove subscriptions held on `publisher`.
    ///
    /// With `None`, every event's callbacks go and the publisher is left
    /// with no subscriber table. With `Some(event)`, only that event's
    /// callbacks go; the table itself is torn down only when that was
    /// the last remaining event. A publisher with no table is a no-op.
    pub fn cancel_subscriptions(&self, publisher: ActorId, event: Option<&str>) {
        let removed = {
            let mut tables = self.inner.tables.write();
            match event {
                Some(event) => tables.remove_event(publisher, event),
                None => tables.remove_publisher(publisher),
            }
        };
        if !removed.is_empty() {
            tracing::debug!(%publisher, event = event.unwrap_or("*"), count = removed.len(), "subscriptions cancelled");
        }
    }

    /// Number of live subscriptions across all publishers.
    pub fn subscription_count(&self) -> usize {
        self.inner.tables.read().len()
    }

    /// Whether any callback is registered for `(publisher, event)`.
    pub fn has_subscribers(&self, publisher: ActorId, event: &str) -> bool {
        self.inner.tables.read().has_subscribers(publisher, event)
    }

    /// Block until every delivery scheduled so far has run, including
    /// deliveries scheduled by the callbacks themselves (republish
    /// chains). A cycle of forwarders that keeps producing new
    /// deliveries keeps this waiting.
    pub fn settle(&self) {
        loop {
            let before = self.inner.dispatcher.executed();
            if self.inner.dispatcher.barrier(None).is_err() {
                return;
            }
            if self.inner.dispatcher.executed() == before {
                return;
            }
        }
    }

    /// Like [`settle`](Registry::settle), with a deadline.
    pub fn settle_timeout(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let before = self.inner.dispatcher.executed();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RegistryError::SettleTimeout { timeout });
            }
            self.inner
                .dispatcher
                .barrier(Some(remaining))
                .map_err(|e| match e {
                    RegistryError::SettleTimeout { .. } => {
                        RegistryError::SettleTimeout { timeout }
                    }
                    other => other,
                })?;
            if self.inner.dispatcher.executed() == before {
                return Ok(());
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
