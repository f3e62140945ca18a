//! Nested subscriber tables plus the reverse-lookup index.

use std::collections::{BTreeMap, HashMap};

use crate::types::{ActorId, SubscriptionId};

use super::types::{Binding, CallbackRecord};

/// Callbacks for one event, keyed by subscription id. Ids are monotonic,
/// so iteration follows insertion order.
pub type EventTable = BTreeMap<SubscriptionId, CallbackRecord>;

/// All subscription state, mutated as one unit.
///
/// Invariant: a handle present in `index` always has a matching record
/// under `subscribers`, and vice versa.
#[derive(Default)]
pub struct Tables {
    /// publisher -> event name -> subscription id -> callback record.
    subscribers: HashMap<ActorId, HashMap<String, EventTable>>,

    /// subscription id -> (publisher, event, context).
    index: HashMap<SubscriptionId, Binding>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a callback under its binding, creating the publisher
    /// table and event entry as needed.
    pub fn insert(&mut self, id: SubscriptionId, binding: Binding, record: CallbackRecord) {
        self.subscribers
            .entry(binding.publisher)
            .or_default()
            .entry(binding.event.clone())
            .or_default()
            .insert(id, record);
        self.index.insert(id, binding);
    }

    /// Remove by handle. Unknown handles are a no-op.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<Binding> {
        let binding = self.index.remove(&id)?;
        if let Some(events) = self.subscribers.get_mut(&binding.publisher) {
            if let Some(table) = events.get_mut(&binding.event) {
                table.remove(&id);
            }
        }
        Some(binding)
    }

    /// Find the live subscription for `(publisher, event)` held by
    /// `context`, if any. At most one exists.
    pub fn find_by_context(
        &self,
        publisher: ActorId,
        event: &str,
        context: ActorId,
    ) -> Option<SubscriptionId> {
        let table = self.subscribers.get(&publisher)?.get(event)?;
        table
            .iter()
            .find(|(_, record)| record.context == Some(context))
            .map(|(id, _)| *id)
    }

    /// Snapshot the callbacks currently registered for `(publisher, event)`.
    pub fn snapshot(&self, publisher: ActorId, event: &str) -> Vec<CallbackRecord> {
        match self.subscribers.get(&publisher).and_then(|e| e.get(event)) {
            Some(table) => table.values().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Drop one event's callbacks for a publisher, returning the removed
    /// ids. Tears the publisher's table down entirely when this was its
    /// last event.
    pub fn remove_event(&mut self, publisher: ActorId, event: &str) -> Vec<SubscriptionId> {
        let Some(events) = self.subscribers.get_mut(&publisher) else {
            return Vec::new();
        };
        let removed: Vec<SubscriptionId> = match events.remove(event) {
            Some(table) => table.keys().copied().collect(),
            None => Vec::new(),
        };
        for id in &removed {
            self.index.remove(id);
        }
        if events.is_empty() {
            self.subscribers.remove(&publisher);
        }
        removed
    }

    /// Drop every event for a publisher, returning the removed ids.
    pub fn remove_publisher(&mut self, publisher: ActorId) -> Vec<SubscriptionId> {
        let Some(events) = self.subscribers.remove(&publisher) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for (_, table) in events {
            for id in table.keys() {
                self.index.remove(id);
                removed.push(*id);
            }
        }
        removed
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether any callback is registered for `(publisher, event)`.
    pub fn has_subscribers(&self, publisher: ActorId, event: &str) -> bool {
        self.subscribers
            .get(&publisher)
            .and_then(|events| events.get(event))
            .map(|table| !table.is_empty())
            .unwrap_or(false)
    }

    /// Walk both structures and check they agree. Test-only.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut seen = 0;
        for (publisher, events) in &self.subscribers {
            for (event, table) in events {
                for (id, record) in table {
                    let binding = self.index.get(id).expect("record without index entry");
                    assert_eq!(binding.publisher, *publisher);
                    assert_eq!(&binding.event, event);
                    assert_eq!(binding.context, record.context);
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, self.index.len(), "index entries without records");
    }
}
