//! Fan-out and isolation behavior as subscription counts grow.

use herald::Registry;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn registry() -> Registry {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Registry::new()
}

#[test]
fn test_wide_fanout_delivers_to_every_subscriber() {
    let registry = registry();
    let publisher = registry.actor();

    let counters: Vec<Arc<AtomicUsize>> = (0..100)
        .map(|_| {
            let count = Arc::new(AtomicUsize::new(0));
            let seen = Arc::clone(&count);
            registry.subscribe(publisher, "tick", None, move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
            count
        })
        .collect();

    registry.publish(publisher, "tick", vec![]);
    registry.settle();

    for count in &counters {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn test_events_are_isolated() {
    let registry = registry();
    let publisher = registry.actor();

    let counters: Vec<Arc<AtomicUsize>> = (0..20)
        .map(|i| {
            let count = Arc::new(AtomicUsize::new(0));
            let seen = Arc::clone(&count);
            registry.subscribe(publisher, &format!("event-{i}"), None, move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });
            count
        })
        .collect();

    for i in (0..20).step_by(2) {
        registry.publish(publisher, &format!("event-{i}"), vec![]);
    }
    registry.settle();

    for (i, count) in counters.iter().enumerate() {
        let expected = usize::from(i % 2 == 0);
        assert_eq!(count.load(Ordering::SeqCst), expected, "event-{i}");
    }
}

#[test]
fn test_publishers_are_isolated() {
    let registry = registry();

    let publishers: Vec<_> = (0..50).map(|_| registry.actor()).collect();
    let total = Arc::new(AtomicUsize::new(0));
    for &publisher in &publishers {
        let seen = Arc::clone(&total);
        registry.subscribe(publisher, "tick", None, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
    }

    // Tearing one publisher down leaves the other 49 untouched.
    registry.cancel_subscriptions(publishers[7], None);
    assert_eq!(registry.subscription_count(), 49);

    for &publisher in &publishers {
        registry.publish(publisher, "tick", vec![]);
    }
    registry.settle();

    assert_eq!(total.load(Ordering::SeqCst), 49);
}

#[test]
fn test_handle_uniqueness_at_scale() {
    let registry = registry();
    let publisher = registry.actor();

    let mut previous = None;
    let mut handles = HashSet::new();
    for i in 0..1000 {
        let id = registry.subscribe(publisher, &format!("event-{}", i % 10), None, |_| {});
        assert!(handles.insert(id), "handle reused: {id:?}");
        if let Some(previous) = previous {
            assert!(id > previous);
        }
        previous = Some(id);
    }

    assert_eq!(registry.subscription_count(), 1000);
}

#[test]
fn test_repeated_identity_churn_keeps_one_live() {
    let registry = registry();
    let publisher = registry.actor();
    let subscriber = registry.actor();

    let last = Arc::new(AtomicUsize::new(usize::MAX));
    for i in 0..100 {
        let seen = Arc::clone(&last);
        registry.subscribe(publisher, "tick", Some(subscriber), move |_| {
            seen.store(i, Ordering::SeqCst);
        });
    }

    assert_eq!(registry.subscription_count(), 1);

    registry.publish(publisher, "tick", vec![]);
    registry.settle();

    // Only the most recent resubscription fires.
    assert_eq!(last.load(Ordering::SeqCst), 99);
}
