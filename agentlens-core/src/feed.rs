//! Push-feed abstraction
//!
//! The aggregator consumes token and activity events from an abstract push
//! feed rather than a concrete transport. A transport adapter (websocket,
//! UDS, test harness) implements [`EventFeed`] and delivers events to every
//! registered handler; [`FeedBus`] is the in-process implementation those
//! adapters push into.
//!
//! Subscriptions are single-owner cancellation handles: cancellation is
//! synchronous, and dropping the handle cancels too, so a scope can never
//! leak a second live subscription by re-subscribing without teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::types::FeedEvent;

/// Callback invoked for each delivered event.
pub type FeedHandler = Box<dyn Fn(FeedEvent) + Send + Sync>;

/// A source of [`FeedEvent`]s.
pub trait EventFeed: Send + Sync {
    /// Register a handler. Events are delivered until the returned
    /// [`Subscription`] is cancelled or dropped.
    fn subscribe(&self, handler: FeedHandler) -> Subscription;
}

/// Single-owner handle to an active feed subscription.
///
/// Cancellation is synchronous: once [`Subscription::cancel`] returns (or the
/// handle is dropped), the handler will not be invoked again.
pub struct Subscription {
    revoke: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a revocation closure provided by a feed implementation.
    pub fn new(revoke: impl FnOnce() + Send + 'static) -> Self {
        Self {
            revoke: Some(Box::new(revoke)),
        }
    }

    /// Revoke the subscription now.
    pub fn cancel(mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(revoke) = self.revoke.take() {
            revoke();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.revoke.is_some())
            .finish()
    }
}

/// In-process fan-out feed.
///
/// Transport adapters push decoded events into the bus with [`FeedBus::emit`];
/// the bus delivers each event to every live handler in registration order.
#[derive(Clone, Default)]
pub struct FeedBus {
    handlers: Arc<Mutex<HashMap<u64, Arc<FeedHandler>>>>,
    next_id: Arc<AtomicU64>,
}

impl FeedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to all live subscribers.
    pub fn emit(&self, event: FeedEvent) {
        // Snapshot the handlers so a handler may subscribe/cancel re-entrantly
        // without deadlocking the registry.
        let handlers: Vec<Arc<FeedHandler>> = {
            let registry = self.handlers.lock().expect("feed registry poisoned");
            let mut entries: Vec<(u64, Arc<FeedHandler>)> =
                registry.iter().map(|(id, h)| (*id, Arc::clone(h))).collect();
            entries.sort_by_key(|(id, _)| *id);
            entries.into_iter().map(|(_, h)| h).collect()
        };

        for handler in handlers {
            (handler.as_ref())(event.clone());
        }
    }

    /// Number of live subscriptions (diagnostics only).
    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().expect("feed registry poisoned").len()
    }
}

impl EventFeed for FeedBus {
    fn subscribe(&self, handler: FeedHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("feed registry poisoned")
            .insert(id, Arc::new(handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(move || {
            handlers.lock().expect("feed registry poisoned").remove(&id);
        })
    }
}
