//! Subsystem activity watcher
//!
//! The runtime pushes a busy/idle signal for background subsystems (memory
//! index rebuilds, most notably). Going busy is display-only; settling back
//! to idle means memory statistics are probably stale, so the watcher
//! schedules one debounced stats refetch.
//!
//! Bursts of activity inside the delay window collapse into a single refetch
//! anchored to the most recent idle transition. The pending timer is
//! cancelable so teardown or a conversation switch never lets a late fire
//! write into a superseded scope; as a second guard, the fire itself is
//! epoch-checked.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::RuntimeClient;
use crate::feed::{EventFeed, Subscription};
use crate::resolver;
use crate::scope::{lock_state, SharedState};
use crate::types::FeedEvent;

pub(crate) struct ActivityWatcher {
    state: SharedState,
    client: Arc<dyn RuntimeClient>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityWatcher {
    pub(crate) fn new(state: SharedState, client: Arc<dyn RuntimeClient>, delay: Duration) -> Self {
        Self {
            state,
            client,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Subscribe to the feed's activity signal for the watcher's lifetime.
    ///
    /// Unlike the token subscription, this one is not conversation-scoped;
    /// token events on the feed are ignored here.
    pub(crate) fn attach(watcher: Arc<ActivityWatcher>, feed: &dyn EventFeed) -> Subscription {
        feed.subscribe(Box::new(move |event| {
            if let FeedEvent::Activity { active } = event {
                watcher.observe(active);
            }
        }))
    }

    /// Record an activity-signal update and react to the edge.
    ///
    /// Must run inside a tokio runtime (the refresh timer is a spawned task).
    pub(crate) fn observe(&self, active: bool) {
        let settled = {
            let mut state = lock_state(&self.state);
            let was_active = state.subsystem_active;
            state.subsystem_active = active;
            was_active && !active
        };

        if settled {
            tracing::debug!(delay = ?self.delay, "subsystem settled, scheduling stats refresh");
            self.schedule_refresh();
        }
    }

    /// Schedule one delayed stats refresh, replacing any pending one.
    ///
    /// The refresh is skipped at fire time when the scope has moved on or no
    /// agent is resolved.
    pub(crate) fn schedule_refresh(&self) {
        let scheduled_epoch = lock_state(&self.state).epoch;
        let state = Arc::clone(&self.state);
        let client = Arc::clone(&self.client);
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let agent_id = {
                let guard = lock_state(&state);
                if guard.epoch != scheduled_epoch {
                    return;
                }
                if !guard.agent.has_agent() {
                    tracing::debug!("skipping scheduled stats refresh: no resolved agent");
                    return;
                }
                guard.agent.agent_id.clone()
            };

            resolver::fetch_stats(&state, client.as_ref(), &agent_id, scheduled_epoch).await;
        });

        let mut pending = self.pending.lock().expect("pending timer lock poisoned");
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending refresh, if any.
    pub(crate) fn cancel_pending(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .expect("pending timer lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for ActivityWatcher {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
