//! Event routing from the push feed into scope state
//!
//! The router is the primary writer during live operation: it binds one
//! conversation id, discards token events that belong to any other
//! conversation, and appends matching tokens to the channel store. Activity
//! signals are not conversation-scoped and are handled by the activity
//! watcher's own subscription, so the router ignores them.

use std::sync::Arc;

use chrono::Utc;

use crate::feed::{EventFeed, Subscription};
use crate::scope::{lock_state, SharedState};
use crate::types::{ChannelKind, FeedEvent, TokenEvent};

pub(crate) struct EventRouter {
    state: SharedState,
}

impl EventRouter {
    pub(crate) fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Bind to `conversation_id` and attach to the feed.
    ///
    /// The caller owns the returned handle and must revoke it before
    /// subscribing again; the scope enforces teardown-before-resubscribe.
    pub(crate) fn subscribe(&self, feed: &dyn EventFeed, conversation_id: &str) -> Subscription {
        let state = Arc::clone(&self.state);
        let bound_id = conversation_id.to_string();

        feed.subscribe(Box::new(move |event| {
            if let FeedEvent::Token(token) = event {
                apply_token(&state, &bound_id, token);
            }
        }))
    }
}

/// Apply one token event, or discard it without side effects.
fn apply_token(state: &SharedState, bound_id: &str, token: TokenEvent) {
    if token.conversation_id != bound_id {
        tracing::trace!(
            event_conversation = %token.conversation_id,
            bound_conversation = %bound_id,
            "discarding token for other conversation"
        );
        return;
    }

    let Ok(channel) = token.channel.parse::<ChannelKind>() else {
        tracing::debug!(channel = %token.channel, "discarding token for unknown channel");
        return;
    };

    let mut guard = lock_state(state);
    // The subscription is revoked synchronously on a switch, but a feed may
    // still be draining its queue; never write into a scope that moved on.
    if guard.conversation_id.as_deref() != Some(bound_id) {
        return;
    }

    guard.channels.append(channel, &token.token);

    // Best-effort agent correlation; the resolver stays authoritative.
    if let Some(agent_id) = token.agent_id {
        if guard.agent.agent_id != agent_id {
            guard.agent.agent_id = agent_id;
            guard.agent.last_activity = Some(Utc::now());
        }
    }
}
