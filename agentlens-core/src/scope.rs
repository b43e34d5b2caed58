//! Conversation scope
//!
//! A [`ConversationScope`] is the lifetime unit binding the debug channels,
//! agent info, memory stats, and the single live token subscription to one
//! active conversation. (The subsystem activity signal is not
//! conversation-scoped; the scope observes it for its whole lifetime.)
//! Display adapters hold a reference to the scope, read
//! [`ConversationScope::snapshot`], and invoke its action entry points; they
//! never touch the underlying state directly.
//!
//! ## Scope epochs
//!
//! Every `select` bumps a monotonically increasing epoch. Asynchronous work
//! (agent resolution, stats fetches, fallback refreshes, the debounce timer)
//! captures the epoch it was started for and commits through
//! [`commit_if_current`], so a completion that lands after the scope moved on
//! is dropped instead of corrupting the new scope's state.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::activity::ActivityWatcher;
use crate::client::RuntimeClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{EventFeed, Subscription};
use crate::resolver::{self, AgentInfoResolver};
use crate::stream::{ChannelStore, EventRouter, LogFallbackFetcher};
use crate::trace::TraceMonitor;
use crate::types::{AgentInfo, CognitiveTrace, MemoryStats};

/// Mutable state owned by one conversation scope.
///
/// Mutations happen as reactions to discrete events (feed token, fetch
/// completion, timer fire); each handler locks, commits, and releases, so a
/// handler's effect is atomic with respect to every other handler.
#[derive(Debug)]
pub(crate) struct ScopeState {
    /// Bumped on every `select`; guards stale async completions
    pub(crate) epoch: u64,
    pub(crate) conversation_id: Option<String>,
    pub(crate) channels: ChannelStore,
    pub(crate) agent: AgentInfo,
    pub(crate) stats: MemoryStats,
    pub(crate) subsystem_active: bool,
    pub(crate) trace: TraceMonitor,
}

impl ScopeState {
    fn new() -> Self {
        Self {
            epoch: 0,
            conversation_id: None,
            channels: ChannelStore::new(),
            agent: AgentInfo::detached(),
            stats: MemoryStats::default(),
            subsystem_active: false,
            trace: TraceMonitor::new(),
        }
    }
}

pub(crate) type SharedState = Arc<Mutex<ScopeState>>;

pub(crate) fn lock_state(state: &SharedState) -> MutexGuard<'_, ScopeState> {
    state.lock().expect("scope state lock poisoned")
}

/// Apply `mutate` only if the scope is still at `epoch`.
///
/// Returns whether the mutation was applied. This is the only way async
/// completions are allowed to write scope state.
pub(crate) fn commit_if_current<F>(state: &SharedState, epoch: u64, mutate: F) -> bool
where
    F: FnOnce(&mut ScopeState),
{
    let mut guard = lock_state(state);
    if guard.epoch != epoch {
        return false;
    }
    mutate(&mut guard);
    true
}

/// Read-only view of a scope for the display layer.
#[derive(Debug, Clone)]
pub struct ScopeSnapshot {
    pub conversation_id: Option<String>,
    pub channels: ChannelStore,
    pub agent: AgentInfo,
    pub stats: MemoryStats,
    pub subsystem_active: bool,
    pub trace: Option<CognitiveTrace>,
}

/// Owner of all per-conversation observability state.
pub struct ConversationScope {
    state: SharedState,
    feed: Arc<dyn EventFeed>,
    client: Arc<dyn RuntimeClient>,
    router: EventRouter,
    resolver: AgentInfoResolver,
    fallback: LogFallbackFetcher,
    watcher: Arc<ActivityWatcher>,
    /// The single live token subscription, if a conversation is selected
    subscription: Mutex<Option<Subscription>>,
    /// Lifetime subscription feeding the activity watcher
    activity_subscription: Mutex<Option<Subscription>>,
    log_window: usize,
}

impl ConversationScope {
    pub fn new(feed: Arc<dyn EventFeed>, client: Arc<dyn RuntimeClient>, config: &Config) -> Self {
        let state: SharedState = Arc::new(Mutex::new(ScopeState::new()));
        let watcher = Arc::new(ActivityWatcher::new(
            Arc::clone(&state),
            Arc::clone(&client),
            config.stats.debounce(),
        ));
        // The activity signal is observed for the scope's whole lifetime;
        // only the token subscription is conversation-bound.
        let activity_subscription =
            ActivityWatcher::attach(Arc::clone(&watcher), feed.as_ref());

        Self {
            router: EventRouter::new(Arc::clone(&state)),
            resolver: AgentInfoResolver::new(Arc::clone(&state), Arc::clone(&client)),
            fallback: LogFallbackFetcher::new(Arc::clone(&state), Arc::clone(&client)),
            state,
            feed,
            client,
            watcher,
            subscription: Mutex::new(None),
            activity_subscription: Mutex::new(Some(activity_subscription)),
            log_window: config.streams.log_window,
        }
    }

    /// Switch to `conversation_id`, or detach with `None`.
    ///
    /// Teardown of the previous scope (subscription revoked, pending refresh
    /// cancelled, channels cleared) completes before the new subscription
    /// exists, so no event from the old conversation can land afterwards.
    /// Resolution for the new conversation then runs to completion; if a
    /// later `select` supersedes it mid-flight, its commits are dropped.
    pub async fn select(&self, conversation_id: Option<&str>) {
        let (id, epoch) = {
            let mut slot = self
                .subscription
                .lock()
                .expect("subscription slot poisoned");
            if let Some(old) = slot.take() {
                old.cancel();
            }
            self.watcher.cancel_pending();

            let epoch = {
                let mut state = lock_state(&self.state);
                state.epoch += 1;
                state.conversation_id = conversation_id.map(str::to_string);
                state.channels.reset();
                state.agent = match conversation_id {
                    Some(_) => AgentInfo::resolving(),
                    None => AgentInfo::detached(),
                };
                state.stats = MemoryStats::default();
                state.epoch
            };

            let Some(id) = conversation_id else {
                tracing::debug!("scope detached");
                return;
            };

            tracing::info!(conversation_id = %id, epoch, "conversation selected");
            *slot = Some(self.router.subscribe(self.feed.as_ref(), id));
            (id, epoch)
        };

        self.resolver.resolve(id, epoch).await;
    }

    /// Manual debug-stream refresh from server logs.
    ///
    /// Overwrites channel content from the classified log window; a transport
    /// failure is returned to the caller and leaves existing content
    /// untouched.
    pub async fn refresh_streams(&self) -> Result<()> {
        self.fallback.refresh(self.log_window).await
    }

    /// Fetch up to `lines` recent server log lines, unclassified.
    pub async fn fetch_server_logs(&self, lines: usize) -> Result<Vec<String>> {
        self.client.get_server_logs(lines).await
    }

    /// One-shot memory-stats refetch for the resolved agent.
    ///
    /// Failures are recorded on the stats snapshot, not returned.
    pub async fn refresh_stats(&self) {
        let (agent, epoch) = {
            let state = lock_state(&self.state);
            (state.agent.clone(), state.epoch)
        };
        if !agent.has_agent() {
            tracing::debug!("stats refresh skipped: no resolved agent");
            return;
        }
        resolver::fetch_stats(&self.state, self.client.as_ref(), &agent.agent_id, epoch).await;
    }

    /// User-initiated memory initialization.
    ///
    /// One-shot: initialize, refetch the agent record once, refetch stats on
    /// success. When no agent id is known (a failed resolution), this re-runs
    /// the full resolution instead, which self-heals along the same path.
    pub async fn initialize_memory(&self) {
        let (conversation_id, agent, epoch) = {
            let state = lock_state(&self.state);
            (state.conversation_id.clone(), state.agent.clone(), state.epoch)
        };
        let Some(conversation_id) = conversation_id else {
            tracing::debug!("initialize skipped: no conversation selected");
            return;
        };

        if agent.has_agent() {
            self.resolver
                .initialize_and_refetch(&agent.agent_id, None, epoch)
                .await;
        } else {
            self.resolver.resolve(&conversation_id, epoch).await;
        }
    }

    /// Fire-and-forget memory index rebuild, with a delayed stats refetch.
    pub async fn rebuild_index(&self) -> Result<()> {
        let agent = lock_state(&self.state).agent.clone();
        if !agent.has_agent() {
            return Err(Error::Lookup(
                "no resolved agent to rebuild the index for".to_string(),
            ));
        }

        self.client.rebuild_memory_index(&agent.agent_id).await?;
        tracing::info!(agent_id = %agent.agent_id, "index rebuild requested");
        self.watcher.schedule_refresh();
        Ok(())
    }

    /// Record a cognitive-trace update.
    pub fn apply_trace(&self, trace: CognitiveTrace) {
        lock_state(&self.state).trace.apply(trace);
    }

    /// Read-only snapshot for the display layer.
    pub fn snapshot(&self) -> ScopeSnapshot {
        let state = lock_state(&self.state);
        ScopeSnapshot {
            conversation_id: state.conversation_id.clone(),
            channels: state.channels.clone(),
            agent: state.agent.clone(),
            stats: state.stats.clone(),
            subsystem_active: state.subsystem_active,
            trace: state.trace.latest().cloned(),
        }
    }

    /// Revoke both feed subscriptions and cancel pending timers.
    ///
    /// Idempotent; also runs on drop.
    pub fn teardown(&self) {
        if let Some(sub) = self
            .subscription
            .lock()
            .expect("subscription slot poisoned")
            .take()
        {
            sub.cancel();
        }
        if let Some(sub) = self
            .activity_subscription
            .lock()
            .expect("subscription slot poisoned")
            .take()
        {
            sub.cancel();
        }
        self.watcher.cancel_pending();
    }
}

impl Drop for ConversationScope {
    fn drop(&mut self) {
        self.teardown();
    }
}
