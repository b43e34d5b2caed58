//! Agent-info resolution
//!
//! Resolves conversation → agent identity → agent metadata as an explicit
//! state machine:
//!
//! ```text
//! Resolving ──(no agent on record)──► Unassigned
//!     │ │
//!     │ └────(conversation fetch fails)──► Failed
//!     ▼
//! agent fetch ──ok──► Resolved ──► stats fetch
//!     │
//!     └─fail─► Initializing ──initialize ok──► refetch ──ok──► Resolved
//!                   │                             └─fail─► Failed
//!                   └─(rejected or fails)──► Failed
//! ```
//!
//! The initialize→refetch detour runs at most once per attempt; any further
//! retry is user-initiated. Every commit is epoch-guarded, so a resolution
//! finishing after the conversation switched is dropped silently.

use std::sync::Arc;

use crate::client::RuntimeClient;
use crate::scope::{commit_if_current, SharedState};
use crate::types::{AgentInfo, ResolutionPhase};

pub(crate) struct AgentInfoResolver {
    state: SharedState,
    client: Arc<dyn RuntimeClient>,
}

impl AgentInfoResolver {
    pub(crate) fn new(state: SharedState, client: Arc<dyn RuntimeClient>) -> Self {
        Self { state, client }
    }

    /// Run one full resolution for `conversation_id` under `epoch`.
    pub(crate) async fn resolve(&self, conversation_id: &str, epoch: u64) {
        if !self.commit(epoch, |agent| *agent = AgentInfo::resolving()) {
            return;
        }

        let conversation = match self.client.get_conversation(conversation_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(conversation_id, error = %e, "conversation fetch failed");
                self.commit(epoch, |agent| {
                    agent.agent_id = "error".to_string();
                    agent.loading = false;
                    agent.error = format!("conversation lookup failed: {}", e);
                    agent.phase = ResolutionPhase::Failed;
                });
                return;
            }
        };

        let Some(agent_id) = conversation.agent_id else {
            tracing::info!(conversation_id, "conversation has no agent assigned");
            self.commit(epoch, |agent| {
                agent.agent_id = "unknown".to_string();
                agent.loading = false;
                agent.error = "no agent assigned to this conversation".to_string();
                agent.phase = ResolutionPhase::Unassigned;
            });
            return;
        };

        match self.client.get_agent(&agent_id).await {
            Ok(record) => self.finish_resolved(&agent_id, record.name, epoch).await,
            Err(fetch_error) => {
                // Self-heal: the agent record may simply not have its memory
                // initialized yet. One initialize + one refetch, nothing more.
                tracing::info!(
                    agent_id = %agent_id,
                    error = %fetch_error,
                    "agent fetch failed, attempting memory initialization"
                );
                self.initialize_and_refetch(&agent_id, Some(&fetch_error.to_string()), epoch)
                    .await;
            }
        }
    }

    /// Initialize the agent's memory and refetch its record once.
    ///
    /// `original_error` is the fetch failure that triggered the self-heal,
    /// embedded in the failure message; `None` for the user-initiated action.
    pub(crate) async fn initialize_and_refetch(
        &self,
        agent_id: &str,
        original_error: Option<&str>,
        epoch: u64,
    ) {
        if !self.commit(epoch, |agent| {
            agent.loading = true;
            agent.error.clear();
            agent.phase = ResolutionPhase::Initializing;
        }) {
            return;
        }

        match self.client.initialize_agent_memory(agent_id).await {
            Ok(true) => match self.client.get_agent(agent_id).await {
                Ok(record) => self.finish_resolved(agent_id, record.name, epoch).await,
                Err(e) => {
                    self.fail(epoch, format!("agent fetch after initialization failed: {}", e));
                }
            },
            Ok(false) => {
                self.fail(epoch, with_original(
                    "memory initialization rejected by runtime".to_string(),
                    original_error,
                ));
            }
            Err(e) => {
                self.fail(epoch, with_original(
                    format!("memory initialization failed: {}", e),
                    original_error,
                ));
            }
        }
    }

    async fn finish_resolved(&self, agent_id: &str, name: String, epoch: u64) {
        tracing::info!(agent_id, name = %name, "agent resolved");
        let committed = self.commit(epoch, |agent| {
            agent.agent_id = agent_id.to_string();
            agent.display_name = name.clone();
            agent.loading = false;
            agent.error.clear();
            agent.phase = ResolutionPhase::Resolved;
        });

        if committed {
            fetch_stats(&self.state, self.client.as_ref(), agent_id, epoch).await;
        }
    }

    fn fail(&self, epoch: u64, message: String) {
        tracing::warn!(error = %message, "agent resolution failed");
        self.commit(epoch, |agent| {
            agent.agent_id = "error".to_string();
            agent.loading = false;
            agent.error = message.clone();
            agent.phase = ResolutionPhase::Failed;
        });
    }

    fn commit(&self, epoch: u64, mutate: impl FnOnce(&mut AgentInfo)) -> bool {
        commit_if_current(&self.state, epoch, |state| mutate(&mut state.agent))
    }
}

fn with_original(message: String, original_error: Option<&str>) -> String {
    match original_error {
        Some(original) => format!("{}; original failure: {}", message, original),
        None => message,
    }
}

/// One-shot memory-stats fetch for `agent_id`, committed under `epoch`.
///
/// Failures are recorded on the stats snapshot for display and never
/// propagated.
pub(crate) async fn fetch_stats(
    state: &SharedState,
    client: &dyn RuntimeClient,
    agent_id: &str,
    epoch: u64,
) {
    if !commit_if_current(state, epoch, |s| {
        s.stats.loading = true;
        s.stats.error.clear();
    }) {
        return;
    }

    match client.get_agent_memory_stats(agent_id).await {
        Ok(record) => {
            commit_if_current(state, epoch, |s| {
                s.stats.count = record.count;
                s.stats.last_access = record.last_access;
                s.stats.loading = false;
            });
        }
        Err(e) => {
            tracing::warn!(agent_id, error = %e, "memory stats fetch failed");
            commit_if_current(state, epoch, |s| {
                s.stats.loading = false;
                s.stats.error = e.to_string();
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{scripted_state, ScriptedClient};

    fn resolver_with(
        client: ScriptedClient,
    ) -> (AgentInfoResolver, SharedState, Arc<ScriptedClient>) {
        let state = scripted_state(Some("c1"));
        let client = Arc::new(client);
        let resolver = AgentInfoResolver::new(
            Arc::clone(&state),
            Arc::clone(&client) as Arc<dyn RuntimeClient>,
        );
        (resolver, state, client)
    }

    #[tokio::test]
    async fn test_happy_path_resolves_and_fetches_stats() {
        let (resolver, state, client) = resolver_with(
            ScriptedClient::new()
                .with_conversation("c1", Some("a1"))
                .with_agent("a1", "Aria")
                .with_stats("a1", 3, None),
        );

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Resolved);
        assert_eq!(guard.agent.agent_id, "a1");
        assert_eq!(guard.agent.display_name, "Aria");
        assert_eq!(guard.agent.error, "");
        assert!(!guard.agent.loading);
        assert_eq!(guard.stats.count, 3);
        assert_eq!(client.count_calls("stats:a1"), 1);
    }

    #[tokio::test]
    async fn test_unassigned_conversation_never_touches_agent_api() {
        let (resolver, state, client) =
            resolver_with(ScriptedClient::new().with_conversation("c1", None));

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Unassigned);
        assert_eq!(guard.agent.agent_id, "unknown");
        assert!(!guard.agent.error.is_empty());
        assert!(!guard.agent.loading);
        assert_eq!(client.count_calls("get_agent:"), 0);
        assert_eq!(client.count_calls("initialize:"), 0);
        assert_eq!(client.count_calls("stats:"), 0);
    }

    #[tokio::test]
    async fn test_conversation_fetch_failure_is_terminal() {
        let (resolver, state, client) = resolver_with(ScriptedClient::new());

        resolver.resolve("missing", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Failed);
        assert_eq!(guard.agent.agent_id, "error");
        assert!(guard.agent.error.contains("conversation lookup failed"));
        assert_eq!(client.count_calls("get_agent:"), 0);
    }

    #[tokio::test]
    async fn test_initialize_then_refetch_recovers() {
        let (resolver, state, client) = resolver_with(
            ScriptedClient::new()
                .with_conversation("c1", Some("a1"))
                .with_agent_failure("a1", "memory store missing")
                .with_agent("a1", "Aria (initialized)")
                .with_init("a1", Ok(true))
                .with_stats("a1", 0, None),
        );

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Resolved);
        assert_eq!(guard.agent.display_name, "Aria (initialized)");
        assert_eq!(guard.agent.error, "");
        // One initialize, two agent fetches, exactly one stats fetch.
        assert_eq!(client.count_calls("initialize:a1"), 1);
        assert_eq!(client.count_calls("get_agent:a1"), 2);
        assert_eq!(client.count_calls("stats:a1"), 1);
    }

    #[tokio::test]
    async fn test_initialize_rejection_embeds_original_failure() {
        let (resolver, state, client) = resolver_with(
            ScriptedClient::new()
                .with_conversation("c1", Some("a1"))
                .with_agent_failure("a1", "memory store missing")
                .with_init("a1", Ok(false)),
        );

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Failed);
        assert_eq!(guard.agent.agent_id, "error");
        assert!(guard.agent.error.contains("memory initialization rejected"));
        assert!(guard.agent.error.contains("memory store missing"));
        // No second fetch and no stats after a rejected initialization.
        assert_eq!(client.count_calls("get_agent:a1"), 1);
        assert_eq!(client.count_calls("stats:"), 0);
    }

    #[tokio::test]
    async fn test_refetch_failure_after_initialize_fails() {
        let (resolver, state, client) = resolver_with(
            ScriptedClient::new()
                .with_conversation("c1", Some("a1"))
                .with_agent_failure("a1", "memory store missing")
                .with_agent_failure("a1", "still missing")
                .with_init("a1", Ok(true)),
        );

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Failed);
        assert!(guard
            .agent
            .error
            .contains("agent fetch after initialization failed"));
        // The single self-heal attempt is not repeated.
        assert_eq!(client.count_calls("initialize:a1"), 1);
        assert_eq!(client.count_calls("get_agent:a1"), 2);
        assert_eq!(client.count_calls("stats:"), 0);
    }

    #[tokio::test]
    async fn test_stale_epoch_commits_nothing() {
        let (resolver, state, client) = resolver_with(
            ScriptedClient::new()
                .with_conversation("c1", Some("a1"))
                .with_agent("a1", "Aria")
                .with_stats("a1", 9, None),
        );
        // The scope has already moved past epoch 1.
        state.lock().unwrap().epoch = 2;

        resolver.resolve("c1", 1).await;

        let guard = state.lock().unwrap();
        assert_eq!(guard.agent.phase, ResolutionPhase::Detached);
        assert_eq!(guard.stats.count, 0);
        // The guard short-circuits before any remote call is made.
        assert_eq!(client.count_calls("get_conversation:"), 0);
    }

    #[tokio::test]
    async fn test_stats_failure_recorded_not_propagated() {
        let state = scripted_state(Some("c1"));
        let client = ScriptedClient::new();

        fetch_stats(&state, &client, "a1", 1).await;

        let guard = state.lock().unwrap();
        assert!(!guard.stats.loading);
        assert!(guard.stats.error.contains("memory stats not found"));
        assert_eq!(guard.stats.count, 0);
    }
}
