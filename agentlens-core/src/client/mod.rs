//! Runtime API client
//!
//! The aggregator talks to the agent runtime through the [`RuntimeClient`]
//! trait so the core never depends on a concrete transport. The shipped
//! implementation is [`HttpRuntimeClient`]; tests substitute scripted
//! in-memory clients.
//!
//! No method retries internally. Transient failures surface as
//! [`Error::Transport`](crate::Error::Transport) and recovery is the
//! caller's decision.

mod http;

pub use http::HttpRuntimeClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Conversation record as returned by the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Agent the conversation is assigned to, if any
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Agent record as returned by the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Display name of the agent
    pub name: String,
}

/// Memory statistics as returned by the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStatsRecord {
    /// Number of stored memories
    pub count: u64,
    /// Last memory access, when known
    #[serde(default)]
    pub last_access: Option<DateTime<Utc>>,
}

/// Request/response interface to the agent runtime.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Fetch a conversation record by id.
    async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationRecord>;

    /// Fetch an agent record by id.
    async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord>;

    /// Ask the runtime to initialize the agent's memory store.
    ///
    /// Returns whether the runtime accepted the initialization.
    async fn initialize_agent_memory(&self, agent_id: &str) -> Result<bool>;

    /// Fetch memory statistics for an agent.
    async fn get_agent_memory_stats(&self, agent_id: &str) -> Result<MemoryStatsRecord>;

    /// Fetch up to `lines` recent server log lines, oldest first.
    async fn get_server_logs(&self, lines: usize) -> Result<Vec<String>>;

    /// Kick off a memory index rebuild for an agent (fire-and-forget).
    async fn rebuild_memory_index(&self, agent_id: &str) -> Result<()>;
}
