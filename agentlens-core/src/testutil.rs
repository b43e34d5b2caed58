//! Shared test fixtures: scripted runtime client and pre-seeded scope state.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::client::{AgentRecord, ConversationRecord, MemoryStatsRecord, RuntimeClient};
use crate::error::{Error, Result};
use crate::scope::{ScopeState, SharedState};
use crate::stream::ChannelStore;
use crate::trace::TraceMonitor;
use crate::types::{AgentInfo, MemoryStats};

/// Scope state as it looks right after `select(conversation_id)`: epoch 1,
/// channels empty, agent detached (tests seed an agent when they need one).
pub(crate) fn scripted_state(conversation_id: Option<&str>) -> SharedState {
    Arc::new(Mutex::new(ScopeState {
        epoch: 1,
        conversation_id: conversation_id.map(str::to_string),
        channels: ChannelStore::new(),
        agent: AgentInfo::detached(),
        stats: MemoryStats::default(),
        subsystem_active: false,
        trace: TraceMonitor::new(),
    }))
}

/// In-memory [`RuntimeClient`] with scripted responses and a call audit.
///
/// Unknown ids fail with [`Error::Lookup`], mirroring the HTTP client's 404
/// mapping. Each method yields once before answering so in-flight races can
/// be staged deterministically in tests.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    /// conversation id → agent id on the record (None = unassigned)
    conversations: Mutex<HashMap<String, Option<String>>>,
    /// agent id → response queue; the last entry repeats
    agents: Mutex<HashMap<String, VecDeque<std::result::Result<String, String>>>>,
    /// agent id → initialize outcome
    init_results: Mutex<HashMap<String, std::result::Result<bool, String>>>,
    stats: Mutex<HashMap<String, MemoryStatsRecord>>,
    log_lines: Mutex<Vec<String>>,
    fail_logs: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_conversation(self, id: &str, agent_id: Option<&str>) -> Self {
        self.conversations
            .lock()
            .unwrap()
            .insert(id.to_string(), agent_id.map(str::to_string));
        self
    }

    pub(crate) fn with_agent(self, id: &str, name: &str) -> Self {
        self.agents
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(Ok(name.to_string()));
        self
    }

    pub(crate) fn with_agent_failure(self, id: &str, message: &str) -> Self {
        self.agents
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn with_init(
        self,
        id: &str,
        outcome: std::result::Result<bool, String>,
    ) -> Self {
        self.init_results
            .lock()
            .unwrap()
            .insert(id.to_string(), outcome);
        self
    }

    pub(crate) fn with_stats(
        self,
        id: &str,
        count: u64,
        last_access: Option<DateTime<Utc>>,
    ) -> Self {
        self.stats
            .lock()
            .unwrap()
            .insert(id.to_string(), MemoryStatsRecord { count, last_access });
        self
    }

    pub(crate) fn with_log_lines(self, lines: Vec<String>) -> Self {
        *self.log_lines.lock().unwrap() = lines;
        self
    }

    pub(crate) fn failing_logs(self) -> Self {
        self.fail_logs.store(true, Ordering::SeqCst);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Number of recorded calls whose audit entry starts with `prefix`.
    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl RuntimeClient for ScriptedClient {
    async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationRecord> {
        self.record(format!("get_conversation:{}", conversation_id));
        tokio::task::yield_now().await;
        match self.conversations.lock().unwrap().get(conversation_id) {
            Some(agent_id) => Ok(ConversationRecord {
                agent_id: agent_id.clone(),
            }),
            None => Err(Error::Lookup(format!(
                "conversation not found: {}",
                conversation_id
            ))),
        }
    }

    async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord> {
        self.record(format!("get_agent:{}", agent_id));
        tokio::task::yield_now().await;
        let mut agents = self.agents.lock().unwrap();
        let Some(queue) = agents.get_mut(agent_id) else {
            return Err(Error::Lookup(format!("agent not found: {}", agent_id)));
        };
        let entry = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match entry {
            Some(Ok(name)) => Ok(AgentRecord { name }),
            Some(Err(message)) => Err(Error::Transport(message)),
            None => Err(Error::Lookup(format!("agent not found: {}", agent_id))),
        }
    }

    async fn initialize_agent_memory(&self, agent_id: &str) -> Result<bool> {
        self.record(format!("initialize:{}", agent_id));
        tokio::task::yield_now().await;
        match self.init_results.lock().unwrap().get(agent_id) {
            Some(Ok(accepted)) => Ok(*accepted),
            Some(Err(message)) => Err(Error::Initialization(message.clone())),
            None => Ok(false),
        }
    }

    async fn get_agent_memory_stats(&self, agent_id: &str) -> Result<MemoryStatsRecord> {
        self.record(format!("stats:{}", agent_id));
        tokio::task::yield_now().await;
        match self.stats.lock().unwrap().get(agent_id) {
            Some(record) => Ok(record.clone()),
            None => Err(Error::Lookup(format!(
                "memory stats not found for agent: {}",
                agent_id
            ))),
        }
    }

    async fn get_server_logs(&self, lines: usize) -> Result<Vec<String>> {
        self.record(format!("logs:{}", lines));
        tokio::task::yield_now().await;
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(Error::Transport(
                "HTTP request failed: connection refused".to_string(),
            ));
        }
        let all = self.log_lines.lock().unwrap();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].to_vec())
    }

    async fn rebuild_memory_index(&self, agent_id: &str) -> Result<()> {
        self.record(format!("rebuild:{}", agent_id));
        tokio::task::yield_now().await;
        Ok(())
    }
}
