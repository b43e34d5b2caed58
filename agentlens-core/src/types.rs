//! Core domain types for agentlens
//!
//! These types model the observable state of one agent conversation: the
//! staged-reasoning debug channels, the resolved agent identity, its memory
//! statistics, and the most recent cognitive trace.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Channel** | A named, append-only text buffer holding one stage of agent reasoning |
//! | **Conversation** | One chat between a human operator and an agent; the unit of scoping |
//! | **Agent** | The runtime-side identity a conversation is assigned to |
//! | **Activity signal** | An externally pushed busy/idle flag for a runtime subsystem |
//! | **Trace** | A point-in-time snapshot of which layer and status a request occupies |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Channels
// ============================================

/// The closed set of debug-stream channels.
///
/// Every token pushed by the runtime names one of these; tokens for any other
/// channel name are discarded at the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// High-level plan the agent is executing
    PrimaryPlan,
    /// Deeper reasoning behind the plan
    DeepAnalysis,
    /// Raw model output tokens
    ModelOutput,
}

impl ChannelKind {
    /// All channels, in display order.
    pub const ALL: [ChannelKind; 3] = [
        ChannelKind::PrimaryPlan,
        ChannelKind::DeepAnalysis,
        ChannelKind::ModelOutput,
    ];

    /// Wire name used by the event feed and in server log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::PrimaryPlan => "primary-plan",
            ChannelKind::DeepAnalysis => "deep-analysis",
            ChannelKind::ModelOutput => "model-output",
        }
    }

    /// Human-friendly name for display headers.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChannelKind::PrimaryPlan => "Primary Plan",
            ChannelKind::DeepAnalysis => "Deep Analysis",
            ChannelKind::ModelOutput => "Model Output",
        }
    }

    /// Canned placeholder shown after a fallback refresh finds nothing
    /// for this channel.
    pub fn placeholder(&self) -> &'static str {
        match self {
            ChannelKind::PrimaryPlan => "(no recent plan output in server logs)",
            ChannelKind::DeepAnalysis => "(no recent analysis output in server logs)",
            ChannelKind::ModelOutput => "(no recent model output in server logs)",
        }
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "primary-plan" => Ok(ChannelKind::PrimaryPlan),
            "deep-analysis" => Ok(ChannelKind::DeepAnalysis),
            "model-output" => Ok(ChannelKind::ModelOutput),
            _ => Err(format!("unknown channel: {}", s)),
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Feed events
// ============================================

/// A single incremental token pushed by the runtime's event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEvent {
    /// Wire name of the target channel (see [`ChannelKind::as_str`])
    pub channel: String,
    /// Text fragment to append
    pub token: String,
    /// Conversation this token belongs to
    pub conversation_id: String,
    /// Agent that produced the token, when the runtime knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Events delivered by the push feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Incremental debug-stream token
    Token(TokenEvent),
    /// Busy/idle transition of a runtime subsystem (e.g. index rebuild)
    Activity { active: bool },
}

// ============================================
// Agent info
// ============================================

/// Where an agent-info resolution currently stands.
///
/// The phase is explicit state, not derived from the flat fields, so the
/// display layer can tell "still looking" from "looked and found nothing"
/// and can surface the self-heal detour while it is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPhase {
    /// No conversation selected
    Detached,
    /// Conversation and agent records are being fetched
    Resolving,
    /// Agent record fetch failed; remote memory initialization in flight
    Initializing,
    /// Agent identity and metadata are known
    Resolved,
    /// Conversation exists but has no agent assigned (terminal)
    Unassigned,
    /// Resolution failed (terminal for this attempt)
    Failed,
}

/// Identity and metadata of the agent behind the selected conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Opaque agent id, or `"unknown"` (unassigned) or `"error"` (failed)
    pub agent_id: String,
    /// Display name from the agent record
    pub display_name: String,
    /// Most recent activity observed for this agent, if any
    pub last_activity: Option<DateTime<Utc>>,
    /// True while a resolution is in flight
    pub loading: bool,
    /// Error message for display; empty when healthy
    pub error: String,
    /// Explicit resolution phase
    pub phase: ResolutionPhase,
}

impl AgentInfo {
    /// State before any conversation is selected.
    pub fn detached() -> Self {
        Self {
            agent_id: String::new(),
            display_name: String::new(),
            last_activity: None,
            loading: false,
            error: String::new(),
            phase: ResolutionPhase::Detached,
        }
    }

    /// State at the start of a resolution.
    pub fn resolving() -> Self {
        Self {
            loading: true,
            phase: ResolutionPhase::Resolving,
            ..Self::detached()
        }
    }

    /// True when `agent_id` names a real agent.
    pub fn has_agent(&self) -> bool {
        !self.agent_id.is_empty() && self.agent_id != "unknown" && self.agent_id != "error"
    }
}

impl Default for AgentInfo {
    fn default() -> Self {
        Self::detached()
    }
}

// ============================================
// Memory statistics
// ============================================

/// Memory statistics for the resolved agent.
///
/// Only valid while the owning [`AgentInfo`] is still current; refetched on
/// demand and after observed subsystem activity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Number of stored memories
    pub count: u64,
    /// Last memory access; `None` renders as "never"
    pub last_access: Option<DateTime<Utc>>,
    /// True while a stats fetch is in flight
    pub loading: bool,
    /// Error message for display; empty when healthy
    pub error: String,
}

// ============================================
// Cognitive trace
// ============================================

/// Processing layer a request occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLayer {
    L1,
    L2,
    L3,
    Dream,
}

impl TraceLayer {
    pub fn display_name(&self) -> &'static str {
        match self {
            TraceLayer::L1 => "L1",
            TraceLayer::L2 => "L2",
            TraceLayer::L3 => "L3",
            TraceLayer::Dream => "Dream",
        }
    }
}

/// Status of the traced request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Idle,
    Processing,
    Streaming,
    Complete,
}

/// Immutable snapshot of the most recent known state of one request.
///
/// Replaced wholesale on each update; never mutated incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveTrace {
    pub layer: TraceLayer,
    pub status: TraceStatus,
    /// Model that served the request
    pub model: String,
    /// End-to-end latency in milliseconds
    pub latency_ms: f64,
    /// Tokens consumed, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Confidence in [0, 1], when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}
