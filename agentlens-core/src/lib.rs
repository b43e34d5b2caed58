//! # agentlens-core
//!
//! Core library for agentlens - a live cognitive-trace and debug-stream
//! aggregator for AI agent runtimes.
//!
//! This library provides:
//! - Append-only debug channels scoped to one conversation
//! - Event routing from a push feed, with a log-polling fallback
//! - Agent-info resolution with a self-healing initialize-then-retry path
//! - A debounced memory-stats refresh driven by subsystem activity
//! - Cognitive-trace display derivation (layer, status, severity bands)
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐ tokens/activity ┌───────────────────┐
//! │ Event feed │ ──────────────► │ ConversationScope │ ◄── select/refresh
//! └────────────┘                 │  channels, agent, │     actions
//! ┌────────────┐  fetches        │  stats, trace     │
//! │ Runtime API│ ◄────────────── │                   │ ──► snapshot()
//! └────────────┘                 └───────────────────┘     (display layer)
//! ```
//!
//! The display layer is an external collaborator: it reads
//! [`ConversationScope::snapshot`] and invokes the scope's action entry
//! points, nothing more.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentlens_core::{Config, ConversationScope, FeedBus, HttpRuntimeClient};
//!
//! # async fn run() -> agentlens_core::Result<()> {
//! let config = Config::load()?;
//! let feed = Arc::new(FeedBus::new());
//! let client = Arc::new(HttpRuntimeClient::new(&config.endpoint)?);
//!
//! let scope = ConversationScope::new(feed.clone(), client, &config);
//! scope.select(Some("conversation-1")).await;
//! let snapshot = scope.snapshot();
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use client::{
    AgentRecord, ConversationRecord, HttpRuntimeClient, MemoryStatsRecord, RuntimeClient,
};
pub use config::Config;
pub use error::{Error, Result};
pub use feed::{EventFeed, FeedBus, FeedHandler, Subscription};
pub use scope::{ConversationScope, ScopeSnapshot};
pub use stream::ChannelStore;
pub use trace::{ConfidenceBand, LatencyBand, TraceMonitor};
pub use types::*;

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod scope;
pub mod stream;
pub mod trace;
pub mod types;

// Internal plumbing
mod activity;
mod resolver;

#[cfg(test)]
pub(crate) mod testutil;
