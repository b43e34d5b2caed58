//! Debug-stream aggregation
//!
//! Channel content reaches the store along two paths of different freshness:
//!
//! ```text
//! ┌────────────┐  push    ┌─────────────┐
//! │ Event feed │ ───────► │ EventRouter │ ──┐  append
//! └────────────┘          └─────────────┘   ▼
//!                                      ┌──────────────┐
//!                                      │ ChannelStore │
//!                                      └──────────────┘
//! ┌─────────────┐  pull   ┌───────────────────┐ ▲  reset + overwrite
//! │ Server logs │ ──────► │ LogFallbackFetcher│ ┘
//! └─────────────┘         └───────────────────┘
//! ```
//!
//! The router appends live tokens; the fallback fetcher rebuilds content from
//! classified log lines on demand. A fallback refresh overwrites, so a live
//! token racing a manual refresh resolves last-write-wins.

mod fallback;
mod router;
mod store;

pub use store::ChannelStore;

pub(crate) use fallback::LogFallbackFetcher;
pub(crate) use router::EventRouter;
