//! Log-polling fallback for the debug streams
//!
//! When the push feed has produced nothing (fresh page, missed events, feed
//! outage), a manual refresh pulls a bounded window of server log lines and
//! rebuilds channel content from them. Lines are classified by channel
//! keyword; anything that matches no channel is dropped.
//!
//! A refresh clears the store before writing so running it twice against the
//! same log snapshot yields identical content. Channels with no classified
//! content get a canned placeholder so the display never goes fully blank
//! right after a refresh. A fetch failure is reported to the caller and
//! leaves previously streamed content untouched.

use std::sync::Arc;

use crate::client::RuntimeClient;
use crate::error::Result;
use crate::scope::{commit_if_current, lock_state, SharedState};
use crate::types::ChannelKind;

pub(crate) struct LogFallbackFetcher {
    state: SharedState,
    client: Arc<dyn RuntimeClient>,
}

impl LogFallbackFetcher {
    pub(crate) fn new(state: SharedState, client: Arc<dyn RuntimeClient>) -> Self {
        Self { state, client }
    }

    /// One-shot refresh of all channels from up to `line_count` log lines.
    ///
    /// No internal retry; transient failures surface to the caller.
    pub(crate) async fn refresh(&self, line_count: usize) -> Result<()> {
        let epoch = lock_state(&self.state).epoch;

        let lines = self.client.get_server_logs(line_count).await?;
        tracing::debug!(requested = line_count, received = lines.len(), "fetched server logs");

        let applied = commit_if_current(&self.state, epoch, |state| {
            state.channels.reset();
            for kind in ChannelKind::ALL {
                let content = classified_content(&lines, kind);
                if content.is_empty() {
                    state.channels.overwrite(kind, kind.placeholder().to_string());
                } else {
                    state.channels.overwrite(kind, content);
                }
            }
        });

        if !applied {
            tracing::debug!("dropping fallback refresh for superseded scope");
        }
        Ok(())
    }
}

/// Classify a server log line by channel keyword.
///
/// A line naming several channels goes to the first match in display order.
pub(crate) fn classify_line(line: &str) -> Option<ChannelKind> {
    ChannelKind::ALL
        .into_iter()
        .find(|kind| line.contains(kind.as_str()))
}

/// Joined content of every line classified into `kind`, oldest first.
fn classified_content(lines: &[String], kind: ChannelKind) -> String {
    let matched: Vec<&str> = lines
        .iter()
        .filter(|line| classify_line(line) == Some(kind))
        .map(String::as_str)
        .collect();
    matched.join("\n")
}
