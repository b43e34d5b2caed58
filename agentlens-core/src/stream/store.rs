//! Append-only channel buffers
//!
//! One [`ChannelStore`] holds the accumulated text of every debug channel for
//! the active conversation. Content only ever grows while a conversation is
//! live; it is cleared at a conversation boundary or by an explicit reset
//! ahead of a fallback refresh.

use crate::types::ChannelKind;

/// Accumulated text per debug channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelStore {
    buffers: [String; ChannelKind::ALL.len()],
}

fn index(channel: ChannelKind) -> usize {
    match channel {
        ChannelKind::PrimaryPlan => 0,
        ChannelKind::DeepAnalysis => 1,
        ChannelKind::ModelOutput => 2,
    }
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to the named channel.
    pub fn append(&mut self, channel: ChannelKind, text: &str) {
        self.buffers[index(channel)].push_str(text);
    }

    /// Replace the named channel's content wholesale.
    ///
    /// Only the fallback fetcher uses this; live routing always appends.
    pub fn overwrite(&mut self, channel: ChannelKind, content: String) {
        self.buffers[index(channel)] = content;
    }

    /// Clear all channels to empty content.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }

    /// Current content of the named channel.
    pub fn get(&self, channel: ChannelKind) -> &str {
        &self.buffers[index(channel)]
    }

    /// True if the named channel has no content.
    pub fn is_empty(&self, channel: ChannelKind) -> bool {
        self.buffers[index(channel)].is_empty()
    }

    /// Total accumulated length across all channels.
    pub fn total_len(&self) -> usize {
        self.buffers.iter().map(|b| b.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_concatenates_in_order() {
        let mut store = ChannelStore::new();
        store.append(ChannelKind::PrimaryPlan, "step 1. ");
        store.append(ChannelKind::PrimaryPlan, "step 2.");
        store.append(ChannelKind::ModelOutput, "hello");

        assert_eq!(store.get(ChannelKind::PrimaryPlan), "step 1. step 2.");
        assert_eq!(store.get(ChannelKind::ModelOutput), "hello");
        assert_eq!(store.get(ChannelKind::DeepAnalysis), "");
    }

    #[test]
    fn test_channels_are_independent() {
        let mut store = ChannelStore::new();
        for kind in ChannelKind::ALL {
            store.append(kind, kind.as_str());
        }
        for kind in ChannelKind::ALL {
            assert_eq!(store.get(kind), kind.as_str());
        }
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = ChannelStore::new();
        store.append(ChannelKind::DeepAnalysis, "because");
        store.overwrite(ChannelKind::ModelOutput, "output".to_string());
        assert!(store.total_len() > 0);

        store.reset();

        for kind in ChannelKind::ALL {
            assert!(store.is_empty(kind));
        }
        assert_eq!(store.total_len(), 0);
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let mut store = ChannelStore::new();
        store.append(ChannelKind::PrimaryPlan, "old");
        store.overwrite(ChannelKind::PrimaryPlan, "new".to_string());
        assert_eq!(store.get(ChannelKind::PrimaryPlan), "new");
    }
}
