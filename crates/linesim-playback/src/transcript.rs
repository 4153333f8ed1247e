//! The live chat transcript.
//!
//! Entries are appended one at a time and are visible to readers as soon as
//! `append` returns. Observers that want push notifications subscribe to a
//! broadcast channel of [`TranscriptEvent`]s.
//!
//! Events are published while the write lock is still held, so the order of
//! events on the channel always matches the order of changes to the entries.

use std::sync::Arc;

use async_trait::async_trait;
use linesim_core::TranscriptEntry;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, trace};

/// Default channel capacity for transcript notifications.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Something that accepts emitted transcript entries.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Append one entry. Must be observable to readers once this returns.
    async fn append(&self, entry: TranscriptEntry);
}

/// Change notification published by a [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// An entry was appended.
    Appended(TranscriptEntry),
    /// The transcript was cleared.
    Cleared {
        /// Number of entries removed.
        removed: usize,
    },
}

/// Append-only, bulk-clearable record of emitted messages.
///
/// Cloning creates a new handle to the same underlying entries.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
    sender: broadcast::Sender<TranscriptEvent>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create an empty transcript with the given notification capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            sender,
        }
    }

    /// Copy of all entries in emission order.
    pub async fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.read().await.clone()
    }

    /// Resolved texts in emission order.
    pub async fn texts(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if the transcript holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remove every entry. Does not touch playback state.
    ///
    /// Returns the number of entries removed.
    pub async fn clear(&self) -> usize {
        let mut guard = self.entries.write().await;
        let removed = guard.len();
        guard.clear();
        let _ = self.sender.send(TranscriptEvent::Cleared { removed });
        drop(guard);
        debug!(removed, "transcript cleared");
        removed
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl TranscriptSink for Transcript {
    async fn append(&self, entry: TranscriptEntry) {
        let id = entry.id;
        let mut guard = self.entries.write().await;
        guard.push(entry.clone());
        // No receivers is fine.
        let _ = self.sender.send(TranscriptEvent::Appended(entry));
        drop(guard);
        trace!(entry_id = %id, "transcript entry appended");
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use linesim_core::{EntryId, ScenarioId};

    use super::*;

    fn entry(id: u64, text: &str) -> TranscriptEntry {
        TranscriptEntry {
            id: EntryId(id),
            text: text.to_string(),
            time_label: "Just now".to_string(),
            scenario_id: ScenarioId::new("s1"),
            emitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_is_immediately_visible() {
        let transcript = Transcript::new();
        transcript.append(entry(1, "A")).await;
        assert_eq!(transcript.texts().await, vec!["A"]);

        transcript.append(entry(2, "B")).await;
        assert_eq!(transcript.texts().await, vec!["A", "B"]);
        assert_eq!(transcript.len().await, 2);
    }

    #[tokio::test]
    async fn clear_empties_and_reports() {
        let transcript = Transcript::new();
        transcript.append(entry(1, "A")).await;
        transcript.append(entry(2, "B")).await;

        assert_eq!(transcript.clear().await, 2);
        assert!(transcript.is_empty().await);
        assert_eq!(transcript.clear().await, 0);
    }

    #[tokio::test]
    async fn subscribers_see_appends_and_clears() {
        let transcript = Transcript::new();
        let mut rx = transcript.subscribe();

        transcript.append(entry(1, "A")).await;
        transcript.clear().await;

        match rx.recv().await.unwrap() {
            TranscriptEvent::Appended(e) => assert_eq!(e.text, "A"),
            other => panic!("expected append, got {other:?}"),
        }
        assert_eq!(
            rx.recv().await.unwrap(),
            TranscriptEvent::Cleared { removed: 1 }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_and_clears_publish_in_state_order() {
        let transcript = Transcript::with_capacity(1024);
        let mut rx = transcript.subscribe();

        let mut tasks = Vec::new();
        for i in 0..50u64 {
            let t = transcript.clone();
            tasks.push(tokio::spawn(async move {
                if matches!(i, 9 | 19 | 29 | 39 | 49) {
                    t.clear().await;
                } else {
                    t.append(entry(i, &i.to_string())).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Replaying the events must rebuild exactly the final state.
        let mut replayed: Vec<String> = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                TranscriptEvent::Appended(e) => replayed.push(e.text),
                TranscriptEvent::Cleared { removed } => {
                    assert_eq!(removed, replayed.len());
                    replayed.clear();
                },
            }
        }
        assert_eq!(replayed, transcript.texts().await);
    }

    #[tokio::test]
    async fn clone_shares_entries() {
        let t1 = Transcript::new();
        let t2 = t1.clone();
        t1.append(entry(1, "shared")).await;
        assert_eq!(t2.texts().await, vec!["shared"]);
    }
}
