//! Mock implementations for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use linesim_catalog::{CatalogError, CatalogResult, CatalogSource};
use linesim_core::TranscriptEntry;
use linesim_playback::TranscriptSink;
use serde_json::Value;
use tokio::time::Instant;

/// Catalog source that replays queued responses.
///
/// When the queue is empty every fetch returns the fallback payload (an
/// empty array unless set). Uses `std::sync::Mutex` so builder methods work
/// without a runtime.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    responses: Arc<Mutex<VecDeque<CatalogResult<Value>>>>,
    fallback: Value,
    fetches: Arc<Mutex<usize>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a mock that returns `[]`.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Value::Array(Vec::new()),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    /// Create a mock that always returns `payload`.
    pub fn returning(payload: Value) -> Self {
        Self {
            fallback: payload,
            ..Self::new()
        }
    }

    /// Queue a successful payload.
    #[must_use]
    pub fn with_payload(self, payload: Value) -> Self {
        self.push(Ok(payload));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: CatalogError) -> Self {
        self.push(Err(error));
        self
    }

    /// Queue a response after construction.
    pub fn push(&self, response: CatalogResult<Value>) {
        if let Ok(mut guard) = self.responses.lock() {
            guard.push_back(response);
        }
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().map(|g| *g).unwrap_or(0)
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch(&self) -> CatalogResult<Value> {
        if let Ok(mut count) = self.fetches.lock() {
            *count = count.saturating_add(1);
        }
        let queued = self.responses.lock().ok().and_then(|mut g| g.pop_front());
        queued.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn describe(&self) -> String {
        "mock catalog".to_string()
    }
}

/// Catalog source that always fails as an unreachable endpoint would.
#[derive(Debug, Clone, Default)]
pub struct FailingCatalog;

#[async_trait]
impl CatalogSource for FailingCatalog {
    async fn fetch(&self) -> CatalogResult<Value> {
        Err(CatalogError::Transport(
            "error sending request: connection refused".to_string(),
        ))
    }

    fn describe(&self) -> String {
        "failing catalog".to_string()
    }
}

/// Transcript sink that records each entry with the tokio instant it
/// arrived at. Under a paused clock those instants measure pacing exactly.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    appended: Arc<Mutex<Vec<(Instant, TranscriptEntry)>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries in arrival order.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.appended
            .lock()
            .map(|g| g.iter().map(|(_, e)| e.clone()).collect())
            .unwrap_or_default()
    }

    /// Recorded texts in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.text).collect()
    }

    /// Arrival instants in order.
    pub fn instants(&self) -> Vec<Instant> {
        self.appended
            .lock()
            .map(|g| g.iter().map(|(at, _)| *at).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TranscriptSink for RecordingSink {
    async fn append(&self, entry: TranscriptEntry) {
        if let Ok(mut guard) = self.appended.lock() {
            guard.push((Instant::now(), entry));
        }
    }
}
