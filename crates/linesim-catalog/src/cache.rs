//! The in-memory scenario catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use linesim_core::{Scenario, ScenarioId};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::group::{CategoryGroup, group_by_category};
use crate::ingest::{RejectedEntry, ingest};
use crate::source::CatalogSource;

/// Outcome of one catalog refresh.
#[derive(Debug)]
pub struct RefreshReport {
    /// Number of scenarios now in the cache.
    pub loaded: usize,
    /// Records skipped during ingestion.
    pub rejected: Vec<RejectedEntry>,
    /// Fetch or payload failure. The cache is empty when this is set.
    pub error: Option<CatalogError>,
}

impl RefreshReport {
    /// Returns `true` if the refresh failed as a whole.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Clears the loading flag when a refresh ends, however it ends.
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Shared scenario list.
///
/// Cloning creates a new handle to the same underlying catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    scenarios: Arc<RwLock<Vec<Arc<Scenario>>>>,
    loading: Arc<AtomicBool>,
}

impl CatalogCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache contents with a fresh fetch from `source`.
    ///
    /// Returns `None` without fetching if another refresh is in flight. On
    /// any fetch or shape failure the cache is emptied and the failure is
    /// returned in the report.
    pub async fn refresh(&self, source: &dyn CatalogSource) -> Option<RefreshReport> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("catalog refresh already in progress");
            return None;
        }
        let _loading = LoadingGuard(Arc::clone(&self.loading));

        let outcome = match source.fetch().await {
            Ok(payload) => ingest(&payload),
            Err(e) => Err(e),
        };

        let report = match outcome {
            Ok(ingested) => {
                let loaded = ingested.scenarios.len();
                *self.scenarios.write().await =
                    ingested.scenarios.into_iter().map(Arc::new).collect();
                info!(
                    source = %source.describe(),
                    loaded,
                    rejected = ingested.rejected.len(),
                    "scenario catalog loaded"
                );
                RefreshReport {
                    loaded,
                    rejected: ingested.rejected,
                    error: None,
                }
            },
            Err(e) => {
                self.scenarios.write().await.clear();
                warn!(source = %source.describe(), error = %e, "scenario catalog unavailable");
                RefreshReport {
                    loaded: 0,
                    rejected: Vec::new(),
                    error: Some(e),
                }
            },
        };
        Some(report)
    }

    /// Look up a scenario by id.
    pub async fn get(&self, id: &ScenarioId) -> Option<Arc<Scenario>> {
        self.scenarios
            .read()
            .await
            .iter()
            .find(|s| &s.id == id)
            .cloned()
    }

    /// All scenarios in catalog order.
    pub async fn scenarios(&self) -> Vec<Arc<Scenario>> {
        self.scenarios.read().await.clone()
    }

    /// Scenarios grouped by category.
    pub async fn grouped(&self) -> Vec<CategoryGroup> {
        group_by_category(&self.scenarios.read().await)
    }

    /// Number of cached scenarios.
    pub async fn len(&self) -> usize {
        self.scenarios.read().await.len()
    }

    /// Returns `true` if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.scenarios.read().await.is_empty()
    }

    /// Returns `true` while a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Notify;

    use super::*;
    use crate::error::CatalogResult;
    use crate::source::StaticCatalog;

    struct Unreachable;

    #[async_trait]
    impl CatalogSource for Unreachable {
        async fn fetch(&self) -> CatalogResult<Value> {
            Err(CatalogError::Transport("connection refused".to_string()))
        }

        fn describe(&self) -> String {
            "unreachable".to_string()
        }
    }

    /// Blocks in `fetch` until released.
    struct Gated {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl CatalogSource for Gated {
        async fn fetch(&self) -> CatalogResult<Value> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(json!([]))
        }

        fn describe(&self) -> String {
            "gated".to_string()
        }
    }

    fn good_payload() -> Value {
        json!([
            {"id": "a", "label": "A", "category": "Booking", "messages": [{"text": "hi"}]},
            {"id": "b", "label": "B", "messages": []},
            {"id": "bad", "messages": [{"delay": -1}]}
        ])
    }

    #[tokio::test]
    async fn refresh_loads_and_reports_rejections() {
        let cache = CatalogCache::new();
        let report = cache
            .refresh(&StaticCatalog::new(good_payload()))
            .await
            .unwrap();

        assert!(!report.is_failure());
        assert_eq!(report.loaded, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id.as_deref(), Some("bad"));

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&ScenarioId::new("a")).await.is_some());
        assert!(cache.get(&ScenarioId::new("bad")).await.is_none());

        let groups = cache.grouped().await;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Booking");
    }

    #[tokio::test]
    async fn non_array_payload_empties_cache() {
        let cache = CatalogCache::new();
        cache
            .refresh(&StaticCatalog::new(good_payload()))
            .await
            .unwrap();
        assert!(!cache.is_empty().await);

        let report = cache
            .refresh(&StaticCatalog::new(json!({"error": "Sheet missing"})))
            .await
            .unwrap();
        assert!(matches!(report.error, Some(CatalogError::Server(_))));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn fetch_failure_empties_cache() {
        let cache = CatalogCache::new();
        cache
            .refresh(&StaticCatalog::new(good_payload()))
            .await
            .unwrap();

        let report = cache.refresh(&Unreachable).await.unwrap();
        assert!(report.is_failure());
        assert_eq!(report.loaded, 0);
        assert!(cache.is_empty().await);
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn concurrent_refresh_is_declined() {
        let cache = CatalogCache::new();
        let gated = Arc::new(Gated {
            entered: Notify::new(),
            release: Notify::new(),
        });

        let first = {
            let cache = cache.clone();
            let gated = Arc::clone(&gated);
            tokio::spawn(async move { cache.refresh(gated.as_ref()).await })
        };

        gated.entered.notified().await;
        assert!(cache.is_loading());
        assert!(
            cache
                .refresh(&StaticCatalog::new(good_payload()))
                .await
                .is_none()
        );

        gated.release.notify_one();
        assert!(first.await.unwrap().is_some());
        assert!(!cache.is_loading());
    }
}
