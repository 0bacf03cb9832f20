// Metrics hooks for the recommendation engine.
//
// Callers install a global `RecommendMetrics` implementation via
// [`set_recommend_metrics`], then `HybridRecommender` reports per-request
// latency and candidate counts for each call to `hybrid_recommendation`.
// This keeps instrumentation decoupled from any specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::codec::UserId;

/// Metrics observer for recommendation requests.
pub trait RecommendMetrics: Send + Sync {
    /// Record the outcome of one hybrid recommendation.
    ///
    /// `user_id` is the target user, `latency` is the wall-clock duration of
    /// the full request, and `candidate_count` is the number of candidates
    /// returned after blending and truncation.
    fn record_recommendation(&self, user_id: UserId, latency: Duration, candidate_count: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn RecommendMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn RecommendMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn RecommendMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global recommendation metrics recorder.
///
/// This is typically called once during service startup so all
/// `HybridRecommender` instances share the same metrics backend.
pub fn set_recommend_metrics(recorder: Option<Arc<dyn RecommendMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("recommend metrics lock poisoned");
    *guard = recorder;
}
