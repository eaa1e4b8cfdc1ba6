use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

/// One day's recomputed metrics, the polling counterpart to the multi-day summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailySnapshot {
    #[schema(example = "2026-01-05")]
    pub date: String,
    #[schema(example = 9)]
    pub areas_cleaned: u64,
    #[schema(example = 24)]
    pub photos_taken: u64,
    #[schema(example = 37.5)]
    pub hours_worked: f64,
    /// Only meaningful when the snapshot day is today, otherwise 0
    #[schema(example = 3)]
    pub currently_clocked_in: u64,
}

/// Keyed by "{date}:{scope}" where scope is the requesting manager's user id
/// or "all" for admins. The short TTL matches the one-minute polling cadence
/// of dashboard clients; mutations invalidate eagerly.
static SNAPSHOT_CACHE: Lazy<Cache<String, DailySnapshot>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(60))
        .build()
});

pub async fn get(key: &str) -> Option<DailySnapshot> {
    SNAPSHOT_CACHE.get(key).await
}

pub async fn put(key: String, snapshot: DailySnapshot) {
    SNAPSHOT_CACHE.insert(key, snapshot).await;
}

/// Drop everything after a mutation (clock-in/out, new selection or photo).
/// Snapshots are cheap to recompute, so scoped invalidation isn't worth it.
pub fn invalidate_all() {
    SNAPSHOT_CACHE.invalidate_all();
}
