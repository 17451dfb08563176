//! Feed Rescoring Background Job
//!
//! Walks the entire feed collection on a fixed schedule and refreshes each
//! item's rank score from current engagement counters and comment counts.
//! Score changes become visible to readers on the next natural cache expiry
//! or invalidation; the job never touches the cache itself.
//!
//! One instance runs per process. If the engine is scaled horizontally the
//! external scheduler must hold a lock so only one instance executes a
//! given run — a duplicate run is idempotent but wasted work.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::warn;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{ContentRecord, FeedItem, ModuleType, ScoreUpdate};
use crate::services::comments::resolve_comment_counts;
use crate::services::scoring;
use crate::store::{CommentStore, ContentStore, FeedFilter, FeedSort, FeedStore};

/// Interval between rescoring runs (1 hour)
pub const RESCORE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Page size for the collection walk
pub const RESCORE_PAGE_SIZE: u64 = 500;

/// Outcome of one full rescoring walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    pub pages: u64,
    pub scored: u64,
    /// Items skipped because their asset reference resolved to nothing
    pub skipped: u64,
}

pub struct Rescorer {
    feed_store: Arc<dyn FeedStore>,
    content_store: Arc<dyn ContentStore>,
    comment_store: Arc<dyn CommentStore>,
    page_size: u64,
    interval: Duration,
}

pub async fn start_rescorer(rescorer: Rescorer) {
    tracing::info!(
        interval_secs = rescorer.interval.as_secs(),
        page_size = rescorer.page_size,
        "Starting feed rescorer background job"
    );

    loop {
        sleep(rescorer.interval).await;

        let cycle_start = Instant::now();
        match rescorer.run_once(Utc::now()).await {
            Ok(summary) => {
                tracing::info!(
                    pages = summary.pages,
                    scored = summary.scored,
                    skipped = summary.skipped,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Feed rescore cycle completed"
                );
            }
            Err(e) => {
                // Store-level failures abort the run; retry policy belongs
                // to the schedule, so the loop just waits for the next tick.
                tracing::error!(
                    error = %e,
                    duration_ms = cycle_start.elapsed().as_millis(),
                    "Feed rescore cycle failed"
                );
            }
        }
    }
}

impl Rescorer {
    pub fn new(
        feed_store: Arc<dyn FeedStore>,
        content_store: Arc<dyn ContentStore>,
        comment_store: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            feed_store,
            content_store,
            comment_store,
            page_size: RESCORE_PAGE_SIZE,
            interval: RESCORE_INTERVAL,
        }
    }

    pub fn from_config(
        feed_store: Arc<dyn FeedStore>,
        content_store: Arc<dyn ContentStore>,
        comment_store: Arc<dyn CommentStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            feed_store,
            content_store,
            comment_store,
            page_size: config.rescore_page_size,
            interval: Duration::from_secs(config.rescore_interval_secs),
        }
    }

    /// One full walk over the feed collection.
    ///
    /// `now` is sampled once by the caller so every page of the run decays
    /// against the same instant. Any store error aborts the walk and
    /// propagates.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RescoreSummary> {
        let filter = FeedFilter::default();
        let mut summary = RescoreSummary::default();
        let mut skip = 0u64;

        loop {
            let page = self
                .feed_store
                .find(&filter, FeedSort::IdAsc, skip, self.page_size)
                .await?;
            if page.is_empty() {
                break;
            }
            skip += page.len() as u64;

            let (updates, skipped) = self.score_page(&page, now).await?;
            if !updates.is_empty() {
                self.feed_store.bulk_update_scores(&updates).await?;
            }

            summary.pages += 1;
            summary.scored += updates.len() as u64;
            summary.skipped += skipped;
        }

        Ok(summary)
    }

    /// Score one page: join content records (batched per module type,
    /// fetched concurrently), resolve comment counts once, then compute
    /// each item's score.
    async fn score_page(
        &self,
        items: &[FeedItem],
        now: DateTime<Utc>,
    ) -> Result<(Vec<ScoreUpdate>, u64)> {
        let mut by_module: HashMap<ModuleType, Vec<Uuid>> = HashMap::new();
        for item in items {
            by_module
                .entry(item.module_type)
                .or_default()
                .push(item.asset_ref);
        }

        let fetches = by_module.into_iter().map(|(module_type, ids)| {
            let store = Arc::clone(&self.content_store);
            async move { store.fetch_by_ids(module_type, ids).await }
        });
        let resolved = futures::future::try_join_all(fetches).await?;
        let mut content: HashMap<Uuid, ContentRecord> = HashMap::new();
        for map in resolved {
            content.extend(map);
        }

        let comment_counts = resolve_comment_counts(self.comment_store.as_ref(), items).await?;

        let mut updates = Vec::with_capacity(items.len());
        let mut skipped = 0u64;
        for item in items {
            let Some(record) = content.get(&item.asset_ref) else {
                warn!(
                    feed_id = %item.id,
                    asset_ref = %item.asset_ref,
                    "Skipping feed item with orphaned asset reference"
                );
                skipped += 1;
                continue;
            };

            let comments = comment_counts.get(&item.id).copied().unwrap_or(0);
            // Age decays from the content record's timestamp: an adopted
            // entry inherits the original content's age.
            let age_hours = scoring::age_in_hours(record.created_at(), now);
            let score = scoring::rank_score(record.engagement(), comments, age_hours);
            updates.push(ScoreUpdate {
                id: item.id,
                score,
            });
        }

        Ok((updates, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RESCORE_PAGE_SIZE, 500);
        assert_eq!(RESCORE_INTERVAL, Duration::from_secs(60 * 60));
    }
}
