//! Feed query orchestration
//!
//! Builds paginated, ranked feed result sets behind a read-through cache.
//!
//! First-page reads stack two segments: a "recent window" (items created
//! within the last hour, chronological) followed by a "ranked remainder"
//! (older items by score). Brand-new items therefore surface immediately
//! even while their score is still near zero, without letting stale
//! high-score items push them down. Subsequent pages paginate purely by
//! `(score desc, id desc)` keyset so traversal is stable and duplicate-free
//! even across large runs of equal scores.
//!
//! Cache reads degrade to a miss on backend failure; the cache is an
//! optimization layer, never a source of correctness.

use chrono::{Duration, Utc};
use feed_cache::{keys, TagCache};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{FeedError, Result};
use crate::models::{ContentRecord, FeedEntry, FeedItem, FeedPage, FeedScope, ModuleType};
use crate::store::{ContentStore, FeedFilter, FeedSort, FeedStore, ScoreCursor};

pub struct FeedQueryService {
    feed_store: Arc<dyn FeedStore>,
    content_store: Arc<dyn ContentStore>,
    cache: Arc<TagCache>,
    config: EngineConfig,
}

impl FeedQueryService {
    pub fn new(
        feed_store: Arc<dyn FeedStore>,
        content_store: Arc<dyn ContentStore>,
        cache: Arc<TagCache>,
    ) -> Self {
        Self::with_config(feed_store, content_store, cache, EngineConfig::default())
    }

    pub fn with_config(
        feed_store: Arc<dyn FeedStore>,
        content_store: Arc<dyn ContentStore>,
        cache: Arc<TagCache>,
        config: EngineConfig,
    ) -> Self {
        Self {
            feed_store,
            content_store,
            cache,
            config,
        }
    }

    /// Ranked, paginated read over `scope`.
    ///
    /// `last_id: None` requests the first page; otherwise `last_id` is the
    /// cursor returned by the previous page. The result shape is identical
    /// in both modes.
    pub async fn get_page(
        &self,
        scope: &FeedScope,
        limit: u32,
        last_id: Option<Uuid>,
    ) -> Result<FeedPage> {
        let limit = limit.clamp(1, self.config.max_page_size);
        let key = keys::list_key(scope, limit, last_id)?;

        match self.cache.get::<FeedPage>(&key).await {
            Ok(Some(page)) => return Ok(page),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "List cache read failed, falling through to store")
            }
        }

        let items = match last_id {
            None => self.first_page(scope, limit).await?,
            Some(cursor) => self.cursor_page(scope, limit, cursor).await?,
        };

        let has_more = items.len() as u32 == limit;
        let next_cursor = if has_more {
            items.last().map(|item| item.id)
        } else {
            None
        };

        let entries = self.hydrate(items).await?;
        let page = FeedPage {
            entries,
            next_cursor,
            has_more,
        };

        match self
            .cache
            .set(&key, &page, self.cache.config().list_ttl)
            .await
        {
            Ok(()) => self.cache.track_key(&scope.tags(), &key),
            Err(e) => warn!(key = %key, error = %e, "List cache write failed"),
        }

        Ok(page)
    }

    /// Single-item read-through by id.
    pub async fn get_item(&self, id: Uuid) -> Result<FeedEntry> {
        let key = keys::item_key(id);

        match self.cache.get::<FeedEntry>(&key).await {
            Ok(Some(entry)) => return Ok(entry),
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Item cache read failed, falling through to store")
            }
        }

        let item = self
            .feed_store
            .find_by_id(id)
            .await?
            .ok_or(FeedError::NotFound(id))?;

        let mut entries = self.hydrate(vec![item]).await?;
        let entry = entries.remove(0);

        if let Err(e) = self
            .cache
            .set(&key, &entry, self.cache.config().item_ttl)
            .await
        {
            warn!(key = %key, error = %e, "Item cache write failed");
        }

        Ok(entry)
    }

    /// Recent window first (chronological), then the ranked remainder. The
    /// two segments are stacked, never interleaved or re-ranked against
    /// each other.
    async fn first_page(&self, scope: &FeedScope, limit: u32) -> Result<Vec<FeedItem>> {
        let window_start = Utc::now() - Duration::seconds(self.config.recent_window_secs);

        let mut recent_filter = FeedFilter::from_scope(scope);
        recent_filter.created_at_or_after = Some(window_start);
        let mut items = self
            .feed_store
            .find(&recent_filter, FeedSort::CreatedDesc, 0, limit as u64)
            .await?;

        if (items.len() as u32) < limit {
            let mut ranked_filter = FeedFilter::from_scope(scope);
            ranked_filter.created_before = Some(window_start);
            let remainder = self
                .feed_store
                .find(
                    &ranked_filter,
                    FeedSort::ScoreDesc,
                    0,
                    (limit as usize - items.len()) as u64,
                )
                .await?;
            items.extend(remainder);
        }

        items.truncate(limit as usize);
        debug!(count = items.len(), "First feed page assembled");
        Ok(items)
    }

    /// Keyset continuation from the `(score, id)` position of `last_id`.
    async fn cursor_page(
        &self,
        scope: &FeedScope,
        limit: u32,
        last_id: Uuid,
    ) -> Result<Vec<FeedItem>> {
        let cursor_item = self
            .feed_store
            .find_by_id(last_id)
            .await?
            .ok_or(FeedError::InvalidCursor(last_id))?;

        let mut filter = FeedFilter::from_scope(scope);
        filter.score_cursor = Some(ScoreCursor {
            score: cursor_item.score,
            id: cursor_item.id,
        });

        Ok(self
            .feed_store
            .find(&filter, FeedSort::ScoreDesc, 0, limit as u64)
            .await?)
    }

    /// Resolve content records for a page, batched per module type. The
    /// per-module fetches are independent and run concurrently. Items whose
    /// asset no longer resolves keep `content: None`.
    async fn hydrate(&self, items: Vec<FeedItem>) -> Result<Vec<FeedEntry>> {
        let mut by_module: HashMap<ModuleType, Vec<Uuid>> = HashMap::new();
        for item in &items {
            let ids = by_module.entry(item.module_type).or_default();
            if !ids.contains(&item.asset_ref) {
                ids.push(item.asset_ref);
            }
        }

        let fetches = by_module.into_iter().map(|(module_type, ids)| {
            let store = Arc::clone(&self.content_store);
            async move { store.fetch_by_ids(module_type, ids).await }
        });
        let resolved = try_join_all(fetches).await?;

        let mut content: HashMap<Uuid, ContentRecord> = HashMap::new();
        for map in resolved {
            content.extend(map);
        }

        Ok(items
            .into_iter()
            .map(|item| FeedEntry {
                content: content.get(&item.asset_ref).cloned(),
                item,
            })
            .collect())
    }
}
