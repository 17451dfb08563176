//! Feed mutation gateway
//!
//! Creation and status/score mutation entry points. After every successful
//! store write the gateway drops the affected cache entries: the item key
//! directly, plus every list key tracked under the item's forum, forum-type
//! and module-type tags. Cache failures after a successful write are logged
//! and swallowed — the next read repopulates, bounded by TTL.

use feed_cache::{keys, TagCache};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FeedError, Result};
use crate::models::{FeedItem, FeedKind, FeedStatus, NewFeedItem};
use crate::store::{FeedFilter, FeedSort, FeedStore, FeedUpdate, StoreError};

pub struct FeedMutationService {
    feed_store: Arc<dyn FeedStore>,
    cache: Arc<TagCache>,
}

impl FeedMutationService {
    pub fn new(feed_store: Arc<dyn FeedStore>, cache: Arc<TagCache>) -> Self {
        Self { feed_store, cache }
    }

    /// Create a feed item, upserting by the `(asset_ref, adoption_ref)`
    /// natural key: when a concurrent or earlier creation already wrote the
    /// pair, the existing record is returned instead of an error.
    pub async fn create_feed_item(&self, input: NewFeedItem) -> Result<FeedItem> {
        validate(&input)?;

        match self.feed_store.create(input.clone()).await {
            Ok(item) => {
                debug!(feed_id = %item.id, forum_id = %item.forum.forum_id, "Feed item created");
                self.invalidate_for(&item).await;
                Ok(item)
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(
                    asset_ref = %input.asset_ref,
                    "Duplicate feed creation resolved to existing record"
                );
                self.feed_store
                    .find_by_natural_key(input.asset_ref, input.adoption_ref)
                    .await?
                    .ok_or_else(|| {
                        FeedError::Store(StoreError::Backend(format!(
                            "duplicate reported for asset {} but no record found",
                            input.asset_ref
                        )))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update status and/or increment the score of every feed item for an
    /// asset, optionally scoped to one adoption. Zero matches is a no-op.
    pub async fn update_status_or_score(
        &self,
        asset_ref: Uuid,
        adoption_ref: Option<Uuid>,
        status: Option<FeedStatus>,
        score_delta: Option<f64>,
    ) -> Result<()> {
        let filter = FeedFilter {
            asset_ref: Some(asset_ref),
            adoption_ref,
            ..Default::default()
        };
        let update = FeedUpdate {
            status,
            score_delta,
        };

        let matched = self.feed_store.update_many(&filter, &update).await?;
        if matched == 0 {
            debug!(asset_ref = %asset_ref, "No feed items matched update");
            return Ok(());
        }

        // Natural-key fields are immutable, so the same filter re-selects
        // the rows just written.
        let items = self
            .feed_store
            .find(&filter, FeedSort::IdAsc, 0, matched)
            .await?;
        for item in &items {
            self.invalidate_for(item).await;
        }

        debug!(asset_ref = %asset_ref, matched, "Feed items updated and caches invalidated");
        Ok(())
    }

    /// Invalidation fan-out for one mutated item. The tag invalidations are
    /// independent and run concurrently.
    async fn invalidate_for(&self, item: &FeedItem) {
        if let Err(e) = self.cache.delete(&keys::item_key(item.id)).await {
            warn!(feed_id = %item.id, error = %e, "Item cache delete failed");
        }

        let tags = vec![
            keys::forum_tag(item.forum.forum_id),
            keys::forum_type_tag(item.forum.forum_type),
            keys::module_type_tag(item.module_type),
        ];
        self.cache.invalidate_tags(&tags).await;
    }
}

fn validate(input: &NewFeedItem) -> Result<()> {
    match (input.feed_kind, input.adoption_ref) {
        (FeedKind::Adopted, None) => Err(FeedError::Validation(
            "adopted feed item requires an adoption ref".to_string(),
        )),
        (FeedKind::Original, Some(_)) => Err(FeedError::Validation(
            "original feed item cannot carry an adoption ref".to_string(),
        )),
        _ => Ok(()),
    }
}
