//! Batched comment-count resolution for feed items
//!
//! Comments attach to the adoption record for adopted entries and to the
//! underlying asset for original entries, so a batch is partitioned by
//! feed kind and resolved with one grouped count query per partition. The
//! per-entity counts then fan back out to every feed item sharing that
//! entity.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::{FeedItem, FeedKind};
use crate::store::{CommentStore, StoreResult};

/// Resolve comment counts for a batch of feed items, keyed by feed item id.
///
/// Items with no matching comments are absent from the map; callers default
/// missing entries to zero. Empty partitions issue no query.
pub async fn resolve_comment_counts(
    store: &dyn CommentStore,
    items: &[FeedItem],
) -> StoreResult<HashMap<Uuid, u64>> {
    let mut adopted_ids: HashSet<Uuid> = HashSet::new();
    let mut original_ids: HashSet<Uuid> = HashSet::new();

    for item in items {
        match item.feed_kind {
            FeedKind::Adopted => {
                if let Some(adoption_ref) = item.adoption_ref {
                    adopted_ids.insert(adoption_ref);
                }
            }
            FeedKind::Original => {
                original_ids.insert(item.asset_ref);
            }
        }
    }

    if adopted_ids.is_empty() && original_ids.is_empty() {
        return Ok(HashMap::new());
    }

    // The two partitions are independent; count them concurrently.
    let (adopted_counts, original_counts) = tokio::join!(
        count_partition(store, adopted_ids),
        count_partition(store, original_ids),
    );
    let (adopted_counts, original_counts) = (adopted_counts?, original_counts?);

    let mut counts = HashMap::new();
    for item in items {
        let entity_count = match item.feed_kind {
            FeedKind::Adopted => item
                .adoption_ref
                .and_then(|adoption_ref| adopted_counts.get(&adoption_ref)),
            FeedKind::Original => original_counts.get(&item.asset_ref),
        };
        if let Some(count) = entity_count {
            counts.insert(item.id, *count);
        }
    }
    Ok(counts)
}

async fn count_partition(
    store: &dyn CommentStore,
    entity_ids: HashSet<Uuid>,
) -> StoreResult<HashMap<Uuid, u64>> {
    if entity_ids.is_empty() {
        return Ok(HashMap::new());
    }
    store
        .count_by_entity_ids(entity_ids.into_iter().collect())
        .await
}
