//! Port traits for the external persistence collaborators.
//!
//! The engine owns no persistence: feed items live in an external document
//! store, content records in per-collection stores, and comment counts in
//! the comment store. Adapters implement these traits; `memory` ships
//! deterministic in-process implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ContentRecord, FeedItem, FeedKind, FeedScope, FeedStatus, ForumType, ModuleType, NewFeedItem,
    ScoreUpdate,
};

pub mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Write violated the natural-key uniqueness constraint
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend failure (connection loss, write failure, ...)
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Keyset cursor position for score-ordered pagination.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCursor {
    pub score: f64,
    pub id: Uuid,
}

/// Store-level query filter. Absent fields are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct FeedFilter {
    pub forum_id: Option<Uuid>,
    pub forum_type: Option<ForumType>,
    pub module_type: Option<ModuleType>,
    pub feed_kind: Option<FeedKind>,
    pub status: Option<FeedStatus>,
    pub asset_ref: Option<Uuid>,
    pub adoption_ref: Option<Uuid>,
    /// Inclusive lower bound on `created_at`
    pub created_at_or_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
    /// Items strictly after this position in `(score desc, id desc)` order
    pub score_cursor: Option<ScoreCursor>,
}

impl FeedFilter {
    /// Store filter for a caller-facing scope; list reads only ever see
    /// published items.
    pub fn from_scope(scope: &FeedScope) -> Self {
        Self {
            forum_id: scope.forum_id,
            forum_type: scope.forum_type,
            module_type: scope.module_type,
            feed_kind: scope.feed_kind,
            status: Some(FeedStatus::Published),
            ..Default::default()
        }
    }

    pub fn matches(&self, item: &FeedItem) -> bool {
        if let Some(forum_id) = self.forum_id {
            if item.forum.forum_id != forum_id {
                return false;
            }
        }
        if let Some(forum_type) = self.forum_type {
            if item.forum.forum_type != forum_type {
                return false;
            }
        }
        if let Some(module_type) = self.module_type {
            if item.module_type != module_type {
                return false;
            }
        }
        if let Some(feed_kind) = self.feed_kind {
            if item.feed_kind != feed_kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if item.status != status {
                return false;
            }
        }
        if let Some(asset_ref) = self.asset_ref {
            if item.asset_ref != asset_ref {
                return false;
            }
        }
        if let Some(adoption_ref) = self.adoption_ref {
            if item.adoption_ref != Some(adoption_ref) {
                return false;
            }
        }
        if let Some(bound) = self.created_at_or_after {
            if item.created_at < bound {
                return false;
            }
        }
        if let Some(bound) = self.created_before {
            if item.created_at >= bound {
                return false;
            }
        }
        if let Some(cursor) = self.score_cursor {
            // Tie-break on id keeps the traversal stable and gap-free when
            // many items share a score.
            let after = item.score < cursor.score
                || (item.score == cursor.score && item.id < cursor.id);
            if !after {
                return false;
            }
        }
        true
    }
}

/// Sort orders a feed store must support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSort {
    /// `created_at` desc, id desc tie-break
    CreatedDesc,
    /// `score` desc, id desc tie-break
    ScoreDesc,
    /// id asc — the stable table-scan order used by the rescoring walk
    IdAsc,
}

/// Field updates applied by `FeedStore::update_many`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedUpdate {
    pub status: Option<FeedStatus>,
    pub score_delta: Option<f64>,
}

#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn find(
        &self,
        filter: &FeedFilter,
        sort: FeedSort,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<FeedItem>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FeedItem>>;

    /// Insert a new item. Must fail with [`StoreError::DuplicateKey`] when
    /// an item with the same `(asset_ref, adoption_ref)` pair exists.
    async fn create(&self, item: NewFeedItem) -> StoreResult<FeedItem>;

    /// Exact natural-key lookup; `adoption_ref: None` matches only items
    /// without an adoption (unlike `FeedFilter`, where `None` is
    /// unconstrained).
    async fn find_by_natural_key(
        &self,
        asset_ref: Uuid,
        adoption_ref: Option<Uuid>,
    ) -> StoreResult<Option<FeedItem>>;

    /// Apply `update` to every item matching `filter`; returns the match
    /// count. Updates must be visible to an immediately following read.
    async fn update_many(&self, filter: &FeedFilter, update: &FeedUpdate) -> StoreResult<u64>;

    /// Persist recomputed scores as one batched write.
    async fn bulk_update_scores(&self, updates: &[ScoreUpdate]) -> StoreResult<()>;

    async fn count(&self, filter: &FeedFilter) -> StoreResult<u64>;
}

/// Batched lookup against one content collection.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch_by_ids(
        &self,
        module_type: ModuleType,
        ids: Vec<Uuid>,
    ) -> StoreResult<HashMap<Uuid, ContentRecord>>;
}

/// Grouped comment counting. Counts cover top-level, non-reply comments
/// whose entity id matches; entities with no comments are absent from the
/// result map.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn count_by_entity_ids(&self, entity_ids: Vec<Uuid>) -> StoreResult<HashMap<Uuid, u64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForumRef;

    fn item(score: f64, id: Uuid) -> FeedItem {
        FeedItem {
            id,
            forum: ForumRef {
                forum_id: Uuid::new_v4(),
                forum_type: ForumType::Node,
            },
            module_type: ModuleType::Issue,
            asset_ref: Uuid::new_v4(),
            feed_kind: FeedKind::Original,
            adoption_ref: None,
            adoption_kind: None,
            status: FeedStatus::Published,
            score,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_score_cursor_excludes_items_at_or_before_position() {
        let cursor_id = Uuid::new_v4();
        let filter = FeedFilter {
            score_cursor: Some(ScoreCursor {
                score: 5.0,
                id: cursor_id,
            }),
            ..Default::default()
        };

        // Lower score passes
        assert!(filter.matches(&item(4.9, Uuid::new_v4())));
        // Higher score does not
        assert!(!filter.matches(&item(5.1, Uuid::new_v4())));
        // Equal score: only ids strictly below the cursor id pass
        let below = Uuid::from_u128(0);
        let above = Uuid::from_u128(u128::MAX);
        assert!(filter.matches(&item(5.0, below)));
        assert!(!filter.matches(&item(5.0, above)));
        // The cursor row itself is excluded
        assert!(!filter.matches(&item(5.0, cursor_id)));
    }

    #[test]
    fn test_adoption_ref_filter_is_exact_when_present() {
        let adoption = Uuid::new_v4();
        let filter = FeedFilter {
            adoption_ref: Some(adoption),
            ..Default::default()
        };

        let mut adopted = item(0.0, Uuid::new_v4());
        adopted.feed_kind = FeedKind::Adopted;
        adopted.adoption_ref = Some(adoption);
        assert!(filter.matches(&adopted));

        let original = item(0.0, Uuid::new_v4());
        assert!(!filter.matches(&original));
    }

    #[test]
    fn test_from_scope_defaults_to_published() {
        let scope = FeedScope::default();
        let filter = FeedFilter::from_scope(&scope);
        assert_eq!(filter.status, Some(FeedStatus::Published));

        let mut archived = item(0.0, Uuid::new_v4());
        archived.status = FeedStatus::Archived;
        assert!(!filter.matches(&archived));
    }

    #[test]
    fn test_created_at_window_bounds() {
        let now = Utc::now();
        let filter = FeedFilter {
            created_at_or_after: Some(now),
            ..Default::default()
        };
        let mut fresh = item(0.0, Uuid::new_v4());
        fresh.created_at = now;
        assert!(filter.matches(&fresh));

        let filter = FeedFilter {
            created_before: Some(now),
            ..Default::default()
        };
        assert!(!filter.matches(&fresh));
    }
}
