//! In-memory adapters for the persistence ports.
//!
//! Deterministic stand-ins used by the test suites and for embedding the
//! engine without external infrastructure. Sort and filter semantics match
//! what the port contracts require of a real document-store adapter.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CommentStore, ContentStore, FeedFilter, FeedSort, FeedStore, FeedUpdate, StoreError,
    StoreResult,
};
use crate::models::{ContentRecord, FeedItem, FeedStatus, ModuleType, NewFeedItem, ScoreUpdate};

#[derive(Default)]
pub struct MemoryFeedStore {
    items: RwLock<Vec<FeedItem>>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-built item, bypassing id assignment. Test seeding only.
    pub async fn insert_raw(&self, item: FeedItem) {
        self.items.write().await.push(item);
    }
}

fn sort_items(items: &mut [FeedItem], sort: FeedSort) {
    match sort {
        FeedSort::CreatedDesc => items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        FeedSort::ScoreDesc => items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.id.cmp(&a.id))
        }),
        FeedSort::IdAsc => items.sort_by(|a, b| a.id.cmp(&b.id)),
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn find(
        &self,
        filter: &FeedFilter,
        sort: FeedSort,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<FeedItem>> {
        let items = self.items.read().await;
        let mut matched: Vec<FeedItem> = items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        sort_items(&mut matched, sort);

        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FeedItem>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn create(&self, new: NewFeedItem) -> StoreResult<FeedItem> {
        let mut items = self.items.write().await;
        if items
            .iter()
            .any(|item| item.asset_ref == new.asset_ref && item.adoption_ref == new.adoption_ref)
        {
            return Err(StoreError::DuplicateKey(format!(
                "feed item exists for asset {} adoption {:?}",
                new.asset_ref, new.adoption_ref
            )));
        }

        let item = FeedItem {
            id: Uuid::new_v4(),
            forum: new.forum,
            module_type: new.module_type,
            asset_ref: new.asset_ref,
            feed_kind: new.feed_kind,
            adoption_ref: new.adoption_ref,
            adoption_kind: new.adoption_kind,
            status: FeedStatus::Published,
            score: 0.0,
            created_at: new.created_at,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn find_by_natural_key(
        &self,
        asset_ref: Uuid,
        adoption_ref: Option<Uuid>,
    ) -> StoreResult<Option<FeedItem>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|item| item.asset_ref == asset_ref && item.adoption_ref == adoption_ref)
            .cloned())
    }

    async fn update_many(&self, filter: &FeedFilter, update: &FeedUpdate) -> StoreResult<u64> {
        let mut items = self.items.write().await;
        let mut matched = 0;
        for item in items.iter_mut().filter(|item| filter.matches(item)) {
            if let Some(status) = update.status {
                item.status = status;
            }
            if let Some(delta) = update.score_delta {
                item.score += delta;
            }
            matched += 1;
        }
        Ok(matched)
    }

    async fn bulk_update_scores(&self, updates: &[ScoreUpdate]) -> StoreResult<()> {
        let mut items = self.items.write().await;
        let by_id: HashMap<Uuid, f64> = updates.iter().map(|u| (u.id, u.score)).collect();
        for item in items.iter_mut() {
            if let Some(score) = by_id.get(&item.id) {
                item.score = *score;
            }
        }
        Ok(())
    }

    async fn count(&self, filter: &FeedFilter) -> StoreResult<u64> {
        let items = self.items.read().await;
        Ok(items.iter().filter(|item| filter.matches(item)).count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    records: RwLock<HashMap<Uuid, ContentRecord>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ContentRecord) {
        self.records.write().await.insert(record.doc().id, record);
    }

    pub async fn remove(&self, id: Uuid) {
        self.records.write().await.remove(&id);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch_by_ids(
        &self,
        module_type: ModuleType,
        ids: Vec<Uuid>,
    ) -> StoreResult<HashMap<Uuid, ContentRecord>> {
        let records = self.records.read().await;
        Ok(ids
            .into_iter()
            .filter_map(|id| {
                records
                    .get(&id)
                    .filter(|record| record.module_type() == module_type)
                    .map(|record| (id, record.clone()))
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCommentStore {
    counts: RwLock<HashMap<Uuid, u64>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_count(&self, entity_id: Uuid, count: u64) {
        self.counts.write().await.insert(entity_id, count);
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn count_by_entity_ids(&self, entity_ids: Vec<Uuid>) -> StoreResult<HashMap<Uuid, u64>> {
        let counts = self.counts.read().await;
        Ok(entity_ids
            .into_iter()
            .filter_map(|id| counts.get(&id).map(|count| (id, *count)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForumRef, ForumType};
    use chrono::Utc;

    fn new_item(asset_ref: Uuid) -> NewFeedItem {
        NewFeedItem::original(
            ForumRef {
                forum_id: Uuid::new_v4(),
                forum_type: ForumType::Club,
            },
            ModuleType::Project,
            asset_ref,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_natural_key() {
        let store = MemoryFeedStore::new();
        let asset = Uuid::new_v4();

        store.create(new_item(asset)).await.unwrap();
        let err = store.create(new_item(asset)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_natural_key_none_is_exact() {
        let store = MemoryFeedStore::new();
        let asset = Uuid::new_v4();
        let adoption = Uuid::new_v4();

        let mut adopted = new_item(asset);
        adopted.feed_kind = crate::models::FeedKind::Adopted;
        adopted.adoption_ref = Some(adoption);
        store.create(adopted).await.unwrap();

        // No original entry exists for this asset
        assert!(store
            .find_by_natural_key(asset, None)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_by_natural_key(asset, Some(adoption))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_score_desc_sort_breaks_ties_by_id_desc() {
        let store = MemoryFeedStore::new();
        for _ in 0..5 {
            store.create(new_item(Uuid::new_v4())).await.unwrap();
        }

        let page = store
            .find(&FeedFilter::default(), FeedSort::ScoreDesc, 0, 10)
            .await
            .unwrap();
        // All scores are 0.0; ids must be strictly descending
        for pair in page.windows(2) {
            assert!(pair[0].id > pair[1].id);
        }
    }

    #[tokio::test]
    async fn test_content_store_filters_by_module_type() {
        let store = MemoryContentStore::new();
        let id = Uuid::new_v4();
        store
            .insert(ContentRecord::Issue(crate::models::ContentDoc {
                id,
                title: "Broken signage".to_string(),
                author_ref: None,
                engagement: Default::default(),
                created_at: Utc::now(),
            }))
            .await;

        let hit = store
            .fetch_by_ids(ModuleType::Issue, vec![id])
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = store
            .fetch_by_ids(ModuleType::Project, vec![id])
            .await
            .unwrap();
        assert!(miss.is_empty());
    }
}
