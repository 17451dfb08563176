//! Core data model: feed items, the content records they reference, and
//! the read/response shapes built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Community container that owns feed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForumType {
    Club,
    Node,
    Chapter,
}

impl std::fmt::Display for ForumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForumType::Club => write!(f, "club"),
            ForumType::Node => write!(f, "node"),
            ForumType::Chapter => write!(f, "chapter"),
        }
    }
}

/// Discriminator for the content collection an `asset_ref` resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleType {
    Project,
    Issue,
    Debate,
    Rule,
    StandardAsset,
    GenericPost,
}

impl std::fmt::Display for ModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleType::Project => write!(f, "project"),
            ModuleType::Issue => write!(f, "issue"),
            ModuleType::Debate => write!(f, "debate"),
            ModuleType::Rule => write!(f, "rule"),
            ModuleType::StandardAsset => write!(f, "standardAsset"),
            ModuleType::GenericPost => write!(f, "genericPost"),
        }
    }
}

/// Whether a feed entry is the item's original appearance or a re-publish
/// by another forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedKind {
    Original,
    Adopted,
}

/// Which kind of forum performed an adoption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdoptionKind {
    Node,
    Club,
}

/// Feed item lifecycle status. Items are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedStatus {
    Published,
    Archived,
    Deleted,
}

/// The forum a feed item belongs to. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumRef {
    pub forum_id: Uuid,
    pub forum_type: ForumType,
}

/// One piece of content's appearance in a forum's feed: the unit being
/// ranked and cached.
///
/// `(asset_ref, adoption_ref)` is the natural key; `adoption_ref` is
/// present iff `feed_kind` is `Adopted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: Uuid,
    pub forum: ForumRef,
    pub module_type: ModuleType,
    pub asset_ref: Uuid,
    pub feed_kind: FeedKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption_ref: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption_kind: Option<AdoptionKind>,
    pub status: FeedStatus,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Creation payload for a feed item. The store assigns the id; status
/// starts at `Published` and score at 0.
#[derive(Debug, Clone)]
pub struct NewFeedItem {
    pub forum: ForumRef,
    pub module_type: ModuleType,
    pub asset_ref: Uuid,
    pub feed_kind: FeedKind,
    pub adoption_ref: Option<Uuid>,
    pub adoption_kind: Option<AdoptionKind>,
    pub created_at: DateTime<Utc>,
}

impl NewFeedItem {
    pub fn original(
        forum: ForumRef,
        module_type: ModuleType,
        asset_ref: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            forum,
            module_type,
            asset_ref,
            feed_kind: FeedKind::Original,
            adoption_ref: None,
            adoption_kind: None,
            created_at,
        }
    }

    pub fn adopted(
        forum: ForumRef,
        module_type: ModuleType,
        asset_ref: Uuid,
        adoption_ref: Uuid,
        adoption_kind: AdoptionKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            forum,
            module_type,
            asset_ref,
            feed_kind: FeedKind::Adopted,
            adoption_ref: Some(adoption_ref),
            adoption_kind: Some(adoption_kind),
            created_at,
        }
    }
}

/// Engagement counters a content record exposes for scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub relevant_count: u64,
    pub irrelevant_count: u64,
    pub adopted_node_count: u64,
    pub adopted_club_count: u64,
}

impl Engagement {
    /// Total adoptions across forum kinds.
    pub fn adoption_count(&self) -> u64 {
        self.adopted_node_count + self.adopted_club_count
    }
}

/// Scoring-relevant projection of a content record. The full content shape
/// is owned by the content collaborator; only these fields cross the
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDoc {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_ref: Option<Uuid>,
    pub engagement: Engagement,
    pub created_at: DateTime<Utc>,
}

/// A content record, tagged by the collection it came from. Every variant
/// exposes the same scoring surface through the shared accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "moduleType", content = "doc", rename_all = "camelCase")]
pub enum ContentRecord {
    Project(ContentDoc),
    Issue(ContentDoc),
    Debate(ContentDoc),
    Rule(ContentDoc),
    StandardAsset(ContentDoc),
    GenericPost(ContentDoc),
}

impl ContentRecord {
    pub fn module_type(&self) -> ModuleType {
        match self {
            ContentRecord::Project(_) => ModuleType::Project,
            ContentRecord::Issue(_) => ModuleType::Issue,
            ContentRecord::Debate(_) => ModuleType::Debate,
            ContentRecord::Rule(_) => ModuleType::Rule,
            ContentRecord::StandardAsset(_) => ModuleType::StandardAsset,
            ContentRecord::GenericPost(_) => ModuleType::GenericPost,
        }
    }

    pub fn doc(&self) -> &ContentDoc {
        match self {
            ContentRecord::Project(doc)
            | ContentRecord::Issue(doc)
            | ContentRecord::Debate(doc)
            | ContentRecord::Rule(doc)
            | ContentRecord::StandardAsset(doc)
            | ContentRecord::GenericPost(doc) => doc,
        }
    }

    pub fn engagement(&self) -> &Engagement {
        &self.doc().engagement
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.doc().created_at
    }
}

/// Caller-facing filter dimensions for list reads. Doubles as the input to
/// cache-key canonicalization, so every field is skipped when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum_type: Option<ForumType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<ModuleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_kind: Option<FeedKind>,
}

impl FeedScope {
    pub fn for_forum(forum_id: Uuid) -> Self {
        Self {
            forum_id: Some(forum_id),
            ..Default::default()
        }
    }

    /// Invalidation tags for the dimensions present on this scope.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        if let Some(forum_id) = self.forum_id {
            tags.push(feed_cache::keys::forum_tag(forum_id));
        }
        if let Some(forum_type) = self.forum_type {
            tags.push(feed_cache::keys::forum_type_tag(forum_type));
        }
        if let Some(module_type) = self.module_type {
            tags.push(feed_cache::keys::module_type_tag(module_type));
        }
        tags
    }
}

/// A feed item hydrated with its content record for display.
///
/// `content` is `None` when the referenced asset no longer resolves; read
/// paths surface the entry rather than failing the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub item: FeedItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentRecord>,
}

/// One page of a ranked feed read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub entries: Vec<FeedEntry>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

/// Bulk-write unit produced by the rescoring job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub id: Uuid,
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> FeedItem {
        FeedItem {
            id: Uuid::new_v4(),
            forum: ForumRef {
                forum_id: Uuid::new_v4(),
                forum_type: ForumType::Club,
            },
            module_type: ModuleType::Project,
            asset_ref: Uuid::new_v4(),
            feed_kind: FeedKind::Original,
            adoption_ref: None,
            adoption_kind: None,
            status: FeedStatus::Published,
            score: 0.0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_feed_item_serializes_camel_case() {
        let json = serde_json::to_value(sample_item()).unwrap();
        assert!(json.get("moduleType").is_some());
        assert!(json.get("feedKind").is_some());
        assert!(json.get("createdAt").is_some());
        // Absent adoption fields are omitted entirely
        assert!(json.get("adoptionRef").is_none());
    }

    #[test]
    fn test_feed_item_roundtrip() {
        let item = sample_item();
        let json = serde_json::to_string(&item).unwrap();
        let back: FeedItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, item.id);
        assert_eq!(back.feed_kind, FeedKind::Original);
        assert_eq!(back.status, FeedStatus::Published);
    }

    #[test]
    fn test_module_type_display_matches_serde() {
        let json = serde_json::to_string(&ModuleType::StandardAsset).unwrap();
        assert_eq!(json, format!("\"{}\"", ModuleType::StandardAsset));
        let json = serde_json::to_string(&ForumType::Chapter).unwrap();
        assert_eq!(json, format!("\"{}\"", ForumType::Chapter));
    }

    #[test]
    fn test_engagement_adoption_count() {
        let engagement = Engagement {
            adopted_node_count: 2,
            adopted_club_count: 3,
            ..Default::default()
        };
        assert_eq!(engagement.adoption_count(), 5);
    }

    #[test]
    fn test_content_record_accessors() {
        let doc = ContentDoc {
            id: Uuid::new_v4(),
            title: "Charter draft".to_string(),
            author_ref: None,
            engagement: Engagement::default(),
            created_at: Utc::now(),
        };
        let record = ContentRecord::Debate(doc.clone());
        assert_eq!(record.module_type(), ModuleType::Debate);
        assert_eq!(record.doc().id, doc.id);
    }

    #[test]
    fn test_scope_tags_only_for_present_dimensions() {
        let forum_id = Uuid::new_v4();
        let scope = FeedScope {
            forum_id: Some(forum_id),
            module_type: Some(ModuleType::Project),
            ..Default::default()
        };
        let tags = scope.tags();
        assert_eq!(
            tags,
            vec![
                format!("forum:{}", forum_id),
                "moduleType:project".to_string()
            ]
        );

        assert!(FeedScope::default().tags().is_empty());
    }
}
