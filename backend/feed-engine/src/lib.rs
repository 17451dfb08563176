//! Feed ranking and caching engine
//!
//! Given a stream of feed items wrapping polymorphic content records, this
//! crate computes time-decayed popularity scores, serves paginated ranked
//! views behind a tag-invalidated cache, and refreshes scores with a
//! periodic full-collection walk. Persistence, content and comment storage
//! are external collaborators reached through the port traits in [`store`];
//! the cache layer lives in the `feed-cache` crate.

pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod store;

pub use config::EngineConfig;
pub use error::{FeedError, Result};
pub use jobs::{start_rescorer, RescoreSummary, Rescorer};
pub use models::{
    AdoptionKind, ContentDoc, ContentRecord, Engagement, FeedEntry, FeedItem, FeedKind, FeedPage,
    FeedScope, FeedStatus, ForumRef, ForumType, ModuleType, NewFeedItem, ScoreUpdate,
};
pub use services::{FeedMutationService, FeedQueryService};
pub use store::{
    CommentStore, ContentStore, FeedFilter, FeedSort, FeedStore, FeedUpdate, ScoreCursor,
    StoreError, StoreResult,
};
