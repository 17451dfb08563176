//! Error types for the feed engine
//!
//! Read paths distinguish "not found" from an empty result set; cache
//! failures never surface here (the callers degrade to a store read and
//! log), while store failures always propagate.

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Result type for feed engine operations
pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Error, Debug)]
pub enum FeedError {
    /// No feed item with this id exists
    #[error("feed item not found: {0}")]
    NotFound(Uuid),

    /// Pagination cursor does not resolve to a feed item
    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(Uuid),

    /// Input failed an engine invariant
    #[error("validation error: {0}")]
    Validation(String),

    /// Persistence collaborator failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Cache key construction or payload encoding failed
    #[error("cache error: {0}")]
    Cache(#[from] feed_cache::CacheError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
