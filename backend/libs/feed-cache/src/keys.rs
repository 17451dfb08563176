//! Deterministic cache key construction
//!
//! Both the read path and every invalidation caller must produce the exact
//! same key string for the same logical entry, so all key formats live here.
//!
//! Key formats:
//! - Single item: `feed:{feed_id}`
//! - List result: `feeds:{canonical-filter-json}:{limit}:{last_id|first}`
//!
//! Tag formats (invalidation dimensions):
//! - `forum:{forum_id}`
//! - `forumType:{forum_type}`
//! - `moduleType:{module_type}`

use serde::Serialize;
use std::fmt::Display;
use uuid::Uuid;

use crate::CacheResult;

/// Cursor placeholder for first-page list keys (no `last_id` yet).
pub const FIRST_PAGE: &str = "first";

/// Key for a single cached feed item.
pub fn item_key(feed_id: Uuid) -> String {
    format!("feed:{}", feed_id)
}

/// Key for a cached list result.
///
/// The filter is canonicalized before serialization so that semantically
/// identical filters always map to the same key string.
pub fn list_key<F: Serialize>(
    filter: &F,
    limit: u32,
    last_id: Option<Uuid>,
) -> CacheResult<String> {
    let filter_json = canonical_json(filter)?;
    let cursor = last_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| FIRST_PAGE.to_string());
    Ok(format!("feeds:{}:{}:{}", filter_json, limit, cursor))
}

/// Serialize a value to canonical JSON.
///
/// Round-trips through `serde_json::Value`, whose object representation is a
/// sorted map (the crate's default, without `preserve_order`), so object keys
/// come out in a stable order regardless of struct field declaration order.
pub fn canonical_json<T: Serialize>(value: &T) -> CacheResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(value.to_string())
}

/// Invalidation tag for a forum id.
pub fn forum_tag(forum_id: impl Display) -> String {
    format!("forum:{}", forum_id)
}

/// Invalidation tag for a forum type.
pub fn forum_type_tag(forum_type: impl Display) -> String {
    format!("forumType:{}", forum_type)
}

/// Invalidation tag for a module type.
pub fn module_type_tag(module_type: impl Display) -> String {
    format!("moduleType:{}", module_type)
}
