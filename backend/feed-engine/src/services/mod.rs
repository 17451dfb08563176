//! Service layer for the feed engine
//!
//! - scoring: pure time-decay rank scoring
//! - comments: batched comment-count resolution
//! - query: cached, paginated feed reads
//! - gateway: mutations with cache invalidation fan-out

pub mod comments;
pub mod gateway;
pub mod query;
pub mod scoring;

pub use comments::resolve_comment_counts;
pub use gateway::FeedMutationService;
pub use query::FeedQueryService;
pub use scoring::{age_in_hours, rank_score};
