//! Time-decayed relevance scoring
//!
//! Pure scoring of one feed item from its engagement counters and age:
//! - Weighted sum: adoptions and comments count double, relevant votes
//!   single, irrelevant votes subtract
//! - Gravity decay: raw / (age_hours + 2)^1.1 — the 2-hour offset caps how
//!   high a brand-new item can score and keeps the denominator away from
//!   zero
//! - Clamp at zero: an item with net-negative engagement bottoms out at 0
//!   rather than ranking below neutral items
//!
//! Deterministic for a fixed `now`; callers sample `now` once per batch so
//! a rescoring pass is internally consistent.

use chrono::{DateTime, Utc};

use crate::models::Engagement;

/// Decay exponent
pub const GRAVITY: f64 = 1.1;

/// Hour offset added to the age before exponentiation
pub const AGE_OFFSET_HOURS: f64 = 2.0;

const ADOPTION_WEIGHT: f64 = 2.0;
const COMMENT_WEIGHT: f64 = 2.0;
const RELEVANT_WEIGHT: f64 = 1.0;
const IRRELEVANT_WEIGHT: f64 = -1.0;

/// Compute the rank score for one item.
///
/// `age_hours` may be fractional and is used as-is, never rounded.
pub fn rank_score(engagement: &Engagement, comment_count: u64, age_hours: f64) -> f64 {
    let raw = engagement.adoption_count() as f64 * ADOPTION_WEIGHT
        + comment_count as f64 * COMMENT_WEIGHT
        + engagement.relevant_count as f64 * RELEVANT_WEIGHT
        + engagement.irrelevant_count as f64 * IRRELEVANT_WEIGHT;

    let decayed = raw / (age_hours + AGE_OFFSET_HOURS).powf(GRAVITY);

    decayed.max(0.0)
}

/// Fractional hours between `created_at` and `now`, floored at zero for
/// records stamped ahead of the sampling clock.
pub fn age_in_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - created_at).num_milliseconds().max(0);
    millis as f64 / 3_600_000.0
}
