//! Ratings table, grouped per user at load time.
//!
//! Ratings arrive min-max scaled to `[0, 1]` from the offline pipeline. The
//! table is grouped once at construction and read-only afterwards, so the
//! per-request path is a single map lookup.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::codec::{AnimeId, UserId};

/// One row of the preprocessed ratings table. Extra columns carried by the
/// upstream CSV (`user_encoded`, `anime_decoded`) are ignored by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub anime_id: AnimeId,
    pub rating: f32,
}

/// Read-only ratings lookup, one entry list per user in file order.
#[derive(Debug, Clone)]
pub struct RatingsTable {
    by_user: HashMap<UserId, Vec<(AnimeId, f32)>>,
    total: usize,
}

impl RatingsTable {
    pub fn new(rows: impl IntoIterator<Item = RatingRecord>) -> Self {
        let mut by_user: HashMap<UserId, Vec<(AnimeId, f32)>> = HashMap::new();
        let mut total = 0;
        for row in rows {
            by_user
                .entry(row.user_id)
                .or_default()
                .push((row.anime_id, row.rating));
            total += 1;
        }
        Self { by_user, total }
    }

    /// All `(anime, rating)` pairs for a user, empty for unknown users.
    pub fn for_user(&self, user: UserId) -> &[(AnimeId, f32)] {
        self.by_user
            .get(&user)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of rating rows.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct users with at least one rating.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

/// Linear-interpolation percentile, matching the semantics the offline
/// tooling used for its threshold. Returns `None` for an empty slice.
pub(crate) fn percentile(values: &[f32], pct: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let fraction = (rank - lo as f64) as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * fraction)
}
