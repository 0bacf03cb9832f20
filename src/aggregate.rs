//! Neighbor aggregation: pool what similar users like.
//!
//! Every neighbor contributes their preferred titles (minus whatever the
//! target already prefers) to a shared pool; a title's support count is the
//! number of contributions it received. Ties on support keep first-occurrence
//! order in the pool, which makes the output a deterministic function of
//! neighbor order.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::catalog::{AnimeCatalog, AnimeRecord};
use crate::codec::UserId;
use crate::preferences::{preferences, PreferredAnime};
use crate::ratings::RatingsTable;

/// A pooled candidate and the number of neighbors that contributed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportedAnime {
    pub anime: AnimeRecord,
    pub support: usize,
}

/// Pool preferences across `similar_users` (most-similar first), excluding
/// titles already in `target_preferences`, and keep the `top_n` titles with
/// the highest support.
///
/// Neighbors with no qualifying preferences contribute nothing. Titles that
/// no longer resolve against the catalog are skipped after truncation, the
/// same way the upstream pipeline tolerated stale pool entries, so the
/// result may be shorter than `top_n`.
pub fn aggregate(
    similar_users: &[UserId],
    target_preferences: &[PreferredAnime],
    ratings: &RatingsTable,
    catalog: &AnimeCatalog,
    top_n: usize,
) -> Vec<SupportedAnime> {
    if top_n == 0 {
        return Vec::new();
    }

    let already_preferred: HashSet<&str> = target_preferences
        .iter()
        .map(|preferred| preferred.title.as_str())
        .collect();

    let mut pool: Vec<String> = Vec::new();
    for &neighbor in similar_users {
        let neighbor_preferences = preferences(neighbor, ratings, catalog);
        pool.extend(
            neighbor_preferences
                .into_iter()
                .filter(|preferred| !already_preferred.contains(preferred.title.as_str()))
                .map(|preferred| preferred.title),
        );
    }
    if pool.is_empty() {
        return Vec::new();
    }

    // Count support while remembering each title's first position in the
    // pool; the position is the tie-break.
    let mut support: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, title) in pool.iter().enumerate() {
        let entry = support.entry(title.as_str()).or_insert((0, position));
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = support
        .into_iter()
        .map(|(title, (count, first_position))| (title, count, first_position))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .filter_map(|(title, count, _)| match catalog.by_title(title) {
            Some(record) => Some(SupportedAnime {
                anime: record.clone(),
                support: count,
            }),
            None => {
                debug!(title, "pooled title missing from catalog, skipped");
                None
            }
        })
        .collect()
}
