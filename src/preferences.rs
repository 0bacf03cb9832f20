//! Preference extraction: which titles does a user actually like.
//!
//! A user's "liked" set is the slice of their ratings at or above their own
//! 75th-percentile rating, joined against the catalog for title and genre.
//! A user with no ratings has no defined percentile; the documented policy
//! is empty-in, empty-out rather than an error, so the condition propagates
//! as an empty (or content-only) recommendation further up.

use tracing::debug;

use crate::catalog::AnimeCatalog;
use crate::codec::{AnimeId, UserId};
use crate::ratings::{percentile, RatingsTable};

/// Percentile used as the per-user preference threshold.
const PREFERENCE_PERCENTILE: f64 = 75.0;

/// A catalog row the user rated at or above their preference threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferredAnime {
    pub anime_id: AnimeId,
    pub title: String,
    pub genre: Option<String>,
    pub rating: f32,
}

/// Extract a user's preferred titles, ordered by descending rating.
///
/// Equal ratings keep the user's original row order (stable sort). Ratings
/// whose anime id is absent from the catalog are dropped; they cannot be
/// surfaced without a title.
pub fn preferences(
    user: UserId,
    ratings: &RatingsTable,
    catalog: &AnimeCatalog,
) -> Vec<PreferredAnime> {
    let rated = ratings.for_user(user);
    let Some(threshold) = percentile(
        &rated.iter().map(|&(_, rating)| rating).collect::<Vec<_>>(),
        PREFERENCE_PERCENTILE,
    ) else {
        return Vec::new();
    };

    let mut kept: Vec<(AnimeId, f32)> = rated
        .iter()
        .copied()
        .filter(|&(_, rating)| rating >= threshold)
        .collect();
    kept.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    kept.into_iter()
        .filter_map(|(anime_id, rating)| match catalog.by_id(anime_id) {
            Some(record) => Some(PreferredAnime {
                anime_id,
                title: record.title.clone(),
                genre: record.genre.clone(),
                rating,
            }),
            None => {
                debug!(%user, %anime_id, "rated anime missing from catalog, dropped");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AnimeRecord;
    use crate::ratings::RatingRecord;

    fn catalog() -> AnimeCatalog {
        let record = |id: u32, title: &str| AnimeRecord {
            anime_id: AnimeId(id),
            title: title.to_string(),
            score: None,
            genre: Some("Drama".to_string()),
            episodes: None,
            kind: None,
            members: None,
            premiered: None,
        };
        AnimeCatalog::new(vec![
            record(10, "Alpha"),
            record(20, "Beta"),
            record(30, "Gamma"),
        ])
    }

    fn rating(user: u32, anime: u32, value: f32) -> RatingRecord {
        RatingRecord {
            user_id: UserId(user),
            anime_id: AnimeId(anime),
            rating: value,
        }
    }

    #[test]
    fn threshold_keeps_only_top_quartile() {
        // Threshold over [0.3, 0.6, 0.9] interpolates to 0.75, so only the
        // 0.9 rating qualifies.
        let ratings = RatingsTable::new([
            rating(1, 10, 0.9),
            rating(1, 20, 0.6),
            rating(1, 30, 0.3),
        ]);
        let prefs = preferences(UserId(1), &ratings, &catalog());
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].anime_id, AnimeId(10));
        assert_eq!(prefs[0].title, "Alpha");
        assert!((prefs[0].rating - 0.9).abs() < 1e-6);
    }

    #[test]
    fn ordered_by_descending_rating() {
        // Threshold over five values lands exactly on 0.9 (rank 3 of the
        // ascending sort), so 0.9 and 1.0 qualify.
        let ratings = RatingsTable::new([
            rating(1, 20, 0.9),
            rating(1, 30, 0.0),
            rating(1, 10, 1.0),
            rating(1, 99, 0.0),
            rating(1, 40, 0.0),
        ]);
        let prefs = preferences(UserId(1), &ratings, &catalog());
        let titles: Vec<&str> = prefs.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn uniform_ratings_keep_everything_in_row_order() {
        let ratings = RatingsTable::new([
            rating(1, 30, 0.5),
            rating(1, 10, 0.5),
            rating(1, 20, 0.5),
        ]);
        let prefs = preferences(UserId(1), &ratings, &catalog());
        let titles: Vec<&str> = prefs.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn user_without_ratings_yields_empty() {
        let ratings = RatingsTable::new([]);
        assert!(preferences(UserId(1), &ratings, &catalog()).is_empty());
    }

    #[test]
    fn single_rating_is_its_own_threshold() {
        let ratings = RatingsTable::new([rating(1, 20, 0.2)]);
        let prefs = preferences(UserId(1), &ratings, &catalog());
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].anime_id, AnimeId(20));
    }

    #[test]
    fn ratings_missing_from_catalog_are_dropped() {
        let ratings = RatingsTable::new([rating(1, 99, 0.9), rating(1, 10, 0.9)]);
        let prefs = preferences(UserId(1), &ratings, &catalog());
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].anime_id, AnimeId(10));
    }
}
