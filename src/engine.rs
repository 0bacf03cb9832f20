//! The hybrid recommendation engine.
//!
//! [`HybridRecommender`] wires the codecs, embedding matrices, and metadata
//! tables together and serves the two-signal blend: the user-based pathway
//! (similar users → pooled preferences) and the content-based pathway
//! (expansion of those pooled titles through item-item similarity). All
//! artifact state is shared immutably, so one engine value can serve
//! concurrent requests without locking; per-request state lives on the
//! stack of each call.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::artifacts::Artifacts;
use crate::catalog::AnimeRef;
use crate::codec::{AnimeId, UserId};
use crate::config::RecommenderConfig;
use crate::embedding::RankDirection;
use crate::error::RecommendError;
use crate::expand::expand;
use crate::metrics::metrics_recorder;
use crate::preferences::{preferences, PreferredAnime};

/// Default weight for each signal when the caller does not override them.
pub const DEFAULT_SIGNAL_WEIGHT: f32 = 0.5;

/// A single hybrid recommendation request.
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    /// Target user; must be known to the user codec.
    pub user_id: UserId,
    /// Weight added once per user-based candidate title.
    pub user_weight: f32,
    /// Weight added per occurrence of a title in the content expansion.
    pub content_weight: f32,
    /// Optional cooperative cancellation flag, checked between
    /// content-expansion iterations.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl RecommendRequest {
    /// Request with both weights at their 0.5 default.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            user_weight: DEFAULT_SIGNAL_WEIGHT,
            content_weight: DEFAULT_SIGNAL_WEIGHT,
            cancel: None,
        }
    }

    pub fn with_weights(user_id: UserId, user_weight: f32, content_weight: f32) -> Self {
        Self {
            user_id,
            user_weight,
            content_weight,
            cancel: None,
        }
    }

    fn validate(&self) -> Result<(), RecommendError> {
        for (name, weight) in [
            ("user_weight", self.user_weight),
            ("content_weight", self.content_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecommendError::InvalidConfig(format!(
                    "{name} must be a non-negative finite number"
                )));
            }
        }
        Ok(())
    }
}

/// One blended, enriched recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCandidate {
    pub anime_id: AnimeId,
    pub anime_name: String,
    pub genre: String,
    pub synopsis: String,
    /// Catalog score; omitted rather than defaulted when the source table
    /// has no numeric score for the title.
    pub mal_rating: Option<f32>,
    pub blended_score: f32,
}

/// A user ranked by embedding similarity to the query user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarUser {
    pub user_id: UserId,
    pub similarity: f32,
}

/// An anime ranked by embedding similarity to the query anime, enriched
/// with catalog metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarAnime {
    pub anime_id: AnimeId,
    pub anime_name: String,
    pub genre: String,
    pub synopsis: String,
    pub similarity: f32,
}

/// Recommendation engine over one loaded artifact set.
#[derive(Debug)]
pub struct HybridRecommender {
    artifacts: Arc<Artifacts>,
    config: RecommenderConfig,
}

impl HybridRecommender {
    /// Construct an engine from a shared artifact set and explicit config.
    pub fn new(artifacts: Arc<Artifacts>, config: RecommenderConfig) -> Result<Self, RecommendError> {
        config
            .validate()
            .map_err(|err| RecommendError::InvalidConfig(err.to_string()))?;
        Ok(Self { artifacts, config })
    }

    /// Construct an engine with the default tuning (every knob at 10).
    pub fn with_default_config(artifacts: Arc<Artifacts>) -> Self {
        Self {
            artifacts,
            config: RecommenderConfig::default(),
        }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Users most (or least) similar to `user_id`, self excluded.
    ///
    /// `user_id` is the primary target here, so an unknown id is a typed
    /// error rather than an empty list.
    pub fn similar_users(
        &self,
        user_id: UserId,
        top_n: usize,
        direction: RankDirection,
    ) -> Result<Vec<SimilarUser>, RecommendError> {
        let query_index = self
            .artifacts
            .user_codec
            .encode(user_id)
            .ok_or(RecommendError::UnknownUser(user_id))?;

        let neighbors = self
            .artifacts
            .user_embeddings
            .rank_neighbors(query_index, top_n, direction);

        Ok(neighbors
            .into_iter()
            .filter_map(|neighbor| {
                match self.artifacts.user_codec.decode(neighbor.index) {
                    Some(user_id) => Some(SimilarUser {
                        user_id,
                        similarity: neighbor.score,
                    }),
                    None => {
                        // Unreachable once row counts are validated at load.
                        warn!(index = neighbor.index, "ranked user index failed to decode");
                        None
                    }
                }
            })
            .collect())
    }

    /// Anime most (or least) similar to the referenced one, enriched with
    /// catalog metadata and synopsis.
    pub fn similar_anime(
        &self,
        anime: &AnimeRef,
        top_n: usize,
        direction: RankDirection,
    ) -> Result<Vec<SimilarAnime>, RecommendError> {
        let record = self
            .artifacts
            .catalog
            .get(anime)
            .ok_or_else(|| RecommendError::UnknownAnime(anime.clone()))?;
        let query_index = self
            .artifacts
            .anime_codec
            .encode(record.anime_id)
            .ok_or_else(|| RecommendError::UnknownAnime(anime.clone()))?;

        let neighbors = self
            .artifacts
            .anime_embeddings
            .rank_neighbors(query_index, top_n, direction);

        Ok(neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let neighbor_id = self.artifacts.anime_codec.decode(neighbor.index)?;
                let record = self.artifacts.catalog.by_id(neighbor_id)?;
                Some(SimilarAnime {
                    anime_id: neighbor_id,
                    anime_name: record.title.clone(),
                    genre: record.genre_or_default().to_string(),
                    synopsis: self
                        .artifacts
                        .synopses
                        .lookup_or_default(neighbor_id, &record.title)
                        .to_string(),
                    similarity: neighbor.score,
                })
            })
            .collect())
    }

    /// The target user's preferred titles (descending by rating). A user
    /// with no qualifying ratings gets an empty list, never an error.
    pub fn preferences(&self, user_id: UserId) -> Vec<PreferredAnime> {
        preferences(user_id, &self.artifacts.ratings, &self.artifacts.catalog)
    }

    /// Serve one hybrid recommendation request.
    pub fn hybrid_recommendation(
        &self,
        request: &RecommendRequest,
    ) -> Result<Vec<RecommendationCandidate>, RecommendError> {
        request.validate()?;
        let start = Instant::now();

        let user_index = self
            .artifacts
            .user_codec
            .encode(request.user_id)
            .ok_or(RecommendError::UnknownUser(request.user_id))?;

        // A user with no ratings has no preference anchor: the user-based
        // list is empty by definition and the content pathway has no seeds,
        // so the result is empty without being an error.
        if self.artifacts.ratings.for_user(request.user_id).is_empty() {
            debug!(user = %request.user_id, "target user has no ratings");
            return Ok(Vec::new());
        }

        // User-based signal: similar users → pooled, support-counted titles.
        let neighbor_ids: Vec<UserId> = self
            .artifacts
            .user_embeddings
            .rank_neighbors(user_index, self.config.similar_users, RankDirection::Nearest)
            .into_iter()
            .filter_map(|neighbor| self.artifacts.user_codec.decode(neighbor.index))
            .collect();

        let target_preferences = self.preferences(request.user_id);
        let user_based = aggregate(
            &neighbor_ids,
            &target_preferences,
            &self.artifacts.ratings,
            &self.artifacts.catalog,
            self.config.user_candidates,
        );
        debug!(
            user = %request.user_id,
            neighbors = neighbor_ids.len(),
            user_candidates = user_based.len(),
            "user-based signal collected"
        );

        // Content-based signal: expand each pooled title through item-item
        // similarity. Skipped outright at zero weight so the outcome cannot
        // depend on the unused signal.
        let content_titles = if request.content_weight == 0.0 {
            Vec::new()
        } else {
            let seed_ids: Vec<AnimeId> = user_based
                .iter()
                .map(|candidate| candidate.anime.anime_id)
                .collect();
            expand(
                &seed_ids,
                &self.artifacts.anime_codec,
                &self.artifacts.anime_embeddings,
                &self.artifacts.catalog,
                self.config.expansion_neighbors,
                request.cancel.as_deref(),
            )?
        };

        let ranked = blend_scores(
            user_based.iter().map(|candidate| candidate.anime.title.as_str()),
            content_titles.iter().map(String::as_str),
            request.user_weight,
            request.content_weight,
            self.config.max_results,
        );

        let candidates: Vec<RecommendationCandidate> = ranked
            .into_iter()
            .filter_map(|(title, blended_score)| {
                match self.artifacts.catalog.by_title(title) {
                    Some(record) => Some(RecommendationCandidate {
                        anime_id: record.anime_id,
                        anime_name: record.title.clone(),
                        genre: record.genre_or_default().to_string(),
                        synopsis: self
                            .artifacts
                            .synopses
                            .lookup_or_default(record.anime_id, &record.title)
                            .to_string(),
                        mal_rating: record.score,
                        blended_score,
                    }),
                    None => {
                        warn!(title, "blended title no longer resolves, dropped");
                        None
                    }
                }
            })
            .collect();

        let latency = start.elapsed();
        debug!(
            user = %request.user_id,
            candidates = candidates.len(),
            ?latency,
            "hybrid recommendation served"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_recommendation(request.user_id, latency, candidates.len());
        }

        Ok(candidates)
    }
}

/// Blend the two candidate lists into `(title, score)` pairs.
///
/// Each user-based title adds `user_weight` once; each occurrence in the
/// content list adds `content_weight`, so a title reachable from k seeds
/// accumulates `k * content_weight`. Zero-weight contributions are skipped
/// entirely. Ordering is score-descending with first-insertion order as the
/// tie-break, truncated to `max_results`.
pub(crate) fn blend_scores<'a>(
    user_based: impl Iterator<Item = &'a str>,
    content: impl Iterator<Item = &'a str>,
    user_weight: f32,
    content_weight: f32,
    max_results: usize,
) -> Vec<(&'a str, f32)> {
    // Map size before an insert doubles as the title's first-insertion
    // rank, which is the tie-break below.
    let mut combined: HashMap<&str, (f32, usize)> = HashMap::new();

    if user_weight != 0.0 {
        for title in user_based {
            let order = combined.len();
            let entry = combined.entry(title).or_insert((0.0, order));
            entry.0 += user_weight;
        }
    }
    if content_weight != 0.0 {
        for title in content {
            let order = combined.len();
            let entry = combined.entry(title).or_insert((0.0, order));
            entry.0 += content_weight;
        }
    }

    let mut ranked: Vec<(&str, f32, usize)> = combined
        .into_iter()
        .map(|(title, (score, insertion))| (title, score, insertion))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });
    ranked.truncate(max_results);

    ranked
        .into_iter()
        .map(|(title, score, _)| (title, score))
        .collect()
}
