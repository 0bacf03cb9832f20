//! # animerec
//!
//! ## Purpose
//!
//! `animerec` serves hybrid anime recommendations from embeddings
//! precomputed by an offline training pipeline. Given a target user it
//! finds users with similar taste in the user embedding space, pools the
//! titles those neighbors like, expands that pool through item-item
//! similarity in the anime embedding space, and blends both signals into a
//! single ranked, metadata-enriched list.
//!
//! The crate owns only the serving side. Raw-data acquisition, cleaning,
//! training, and weight extraction are external collaborators; their output
//! (two id codecs, two unit-row-normalized embedding matrices, and three
//! tables) is loaded read-only, exactly once, via [`Artifacts::load`].
//!
//! ## Core Types
//!
//! - [`EntityCodec`]: external id ↔ dense matrix-row index, one per domain.
//! - [`EmbeddingMatrix`]: unit-row matrix with exact cosine ranking
//!   ([`EmbeddingMatrix::rank_neighbors`]).
//! - [`AnimeCatalog`] / [`SynopsisTable`]: read-only metadata, looked up
//!   through the tagged [`AnimeRef`].
//! - [`RatingsTable`]: per-user scaled ratings feeding
//!   [`preferences`](crate::preferences::preferences).
//! - [`HybridRecommender`]: the engine; [`RecommendRequest`] in,
//!   [`RecommendationCandidate`] list out.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use animerec::{
//!     ArtifactPaths, Artifacts, HybridRecommender, RecommendRequest,
//!     RecommenderConfig, UserId,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = ArtifactPaths::under_root("artifacts");
//! let artifacts = Arc::new(Artifacts::load(&paths)?);
//! let engine = HybridRecommender::new(artifacts, RecommenderConfig::default())?;
//!
//! let request = RecommendRequest::new(UserId(12345));
//! for candidate in engine.hybrid_recommendation(&request)? {
//!     println!(
//!         "{} [{}] score={:.2}",
//!         candidate.anime_name, candidate.genre, candidate.blended_score
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Install a [`RecommendMetrics`] implementation via
//! [`set_recommend_metrics`] to record per-request latency and candidate
//! counts. This is typically done once during service startup so all
//! [`HybridRecommender`] instances share the same metrics backend.

pub mod aggregate;
pub mod artifacts;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod expand;
pub mod metrics;
pub mod preferences;
pub mod ratings;

pub use crate::aggregate::{aggregate, SupportedAnime};
pub use crate::artifacts::{ArtifactError, Artifacts};
pub use crate::catalog::{
    AnimeCatalog, AnimeRecord, AnimeRef, SynopsisRecord, SynopsisTable, GENRE_PLACEHOLDER,
    SYNOPSIS_PLACEHOLDER,
};
pub use crate::codec::{AnimeId, CodecError, Domain, EntityCodec, UserId};
pub use crate::config::{ArtifactPaths, ConfigLoadError, EngineConfig, RecommenderConfig};
pub use crate::embedding::{
    EmbeddingError, EmbeddingMatrix, MatrixArtifact, RankDirection, RankedNeighbor,
    MATRIX_SCHEMA_VERSION,
};
pub use crate::engine::{
    HybridRecommender, RecommendRequest, RecommendationCandidate, SimilarAnime, SimilarUser,
    DEFAULT_SIGNAL_WEIGHT,
};
pub use crate::error::RecommendError;
pub use crate::expand::expand;
pub use crate::metrics::{set_recommend_metrics, RecommendMetrics};
pub use crate::preferences::{preferences, PreferredAnime};
pub use crate::ratings::{RatingRecord, RatingsTable};
