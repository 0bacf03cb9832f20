//! Error taxonomy for the recommendation engine.
//!
//! Unknown seed entities inside expansion loops are absorbed (they produce
//! empty contributions); only the failures below surface to callers. An
//! unknown *primary* target is an explicit error so callers can tell it
//! apart from a successful-but-empty recommendation list.

use thiserror::Error;

use crate::artifacts::ArtifactError;
use crate::catalog::AnimeRef;
use crate::codec::UserId;

/// Errors produced by the recommendation layer.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The target user of a top-level request is absent from the user codec.
    #[error("unknown user id {0}")]
    UnknownUser(UserId),
    /// The target anime of a similarity query could not be resolved.
    #[error("unknown anime ({0})")]
    UnknownAnime(AnimeRef),
    /// The caller's cancellation flag was observed mid-request.
    #[error("recommendation cancelled")]
    Cancelled,
    /// Invalid request parameters or engine configuration.
    #[error("invalid recommend config: {0}")]
    InvalidConfig(String),
    /// A required artifact failed to load or validate.
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),
}
