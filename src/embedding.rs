//! Embedding matrices and exact similarity ranking.
//!
//! Both matrices (user and anime) are produced by the offline trainer with
//! unit-normalized rows, so a plain dot product of two rows is their cosine
//! similarity. Ranking is an exact full scan: score every row against the
//! query row, argsort, take the tail. The matrices are small enough that the
//! scan bounds per-request latency without an approximate index.

use std::cmp::Ordering;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bump this value whenever the on-disk matrix layout changes.
pub const MATRIX_SCHEMA_VERSION: u16 = 1;

/// On-disk layout for one embedding matrix, bincode-encoded by the offline
/// weight-extraction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub rows: u32,
    pub cols: u32,
    /// Row-major matrix data, `rows * cols` values.
    pub data: Vec<f32>,
}

const fn default_schema_version() -> u16 {
    MATRIX_SCHEMA_VERSION
}

impl MatrixArtifact {
    pub fn new(rows: u32, cols: u32, data: Vec<f32>) -> Self {
        Self {
            schema_version: MATRIX_SCHEMA_VERSION,
            rows,
            cols,
            data,
        }
    }
}

/// Errors raised when materializing a matrix from its artifact.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("unsupported matrix schema version {found} (expected {expected})")]
    SchemaVersion { found: u16, expected: u16 },
    #[error("matrix shape {rows}x{cols} does not match {len} values")]
    ShapeMismatch { rows: u32, cols: u32, len: usize },
    #[error("matrix has no rows")]
    Empty,
}

/// Whether ranking should surface the most or least similar rows.
///
/// `Farthest` mirrors the diagnostic `neg` mode of the upstream tooling and
/// is not part of the recommendation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Nearest,
    Farthest,
}

/// One ranked row: dense index plus its cosine score against the query row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedNeighbor {
    pub index: usize,
    pub score: f32,
}

/// Dense embedding matrix, one unit-normalized row per encoded index.
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    weights: Array2<f32>,
}

impl EmbeddingMatrix {
    /// Decode an artifact into a usable matrix.
    pub fn from_artifact(artifact: MatrixArtifact) -> Result<Self, EmbeddingError> {
        if artifact.schema_version != MATRIX_SCHEMA_VERSION {
            return Err(EmbeddingError::SchemaVersion {
                found: artifact.schema_version,
                expected: MATRIX_SCHEMA_VERSION,
            });
        }
        if artifact.rows == 0 {
            return Err(EmbeddingError::Empty);
        }
        let (rows, cols) = (artifact.rows as usize, artifact.cols as usize);
        let len = artifact.data.len();
        let weights = Array2::from_shape_vec((rows, cols), artifact.data)
            .map_err(|_| EmbeddingError::ShapeMismatch {
                rows: artifact.rows,
                cols: artifact.cols,
                len,
            })?;
        Ok(Self { weights })
    }

    /// Wrap an already-materialized array. Rows are assumed unit-normalized.
    pub fn from_array(weights: Array2<f32>) -> Result<Self, EmbeddingError> {
        if weights.nrows() == 0 {
            return Err(EmbeddingError::Empty);
        }
        Ok(Self { weights })
    }

    /// Number of rows (= entities known to the paired codec).
    pub fn rows(&self) -> usize {
        self.weights.nrows()
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.weights.ncols()
    }

    /// Rank all rows by similarity to `query_index`.
    ///
    /// Selection is a stable ascending argsort truncated from the top: when
    /// scores tie exactly, the row with the smaller index sorts first in the
    /// ascending order, which is the documented tie-break contract. For
    /// `Nearest` the top `top_n + 1` rows are taken so the query row itself
    /// (cosine 1.0 under unit rows, always in the selected set) can be
    /// dropped before truncating to `top_n`; output is descending by score.
    /// For `Farthest` the lowest `top_n` rows are returned ascending.
    ///
    /// An out-of-range `query_index` yields an empty result rather than an
    /// error; callers treat an unknown entity as "no neighbors".
    pub fn rank_neighbors(
        &self,
        query_index: usize,
        top_n: usize,
        direction: RankDirection,
    ) -> Vec<RankedNeighbor> {
        if top_n == 0 || query_index >= self.weights.nrows() {
            return Vec::new();
        }

        let query = self.weights.row(query_index);
        let scores: Array1<f32> = self.weights.dot(&query);

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(Ordering::Equal)
        });

        match direction {
            RankDirection::Nearest => order
                .iter()
                .rev()
                .take(top_n + 1)
                .filter(|&&index| index != query_index)
                .take(top_n)
                .map(|&index| RankedNeighbor {
                    index,
                    score: scores[index],
                })
                .collect(),
            RankDirection::Farthest => order
                .iter()
                .filter(|&&index| index != query_index)
                .take(top_n)
                .map(|&index| RankedNeighbor {
                    index,
                    score: scores[index],
                })
                .collect(),
        }
    }
}
