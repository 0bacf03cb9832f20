//! One-shot loading of the precomputed serving artifacts.
//!
//! Every artifact is read exactly once at process start and held read-only
//! in [`Artifacts`]; components receive shared references and never touch
//! storage afterwards. A load or cross-validation failure here is fatal for
//! the serving process and is surfaced before any similarity computation can
//! begin.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bincode::config::standard;
use bincode::serde::decode_from_slice;
use thiserror::Error;
use tracing::info;

use crate::catalog::{AnimeCatalog, AnimeRecord, SynopsisRecord, SynopsisTable};
use crate::codec::{AnimeId, CodecError, Domain, EntityCodec, UserId};
use crate::config::ArtifactPaths;
use crate::embedding::{EmbeddingError, EmbeddingMatrix, MatrixArtifact};
use crate::ratings::{RatingRecord, RatingsTable};

/// Errors raised while loading or validating the serving artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse codec map {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode matrix {path}: {message}")]
    Decode { path: String, message: String },
    #[error("failed to read table {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("{domain} embeddings have {rows} rows but the codec maps {entries} entities")]
    RowCountMismatch {
        domain: Domain,
        rows: usize,
        entries: usize,
    },
    #[error("{name} table is empty")]
    EmptyTable { name: &'static str },
}

/// The complete, read-only artifact set one serving process works from.
#[derive(Debug)]
pub struct Artifacts {
    pub user_codec: EntityCodec<UserId>,
    pub anime_codec: EntityCodec<AnimeId>,
    pub user_embeddings: EmbeddingMatrix,
    pub anime_embeddings: EmbeddingMatrix,
    pub catalog: AnimeCatalog,
    pub synopses: SynopsisTable,
    pub ratings: RatingsTable,
}

impl Artifacts {
    /// Load everything from disk and cross-validate.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let user_codec = load_codec::<UserId>(Domain::User, &paths.user_codec)?;
        let anime_codec = load_codec::<AnimeId>(Domain::Anime, &paths.anime_codec)?;
        let user_embeddings = load_matrix(&paths.user_embeddings)?;
        let anime_embeddings = load_matrix(&paths.anime_embeddings)?;
        let catalog = AnimeCatalog::new(load_table::<AnimeRecord>(&paths.anime_table)?);
        let synopses = SynopsisTable::new(load_table::<SynopsisRecord>(&paths.synopsis_table)?);
        let ratings = RatingsTable::new(load_table::<RatingRecord>(&paths.ratings_table)?);

        let artifacts = Self::from_parts(
            user_codec,
            anime_codec,
            user_embeddings,
            anime_embeddings,
            catalog,
            synopses,
            ratings,
        )?;
        info!(
            users = artifacts.user_codec.len(),
            anime = artifacts.anime_codec.len(),
            catalog_rows = artifacts.catalog.len(),
            rating_rows = artifacts.ratings.len(),
            "artifacts loaded"
        );
        Ok(artifacts)
    }

    /// Assemble an artifact set from already-materialized parts, applying
    /// the same cross-validation as [`Artifacts::load`]. Intended for tests
    /// and embedded producers.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        user_codec: EntityCodec<UserId>,
        anime_codec: EntityCodec<AnimeId>,
        user_embeddings: EmbeddingMatrix,
        anime_embeddings: EmbeddingMatrix,
        catalog: AnimeCatalog,
        synopses: SynopsisTable,
        ratings: RatingsTable,
    ) -> Result<Self, ArtifactError> {
        if user_embeddings.rows() != user_codec.len() {
            return Err(ArtifactError::RowCountMismatch {
                domain: Domain::User,
                rows: user_embeddings.rows(),
                entries: user_codec.len(),
            });
        }
        if anime_embeddings.rows() != anime_codec.len() {
            return Err(ArtifactError::RowCountMismatch {
                domain: Domain::Anime,
                rows: anime_embeddings.rows(),
                entries: anime_codec.len(),
            });
        }
        if catalog.is_empty() {
            return Err(ArtifactError::EmptyTable { name: "anime" });
        }
        if ratings.is_empty() {
            return Err(ArtifactError::EmptyTable { name: "ratings" });
        }

        Ok(Self {
            user_codec,
            anime_codec,
            user_embeddings,
            anime_embeddings,
            catalog,
            synopses,
            ratings,
        })
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Codec maps are persisted as a JSON object of external id → dense index.
fn load_codec<I: Copy + Eq + std::hash::Hash + From<u32>>(
    domain: Domain,
    path: &Path,
) -> Result<EntityCodec<I>, ArtifactError> {
    let content = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: display_path(path),
        source,
    })?;
    let map: HashMap<u32, usize> =
        serde_json::from_str(&content).map_err(|source| ArtifactError::Json {
            path: display_path(path),
            source,
        })?;
    let codec = EntityCodec::from_pairs(domain, map.into_iter().map(|(id, index)| (I::from(id), index)))?;
    Ok(codec)
}

fn load_matrix(path: &Path) -> Result<EmbeddingMatrix, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: display_path(path),
        source,
    })?;
    let (artifact, _): (MatrixArtifact, usize) =
        decode_from_slice(&bytes, standard()).map_err(|err| ArtifactError::Decode {
            path: display_path(path),
            message: err.to_string(),
        })?;
    Ok(EmbeddingMatrix::from_artifact(artifact)?)
}

fn load_table<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, ArtifactError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| ArtifactError::Csv {
        path: display_path(path),
        source,
    })?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.map_err(|source| ArtifactError::Csv {
            path: display_path(path),
            source,
        })?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn unit_matrix(rows: usize) -> EmbeddingMatrix {
        let mut data = Vec::with_capacity(rows * 2);
        for row in 0..rows {
            let angle = row as f32;
            data.extend([angle.cos(), angle.sin()]);
        }
        EmbeddingMatrix::from_artifact(MatrixArtifact::new(rows as u32, 2, data))
            .expect("well-formed artifact")
    }

    fn minimal_parts() -> (
        EntityCodec<UserId>,
        EntityCodec<AnimeId>,
        AnimeCatalog,
        SynopsisTable,
        RatingsTable,
    ) {
        let user_codec =
            EntityCodec::from_pairs(Domain::User, [(UserId(1), 0), (UserId(2), 1)])
                .expect("valid mapping");
        let anime_codec =
            EntityCodec::from_pairs(Domain::Anime, [(AnimeId(10), 0), (AnimeId(20), 1)])
                .expect("valid mapping");
        let catalog = AnimeCatalog::new(vec![AnimeRecord {
            anime_id: AnimeId(10),
            title: "Alpha".to_string(),
            score: None,
            genre: None,
            episodes: None,
            kind: None,
            members: None,
            premiered: None,
        }]);
        let synopses = SynopsisTable::new(Vec::new());
        let ratings = RatingsTable::new([RatingRecord {
            user_id: UserId(1),
            anime_id: AnimeId(10),
            rating: 0.5,
        }]);
        (user_codec, anime_codec, catalog, synopses, ratings)
    }

    #[test]
    fn from_parts_accepts_consistent_artifacts() {
        let (user_codec, anime_codec, catalog, synopses, ratings) = minimal_parts();
        let artifacts = Artifacts::from_parts(
            user_codec,
            anime_codec,
            unit_matrix(2),
            unit_matrix(2),
            catalog,
            synopses,
            ratings,
        );
        assert!(artifacts.is_ok());
    }

    #[test]
    fn row_count_mismatch_is_fatal() {
        let (user_codec, anime_codec, catalog, synopses, ratings) = minimal_parts();
        let err = Artifacts::from_parts(
            user_codec,
            anime_codec,
            unit_matrix(3),
            unit_matrix(2),
            catalog,
            synopses,
            ratings,
        )
        .expect_err("three rows for two users");
        assert!(matches!(
            err,
            ArtifactError::RowCountMismatch {
                domain: Domain::User,
                rows: 3,
                entries: 2,
            }
        ));
    }

    #[test]
    fn empty_ratings_table_is_fatal() {
        let (user_codec, anime_codec, catalog, synopses, _) = minimal_parts();
        let err = Artifacts::from_parts(
            user_codec,
            anime_codec,
            unit_matrix(2),
            unit_matrix(2),
            catalog,
            synopses,
            RatingsTable::new([]),
        )
        .expect_err("ratings must be non-empty");
        assert!(matches!(err, ArtifactError::EmptyTable { name: "ratings" }));
    }

    #[test]
    fn embedding_matrix_helper_produces_unit_rows() {
        let matrix = unit_matrix(4);
        assert_eq!(matrix.rows(), 4);
        let probe = EmbeddingMatrix::from_array(array![[1.0_f32, 0.0]]).expect("one row");
        assert_eq!(probe.rows(), 1);
    }
}
