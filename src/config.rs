//! YAML configuration for the recommendation engine.
//!
//! Two concerns live here: where the precomputed artifacts sit on disk
//! ([`ArtifactPaths`]) and how the engine is tuned ([`RecommenderConfig`]).
//! Both are plain values constructed once at startup and passed to whatever
//! component needs them; nothing reads ambient global state.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//!
//! artifacts:
//!   user_codec: artifacts/preprocessed/user2user_encoded.json
//!   anime_codec: artifacts/preprocessed/anime2anime_encoded.json
//!   user_embeddings: artifacts/weights/user_weights.bin
//!   anime_embeddings: artifacts/weights/anime_weights.bin
//!   anime_table: artifacts/preprocessed/anime_df.csv
//!   synopsis_table: artifacts/preprocessed/synopsis_df.csv
//!   ratings_table: artifacts/preprocessed/rating_df.csv
//!
//! recommender:
//!   similar_users: 10
//!   user_candidates: 10
//!   expansion_neighbors: 10
//!   max_results: 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Storage locations of the seven precomputed artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// User id → encoded index map (JSON).
    pub user_codec: PathBuf,
    /// Anime id → encoded index map (JSON).
    pub anime_codec: PathBuf,
    /// User embedding matrix (bincode `MatrixArtifact`).
    pub user_embeddings: PathBuf,
    /// Anime embedding matrix (bincode `MatrixArtifact`).
    pub anime_embeddings: PathBuf,
    /// Anime metadata table (CSV).
    pub anime_table: PathBuf,
    /// Synopsis table (CSV).
    pub synopsis_table: PathBuf,
    /// Ratings table (CSV).
    pub ratings_table: PathBuf,
}

impl ArtifactPaths {
    /// Conventional artifact names under one root directory, mirroring the
    /// layout the offline pipeline writes.
    pub fn under_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            user_codec: root.join("user2user_encoded.json"),
            anime_codec: root.join("anime2anime_encoded.json"),
            user_embeddings: root.join("user_weights.bin"),
            anime_embeddings: root.join("anime_weights.bin"),
            anime_table: root.join("anime_df.csv"),
            synopsis_table: root.join("synopsis_df.csv"),
            ratings_table: root.join("rating_df.csv"),
        }
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        let entries = [
            ("artifacts.user_codec", &self.user_codec),
            ("artifacts.anime_codec", &self.anime_codec),
            ("artifacts.user_embeddings", &self.user_embeddings),
            ("artifacts.anime_embeddings", &self.anime_embeddings),
            ("artifacts.anime_table", &self.anime_table),
            ("artifacts.synopsis_table", &self.synopsis_table),
            ("artifacts.ratings_table", &self.ratings_table),
        ];
        for (field, path) in entries {
            if path.as_os_str().is_empty() {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Engine tuning knobs. All four default to 10, matching the upstream
/// serving behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// How many similar users to consult for the user-based signal.
    #[serde(default = "RecommenderConfig::default_top_n")]
    pub similar_users: usize,
    /// How many pooled candidates the neighbor aggregation keeps.
    #[serde(default = "RecommenderConfig::default_top_n")]
    pub user_candidates: usize,
    /// How many neighbors each content-expansion seed contributes.
    #[serde(default = "RecommenderConfig::default_top_n")]
    pub expansion_neighbors: usize,
    /// Maximum number of blended candidates returned to the caller.
    #[serde(default = "RecommenderConfig::default_top_n")]
    pub max_results: usize,
}

impl RecommenderConfig {
    pub(crate) fn default_top_n() -> usize {
        10
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let entries = [
            ("recommender.similar_users", self.similar_users),
            ("recommender.user_candidates", self.user_candidates),
            ("recommender.expansion_neighbors", self.expansion_neighbors),
            ("recommender.max_results", self.max_results),
        ];
        for (field, value) in entries {
            if value == 0 {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            similar_users: Self::default_top_n(),
            user_candidates: Self::default_top_n(),
            expansion_neighbors: Self::default_top_n(),
            max_results: Self::default_top_n(),
        }
    }
}

/// Top-level YAML configuration: artifact locations plus engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration format version.
    pub version: String,

    /// Optional configuration name/description.
    #[serde(default)]
    pub name: Option<String>,

    /// Artifact storage locations.
    pub artifacts: ArtifactPaths,

    /// Engine tuning knobs.
    #[serde(default)]
    pub recommender: RecommenderConfig,
}

impl EngineConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;
        self.artifacts.validate()?;
        self.recommender.validate()?;
        Ok(())
    }
}
