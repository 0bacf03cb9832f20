//! Content expansion: grow a liked-item list through item-item similarity.
//!
//! Every seed anime is expanded into its `top_n` nearest neighbors in the
//! anime embedding space and the neighbor titles are flattened into one
//! combined list. Duplicates across seeds are deliberately preserved: a
//! title reachable from k seeds appears k times, and the blender turns that
//! repetition into the title's content-side weight.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::catalog::AnimeCatalog;
use crate::codec::{AnimeId, EntityCodec};
use crate::embedding::{EmbeddingMatrix, RankDirection};
use crate::error::RecommendError;

/// Expand `seed_ids` into neighbor titles over the anime embedding space.
///
/// A seed that is unknown to the codec, or whose neighbors cannot be decoded
/// or resolved, contributes nothing; those misses are local and absorbed.
/// The optional `cancel` flag is checked between seeds, bounding how long a
/// caller waits after requesting cancellation to one inner similarity scan.
pub fn expand(
    seed_ids: &[AnimeId],
    codec: &EntityCodec<AnimeId>,
    embeddings: &EmbeddingMatrix,
    catalog: &AnimeCatalog,
    top_n: usize,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<String>, RecommendError> {
    let mut combined = Vec::new();

    for &seed in seed_ids {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(RecommendError::Cancelled);
            }
        }

        let Some(seed_index) = codec.encode(seed) else {
            debug!(%seed, "expansion seed unknown to anime codec, skipped");
            continue;
        };

        for neighbor in embeddings.rank_neighbors(seed_index, top_n, RankDirection::Nearest) {
            let Some(neighbor_id) = codec.decode(neighbor.index) else {
                continue;
            };
            match catalog.by_id(neighbor_id) {
                Some(record) => combined.push(record.title.clone()),
                None => {
                    debug!(%neighbor_id, "expanded neighbor missing from catalog, skipped")
                }
            }
        }
    }

    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AnimeRecord;
    use crate::codec::Domain;
    use ndarray::array;

    fn record(id: u32, title: &str) -> AnimeRecord {
        AnimeRecord {
            anime_id: AnimeId(id),
            title: title.to_string(),
            score: None,
            genre: None,
            episodes: None,
            kind: None,
            members: None,
            premiered: None,
        }
    }

    fn fixture() -> (EntityCodec<AnimeId>, EmbeddingMatrix, AnimeCatalog) {
        let codec = EntityCodec::from_pairs(
            Domain::Anime,
            [
                (AnimeId(10), 0),
                (AnimeId(20), 1),
                (AnimeId(30), 2),
                (AnimeId(40), 3),
            ],
        )
        .expect("valid mapping");
        // 10 and 20 point one way, 30 and 40 the other.
        let embeddings = EmbeddingMatrix::from_array(array![
            [1.0_f32, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ])
        .expect("non-empty matrix");
        let catalog = AnimeCatalog::new(vec![
            record(10, "A"),
            record(20, "B"),
            record(30, "C"),
            record(40, "D"),
        ]);
        (codec, embeddings, catalog)
    }

    #[test]
    fn duplicates_across_seeds_are_preserved() {
        let (codec, embeddings, catalog) = fixture();
        // Both seeds have each other as their single nearest neighbor, so
        // neither contributes a fresh title and both contributions stay.
        let titles = expand(
            &[AnimeId(10), AnimeId(20)],
            &codec,
            &embeddings,
            &catalog,
            1,
            None,
        )
        .expect("no cancellation");
        assert_eq!(titles, vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn unknown_seed_is_skipped_silently() {
        let (codec, embeddings, catalog) = fixture();
        let titles = expand(
            &[AnimeId(99), AnimeId(30)],
            &codec,
            &embeddings,
            &catalog,
            1,
            None,
        )
        .expect("no cancellation");
        assert_eq!(titles, vec!["D".to_string()]);
    }

    #[test]
    fn no_seeds_yield_empty() {
        let (codec, embeddings, catalog) = fixture();
        let titles = expand(&[], &codec, &embeddings, &catalog, 5, None)
            .expect("no cancellation");
        assert!(titles.is_empty());
    }

    #[test]
    fn cancellation_flag_stops_the_loop() {
        let (codec, embeddings, catalog) = fixture();
        let flag = AtomicBool::new(true);
        let result = expand(
            &[AnimeId(10)],
            &codec,
            &embeddings,
            &catalog,
            1,
            Some(&flag),
        );
        assert!(matches!(result, Err(RecommendError::Cancelled)));
    }
}
