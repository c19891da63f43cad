//! Precomputed item-item neighbor lists.
//!
//! A `NeighborIndex` maps each movie to its most similar movies, best first.
//! Lists never contain the movie itself and their scores never increase.
//! Ties are ordered by ascending movie id.
//!
//! With no limit every list covers every other movie, which ranks exactly
//! like scoring at query time. A limit trades that for memory.

use crate::error::{RecommendError, Result};
use crate::ranking::{compare_ranked, ScoredMovie};
use crate::similarity::{SimilarityMeasure, SparseVector};
use data_loader::MovieId;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct NeighborIndex {
    lists: HashMap<MovieId, Vec<ScoredMovie>>,
    limit: Option<usize>,
}

impl NeighborIndex {
    /// Compute neighbor lists for `ids` in parallel
    ///
    /// A movie without a vector in `vectors` scores 0 against everything.
    /// A limit of zero is rejected: it would leave every list empty.
    #[instrument(skip(ids, vectors, measure), fields(movies = ids.len(), measure = measure.name()))]
    pub fn build(
        ids: &[MovieId],
        vectors: &HashMap<MovieId, SparseVector>,
        measure: &dyn SimilarityMeasure,
        limit: Option<usize>,
    ) -> Result<Self> {
        if limit == Some(0) {
            return Err(RecommendError::InvalidRequest(
                "neighbor limit must be positive".to_string(),
            ));
        }
        let start = Instant::now();
        let empty = SparseVector::default();
        let vector_of = |id: MovieId| vectors.get(&id).unwrap_or(&empty);

        let lists: HashMap<MovieId, Vec<ScoredMovie>> = ids
            .par_iter()
            .map(|&id| {
                let own = vector_of(id);
                let mut list: Vec<ScoredMovie> = ids
                    .iter()
                    .filter(|&&other| other != id)
                    .map(|&other| ScoredMovie::new(other, measure.similarity(own, vector_of(other))))
                    .collect();
                list.sort_unstable_by(compare_ranked);
                if let Some(limit) = limit {
                    list.truncate(limit);
                }
                (id, list)
            })
            .collect();

        info!(
            lists = lists.len(),
            limit = ?limit,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built neighbor index"
        );
        Ok(Self { lists, limit })
    }

    /// Build from externally supplied lists
    ///
    /// Lists are normalized: self entries and repeated neighbors are dropped
    /// (the first score wins) and entries are sorted.
    pub fn from_lists(lists: impl IntoIterator<Item = (MovieId, Vec<(MovieId, f32)>)>) -> Self {
        let lists = lists
            .into_iter()
            .map(|(id, entries)| {
                let mut seen = HashSet::new();
                let mut list: Vec<ScoredMovie> = entries
                    .into_iter()
                    .filter(|&(other, _)| other != id && seen.insert(other))
                    .map(|(other, score)| ScoredMovie::new(other, score))
                    .collect();
                list.sort_unstable_by(compare_ranked);
                (id, list)
            })
            .collect();
        Self { lists, limit: None }
    }

    /// Neighbors of a movie, best first
    pub fn neighbors(&self, movie_id: MovieId) -> Option<&[ScoredMovie]> {
        self.lists.get(&movie_id).map(Vec::as_slice)
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.lists.contains_key(&movie_id)
    }

    /// Per-list cap the index was built with
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::Cosine;

    fn create_test_vectors() -> HashMap<MovieId, SparseVector> {
        [
            (1, vec![(0, 1.0), (1, 1.0)]),
            (2, vec![(0, 1.0), (1, 0.9)]),
            (3, vec![(1, 1.0), (2, 1.0)]),
            (4, vec![(2, 1.0)]),
        ]
        .into_iter()
        .map(|(id, entries)| (id, SparseVector::from_entries(3, entries)))
        .collect()
    }

    fn is_sorted(list: &[ScoredMovie]) -> bool {
        list.windows(2)
            .all(|w| compare_ranked(&w[0], &w[1]) != std::cmp::Ordering::Greater)
    }

    #[test]
    fn test_full_index_lists_every_other_movie() {
        let ids = vec![1, 2, 3, 4, 5];
        let index = NeighborIndex::build(&ids, &create_test_vectors(), &Cosine, None).unwrap();

        assert_eq!(index.len(), 5);
        for &id in &ids {
            let list = index.neighbors(id).unwrap();
            assert_eq!(list.len(), 4);
            assert!(list.iter().all(|n| n.movie_id != id));
            assert!(is_sorted(list));
        }
        assert_eq!(index.neighbors(1).unwrap()[0].movie_id, 2);

        // Movie 5 has no vector: all zeros, so plain id order
        let ids_of_5: Vec<MovieId> = index.neighbors(5).unwrap().iter().map(|n| n.movie_id).collect();
        assert_eq!(ids_of_5, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_limit_truncates_lists() {
        let ids = vec![1, 2, 3, 4];
        let index = NeighborIndex::build(&ids, &create_test_vectors(), &Cosine, Some(2)).unwrap();

        assert_eq!(index.limit(), Some(2));
        assert!(ids.iter().all(|&id| index.neighbors(id).unwrap().len() == 2));
        assert_eq!(index.neighbors(4).unwrap()[0].movie_id, 3);
    }

    #[test]
    fn test_zero_limit_is_rejected() {
        let result = NeighborIndex::build(&[1, 2, 3], &create_test_vectors(), &Cosine, Some(0));
        assert!(matches!(result, Err(RecommendError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_lists_normalizes() {
        let index = NeighborIndex::from_lists([(
            1,
            vec![(3, 0.2), (1, 1.0), (2, 0.5), (3, 0.9), (4, 0.5)],
        )]);
        let list = index.neighbors(1).unwrap();

        assert_eq!(
            list,
            &[
                ScoredMovie::new(2, 0.5),
                ScoredMovie::new(4, 0.5),
                ScoredMovie::new(3, 0.2),
            ]
        );
        assert!(index.contains(1));
        assert!(!index.contains(2));
        assert!(index.neighbors(2).is_none());
    }
}
