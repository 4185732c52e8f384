//! Item-item similarity over co-rating vectors.
//!
//! Every item is a sparse vector over users. Only pairs of items with at least
//! one common rater get an entry, and each pair is scored once and mirrored,
//! so `score(a, b) == score(b, a)` bit for bit.

use crate::{Error, RatingMatrix, Result};
use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// Cosine over raw ratings
    #[default]
    Cosine,
    /// Cosine over ratings centered on each item's mean rating
    Adjusted,
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Cosine => f.write_str("cosine"),
            SimilarityMetric::Adjusted => f.write_str("adjusted"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "adjusted" | "adjusted-cosine" | "centered" => Ok(SimilarityMetric::Adjusted),
            other => Err(Error::Validation(format!(
                "unknown similarity metric '{}', expected 'cosine' or 'adjusted'",
                other
            ))),
        }
    }
}

/// A neighboring item and its similarity score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub item: u32,
    pub score: f32,
}

/// Neighbor lists per item, aligned with the item index of the [`RatingMatrix`]
/// that produced them. Each list is sorted by score descending, then item
/// index ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityTable {
    neighbors: Vec<Vec<Neighbor>>,
}

impl SimilarityTable {
    pub fn compute(matrix: &RatingMatrix, metric: SimilarityMetric) -> Self {
        let n_items = matrix.n_items();

        let means: Vec<f64> = (0..n_items)
            .map(|i| match metric {
                SimilarityMetric::Cosine => 0.0,
                SimilarityMetric::Adjusted => {
                    let column = matrix.column(i);
                    column.iter().map(|&(_, r)| f64::from(r)).sum::<f64>() / column.len() as f64
                }
            })
            .collect();

        let value = |item: u32, rating: f32| f64::from(rating) - means[item as usize];

        let norms: Vec<f64> = (0..n_items)
            .map(|i| {
                matrix
                    .column(i)
                    .iter()
                    .map(|&(_, r)| value(i as u32, r).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();

        // Upper triangle: for item i, the scores against every j > i sharing a rater.
        let upper: Vec<Vec<Neighbor>> = (0..n_items)
            .into_par_iter()
            .map(|i| {
                let mut dots: AHashMap<u32, f64> = AHashMap::new();
                for &(user, r_i) in matrix.column(i) {
                    let v_i = value(i as u32, r_i);
                    for &(j, r_j) in matrix.row(user as usize) {
                        if (j as usize) <= i {
                            continue;
                        }
                        *dots.entry(j).or_insert(0.0) += v_i * value(j, r_j);
                    }
                }

                let mut row: Vec<Neighbor> = dots
                    .into_iter()
                    .map(|(j, dot)| {
                        let denom = norms[i] * norms[j as usize];
                        let score = if denom > 0.0 { dot / denom } else { 0.0 };
                        Neighbor {
                            item: j,
                            score: score as f32,
                        }
                    })
                    .collect();
                row.sort_unstable_by_key(|n| n.item);
                row
            })
            .collect();

        let mut neighbors: Vec<Vec<Neighbor>> = vec![Vec::new(); n_items];
        for (i, row) in upper.into_iter().enumerate() {
            for n in row {
                neighbors[n.item as usize].push(Neighbor {
                    item: i as u32,
                    score: n.score,
                });
                neighbors[i].push(n);
            }
        }
        for list in &mut neighbors {
            list.sort_by(rank_order);
        }

        Self { neighbors }
    }

    /// Neighbors of an item, best first
    #[inline]
    pub fn neighbors(&self, item: usize) -> &[Neighbor] {
        self.neighbors.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stored similarity between two items, if they share a rater
    pub fn score(&self, a: usize, b: usize) -> Option<f32> {
        self.neighbors(a)
            .iter()
            .find(|n| n.item as usize == b)
            .map(|n| n.score)
    }

    #[inline]
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of unordered item pairs with a stored score
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Score descending, item index ascending
pub(crate) fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score.total_cmp(&a.score).then(a.item.cmp(&b.item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rating;

    fn matrix() -> RatingMatrix {
        RatingMatrix::from_ratings(&[
            Rating::new("u1", "b1", 5.0),
            Rating::new("u1", "b2", 5.0),
            Rating::new("u2", "b1", 5.0),
            Rating::new("u2", "b2", 4.0),
            Rating::new("u2", "b3", 4.0),
            Rating::new("u3", "b4", 2.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_cosine_scores() {
        let table = SimilarityTable::compute(&matrix(), SimilarityMetric::Cosine);
        // b1 = (5, 5, 0), b2 = (5, 4, 0), b3 = (0, 4, 0)
        let expected = 45.0 / (50f64.sqrt() * 41f64.sqrt());
        assert!((f64::from(table.score(0, 1).unwrap()) - expected).abs() < 1e-6);
        assert_eq!(table.neighbors(0)[0].item, 1);
        // b4 shares no rater with anything
        assert!(table.neighbors(3).is_empty());
        assert_eq!(table.score(0, 3), None);
    }

    #[test]
    fn test_symmetry() {
        for metric in [SimilarityMetric::Cosine, SimilarityMetric::Adjusted] {
            let table = SimilarityTable::compute(&matrix(), metric);
            for a in 0..table.n_items() {
                for n in table.neighbors(a) {
                    assert_eq!(table.score(n.item as usize, a), Some(n.score));
                }
            }
        }
    }

    #[test]
    fn test_no_self_similarity() {
        let table = SimilarityTable::compute(&matrix(), SimilarityMetric::Cosine);
        for a in 0..table.n_items() {
            assert!(table.neighbors(a).iter().all(|n| n.item as usize != a));
        }
        assert_eq!(table.pair_count(), 3);
    }

    #[test]
    fn test_adjusted_zero_variance_is_zero() {
        let m = RatingMatrix::from_ratings(&[
            Rating::new("u1", "b1", 4.0),
            Rating::new("u1", "b2", 4.0),
        ])
        .unwrap();
        let table = SimilarityTable::compute(&m, SimilarityMetric::Adjusted);
        assert_eq!(table.score(0, 1), Some(0.0));
    }

    #[test]
    fn test_sorted_descending() {
        let table = SimilarityTable::compute(&matrix(), SimilarityMetric::Cosine);
        let scores: Vec<f32> = table.neighbors(1).iter().map(|n| n.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Cosine".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::Cosine);
        assert_eq!("adjusted".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::Adjusted);
        assert!("pearson".parse::<SimilarityMetric>().is_err());
    }
}
