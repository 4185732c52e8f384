use crate::{Error, Result, SimilarityMetric, SimilarityTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The trained recommender state: item index, similarity table, item mean
/// ratings and the set of items each user rated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    metric: SimilarityMetric,
    items: Vec<String>,
    similarity: SimilarityTable,
    item_means: Vec<f32>,
    // user -> rated item indices, ascending
    user_history: BTreeMap<String, Vec<u32>>,
}

impl Model {
    pub fn new(
        metric: SimilarityMetric,
        items: Vec<String>,
        similarity: SimilarityTable,
        item_means: Vec<f32>,
        user_history: BTreeMap<String, Vec<u32>>,
    ) -> Result<Self> {
        let model = Self {
            metric,
            items,
            similarity,
            item_means,
            user_history,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check internal consistency. Loaders call this on deserialized models.
    pub fn validate(&self) -> Result<()> {
        let n = self.items.len();
        if self.similarity.n_items() != n || self.item_means.len() != n {
            return Err(Error::Artifact(format!(
                "inconsistent model: {} items, {} similarity rows, {} means",
                n,
                self.similarity.n_items(),
                self.item_means.len()
            )));
        }
        if self.items.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Artifact("item index is not sorted".to_string()));
        }
        for i in 0..n {
            if self.similarity.neighbors(i).iter().any(|nb| nb.item as usize >= n) {
                return Err(Error::Artifact(format!(
                    "neighbor index out of range for item '{}'",
                    self.items[i]
                )));
            }
        }
        for (user, rated) in &self.user_history {
            if rated.iter().any(|&i| i as usize >= n) {
                return Err(Error::Artifact(format!(
                    "history index out of range for user '{}'",
                    user
                )));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    #[inline]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[inline]
    pub fn item_id(&self, index: usize) -> &str {
        &self.items[index]
    }

    pub fn item_index(&self, item_id: &str) -> Option<usize> {
        self.items
            .binary_search_by(|it| it.as_str().cmp(item_id))
            .ok()
    }

    #[inline]
    pub fn similarity(&self) -> &SimilarityTable {
        &self.similarity
    }

    #[inline]
    pub fn item_means(&self) -> &[f32] {
        &self.item_means
    }

    /// Mean rating of an item by id
    pub fn item_mean(&self, item_id: &str) -> Option<f32> {
        self.item_index(item_id).map(|i| self.item_means[i])
    }

    /// Indices of the items a user rated, or `None` for an unknown user
    pub fn user_history(&self, user_id: &str) -> Option<&[u32]> {
        self.user_history.get(user_id).map(Vec::as_slice)
    }

    #[inline]
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn n_users(&self) -> usize {
        self.user_history.len()
    }
}
