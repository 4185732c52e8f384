use crate::similarity::rank_order;
use crate::{Book, Catalog, Error, Model, Neighbor, Result, SearchIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result count used when a request does not give one
pub const DEFAULT_K: usize = 5;
/// Upper bound for `k` on every query
pub const MAX_K: usize = 1000;

/// An item id with its ranking score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f32,
}

/// How a recommendation list was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Summed similarity to the items the user rated
    ItemSimAggregate,
    /// Unknown user, ranked by item mean rating
    ColdStartItemMeans,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub user_id: String,
    pub strategy: Strategy,
    pub items: Vec<ScoredItem>,
}

/// Immutable query context built once from a trained model and its catalog.
///
/// All query methods take `&self`, so a single instance can be shared
/// across request handlers behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct Recommender {
    model: Model,
    catalog: Catalog,
    search: SearchIndex,
}

impl Recommender {
    pub fn new(model: Model, catalog: Catalog) -> Self {
        let search = SearchIndex::build(&catalog);
        Self {
            model,
            catalog,
            search,
        }
    }

    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn book(&self, book_id: &str) -> Option<&Book> {
        self.catalog.get(book_id)
    }

    /// Up to `k` nearest neighbors of `item_id`, highest similarity first.
    pub fn similar(&self, item_id: &str, k: usize) -> Result<Vec<ScoredItem>> {
        validate_k(k)?;
        let index = self
            .model
            .item_index(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.to_string()))?;

        Ok(self
            .model
            .similarity()
            .neighbors(index)
            .iter()
            .take(k)
            .map(|n| self.scored(n))
            .collect())
    }

    /// Top `k` unrated items for `user_id`.
    ///
    /// Known users get every item they have not rated, scored by the sum of
    /// its similarity to each item they rated. Unknown users fall back to
    /// the item mean-rating ranking.
    pub fn recommend(&self, user_id: &str, k: usize) -> Result<Recommendations> {
        validate_k(k)?;
        if user_id.trim().is_empty() {
            return Err(Error::Validation("user_id must not be empty".to_string()));
        }

        let history = match self.model.user_history(user_id) {
            Some(history) if !history.is_empty() => history,
            _ => {
                return Ok(Recommendations {
                    user_id: user_id.to_string(),
                    strategy: Strategy::ColdStartItemMeans,
                    items: self.popular(k)?,
                });
            }
        };

        let mut totals = vec![0.0f64; self.model.n_items()];
        for &rated in history {
            for n in self.model.similarity().neighbors(rated as usize) {
                totals[n.item as usize] += f64::from(n.score);
            }
        }

        let rated: BTreeSet<u32> = history.iter().copied().collect();
        let candidates: Vec<Neighbor> = totals
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !rated.contains(&(*i as u32)))
            .map(|(i, total)| Neighbor {
                item: i as u32,
                score: total as f32,
            })
            .collect();

        Ok(Recommendations {
            user_id: user_id.to_string(),
            strategy: Strategy::ItemSimAggregate,
            items: self.top_k(candidates, k),
        })
    }

    /// Top `k` items by mean rating, the cold-start ranking.
    pub fn popular(&self, k: usize) -> Result<Vec<ScoredItem>> {
        validate_k(k)?;
        let candidates = self
            .model
            .item_means()
            .iter()
            .enumerate()
            .map(|(i, &mean)| Neighbor {
                item: i as u32,
                score: mean,
            })
            .collect();
        Ok(self.top_k(candidates, k))
    }

    /// Books whose title, author or tags match `query`, most relevant first.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<&Book>> {
        if let Some(limit) = limit {
            check_count("limit", limit)?;
        }
        Ok(self
            .search
            .search(query, limit)?
            .into_iter()
            .filter_map(|(book_id, _)| self.catalog.get(book_id))
            .collect())
    }

    fn top_k(&self, mut candidates: Vec<Neighbor>, k: usize) -> Vec<ScoredItem> {
        candidates.sort_by(rank_order);
        candidates.truncate(k);
        candidates.iter().map(|n| self.scored(n)).collect()
    }

    fn scored(&self, n: &Neighbor) -> ScoredItem {
        ScoredItem {
            item_id: self.model.item_id(n.item as usize).to_string(),
            score: n.score,
        }
    }
}

/// Reject `k` outside `1..=MAX_K`.
pub fn validate_k(k: usize) -> Result<()> {
    check_count("k", k)
}

fn check_count(name: &str, value: usize) -> Result<()> {
    if value == 0 || value > MAX_K {
        return Err(Error::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_K, value
        )));
    }
    Ok(())
}
