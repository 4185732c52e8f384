use crate::{Error, Rating, Result};
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Sparse user-by-item rating matrix.
///
/// Users and items are indexed in ascending id order, so index order equals
/// id order. Repeated ratings of the same (user, item) pair are averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    users: Vec<String>,
    items: Vec<String>,
    // item -> [(user, rating)] ascending by user
    columns: Vec<Vec<(u32, f32)>>,
    // user -> [(item, rating)] ascending by item
    rows: Vec<Vec<(u32, f32)>>,
}

impl RatingMatrix {
    pub fn from_ratings(ratings: &[Rating]) -> Result<Self> {
        if ratings.is_empty() {
            return Err(Error::EmptyDataset("no ratings to build a matrix from".to_string()));
        }

        let users: Vec<String> = ratings
            .iter()
            .map(|r| r.user_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let items: Vec<String> = ratings
            .iter()
            .map(|r| r.book_id.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let user_idx: AHashMap<&str, u32> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), i as u32))
            .collect();
        let item_idx: AHashMap<&str, u32> = items
            .iter()
            .enumerate()
            .map(|(i, it)| (it.as_str(), i as u32))
            .collect();

        // (user, item) -> (sum, count)
        let mut cells: AHashMap<(u32, u32), (f64, u32)> = AHashMap::with_capacity(ratings.len());
        for r in ratings {
            let key = (user_idx[r.user_id.as_str()], item_idx[r.book_id.as_str()]);
            let cell = cells.entry(key).or_insert((0.0, 0));
            cell.0 += f64::from(r.rating);
            cell.1 += 1;
        }

        let mut columns: Vec<Vec<(u32, f32)>> = vec![Vec::new(); items.len()];
        let mut rows: Vec<Vec<(u32, f32)>> = vec![Vec::new(); users.len()];
        for ((u, i), (sum, count)) in cells {
            let value = (sum / f64::from(count)) as f32;
            columns[i as usize].push((u, value));
            rows[u as usize].push((i, value));
        }
        for column in &mut columns {
            column.sort_unstable_by_key(|&(u, _)| u);
        }
        for row in &mut rows {
            row.sort_unstable_by_key(|&(i, _)| i);
        }

        Ok(Self {
            users,
            items,
            columns,
            rows,
        })
    }

    #[inline]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    #[inline]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[inline]
    #[must_use]
    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    #[inline]
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Number of distinct (user, item) cells
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Ratings of an item, ascending by user index
    #[inline]
    pub fn column(&self, item: usize) -> &[(u32, f32)] {
        &self.columns[item]
    }

    /// Ratings by a user, ascending by item index
    #[inline]
    pub fn row(&self, user: usize) -> &[(u32, f32)] {
        &self.rows[user]
    }

    pub fn item_index(&self, item_id: &str) -> Option<usize> {
        self.items
            .binary_search_by(|it| it.as_str().cmp(item_id))
            .ok()
    }

    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.users
            .binary_search_by(|u| u.as_str().cmp(user_id))
            .ok()
    }
}
