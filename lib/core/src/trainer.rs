use crate::{Catalog, Dataset, Model, RatingMatrix, Result, SimilarityMetric, SimilarityTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Counters describing a training run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub users: usize,
    pub items: usize,
    pub ratings: usize,
    pub books: usize,
    pub dropped_ratings: usize,
    pub similarity_pairs: usize,
}

/// Output of [`train`]: everything the server needs, independent of the CSVs
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: Model,
    pub catalog: Catalog,
    pub stats: TrainingStats,
}

/// Build the item-item similarity model from a loaded dataset.
pub fn train(dataset: &Dataset, metric: SimilarityMetric) -> Result<TrainedModel> {
    let start = Instant::now();
    let matrix = RatingMatrix::from_ratings(dataset.ratings())?;
    info!(
        "Rating matrix: {} users x {} items, {} cells",
        matrix.n_users(),
        matrix.n_items(),
        matrix.nnz()
    );

    let similarity = SimilarityTable::compute(&matrix, metric);
    let item_means = item_means(dataset, &matrix);

    let user_history: BTreeMap<String, Vec<u32>> = matrix
        .users()
        .iter()
        .enumerate()
        .map(|(u, user)| (user.clone(), matrix.row(u).iter().map(|&(i, _)| i).collect()))
        .collect();

    let stats = TrainingStats {
        users: matrix.n_users(),
        items: matrix.n_items(),
        ratings: dataset.ratings().len(),
        books: dataset.catalog().len(),
        dropped_ratings: dataset.dropped_ratings(),
        similarity_pairs: similarity.pair_count(),
    };

    let model = Model::new(
        metric,
        matrix.items().to_vec(),
        similarity,
        item_means,
        user_history,
    )?;

    info!(
        "Trained {} similarity over {} items ({} pairs) in {:.2?}",
        metric,
        stats.items,
        stats.similarity_pairs,
        start.elapsed()
    );

    Ok(TrainedModel {
        model,
        catalog: dataset.catalog().clone(),
        stats,
    })
}

/// Arithmetic mean of every rating row per item, aligned with the matrix items.
fn item_means(dataset: &Dataset, matrix: &RatingMatrix) -> Vec<f32> {
    let mut sums = vec![(0.0f64, 0u32); matrix.n_items()];
    for rating in dataset.ratings() {
        if let Some(i) = matrix.item_index(&rating.book_id) {
            sums[i].0 += f64::from(rating.rating);
            sums[i].1 += 1;
        }
    }
    sums.into_iter()
        .map(|(sum, count)| if count > 0 { (sum / f64::from(count)) as f32 } else { 0.0 })
        .collect()
}
