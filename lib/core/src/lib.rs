//! # bookrec Core
//!
//! Core library for the bookrec item-based recommender.
//!
//! This crate provides the data model and the algorithms:
//!
//! - [`Rating`], [`Book`] - Typed records loaded from CSV
//! - [`Dataset`] - Schema-validated load of `ratings.csv` and `books.csv`
//! - [`RatingMatrix`] - Sparse user-by-item rating matrix
//! - [`SimilarityTable`] - Item-item similarity over co-rating vectors
//! - [`Model`] - Trained similarity, mean-rating table and user histories
//! - [`Recommender`] - Immutable query context (similar, recommend, search)
//!
//! ## Example
//!
//! ```rust
//! use bookrec_core::{Book, Catalog, Dataset, Rating, Recommender, SimilarityMetric, UnknownBookPolicy};
//!
//! let books = Catalog::from_books(vec![
//!     Book::new("b1", "Rust in Action", "Tim McNamara", "rust|systems"),
//!     Book::new("b2", "Programming Rust", "Jim Blandy", "rust"),
//! ]);
//! let ratings = vec![
//!     Rating::new("u1", "b1", 5.0),
//!     Rating::new("u1", "b2", 4.0),
//!     Rating::new("u2", "b1", 4.0),
//! ];
//! let dataset = Dataset::from_records(ratings, books, UnknownBookPolicy::Drop).unwrap();
//! let trained = bookrec_core::train(&dataset, SimilarityMetric::Cosine).unwrap();
//!
//! let recommender = Recommender::new(trained.model, trained.catalog);
//! let similar = recommender.similar("b1", 5).unwrap();
//! assert_eq!(similar[0].item_id, "b2");
//! ```

pub mod error;
pub mod record;
pub mod catalog;
pub mod dataset;
pub mod matrix;
pub mod similarity;
pub mod model;
pub mod recommend;
pub mod search;
pub mod trainer;

pub use error::{Error, Result};
pub use record::{Book, Rating};
pub use catalog::Catalog;
pub use dataset::{Dataset, UnknownBookPolicy};
pub use matrix::RatingMatrix;
pub use similarity::{Neighbor, SimilarityMetric, SimilarityTable};
pub use model::Model;
pub use recommend::{Recommendations, Recommender, ScoredItem, Strategy, DEFAULT_K, MAX_K};
pub use search::SearchIndex;
pub use trainer::{train, TrainedModel, TrainingStats};
