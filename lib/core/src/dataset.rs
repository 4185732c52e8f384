//! Schema-validated loading of the training CSVs.
//!
//! `ratings.csv` must carry `user_id,book_id,rating`; `books.csv` must carry
//! `book_id,title` and may carry `author` and `tags`. Column order is free,
//! extra columns are ignored. Any malformed row fails the whole load with the
//! file name and line number.

use crate::{Book, Catalog, Error, Rating, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const RATINGS_FILE: &str = "ratings.csv";
pub const BOOKS_FILE: &str = "books.csv";

/// What to do with ratings that reference a `book_id` missing from `books.csv`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownBookPolicy {
    /// Drop the row and log a warning
    #[default]
    Drop,
    /// Fail the load
    Reject,
}

/// Ratings and book metadata ready for training
#[derive(Debug, Clone)]
pub struct Dataset {
    ratings: Vec<Rating>,
    catalog: Catalog,
    dropped_ratings: usize,
}

impl Dataset {
    /// Load `ratings.csv` and `books.csv` from `data_dir`.
    pub fn load<P: AsRef<Path>>(data_dir: P, policy: UnknownBookPolicy) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let catalog = load_books(data_dir.join(BOOKS_FILE))?;
        let ratings = load_ratings(data_dir.join(RATINGS_FILE))?;
        Self::from_records(ratings, catalog, policy)
    }

    /// Apply the unknown-book policy to already parsed records.
    pub fn from_records(
        ratings: Vec<Rating>,
        catalog: Catalog,
        policy: UnknownBookPolicy,
    ) -> Result<Self> {
        if ratings.is_empty() {
            return Err(Error::EmptyDataset("no ratings to train on".to_string()));
        }

        let total = ratings.len();
        let mut unknown: BTreeSet<String> = BTreeSet::new();
        let mut kept = Vec::with_capacity(total);

        for rating in ratings {
            if catalog.contains(&rating.book_id) {
                kept.push(rating);
                continue;
            }
            match policy {
                UnknownBookPolicy::Reject => {
                    return Err(Error::UnknownBook {
                        user_id: rating.user_id,
                        book_id: rating.book_id,
                    });
                }
                UnknownBookPolicy::Drop => {
                    unknown.insert(rating.book_id);
                }
            }
        }

        let dropped_ratings = total - kept.len();
        if dropped_ratings > 0 {
            let sample: Vec<&str> = unknown.iter().take(5).map(String::as_str).collect();
            warn!(
                dropped = dropped_ratings,
                unknown_books = unknown.len(),
                "Dropping ratings for books missing from the catalog (e.g. {:?})",
                sample
            );
        }

        if kept.is_empty() {
            return Err(Error::EmptyDataset(
                "no ratings reference a book in the catalog".to_string(),
            ));
        }

        Ok(Self {
            ratings: kept,
            catalog,
            dropped_ratings,
        })
    }

    #[inline]
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn dropped_ratings(&self) -> usize {
        self.dropped_ratings
    }
}

/// Load and validate a ratings CSV file.
pub fn load_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<Rating>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Dataset {
        path: path.display().to_string(),
        line: 0,
        message: format!("Failed to open CSV: {}", e),
    })?;
    read_ratings(file, &path.display().to_string())
}

/// Load and validate a books CSV file.
pub fn load_books<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Dataset {
        path: path.display().to_string(),
        line: 0,
        message: format!("Failed to open CSV: {}", e),
    })?;
    read_books(file, &path.display().to_string())
}

/// Parse ratings from any reader. `source` names the input in error messages.
pub fn read_ratings<R: Read>(reader: R, source: &str) -> Result<Vec<Rating>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = read_headers(&mut reader, source)?;

    let user_col = column_index(&headers, "user_id", source)?;
    let book_col = column_index(&headers, "book_id", source)?;
    let rating_col = column_index(&headers, "rating", source)?;

    let mut ratings = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(e, source))?;
        let line = record_line(&record);

        let user_id = required_field(&record, user_col, "user_id", source, line)?;
        let book_id = required_field(&record, book_col, "book_id", source, line)?;
        let raw = required_field(&record, rating_col, "rating", source, line)?;

        let rating: f32 = raw.parse().map_err(|_| Error::Dataset {
            path: source.to_string(),
            line,
            message: format!("rating '{}' is not a number", raw),
        })?;
        if !rating.is_finite() {
            return Err(Error::Dataset {
                path: source.to_string(),
                line,
                message: format!("rating '{}' is not finite", raw),
            });
        }

        ratings.push(Rating::new(user_id, book_id, rating));
    }

    if ratings.is_empty() {
        return Err(Error::EmptyDataset(format!("{} has no rating rows", source)));
    }

    debug!("Loaded {} ratings from {}", ratings.len(), source);
    Ok(ratings)
}

/// Parse book metadata from any reader. Duplicate ids keep the first row.
pub fn read_books<R: Read>(reader: R, source: &str) -> Result<Catalog> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = read_headers(&mut reader, source)?;

    let id_col = column_index(&headers, "book_id", source)?;
    let title_col = column_index(&headers, "title", source)?;
    let author_col = headers.iter().position(|h| h == "author");
    let tags_col = headers.iter().position(|h| h == "tags");

    let mut catalog = Catalog::new();
    let mut duplicates = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(e, source))?;
        let line = record_line(&record);

        let book_id = required_field(&record, id_col, "book_id", source, line)?;
        let title = required_field(&record, title_col, "title", source, line)?;
        let author = author_col.and_then(|c| record.get(c)).unwrap_or_default();
        let tags = tags_col.and_then(|c| record.get(c)).unwrap_or_default();

        if !catalog.insert(Book::new(book_id, title, author, tags)) {
            duplicates += 1;
        }
    }

    if catalog.is_empty() {
        return Err(Error::EmptyDataset(format!("{} has no book rows", source)));
    }
    if duplicates > 0 {
        warn!("{}: ignored {} duplicate book_id rows", source, duplicates);
    }

    debug!("Loaded {} books from {}", catalog.len(), source);
    Ok(catalog)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>, source: &str) -> Result<StringRecord> {
    let headers = reader.headers().map_err(|e| csv_error(e, source))?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(Error::EmptyDataset(format!("{} is empty", source)));
    }
    Ok(headers)
}

fn column_index(headers: &StringRecord, column: &str, source: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| Error::MissingColumn {
            path: source.to_string(),
            column: column.to_string(),
        })
}

fn required_field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    source: &str,
    line: u64,
) -> Result<&'r str> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Dataset {
            path: source.to_string(),
            line,
            message: format!("missing value for '{}'", name),
        }),
    }
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn csv_error(err: csv::Error, source: &str) -> Error {
    Error::Dataset {
        path: source.to_string(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS: &str = "book_id,title,author,tags\n\
        b1,Fluent Python,Luciano Ramalho,python|programming\n\
        b2,The Rust Book,Steve Klabnik,rust\n";

    #[test]
    fn test_read_ratings() {
        let csv = "user_id,book_id,rating\nu1,b1,5\nu2, b2 ,3.5\n";
        let ratings = read_ratings(csv.as_bytes(), "ratings.csv").unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1], Rating::new("u2", "b2", 3.5));
    }

    #[test]
    fn test_column_order_is_free() {
        let csv = "rating,book_id,user_id\n4,b1,u1\n";
        let ratings = read_ratings(csv.as_bytes(), "ratings.csv").unwrap();
        assert_eq!(ratings[0], Rating::new("u1", "b1", 4.0));
    }

    #[test]
    fn test_missing_column() {
        let csv = "user_id,book_id\nu1,b1\n";
        let err = read_ratings(csv.as_bytes(), "ratings.csv").unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "rating"));
    }

    #[test]
    fn test_malformed_rating_reports_line() {
        let csv = "user_id,book_id,rating\nu1,b1,5\nu2,b2,great\n";
        match read_ratings(csv.as_bytes(), "ratings.csv").unwrap_err() {
            Error::Dataset { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("great"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let csv = "user_id,book_id,rating\nu1,b1,NaN\n";
        assert!(matches!(
            read_ratings(csv.as_bytes(), "ratings.csv"),
            Err(Error::Dataset { .. })
        ));
    }

    #[test]
    fn test_empty_ratings() {
        assert!(matches!(
            read_ratings("".as_bytes(), "ratings.csv"),
            Err(Error::EmptyDataset(_))
        ));
        assert!(matches!(
            read_ratings("user_id,book_id,rating\n".as_bytes(), "ratings.csv"),
            Err(Error::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_read_books_optional_columns() {
        let csv = "book_id,title\nb1,Dune\n";
        let catalog = read_books(csv.as_bytes(), "books.csv").unwrap();
        let book = catalog.get("b1").unwrap();
        assert_eq!(book.author, "");
        assert!(book.tags.is_empty());
    }

    #[test]
    fn test_empty_title_reports_line() {
        let csv = "book_id,title,author,tags\nb1,Dune,Frank Herbert,sci-fi\nb2,,Someone,x\n";
        match read_books(csv.as_bytes(), "books.csv").unwrap_err() {
            Error::Dataset { path, line, message } => {
                assert_eq!(path, "books.csv");
                assert_eq!(line, 3);
                assert!(message.contains("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_books_dropped() {
        let catalog = read_books(BOOKS.as_bytes(), "books.csv").unwrap();
        let ratings = vec![Rating::new("u1", "b1", 5.0), Rating::new("u1", "b9", 2.0)];
        let dataset = Dataset::from_records(ratings, catalog, UnknownBookPolicy::Drop).unwrap();
        assert_eq!(dataset.ratings().len(), 1);
        assert_eq!(dataset.dropped_ratings(), 1);
    }

    #[test]
    fn test_unknown_books_rejected() {
        let catalog = read_books(BOOKS.as_bytes(), "books.csv").unwrap();
        let ratings = vec![Rating::new("u1", "b9", 2.0)];
        let err = Dataset::from_records(ratings, catalog, UnknownBookPolicy::Reject).unwrap_err();
        assert!(matches!(err, Error::UnknownBook { ref book_id, .. } if book_id == "b9"));
    }

    #[test]
    fn test_all_unknown_is_empty() {
        let catalog = read_books(BOOKS.as_bytes(), "books.csv").unwrap();
        let ratings = vec![Rating::new("u1", "b9", 2.0)];
        let err = Dataset::from_records(ratings, catalog, UnknownBookPolicy::Drop).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset(_)));
        assert!(err.is_dataset_error());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BOOKS_FILE), BOOKS).unwrap();
        std::fs::write(
            dir.path().join(RATINGS_FILE),
            "user_id,book_id,rating\nu1,b1,5\nu1,b2,4\n",
        )
        .unwrap();
        let dataset = Dataset::load(dir.path(), UnknownBookPolicy::Drop).unwrap();
        assert_eq!(dataset.ratings().len(), 2);
        assert_eq!(dataset.catalog().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load(dir.path(), UnknownBookPolicy::Drop).unwrap_err();
        assert!(matches!(err, Error::Dataset { line: 0, .. }));
    }
}
