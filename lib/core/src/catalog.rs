use crate::Book;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Book metadata indexed by `book_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    books: BTreeMap<String, Book>,
}

impl Catalog {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, keeping the first book seen for each `book_id`.
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        let mut catalog = Self::new();
        for book in books {
            catalog.insert(book);
        }
        catalog
    }

    /// Insert a book unless its id is already present. Returns whether it was added.
    pub fn insert(&mut self, book: Book) -> bool {
        if self.books.contains_key(&book.book_id) {
            return false;
        }
        self.books.insert(book.book_id.clone(), book);
        true
    }

    #[inline]
    pub fn get(&self, book_id: &str) -> Option<&Book> {
        self.books.get(book_id)
    }

    #[inline]
    pub fn contains(&self, book_id: &str) -> bool {
        self.books.contains_key(book_id)
    }

    /// Books in ascending `book_id` order
    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_book_wins() {
        let catalog = Catalog::from_books(vec![
            Book::new("b1", "First", "", ""),
            Book::new("b1", "Second", "", ""),
            Book::new("b0", "Other", "", ""),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b1").unwrap().title, "First");
        let ids: Vec<_> = catalog.iter().map(|b| b.book_id.as_str()).collect();
        assert_eq!(ids, vec!["b0", "b1"]);
    }
}
