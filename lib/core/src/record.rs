use serde::{Deserialize, Serialize};

/// A single user rating for a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: String,
    pub book_id: String,
    pub rating: f32,
}

impl Rating {
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>, book_id: impl Into<String>, rating: f32) -> Self {
        Self {
            user_id: user_id.into(),
            book_id: book_id.into(),
            rating,
        }
    }
}

/// Book metadata, keyed by `book_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Book {
    /// Build a book from raw CSV-style fields, splitting `tags` into a list.
    #[must_use]
    pub fn new(
        book_id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        tags: &str,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            title: title.into(),
            author: author.into(),
            tags: Self::parse_tags(tags),
        }
    }

    /// Split a raw tag field on `|`, `;` or `,`.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(['|', ';', ','])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            Book::parse_tags("python| data ;ml,,"),
            vec!["python", "data", "ml"]
        );
        assert!(Book::parse_tags("  ").is_empty());
    }

    #[test]
    fn test_book_new() {
        let book = Book::new("b1", "Fluent Python", "Luciano Ramalho", "python|programming");
        assert_eq!(book.book_id, "b1");
        assert_eq!(book.tags.len(), 2);
    }
}
