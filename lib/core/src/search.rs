//! Case-insensitive catalog search over title, author and tags
use crate::{Book, Catalog, Error, Result};
use std::cmp::Ordering;

const TITLE_PHRASE_WEIGHT: u32 = 3;
const AUTHOR_PHRASE_WEIGHT: u32 = 2;
const TAG_PHRASE_WEIGHT: u32 = 1;
const TOKEN_WEIGHT: u32 = 1;

#[derive(Debug, Clone)]
struct SearchDoc {
    book_id: String,
    title: String,
    author: String,
    tags: Vec<String>,
}

impl SearchDoc {
    fn contains(&self, needle: &str) -> bool {
        self.title.contains(needle)
            || self.author.contains(needle)
            || self.tags.iter().any(|t| t.contains(needle))
    }
}

/// Lowercased copy of the catalog fields, in ascending `book_id` order
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    docs: Vec<SearchDoc>,
}

impl SearchIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let docs = catalog
            .iter()
            .map(|book: &Book| SearchDoc {
                book_id: book.book_id.clone(),
                title: book.title.to_lowercase(),
                author: book.author.to_lowercase(),
                tags: book.tags.iter().map(|t| t.to_lowercase()).collect(),
            })
            .collect();
        Self { docs }
    }

    /// Tokenize text for matching.
    /// Uses lowercase normalization and removes punctuation
    #[inline]
    pub fn tokenize(text: &str) -> Vec<String> {
        let mut tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .filter(|s| !s.is_empty() && s.chars().count() > 1) // Filter single chars
            .collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }

    /// Find books matching `query`, returning `(book_id, relevance)` pairs.
    ///
    /// A book matches when the whole query is a substring of its title, author
    /// or one of its tags, or when every query token is. Relevance adds
    /// 3/2/1 for a whole-phrase hit in title/author/tags plus 1 per token
    /// found anywhere. Results are ordered by relevance descending, then
    /// title, then `book_id`.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<(&str, u32)>> {
        let phrase = query.trim().to_lowercase();
        if phrase.is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }
        let tokens = Self::tokenize(&phrase);

        let mut hits: Vec<(&SearchDoc, u32)> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let mut score = 0;
                let mut phrase_hit = false;
                if doc.title.contains(&phrase) {
                    score += TITLE_PHRASE_WEIGHT;
                    phrase_hit = true;
                }
                if doc.author.contains(&phrase) {
                    score += AUTHOR_PHRASE_WEIGHT;
                    phrase_hit = true;
                }
                if doc.tags.iter().any(|t| t.contains(&phrase)) {
                    score += TAG_PHRASE_WEIGHT;
                    phrase_hit = true;
                }

                let token_hits = tokens.iter().filter(|t| doc.contains(t)).count() as u32;
                let all_tokens = !tokens.is_empty() && token_hits as usize == tokens.len();

                if phrase_hit || all_tokens {
                    Some((doc, score + token_hits * TOKEN_WEIGHT))
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| match b.1.cmp(&a.1) {
            Ordering::Equal => a
                .0
                .title
                .cmp(&b.0.title)
                .then_with(|| a.0.book_id.cmp(&b.0.book_id)),
            other => other,
        });
        if let Some(limit) = limit {
            hits.truncate(limit);
        }

        Ok(hits
            .into_iter()
            .map(|(doc, score)| (doc.book_id.as_str(), score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SearchIndex {
        SearchIndex::build(&Catalog::from_books(vec![
            Book::new("b1", "Fluent Python", "Luciano Ramalho", "python|programming"),
            Book::new("b2", "Python Crash Course", "Eric Matthes", "python|beginner"),
            Book::new("b3", "The Rust Programming Language", "Steve Klabnik", "rust"),
            Book::new("b4", "Monty Python's Flying Circus", "Graham Chapman", "comedy"),
            Book::new("b5", "Dune", "Frank Herbert", "sci-fi"),
        ]))
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            SearchIndex::tokenize("Rust, the Rust-Book! a"),
            vec!["book", "rust", "the"]
        );
    }

    #[test]
    fn test_case_insensitive_match() {
        let idx = index();
        let ids: Vec<&str> = idx.search("PYTHON", None).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(&"b3"));
        assert!(!ids.contains(&"b5"));
    }

    #[test]
    fn test_relevance_then_title() {
        let idx = index();
        let hits = idx.search("python", None).unwrap();
        // b1 and b2 hit title and tag, b4 only the title
        assert_eq!(hits[0], ("b1", 5));
        assert_eq!(hits[1], ("b2", 5));
        assert_eq!(hits[2], ("b4", 4));
    }

    #[test]
    fn test_author_and_tokens() {
        let idx = index();
        let hits = idx.search("klabnik", None).unwrap();
        assert_eq!(hits, vec![("b3", 3)]);

        // tokens spread over title and author
        let hits = idx.search("dune herbert", None).unwrap();
        assert_eq!(hits, vec![("b5", 2)]);

        assert!(idx.search("dune python", None).unwrap().is_empty());
    }

    #[test]
    fn test_limit_and_validation() {
        let idx = index();
        assert_eq!(idx.search("python", Some(1)).unwrap().len(), 1);
        assert!(matches!(idx.search("   ", None), Err(Error::Validation(_))));
    }
}
