//! In-memory filtering of the book list. The whole catalog stays loaded at
//! once, so filtering is a single linear pass that never touches the database.
//! The three dimensions (title text, author, genre) compose with AND and the
//! output preserves the input order, which keeps the books table stable while
//! the user narrows the view.

use crate::models::Book;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Active filter state for the books screen. An empty `text` and `None` ids
/// mean the dimension is inactive.
pub struct CatalogFilter {
    /// Case-insensitive substring matched against book titles. Whitespace-only
    /// text counts as inactive.
    pub text: String,
    /// When set, only books linked to this author pass.
    pub author_id: Option<i64>,
    /// When set, only books linked to this genre pass.
    pub genre_id: Option<i64>,
}

impl CatalogFilter {
    /// True when no dimension is active, meaning `apply` would return the
    /// input list unchanged.
    pub fn is_clear(&self) -> bool {
        self.text.trim().is_empty() && self.author_id.is_none() && self.genre_id.is_none()
    }

    /// Reset every dimension. Used by the reset-filters key.
    pub fn clear(&mut self) {
        self.text.clear();
        self.author_id = None;
        self.genre_id = None;
    }

    /// Produce the visible subset of `books`. Each active dimension must
    /// match; inactive dimensions pass everything. Order follows the input
    /// list, so a cleared filter round-trips the catalog untouched.
    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        let query = self.text.to_lowercase();
        let text_active = !query.trim().is_empty();
        books
            .iter()
            .filter(|book| {
                if text_active && !book.title.to_lowercase().contains(&query) {
                    return false;
                }
                if let Some(author_id) = self.author_id {
                    if !book.authors.iter().any(|author| author.id == author_id) {
                        return false;
                    }
                }
                if let Some(genre_id) = self.genre_id {
                    if !book.genres.iter().any(|genre| genre.id == genre_id) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Genre};

    fn author(id: i64, first: &str, last: &str) -> Author {
        Author {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: String::new(),
            country: String::new(),
        }
    }

    fn genre(id: i64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
            description: String::new(),
        }
    }

    fn book(id: i64, title: &str, authors: Vec<Author>, genres: Vec<Genre>) -> Book {
        Book {
            id,
            title: title.to_string(),
            publish_year: 1869,
            isbn: String::new(),
            quantity_in_stock: 1,
            authors,
            genres,
        }
    }

    /// Three classics mirroring the seed catalog: Tolstoy id 1, Dostoevsky
    /// id 2, Chekhov id 3.
    fn sample_catalog() -> Vec<Book> {
        vec![
            book(
                1,
                "Война и мир",
                vec![author(1, "Лев", "Толстой")],
                vec![genre(1, "Роман")],
            ),
            book(
                2,
                "Преступление и наказание",
                vec![author(2, "Фёдор", "Достоевский")],
                vec![genre(1, "Роман")],
            ),
            book(
                3,
                "Дама с собачкой",
                vec![author(3, "Антон", "Чехов")],
                vec![genre(3, "Рассказ")],
            ),
        ]
    }

    #[test]
    fn clear_filter_returns_input_in_order() {
        let books = sample_catalog();
        let filter = CatalogFilter::default();
        assert!(filter.is_clear());
        let visible = filter.apply(&books);
        let ids: Vec<i64> = visible.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn whitespace_text_is_inactive() {
        let books = sample_catalog();
        let filter = CatalogFilter {
            text: "   ".to_string(),
            ..CatalogFilter::default()
        };
        assert!(filter.is_clear());
        assert_eq!(filter.apply(&books).len(), 3);
    }

    #[test]
    fn text_match_is_case_insensitive() {
        let books = sample_catalog();
        let filter = CatalogFilter {
            text: "вОЙНА".to_string(),
            ..CatalogFilter::default()
        };
        let visible = filter.apply(&books);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Война и мир");
    }

    #[test]
    fn dimensions_compose_with_and() {
        let books = sample_catalog();
        let filter = CatalogFilter {
            text: "Война".to_string(),
            author_id: Some(1),
            genre_id: None,
        };
        let visible = filter.apply(&books);
        let titles: Vec<&str> = visible.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Война и мир"]);

        // Same text with a mismatched author passes nothing.
        let filter = CatalogFilter {
            text: "Война".to_string(),
            author_id: Some(3),
            genre_id: None,
        };
        assert!(filter.apply(&books).is_empty());
    }

    #[test]
    fn author_filter_selects_linked_books_only() {
        let books = sample_catalog();
        let filter = CatalogFilter {
            author_id: Some(2),
            ..CatalogFilter::default()
        };
        let visible = filter.apply(&books);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Преступление и наказание");
    }

    #[test]
    fn genre_filter_keeps_input_order() {
        let books = sample_catalog();
        let filter = CatalogFilter {
            genre_id: Some(1),
            ..CatalogFilter::default()
        };
        let ids: Vec<i64> = filter.apply(&books).iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn clear_resets_every_dimension() {
        let mut filter = CatalogFilter {
            text: "Дама".to_string(),
            author_id: Some(3),
            genre_id: Some(3),
        };
        filter.clear();
        assert!(filter.is_clear());
        assert_eq!(filter.apply(&sample_catalog()).len(), 3);
    }
}
