//! Persistence helpers around the embedded SQLite database. Each submodule
//! owns the queries for one table family so the rest of the codebase can stay
//! focused on UI state management.

mod authors;
mod books;
mod connection;
mod genres;

pub use authors::{create_author, delete_author, fetch_authors, update_author};
pub use books::{
    create_book, create_book_with_links, delete_book, fetch_books, fetch_books_with_links,
    replace_author_links, replace_genre_links, update_book, update_book_with_links,
};
pub use connection::{ensure_schema, seed_if_empty};
pub use genres::{create_genre, delete_genre, fetch_genres, update_genre};

#[cfg(test)]
pub(crate) use connection::open_test_catalog;
