//! Core library surface for the Library Catalog Manager TUI application.
//!
//! Everything the binary needs is re-exported from here, which also keeps the
//! door open for scripts or tests that want the catalog without the terminal.
pub mod db;
pub mod filter;
pub mod models;
pub mod ui;
pub mod validate;

/// Persistence entry points. `main.rs` calls these to open the embedded
/// SQLite store and pull the initial snapshot of the catalog.
pub use db::{ensure_schema, fetch_authors, fetch_books_with_links, fetch_genres, seed_if_empty};

/// The domain types that every other layer passes around.
pub use models::{Author, Book, Genre};

/// Application state container and the terminal loop that drives it.
pub use ui::{run_app, App};
