//! Binary entry point wiring the SQLite catalog store to the terminal UI.
//! Startup opens the database, seeds it on a first run, loads one snapshot of
//! every table, and then hands control to the Ratatui event loop until the
//! user exits.
use library_catalog_manager::{
    ensure_schema, fetch_authors, fetch_books_with_links, fetch_genres, run_app, seed_if_empty,
    App,
};

/// Open the store, hydrate the initial state, and run the terminal loop.
///
/// Fatal startup problems, such as an unwritable home directory, surface here
/// as an error instead of a panic.
fn main() -> anyhow::Result<()> {
    let mut conn = ensure_schema()?;
    seed_if_empty(&mut conn)?;

    let books = fetch_books_with_links(&conn)?;
    let authors = fetch_authors(&conn)?;
    let genres = fetch_genres(&conn)?;

    let mut app = App::new(conn, books, authors, genres);
    run_app(&mut app)
}
