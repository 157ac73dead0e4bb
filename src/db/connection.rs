use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection};

/// Dot-directory under the user's home that owns all catalog data.
const DATA_DIR_NAME: &str = ".library-catalog-manager";
/// Database file placed inside that directory.
const DB_FILE_NAME: &str = "catalog.sqlite";

/// Open the catalog database, creating the file and any missing tables on the
/// way. Foreign keys are switched on per connection because SQLite leaves them
/// off by default, and the cascade rules in the schema depend on them.
pub fn ensure_schema() -> Result<Connection> {
    let db_path = db_path()?;

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(&db_path).context("failed to open SQLite database")?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Apply the schema to an already-open connection. Kept separate from path
/// resolution so the tests can run the exact production schema against an
/// in-memory database.
pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(title) <= 200),
            publish_year INTEGER NOT NULL,
            isbn TEXT NOT NULL DEFAULT '' CHECK (length(isbn) <= 20),
            quantity_in_stock INTEGER NOT NULL DEFAULT 0 CHECK (quantity_in_stock >= 0)
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL CHECK (length(first_name) <= 50),
            last_name TEXT NOT NULL CHECK (length(last_name) <= 50),
            birth_date TEXT NOT NULL DEFAULT '',
            country TEXT NOT NULL DEFAULT '' CHECK (length(country) <= 50)
        )",
        [],
    )
    .context("failed to create authors table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE CHECK (length(name) <= 50),
            description TEXT NOT NULL DEFAULT '' CHECK (length(description) <= 200)
        )",
        [],
    )
    .context("failed to create genres table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS book_authors (
            book_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            PRIMARY KEY (book_id, author_id),
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY(author_id) REFERENCES authors(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create book_authors table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS book_genres (
            book_id INTEGER NOT NULL,
            genre_id INTEGER NOT NULL,
            PRIMARY KEY (book_id, genre_id),
            FOREIGN KEY(book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY(genre_id) REFERENCES genres(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create book_genres table")?;

    Ok(())
}

/// Populate a brand-new catalog with a small set of classics so the first run
/// shows the screens working instead of an empty table. Skipped entirely when
/// any catalog row already exists, which also keeps re-runs from tripping the
/// unique genre name constraint.
pub fn seed_if_empty(conn: &mut Connection) -> Result<()> {
    let occupied: i64 = conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM books)
                  + (SELECT COUNT(*) FROM authors)
                  + (SELECT COUNT(*) FROM genres)",
            [],
            |row| row.get(0),
        )
        .context("failed to count catalog rows")?;
    if occupied > 0 {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to begin seed transaction")?;

    let mut author_ids = Vec::new();
    for (first, last, born, country) in [
        ("Лев", "Толстой", "1828-09-09", "Россия"),
        ("Фёдор", "Достоевский", "1821-11-11", "Россия"),
        ("Антон", "Чехов", "1860-01-29", "Россия"),
    ] {
        tx.execute(
            "INSERT INTO authors (first_name, last_name, birth_date, country)
             VALUES (?1, ?2, ?3, ?4)",
            params![first, last, born, country],
        )
        .context("failed to seed author")?;
        author_ids.push(tx.last_insert_rowid());
    }

    let mut genre_ids = Vec::new();
    for (name, description) in [
        ("Роман", "Художественная литература"),
        ("Драма", "Драматические произведения"),
        ("Рассказ", "Короткая проза"),
    ] {
        tx.execute(
            "INSERT INTO genres (name, description) VALUES (?1, ?2)",
            params![name, description],
        )
        .context("failed to seed genre")?;
        genre_ids.push(tx.last_insert_rowid());
    }

    for (title, year, isbn, quantity, author_idx, genre_idx) in [
        ("Война и мир", 1869, "978-5-699-12014-7", 5, 0, 0),
        ("Преступление и наказание", 1866, "978-5-699-12015-4", 3, 1, 0),
        ("Дама с собачкой", 1899, "978-5-699-12016-1", 2, 2, 2),
    ] {
        tx.execute(
            "INSERT INTO books (title, publish_year, isbn, quantity_in_stock)
             VALUES (?1, ?2, ?3, ?4)",
            params![title, year, isbn, quantity],
        )
        .context("failed to seed book")?;
        let book_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2)",
            params![book_id, author_ids[author_idx]],
        )
        .context("failed to seed book author link")?;
        tx.execute(
            "INSERT INTO book_genres (book_id, genre_id) VALUES (?1, ?2)",
            params![book_id, genre_ids[genre_idx]],
        )
        .context("failed to seed book genre link")?;
    }

    tx.commit().context("failed to commit seed transaction")
}

/// Absolute location of the database file under the user's home directory.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// In-memory database carrying the production schema, for tests.
#[cfg(test)]
pub(crate) fn open_test_catalog() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    create_tables(&conn)?;
    Ok(conn)
}
