use anyhow::{anyhow, Context, Result};
use rusqlite::{ffi, params, Connection, Error as SqlError};

use crate::models::Genre;

/// Retrieve every genre sorted by name, case-insensitively. The query doubles
/// as the single source of truth for how we order genres in the UI.
pub fn fetch_genres(conn: &Connection) -> Result<Vec<Genre>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, description
             FROM genres
             ORDER BY name COLLATE NOCASE",
        )
        .context("failed to prepare genre query")?;

    let genres = stmt
        .query_map([], |row| {
            Ok(Genre {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })
        .context("failed to load genres")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect genres")?;

    Ok(genres)
}

/// Insert a genre row and hand back the stored struct, id included. A name
/// collision with an existing genre comes back as a validation error.
pub fn create_genre(conn: &Connection, name: &str, description: &str) -> Result<Genre> {
    conn.execute(
        "INSERT INTO genres (name, description) VALUES (?1, ?2)",
        params![name, description],
    )
    .map_err(|err| map_unique_name(err, name))
    .context("failed to insert genre")?;

    let id = conn.last_insert_rowid();
    Ok(Genre {
        id,
        name: name.to_string(),
        description: description.to_string(),
    })
}

/// Update the name and description of an existing genre. Returns `false` when
/// the row vanished between selection and commit; callers treat that as a
/// no-op and let the following reload show the true state.
pub fn update_genre(conn: &Connection, id: i64, name: &str, description: &str) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE genres SET name = ?1, description = ?2 WHERE id = ?3",
            params![name, description, id],
        )
        .map_err(|err| map_unique_name(err, name))
        .context("failed to update genre")?;

    Ok(updated > 0)
}

/// Remove a genre row. The schema cascades to `book_genres`, so linked books
/// simply lose the entry. Returns `false` when the row was already gone.
pub fn delete_genre(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM genres WHERE id = ?1", params![id])
        .context("failed to delete genre")?;

    Ok(deleted > 0)
}

/// Coerce SQLite constraint errors into human-readable messages. The genres
/// table carries length checks next to the unique name index, so we match the
/// extended error code and only rewrite failures coming from the index itself.
fn map_unique_name(err: SqlError, name: &str) -> anyhow::Error {
    if matches!(
        err.sqlite_error(),
        Some(inner) if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    ) {
        anyhow!("A genre named '{name}' already exists")
    } else {
        err.into()
    }
}
