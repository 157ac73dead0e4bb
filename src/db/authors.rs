use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::Author;

/// Retrieve every author sorted by name, case-insensitively, so the list reads
/// like an index regardless of how names were capitalized.
pub fn fetch_authors(conn: &Connection) -> Result<Vec<Author>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, first_name, last_name, birth_date, country
             FROM authors
             ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE",
        )
        .context("failed to prepare author query")?;

    let authors = stmt
        .query_map([], |row| {
            Ok(Author {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                birth_date: row.get(3)?,
                country: row.get(4)?,
            })
        })
        .context("failed to load authors")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect authors")?;

    Ok(authors)
}

/// Insert an author and return it with the generated id filled in.
pub fn create_author(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    birth_date: &str,
    country: &str,
) -> Result<Author> {
    conn.execute(
        "INSERT INTO authors (first_name, last_name, birth_date, country)
         VALUES (?1, ?2, ?3, ?4)",
        params![first_name, last_name, birth_date, country],
    )
    .context("failed to insert author")?;

    let id = conn.last_insert_rowid();
    Ok(Author {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        birth_date: birth_date.to_string(),
        country: country.to_string(),
    })
}

/// Update all editable author fields. Returns `false` when the row vanished
/// between selection and commit; callers treat that as a no-op and let the
/// following reload show the true state.
pub fn update_author(
    conn: &Connection,
    id: i64,
    first_name: &str,
    last_name: &str,
    birth_date: &str,
    country: &str,
) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE authors
             SET first_name = ?1, last_name = ?2, birth_date = ?3, country = ?4
             WHERE id = ?5",
            params![first_name, last_name, birth_date, country, id],
        )
        .context("failed to update author")?;

    Ok(updated > 0)
}

/// Remove an author row. The schema cascades to `book_authors`, so linked
/// books simply lose the entry. Returns `false` when the row was already gone.
pub fn delete_author(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM authors WHERE id = ?1", params![id])
        .context("failed to delete author")?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_test_catalog;

    #[test]
    fn create_and_fetch_round_trip() {
        let conn = open_test_catalog().expect("schema");
        let created = create_author(&conn, "Антон", "Чехов", "1860-01-29", "Россия")
            .expect("create author");
        assert!(created.id > 0);

        let authors = fetch_authors(&conn).expect("fetch authors");
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].full_name(), "Антон Чехов");
        assert_eq!(authors[0].birth_date, "1860-01-29");
    }

    #[test]
    fn fetch_orders_by_last_then_first_name() {
        let conn = open_test_catalog().expect("schema");
        create_author(&conn, "zoe", "brown", "", "").expect("create");
        create_author(&conn, "Adam", "Brown", "", "").expect("create");
        create_author(&conn, "Mia", "adams", "", "").expect("create");

        let names: Vec<String> = fetch_authors(&conn)
            .expect("fetch")
            .iter()
            .map(Author::full_name)
            .collect();
        assert_eq!(names, vec!["Mia adams", "Adam Brown", "zoe brown"]);
    }

    #[test]
    fn update_rewrites_every_field() {
        let conn = open_test_catalog().expect("schema");
        let author = create_author(&conn, "Лев", "Толстой", "", "").expect("create");

        let touched = update_author(&conn, author.id, "Лев", "Толстой", "1828-09-09", "Россия")
            .expect("update");
        assert!(touched);

        let authors = fetch_authors(&conn).expect("fetch");
        assert_eq!(authors[0].birth_date, "1828-09-09");
        assert_eq!(authors[0].country, "Россия");
    }

    #[test]
    fn update_of_missing_row_is_a_no_op() {
        let conn = open_test_catalog().expect("schema");
        let touched = update_author(&conn, 42, "x", "y", "", "").expect("update");
        assert!(!touched);
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let conn = open_test_catalog().expect("schema");
        let author = create_author(&conn, "Фёдор", "Достоевский", "", "").expect("create");
        assert!(delete_author(&conn, author.id).expect("delete"));
        assert!(!delete_author(&conn, author.id).expect("repeat delete"));
    }
}
