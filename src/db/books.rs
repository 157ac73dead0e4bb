use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::models::{Author, Book, Genre};

/// Retrieve every book sorted by title, case-insensitively. Link collections
/// are left empty here; list views that need them go through
/// [`fetch_books_with_links`] instead.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title, publish_year, isbn, quantity_in_stock
             FROM books
             ORDER BY title COLLATE NOCASE",
        )
        .context("failed to prepare book query")?;

    let books = stmt
        .query_map([], |row| {
            Ok(Book {
                id: row.get(0)?,
                title: row.get(1)?,
                publish_year: row.get(2)?,
                isbn: row.get(3)?,
                quantity_in_stock: row.get(4)?,
                authors: Vec::new(),
                genres: Vec::new(),
            })
        })
        .context("failed to load books")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect books")?;

    Ok(books)
}

/// Retrieve every book with its author and genre links resolved. Three fixed
/// queries and an in-memory join keep the cost flat no matter how many books
/// exist, instead of issuing follow-up queries per row.
pub fn fetch_books_with_links(conn: &Connection) -> Result<Vec<Book>> {
    let mut books = fetch_books(conn)?;
    let mut index = HashMap::new();
    for (position, book) in books.iter().enumerate() {
        index.insert(book.id, position);
    }

    let mut stmt = conn
        .prepare(
            "SELECT ba.book_id, a.id, a.first_name, a.last_name, a.birth_date, a.country
             FROM book_authors ba
             INNER JOIN authors a ON a.id = ba.author_id
             ORDER BY a.last_name COLLATE NOCASE, a.first_name COLLATE NOCASE",
        )
        .context("failed to prepare author links query")?;
    let author_links = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Author {
                    id: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    birth_date: row.get(4)?,
                    country: row.get(5)?,
                },
            ))
        })
        .context("failed to iterate author links")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect author links")?;
    for (book_id, author) in author_links {
        if let Some(&position) = index.get(&book_id) {
            books[position].authors.push(author);
        }
    }

    let mut stmt = conn
        .prepare(
            "SELECT bg.book_id, g.id, g.name, g.description
             FROM book_genres bg
             INNER JOIN genres g ON g.id = bg.genre_id
             ORDER BY g.name COLLATE NOCASE",
        )
        .context("failed to prepare genre links query")?;
    let genre_links = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Genre {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                },
            ))
        })
        .context("failed to iterate genre links")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect genre links")?;
    for (book_id, genre) in genre_links {
        if let Some(&position) = index.get(&book_id) {
            books[position].genres.push(genre);
        }
    }

    Ok(books)
}

/// Insert a new book row, returning the hydrated struct. Link collections
/// start empty; callers attach them with [`replace_author_links`] and
/// [`replace_genre_links`], or use [`create_book_with_links`] to do the whole
/// write in one transaction.
pub fn create_book(
    conn: &Connection,
    title: &str,
    publish_year: i64,
    isbn: &str,
    quantity_in_stock: i64,
) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, publish_year, isbn, quantity_in_stock)
         VALUES (?1, ?2, ?3, ?4)",
        params![title, publish_year, isbn, quantity_in_stock],
    )
    .context("failed to insert book")?;

    let id = conn.last_insert_rowid();
    Ok(Book {
        id,
        title: title.to_string(),
        publish_year,
        isbn: isbn.to_string(),
        quantity_in_stock,
        authors: Vec::new(),
        genres: Vec::new(),
    })
}

/// Update all scalar book fields. Returns `false` when the row vanished
/// between selection and commit; callers treat that as a no-op and let the
/// following reload show the true state.
pub fn update_book(
    conn: &Connection,
    id: i64,
    title: &str,
    publish_year: i64,
    isbn: &str,
    quantity_in_stock: i64,
) -> Result<bool> {
    let updated = conn
        .execute(
            "UPDATE books
             SET title = ?1, publish_year = ?2, isbn = ?3, quantity_in_stock = ?4
             WHERE id = ?5",
            params![title, publish_year, isbn, quantity_in_stock, id],
        )
        .context("failed to update book")?;

    Ok(updated > 0)
}

/// Remove a book row. The schema cascades to both join tables, so author and
/// genre links disappear without extra statements. Returns `false` when the
/// row was already gone.
pub fn delete_book(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .context("failed to delete book")?;

    Ok(deleted > 0)
}

/// Insert a new book together with its author and genre links in a single
/// transaction. A failed link insert rolls the book row back too, so the
/// catalog never gains a half-written book.
pub fn create_book_with_links(
    conn: &mut Connection,
    title: &str,
    publish_year: i64,
    isbn: &str,
    quantity_in_stock: i64,
    author_ids: &[i64],
    genre_ids: &[i64],
) -> Result<Book> {
    let tx = conn.transaction().context("failed to begin book insert")?;
    let book = create_book(&tx, title, publish_year, isbn, quantity_in_stock)?;
    write_author_links(&tx, book.id, author_ids)?;
    write_genre_links(&tx, book.id, genre_ids)?;
    tx.commit().context("failed to commit book insert")?;
    Ok(book)
}

/// Update a book's scalar fields and replace both link sets in a single
/// transaction. Returns `false` without writing anything when the book row no
/// longer exists.
pub fn update_book_with_links(
    conn: &mut Connection,
    id: i64,
    title: &str,
    publish_year: i64,
    isbn: &str,
    quantity_in_stock: i64,
    author_ids: &[i64],
    genre_ids: &[i64],
) -> Result<bool> {
    let tx = conn.transaction().context("failed to begin book update")?;
    if !update_book(&tx, id, title, publish_year, isbn, quantity_in_stock)? {
        return Ok(false);
    }
    write_author_links(&tx, id, author_ids)?;
    write_genre_links(&tx, id, genre_ids)?;
    tx.commit().context("failed to commit book update")?;
    Ok(true)
}

/// Replace the full set of author links for a book: delete everything, insert
/// the new set, all inside one transaction so no reader ever observes a
/// half-replaced set. A failed insert rolls the deletion back as well.
pub fn replace_author_links(conn: &mut Connection, book_id: i64, author_ids: &[i64]) -> Result<()> {
    let tx = conn
        .transaction()
        .context("failed to begin author link replacement")?;
    write_author_links(&tx, book_id, author_ids)?;
    tx.commit().context("failed to commit author link replacement")
}

/// Replace the full set of genre links for a book, with the same
/// delete-then-insert shape as [`replace_author_links`].
pub fn replace_genre_links(conn: &mut Connection, book_id: i64, genre_ids: &[i64]) -> Result<()> {
    let tx = conn
        .transaction()
        .context("failed to begin genre link replacement")?;
    write_genre_links(&tx, book_id, genre_ids)?;
    tx.commit().context("failed to commit genre link replacement")
}

fn write_author_links(conn: &Connection, book_id: i64, author_ids: &[i64]) -> Result<()> {
    conn.execute(
        "DELETE FROM book_authors WHERE book_id = ?1",
        params![book_id],
    )
    .context("failed to clear author links")?;
    let mut stmt = conn
        .prepare("INSERT INTO book_authors (book_id, author_id) VALUES (?1, ?2)")
        .context("failed to prepare author link insert")?;
    for author_id in author_ids {
        stmt.execute(params![book_id, author_id])
            .context("failed to insert author link")?;
    }
    Ok(())
}

fn write_genre_links(conn: &Connection, book_id: i64, genre_ids: &[i64]) -> Result<()> {
    conn.execute(
        "DELETE FROM book_genres WHERE book_id = ?1",
        params![book_id],
    )
    .context("failed to clear genre links")?;
    let mut stmt = conn
        .prepare("INSERT INTO book_genres (book_id, genre_id) VALUES (?1, ?2)")
        .context("failed to prepare genre link insert")?;
    for genre_id in genre_ids {
        stmt.execute(params![book_id, genre_id])
            .context("failed to insert genre link")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::authors::{create_author, delete_author};
    use crate::db::connection::open_test_catalog;
    use crate::db::genres::create_genre;

    fn linked_catalog(conn: &mut Connection) -> (Book, i64, i64) {
        let author = create_author(conn, "Лев", "Толстой", "1828-09-09", "Россия")
            .expect("create author");
        let genre = create_genre(conn, "Роман", "").expect("create genre");
        let book =
            create_book(conn, "Война и мир", 1869, "978-5-699-12014-7", 5).expect("create book");
        replace_author_links(conn, book.id, &[author.id]).expect("link author");
        replace_genre_links(conn, book.id, &[genre.id]).expect("link genre");
        (book, author.id, genre.id)
    }

    #[test]
    fn eager_fetch_resolves_both_link_kinds() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, _, _) = linked_catalog(&mut conn);
        create_book(&conn, "Азбука", 1872, "", 1).expect("create unlinked book");

        let books = fetch_books_with_links(&conn).expect("fetch");
        assert_eq!(books.len(), 2);

        let linked = books.iter().find(|b| b.id == book.id).expect("linked row");
        assert_eq!(linked.authors_display(), "Лев Толстой");
        assert_eq!(linked.genres_display(), "Роман");

        let unlinked = books.iter().find(|b| b.id != book.id).expect("plain row");
        assert_eq!(unlinked.authors_display(), "");
        assert_eq!(unlinked.genres_display(), "");
    }

    #[test]
    fn fetch_orders_titles_case_insensitively() {
        let conn = open_test_catalog().expect("schema");
        create_book(&conn, "beta", 1900, "", 0).expect("create");
        create_book(&conn, "Alpha", 1900, "", 0).expect("create");
        create_book(&conn, "GAMMA", 1900, "", 0).expect("create");

        let titles: Vec<String> = fetch_books(&conn)
            .expect("fetch")
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "beta", "GAMMA"]);
    }

    #[test]
    fn replace_links_installs_exactly_the_new_set() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, first_author, _) = linked_catalog(&mut conn);
        let second = create_author(&conn, "Антон", "Чехов", "", "").expect("create author");
        let third = create_author(&conn, "Фёдор", "Достоевский", "", "").expect("create author");

        replace_author_links(&mut conn, book.id, &[second.id, third.id]).expect("replace");

        let mut linked: Vec<i64> = {
            let mut stmt = conn
                .prepare("SELECT author_id FROM book_authors WHERE book_id = ?1")
                .expect("prepare");
            stmt.query_map([book.id], |row| row.get(0))
                .expect("query")
                .collect::<rusqlite::Result<Vec<i64>>>()
                .expect("collect")
        };
        linked.sort_unstable();
        let mut expected = vec![second.id, third.id];
        expected.sort_unstable();
        assert_eq!(linked, expected);
        assert!(!linked.contains(&first_author));
    }

    #[test]
    fn replace_links_with_empty_set_clears_everything() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, _, _) = linked_catalog(&mut conn);

        replace_genre_links(&mut conn, book.id, &[]).expect("clear");

        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM book_genres WHERE book_id = ?1",
                [book.id],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(remaining, 0);
    }

    #[test]
    fn replace_links_rolls_back_when_an_insert_fails() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, first_author, _) = linked_catalog(&mut conn);

        // The second id points at no author row, so the foreign key fires.
        let result = replace_author_links(&mut conn, book.id, &[first_author, 999]);
        assert!(result.is_err());

        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM book_authors WHERE book_id = ?1",
                [book.id],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(remaining, 1, "original link survives a failed replacement");
    }

    #[test]
    fn create_with_links_rolls_the_book_back_on_a_bad_link() {
        let mut conn = open_test_catalog().expect("schema");
        let author = create_author(&conn, "Лев", "Толстой", "", "").expect("create author");

        // Genre id 999 does not exist, so the insert must fail as a whole.
        let result = create_book_with_links(
            &mut conn,
            "Война и мир",
            1869,
            "978-5-699-12014-7",
            5,
            &[author.id],
            &[999],
        );
        assert!(result.is_err());

        let book_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .expect("count books");
        assert_eq!(book_count, 0, "book row must not survive a failed link");
    }

    #[test]
    fn update_with_links_swaps_scalars_and_both_sets_together() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, _, _) = linked_catalog(&mut conn);
        let chekhov = create_author(&conn, "Антон", "Чехов", "", "").expect("create author");
        let drama = create_genre(&conn, "Драма", "").expect("create genre");

        let touched = update_book_with_links(
            &mut conn,
            book.id,
            "Чайка",
            1896,
            "030640615X",
            2,
            &[chekhov.id],
            &[drama.id],
        )
        .expect("update");
        assert!(touched);

        let books = fetch_books_with_links(&conn).expect("fetch");
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "Чайка");
        assert_eq!(books[0].authors_display(), "Антон Чехов");
        assert_eq!(books[0].genres_display(), "Драма");
    }

    #[test]
    fn update_with_links_on_a_missing_row_writes_nothing() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, author_id, _) = linked_catalog(&mut conn);

        let touched = update_book_with_links(&mut conn, 999, "x", 1900, "", 0, &[], &[])
            .expect("update");
        assert!(!touched);

        let links: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM book_authors WHERE book_id = ?1 AND author_id = ?2",
                params![book.id, author_id],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(links, 1, "existing links stay untouched");
    }

    #[test]
    fn deleting_an_author_cascades_links_but_keeps_books() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, author_id, _) = linked_catalog(&mut conn);

        assert!(delete_author(&conn, author_id).expect("delete author"));

        let link_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM book_authors", [], |row| row.get(0))
            .expect("count links");
        assert_eq!(link_count, 0);

        let books = fetch_books_with_links(&conn).expect("fetch");
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, book.id);
        assert_eq!(books[0].authors_display(), "");
        assert_eq!(books[0].genres_display(), "Роман");
    }

    #[test]
    fn deleting_a_book_cascades_both_join_tables() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, _, _) = linked_catalog(&mut conn);

        assert!(delete_book(&conn, book.id).expect("delete book"));

        let author_links: i64 = conn
            .query_row("SELECT COUNT(*) FROM book_authors", [], |row| row.get(0))
            .expect("count author links");
        let genre_links: i64 = conn
            .query_row("SELECT COUNT(*) FROM book_genres", [], |row| row.get(0))
            .expect("count genre links");
        assert_eq!(author_links, 0);
        assert_eq!(genre_links, 0);
    }

    #[test]
    fn update_rewrites_scalar_fields() {
        let mut conn = open_test_catalog().expect("schema");
        let (book, _, _) = linked_catalog(&mut conn);

        let touched = update_book(&conn, book.id, "Война и мир. Том 1", 1868, "0-306-40615-2", 7)
            .expect("update");
        assert!(touched);

        let books = fetch_books(&conn).expect("fetch");
        assert_eq!(books[0].title, "Война и мир. Том 1");
        assert_eq!(books[0].publish_year, 1868);
        assert_eq!(books[0].isbn, "0-306-40615-2");
        assert_eq!(books[0].quantity_in_stock, 7);
    }

    #[test]
    fn update_and_delete_of_missing_rows_are_no_ops() {
        let conn = open_test_catalog().expect("schema");
        assert!(!update_book(&conn, 5, "x", 1900, "", 0).expect("update"));
        assert!(!delete_book(&conn, 5).expect("delete"));
    }
}
