//! Plain data types matching the SQLite schema. Rows come out of the `db`
//! module as these structs and flow unchanged into the TUI, so validation and
//! rendering never have to talk to the database themselves.

use std::fmt;

#[derive(Debug, Clone)]
/// In-memory representation of a book. The struct mirrors a row in the `books`
/// table plus the resolved link collections, so list views never have to issue
/// follow-up queries per row.
pub struct Book {
    /// Primary key. Edit and delete flows hand this back to the persistence
    /// layer, so it travels with the row even when only text is rendered.
    pub id: i64,
    /// Title shown in the catalog list and matched by the text filter.
    pub title: String,
    /// Year of publication. Stored as an integer so range checks stay numeric.
    pub publish_year: i64,
    /// ISBN kept as raw text; hyphenation varies between editions so we never
    /// normalize it in storage.
    pub isbn: String,
    /// Copies currently on the shelf. Never negative.
    pub quantity_in_stock: i64,
    /// Authors linked through the `book_authors` join table, resolved eagerly.
    pub authors: Vec<Author>,
    /// Genres linked through the `book_genres` join table, resolved eagerly.
    pub genres: Vec<Genre>,
}

impl Book {
    /// Comma-joined `First Last` names of the linked authors. Yields an empty
    /// string when the book has no links so table cells never render a
    /// placeholder of their own.
    pub fn authors_display(&self) -> String {
        self.authors
            .iter()
            .map(Author::full_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma-joined genre names, empty when the book has no genre links.
    pub fn genres_display(&self) -> String {
        self.genres
            .iter()
            .map(|genre| genre.name.clone())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Book {
    /// Renders as the bare title, which is what list rows and status
    /// messages want.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone)]
/// In-memory representation of an author. Mirrors rows in the `authors`
/// table; the join rows are resolved onto [`Book`] instead of here.
pub struct Author {
    /// Primary key in the authors table.
    pub id: i64,
    /// Given name, required by the edit form.
    pub first_name: String,
    /// Family name, required by the edit form.
    pub last_name: String,
    /// Birth date kept as raw text. No date arithmetic happens anywhere, so we
    /// store whatever the user typed.
    pub birth_date: String,
    /// Country of origin, optional. Empty string when unknown.
    pub country: String,
}

impl Author {
    /// Compose a `First Last` string. Many views (filter pickers, the books
    /// table) rely on this ready-to-use formatting.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

#[derive(Debug, Clone)]
/// A catalog genre. `name` is unique case-insensitively across the table.
pub struct Genre {
    /// Primary key in the genres table.
    pub id: i64,
    /// Display name, unique among all genres regardless of letter case.
    pub name: String,
    /// Optional free-text description. Empty string when absent.
    pub description: String,
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Join row linking a book to an author. The pair is the composite primary
/// key; deleting either side cascades away the row.
pub struct BookAuthor {
    pub book_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Join row linking a book to a genre, with the same cascade behavior as
/// [`BookAuthor`].
pub struct BookGenre {
    pub book_id: i64,
    pub genre_id: i64,
}
