use std::collections::HashSet;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Author, Book, Genre};
use crate::ui::screens::SelectionList;
use crate::validate::{self, BookDraft, ValidationError};

/// Internal representation of the author form fields.
#[derive(Default, Clone)]
pub(crate) struct AuthorForm {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) birth_date: String,
    pub(crate) country: String,
    pub(crate) active: AuthorField,
    pub(crate) error: Option<String>,
}

/// Fields available within the author form.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum AuthorField {
    FirstName,
    LastName,
    BirthDate,
    Country,
}

impl Default for AuthorField {
    fn default() -> Self {
        AuthorField::FirstName
    }
}

impl AuthorForm {
    /// Populate the form from an existing author when editing.
    pub(crate) fn from_author(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            birth_date: author.birth_date.clone(),
            country: author.country.clone(),
            active: AuthorField::FirstName,
            error: None,
        }
    }

    /// Cycle focus across the four author fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AuthorField::FirstName => AuthorField::LastName,
            AuthorField::LastName => AuthorField::BirthDate,
            AuthorField::BirthDate => AuthorField::Country,
            AuthorField::Country => AuthorField::FirstName,
        };
    }

    /// Append a character to the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            AuthorField::FirstName => self.first_name.push(ch),
            AuthorField::LastName => self.last_name.push(ch),
            AuthorField::BirthDate => self.birth_date.push(ch),
            AuthorField::Country => self.country.push(ch),
        }
        true
    }

    /// Drop the trailing character of the focused field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            AuthorField::FirstName => {
                self.first_name.pop();
            }
            AuthorField::LastName => {
                self.last_name.pop();
            }
            AuthorField::BirthDate => {
                self.birth_date.pop();
            }
            AuthorField::Country => {
                self.country.pop();
            }
        }
    }

    /// Validate and normalize the inputs, returning values ready for
    /// persistence.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String, String), ValidationError> {
        validate::check_author(&self.first_name, &self.last_name)?;
        Ok((
            self.first_name.trim().to_string(),
            self.last_name.trim().to_string(),
            self.birth_date.trim().to_string(),
            self.country.trim().to_string(),
        ))
    }

    /// Render a styled line for the modal form.
    pub(crate) fn build_line(&self, field_name: &str, field: AuthorField) -> Line<'static> {
        let value = self.field_value(field);
        let is_active = self.active == field;

        let placeholder = match field {
            AuthorField::FirstName | AuthorField::LastName => "<required>",
            AuthorField::BirthDate | AuthorField::Country => "<optional>",
        };

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Length in characters of the named field, used for cursor placement.
    pub(crate) fn value_len(&self, field: AuthorField) -> usize {
        self.field_value(field).chars().count()
    }

    fn field_value(&self, field: AuthorField) -> &String {
        match field {
            AuthorField::FirstName => &self.first_name,
            AuthorField::LastName => &self.last_name,
            AuthorField::BirthDate => &self.birth_date,
            AuthorField::Country => &self.country,
        }
    }
}

/// Internal representation of the genre form fields.
#[derive(Default, Clone)]
pub(crate) struct GenreForm {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) active: GenreField,
    pub(crate) error: Option<String>,
}

/// Fields available within the genre form.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum GenreField {
    Name,
    Description,
}

impl Default for GenreField {
    fn default() -> Self {
        GenreField::Name
    }
}

impl GenreForm {
    /// Populate the form from an existing genre when editing.
    pub(crate) fn from_genre(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
            description: genre.description.clone(),
            active: GenreField::Name,
            error: None,
        }
    }

    /// Swap focus between the name and description fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            GenreField::Name => GenreField::Description,
            GenreField::Description => GenreField::Name,
        };
    }

    /// Append a character to the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            GenreField::Name => self.name.push(ch),
            GenreField::Description => self.description.push(ch),
        }
        true
    }

    /// Drop the trailing character of the focused field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            GenreField::Name => {
                self.name.pop();
            }
            GenreField::Description => {
                self.description.pop();
            }
        }
    }

    /// Validate against the current genre list and return normalized values.
    /// `editing_id` excludes the genre being edited from the uniqueness scan.
    pub(crate) fn parse_inputs(
        &self,
        existing: &[Genre],
        editing_id: Option<i64>,
    ) -> Result<(String, String), ValidationError> {
        validate::check_genre(self.name.trim(), existing, editing_id)?;
        Ok((
            self.name.trim().to_string(),
            self.description.trim().to_string(),
        ))
    }

    /// Render a styled line for the modal form.
    pub(crate) fn build_line(&self, field_name: &str, field: GenreField) -> Line<'static> {
        let (value, is_active) = match field {
            GenreField::Name => (&self.name, self.active == GenreField::Name),
            GenreField::Description => (&self.description, self.active == GenreField::Description),
        };

        let display = if value.is_empty() {
            match field {
                GenreField::Name => "<required>".to_string(),
                GenreField::Description => "<optional>".to_string(),
            }
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Length in characters of the named field, used for cursor placement.
    pub(crate) fn value_len(&self, field: GenreField) -> usize {
        match field {
            GenreField::Name => self.name.chars().count(),
            GenreField::Description => self.description.chars().count(),
        }
    }
}

/// Form state for book creation/editing. The scalar fields are free text and
/// only become typed values through [`BookForm::parse_inputs`]; the two
/// checkbox lists carry the author and genre links.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) publish_year: String,
    pub(crate) isbn: String,
    pub(crate) quantity: String,
    pub(crate) authors: SelectionList,
    pub(crate) genres: SelectionList,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Enumerates the focus stops within the book form. The two picker stops move
/// a cursor through their checkbox list instead of accepting text.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum BookField {
    Title,
    PublishYear,
    Isbn,
    Quantity,
    Authors,
    Genres,
}

impl BookForm {
    /// Empty form offering every known author and genre unchecked.
    pub(crate) fn new(authors: &[Author], genres: &[Genre]) -> Self {
        Self {
            title: String::new(),
            publish_year: String::new(),
            isbn: String::new(),
            quantity: String::new(),
            authors: SelectionList::new(author_entries(authors), HashSet::new()),
            genres: SelectionList::new(genre_entries(genres), HashSet::new()),
            active: BookField::Title,
            error: None,
        }
    }

    /// Populate the form from an existing book when editing. The book's
    /// current links arrive pre-checked.
    pub(crate) fn from_book(book: &Book, authors: &[Author], genres: &[Genre]) -> Self {
        let checked_authors: HashSet<i64> = book.authors.iter().map(|author| author.id).collect();
        let checked_genres: HashSet<i64> = book.genres.iter().map(|genre| genre.id).collect();
        Self {
            title: book.title.clone(),
            publish_year: book.publish_year.to_string(),
            isbn: book.isbn.clone(),
            quantity: book.quantity_in_stock.to_string(),
            authors: SelectionList::new(author_entries(authors), checked_authors),
            genres: SelectionList::new(genre_entries(genres), checked_genres),
            active: BookField::Title,
            error: None,
        }
    }

    /// Cycle focus across the four text fields and the two pickers.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::PublishYear,
            BookField::PublishYear => BookField::Isbn,
            BookField::Isbn => BookField::Quantity,
            BookField::Quantity => BookField::Authors,
            BookField::Authors => BookField::Genres,
            BookField::Genres => BookField::Title,
        };
    }

    /// Whether the focus currently sits on one of the checkbox lists.
    pub(crate) fn is_picker_active(&self) -> bool {
        matches!(self.active, BookField::Authors | BookField::Genres)
    }

    /// Move the cursor of the active picker.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        if let Some(list) = self.active_list() {
            list.move_selection(offset);
        }
    }

    /// Toggle the checkbox under the active picker's cursor.
    pub(crate) fn toggle_checked(&mut self) {
        if let Some(list) = self.active_list() {
            list.toggle_current();
        }
    }

    /// Append a character to the active text field. Picker stops take no text.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::PublishYear => self.publish_year.push(ch),
            BookField::Isbn => self.isbn.push(ch),
            BookField::Quantity => self.quantity.push(ch),
            BookField::Authors | BookField::Genres => return false,
        }
        true
    }

    /// Remove the last character from the active text field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::PublishYear => {
                self.publish_year.pop();
            }
            BookField::Isbn => {
                self.isbn.pop();
            }
            BookField::Quantity => {
                self.quantity.pop();
            }
            BookField::Authors | BookField::Genres => {}
        }
    }

    /// Validate the inputs and return a typed draft ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<BookDraft, ValidationError> {
        validate::check_book(
            &self.title,
            &self.publish_year,
            &self.isbn,
            &self.quantity,
            self.authors.checked_count(),
            self.genres.checked_count(),
        )
    }

    /// Checked author ids in display order.
    pub(crate) fn author_ids(&self) -> Vec<i64> {
        self.authors.checked_ids()
    }

    /// Checked genre ids in display order.
    pub(crate) fn genre_ids(&self) -> Vec<i64> {
        self.genres.checked_ids()
    }

    /// Render a styled line for one of the text fields.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let value = self.text_value(field).cloned().unwrap_or_default();
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character length of the requested text field.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.text_value(field).map_or(0, |value| value.chars().count())
    }

    fn text_value(&self, field: BookField) -> Option<&String> {
        match field {
            BookField::Title => Some(&self.title),
            BookField::PublishYear => Some(&self.publish_year),
            BookField::Isbn => Some(&self.isbn),
            BookField::Quantity => Some(&self.quantity),
            BookField::Authors | BookField::Genres => None,
        }
    }

    fn active_list(&mut self) -> Option<&mut SelectionList> {
        match self.active {
            BookField::Authors => Some(&mut self.authors),
            BookField::Genres => Some(&mut self.genres),
            _ => None,
        }
    }
}

fn author_entries(authors: &[Author]) -> Vec<(i64, String)> {
    authors
        .iter()
        .map(|author| (author.id, author.full_name()))
        .collect()
}

fn genre_entries(genres: &[Genre]) -> Vec<(i64, String)> {
    genres
        .iter()
        .map(|genre| (genre.id, genre.name.clone()))
        .collect()
}

#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
}

impl ConfirmBookDelete {
    /// Build the confirmation state from the book being considered.
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmAuthorDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl ConfirmAuthorDelete {
    pub(crate) fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.full_name(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct ConfirmGenreDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl ConfirmGenreDelete {
    pub(crate) fn from(genre: &Genre) -> Self {
        Self {
            id: genre.id,
            name: genre.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn sample_book() -> Book {
        Book {
            id: 5,
            title: "Война и мир".to_string(),
            publish_year: 1869,
            isbn: "978-5-699-12014-7".to_string(),
            quantity_in_stock: 3,
            authors: vec![author(1, "Лев", "Толстой")],
            genres: vec![genre(2, "Роман")],
        }
    }

    #[test]
    fn book_form_cycles_through_all_six_stops() {
        let mut form = BookForm::new(&[], &[]);
        assert!(form.active == BookField::Title);
        for expected in [
            BookField::PublishYear,
            BookField::Isbn,
            BookField::Quantity,
            BookField::Authors,
            BookField::Genres,
            BookField::Title,
        ] {
            form.toggle_field();
            assert!(form.active == expected);
        }
    }

    #[test]
    fn from_book_prechecks_current_links() {
        let authors = vec![author(1, "Лев", "Толстой"), author(9, "Антон", "Чехов")];
        let genres = vec![genre(2, "Роман"), genre(8, "Драма")];
        let form = BookForm::from_book(&sample_book(), &authors, &genres);
        assert_eq!(form.author_ids(), vec![1]);
        assert_eq!(form.genre_ids(), vec![2]);
        assert_eq!(form.publish_year, "1869");
        assert_eq!(form.quantity, "3");
    }

    #[test]
    fn picker_stops_reject_text_and_accept_toggles() {
        let mut form = BookForm::new(&[author(1, "Лев", "Толстой")], &[genre(2, "Роман")]);
        while form.active != BookField::Authors {
            form.toggle_field();
        }
        assert!(!form.push_char('x'));
        form.toggle_checked();
        assert_eq!(form.author_ids(), vec![1]);
        form.toggle_checked();
        assert!(form.author_ids().is_empty());
    }

    #[test]
    fn parse_surfaces_missing_selections() {
        let mut form = BookForm::new(&[author(1, "Лев", "Толстой")], &[genre(2, "Роман")]);
        form.title.push_str("Анна Каренина");
        form.publish_year.push_str("1878");
        form.isbn.push_str("030640615X");
        form.quantity.push_str("1");
        assert_eq!(form.parse_inputs(), Err(ValidationError::NoAuthorsSelected));

        form.active = BookField::Authors;
        form.toggle_checked();
        assert_eq!(form.parse_inputs(), Err(ValidationError::NoGenresSelected));

        form.active = BookField::Genres;
        form.toggle_checked();
        let draft = form.parse_inputs().expect("draft should validate");
        assert_eq!(draft.publish_year, 1878);
    }

    #[test]
    fn genre_form_uniqueness_respects_editing_id() {
        let existing = vec![genre(1, "Роман"), genre(2, "Драма")];
        let mut form = GenreForm::from_genre(&existing[0]);
        assert!(form.parse_inputs(&existing, Some(1)).is_ok());

        form.name = "дРАМА".to_string();
        assert_eq!(
            form.parse_inputs(&existing, Some(1)),
            Err(ValidationError::GenreNameTaken {
                name: "дРАМА".to_string()
            })
        );
    }

    #[test]
    fn author_form_trims_on_parse() {
        let mut form = AuthorForm::default();
        form.first_name = "  Лев ".to_string();
        form.last_name = "Толстой".to_string();
        form.birth_date = " 1828-09-09 ".to_string();
        let (first, last, born, country) = form.parse_inputs().expect("author should validate");
        assert_eq!(first, "Лев");
        assert_eq!(last, "Толстой");
        assert_eq!(born, "1828-09-09");
        assert_eq!(country, "");
    }
}
