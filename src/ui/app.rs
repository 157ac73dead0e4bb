use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use crate::db::{
    create_author, create_book_with_links, create_genre, delete_author, delete_book, delete_genre,
    fetch_authors, fetch_books_with_links, fetch_genres, update_author, update_book_with_links,
    update_genre,
};
use crate::filter::CatalogFilter;
use crate::models::{Author, Book, Genre};

use super::forms::{
    AuthorField, AuthorForm, BookField, BookForm, ConfirmAuthorDelete, ConfirmBookDelete,
    ConfirmGenreDelete, GenreField, GenreForm,
};
use super::helpers::{centered_rect, surface_error};
use super::screens::{AuthorsScreen, FilterKind, FilterPicker, GenresScreen, SelectionList};

/// Rows reserved at the bottom for the status line and key hints.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per book card in the catalog list.
const BOOK_CARD_HEIGHT: u16 = 6;
/// Height allocation per author or genre card in the manage screens.
const MANAGE_CARD_HEIGHT: u16 = 4;

/// Which major view is active. The manage variants carry their own list state
/// so the book list keeps its selection while they are open.
enum Screen {
    Books,
    Authors(AuthorsScreen),
    Genres(GenresScreen),
}

/// Modal input state layered over the active screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook {
        id: i64,
        form: BookForm,
    },
    ConfirmBookDelete(ConfirmBookDelete),
    AddingAuthor(AuthorForm),
    EditingAuthor {
        id: i64,
        form: AuthorForm,
    },
    ConfirmAuthorDelete(ConfirmAuthorDelete),
    AddingGenre(GenreForm),
    EditingGenre {
        id: i64,
        form: GenreForm,
    },
    ConfirmGenreDelete(ConfirmGenreDelete),
    PickingFilter(FilterPicker),
    Searching(SearchState),
}

/// State for an active inline title search.
struct SearchState {
    query: String,
}

/// Message shown in the footer together with its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Colour class for the footer message.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// All runtime state for a catalog session.
pub struct App {
    conn: Connection,
    books: Vec<Book>,
    filtered_books: Vec<Book>,
    authors: Vec<Author>,
    genres: Vec<Genre>,
    filter: CatalogFilter,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        conn: Connection,
        books: Vec<Book>,
        authors: Vec<Author>,
        genres: Vec<Genre>,
    ) -> Self {
        let filtered_books = books.clone();
        Self {
            conn,
            books,
            filtered_books,
            authors,
            genres,
            filter: CatalogFilter::default(),
            selected: 0,
            screen: Screen::Books,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ConfirmBookDelete(confirm) => self.handle_confirm_book_delete(code, confirm)?,
            Mode::AddingAuthor(form) => self.handle_add_author(code, form)?,
            Mode::EditingAuthor { id, form } => self.handle_edit_author(code, id, form)?,
            Mode::ConfirmAuthorDelete(confirm) => {
                self.handle_confirm_author_delete(code, confirm)?
            }
            Mode::AddingGenre(form) => self.handle_add_genre(code, form)?,
            Mode::EditingGenre { id, form } => self.handle_edit_genre(code, id, form)?,
            Mode::ConfirmGenreDelete(confirm) => self.handle_confirm_genre_delete(code, confirm)?,
            Mode::PickingFilter(picker) => self.handle_pick_filter(code, picker)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Books => {
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        *exit = true;
                    }
                    KeyCode::Up => self.move_selection(-1),
                    KeyCode::Down => self.move_selection(1),
                    KeyCode::PageUp => self.move_selection(-5),
                    KeyCode::PageDown => self.move_selection(5),
                    KeyCode::Home => self.select_first(),
                    KeyCode::End => self.select_last(),
                    KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                        if let Some(book) = self.current_book().cloned() {
                            self.clear_status();
                            return Ok(Mode::EditingBook {
                                id: book.id,
                                form: BookForm::from_book(&book, &self.authors, &self.genres),
                            });
                        } else {
                            self.set_status("No book selected to edit.", StatusKind::Error);
                        }
                    }
                    KeyCode::Char('+') => {
                        self.clear_status();
                        return Ok(Mode::AddingBook(BookForm::new(&self.authors, &self.genres)));
                    }
                    KeyCode::Char('-') => {
                        if let Some(book) = self.current_book().cloned() {
                            self.clear_status();
                            return Ok(Mode::ConfirmBookDelete(ConfirmBookDelete::from(&book)));
                        } else {
                            self.set_status("No book selected to remove.", StatusKind::Error);
                        }
                    }
                    KeyCode::Char('f') => {
                        self.clear_status();
                        return Ok(Mode::Searching(SearchState {
                            query: self.filter.text.clone(),
                        }));
                    }
                    KeyCode::Char('a') => {
                        self.clear_status();
                        return Ok(Mode::PickingFilter(FilterPicker::new(
                            FilterKind::Author,
                            self.author_filter_options(),
                            self.filter.author_id,
                        )));
                    }
                    KeyCode::Char('g') => {
                        self.clear_status();
                        return Ok(Mode::PickingFilter(FilterPicker::new(
                            FilterKind::Genre,
                            self.genre_filter_options(),
                            self.filter.genre_id,
                        )));
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        if self.filter.is_clear() {
                            self.set_status("No filters active.", StatusKind::Info);
                        } else {
                            self.filter.clear();
                            self.apply_filter(None);
                            self.set_status("Filters reset.", StatusKind::Info);
                        }
                    }
                    KeyCode::F(5) => {
                        self.reload_catalog(None)?;
                        self.set_status("Catalog reloaded.", StatusKind::Info);
                    }
                    KeyCode::Char('A') => {
                        self.clear_status();
                        self.open_authors_screen()?;
                    }
                    KeyCode::Char('G') => {
                        self.clear_status();
                        self.open_genres_screen()?;
                    }
                    _ => {}
                }
                Ok(Mode::Normal)
            }
            Screen::Authors(ref mut screen) => {
                let mut return_to_books = false;
                let mut status_to_set: Option<(String, StatusKind)> = None;

                match code {
                    KeyCode::Char('q') => {
                        *exit = true;
                    }
                    KeyCode::Esc | KeyCode::Char('A') => {
                        return_to_books = true;
                    }
                    KeyCode::Up => screen.move_selection(-1),
                    KeyCode::Down => screen.move_selection(1),
                    KeyCode::PageUp => screen.move_selection(-5),
                    KeyCode::PageDown => screen.move_selection(5),
                    KeyCode::Home => screen.select_first(),
                    KeyCode::End => screen.select_last(),
                    KeyCode::Char('+') => {
                        return Ok(Mode::AddingAuthor(AuthorForm::default()));
                    }
                    KeyCode::Char('-') => {
                        if let Some(author) = screen.current_author().cloned() {
                            return Ok(Mode::ConfirmAuthorDelete(ConfirmAuthorDelete::from(
                                &author,
                            )));
                        } else {
                            status_to_set = Some((
                                "No author selected to delete.".to_string(),
                                StatusKind::Error,
                            ));
                        }
                    }
                    KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                        if let Some(author) = screen.current_author().cloned() {
                            return Ok(Mode::EditingAuthor {
                                id: author.id,
                                form: AuthorForm::from_author(&author),
                            });
                        } else {
                            status_to_set = Some((
                                "No author selected to edit.".to_string(),
                                StatusKind::Error,
                            ));
                        }
                    }
                    _ => {}
                }

                if return_to_books {
                    self.close_manage_screen()?;
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
            Screen::Genres(ref mut screen) => {
                let mut return_to_books = false;
                let mut status_to_set: Option<(String, StatusKind)> = None;

                match code {
                    KeyCode::Char('q') => {
                        *exit = true;
                    }
                    KeyCode::Esc | KeyCode::Char('G') => {
                        return_to_books = true;
                    }
                    KeyCode::Up => screen.move_selection(-1),
                    KeyCode::Down => screen.move_selection(1),
                    KeyCode::PageUp => screen.move_selection(-5),
                    KeyCode::PageDown => screen.move_selection(5),
                    KeyCode::Home => screen.select_first(),
                    KeyCode::End => screen.select_last(),
                    KeyCode::Char('+') => {
                        return Ok(Mode::AddingGenre(GenreForm::default()));
                    }
                    KeyCode::Char('-') => {
                        if let Some(genre) = screen.current_genre().cloned() {
                            return Ok(Mode::ConfirmGenreDelete(ConfirmGenreDelete::from(&genre)));
                        } else {
                            status_to_set = Some((
                                "No genre selected to delete.".to_string(),
                                StatusKind::Error,
                            ));
                        }
                    }
                    KeyCode::Enter | KeyCode::Char('e') | KeyCode::Char('E') => {
                        if let Some(genre) = screen.current_genre().cloned() {
                            return Ok(Mode::EditingGenre {
                                id: genre.id,
                                form: GenreForm::from_genre(&genre),
                            });
                        } else {
                            status_to_set = Some((
                                "No genre selected to edit.".to_string(),
                                StatusKind::Error,
                            ));
                        }
                    }
                    _ => {}
                }

                if return_to_books {
                    self.close_manage_screen()?;
                } else if let Some((text, kind)) = status_to_set {
                    self.set_status(text, kind);
                }

                Ok(Mode::Normal)
            }
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Up => form.move_selection(-1),
            KeyCode::Down => form.move_selection(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(' ') if form.is_picker_active() => {
                form.toggle_checked();
                form.error = None;
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: i64, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Up => form.move_selection(-1),
            KeyCode::Down => form.move_selection(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(' ') if form.is_picker_active() => {
                form.toggle_checked();
                form.error = None;
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingBook { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_book_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBookDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_book_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmBookDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmBookDelete(confirm)),
        }
    }

    fn handle_add_author(&mut self, code: KeyCode, mut form: AuthorForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add author cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_author(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingAuthor(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_author(&mut self, code: KeyCode, id: i64, mut form: AuthorForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_author(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingAuthor { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_author_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmAuthorDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_author_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmAuthorDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmAuthorDelete(confirm)),
        }
    }

    fn handle_add_genre(&mut self, code: KeyCode, mut form: GenreForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add genre cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_genre(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingGenre(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_genre(&mut self, code: KeyCode, id: i64, mut form: GenreForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_genre(id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingGenre { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_genre_delete(
        &mut self,
        code: KeyCode,
        confirm: ConfirmGenreDelete,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_genre_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmGenreDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmGenreDelete(confirm)),
        }
    }

    fn handle_pick_filter(&mut self, code: KeyCode, mut picker: FilterPicker) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Up => {
                picker.move_selection(-1);
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::Down => {
                picker.move_selection(1);
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::PageUp => {
                picker.move_selection(-5);
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::PageDown => {
                picker.move_selection(5);
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::Home => {
                picker.select_first();
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::End => {
                picker.select_last();
                Ok(Mode::PickingFilter(picker))
            }
            KeyCode::Enter => {
                if let Some((choice, label)) = picker.current_choice() {
                    let label = label.to_string();
                    match picker.kind {
                        FilterKind::Author => self.filter.author_id = choice,
                        FilterKind::Genre => self.filter.genre_id = choice,
                    }
                    self.apply_filter(None);
                    let message = match (picker.kind, choice) {
                        (FilterKind::Author, Some(_)) => format!("Showing books by {label}."),
                        (FilterKind::Author, None) => "Author filter cleared.".to_string(),
                        (FilterKind::Genre, Some(_)) => format!("Showing books in {label}."),
                        (FilterKind::Genre, None) => "Genre filter cleared.".to_string(),
                    };
                    self.set_status(message, StatusKind::Info);
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::PickingFilter(picker)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.filter.text.clear();
                self.apply_filter(None);
                self.clear_status();
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                return Ok(Mode::Normal);
            }
            KeyCode::Up => {
                self.move_selection(-1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Down => {
                self.move_selection(1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageUp => {
                self.move_selection(-5);
                return Ok(Mode::Searching(state));
            }
            KeyCode::PageDown => {
                self.move_selection(5);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Home => {
                self.select_first();
                return Ok(Mode::Searching(state));
            }
            KeyCode::End => {
                self.select_last();
                return Ok(Mode::Searching(state));
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => {}
        }

        self.filter.text = state.query.clone();
        self.apply_filter(None);
        Ok(Mode::Searching(state))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Books => self.draw_books(frame, content_area),
            Screen::Authors(screen) => self.draw_authors(frame, content_area, screen),
            Screen::Genres(screen) => self.draw_genres(frame, content_area, screen),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmBookDelete(confirm) => self.draw_confirm_book(frame, area, confirm),
            Mode::AddingAuthor(form) => self.draw_author_form(frame, area, "Add Author", form),
            Mode::EditingAuthor { form, .. } => {
                self.draw_author_form(frame, area, "Edit Author", form)
            }
            Mode::ConfirmAuthorDelete(confirm) => self.draw_confirm_author(frame, area, confirm),
            Mode::AddingGenre(form) => self.draw_genre_form(frame, area, "Add Genre", form),
            Mode::EditingGenre { form, .. } => {
                self.draw_genre_form(frame, area, "Edit Genre", form)
            }
            Mode::ConfirmGenreDelete(confirm) => self.draw_confirm_genre(frame, area, confirm),
            Mode::PickingFilter(picker) => self.draw_filter_picker(frame, area, picker),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Library Catalog",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(format!(
                "{} of {} books shown",
                self.filtered_books.len(),
                self.books.len()
            ))),
            Line::from(Span::styled(
                self.filter_summary(),
                Style::default().fg(Color::Gray),
            )),
        ])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Books"));
        frame.render_widget(header, chunks[0]);

        if self.books.is_empty() {
            let message = Paragraph::new("No books yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        if self.filtered_books.is_empty() {
            let message = Paragraph::new("No books match the current filters.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_book_cards(frame, chunks[1], &self.filtered_books, self.selected);
    }

    fn draw_authors(&self, frame: &mut Frame, area: Rect, screen: &AuthorsScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Authors",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(format!("{} on record", screen.authors.len()))),
        ])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Manage Authors"));
        frame.render_widget(header, chunks[0]);

        if screen.authors.is_empty() {
            let message = Paragraph::new("No authors yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_author_cards(frame, chunks[1], &screen.authors, screen.selected);
    }

    fn draw_genres(&self, frame: &mut Frame, area: Rect, screen: &GenresScreen) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Genres",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::raw(format!("{} on record", screen.genres.len()))),
        ])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Manage Genres"));
        frame.render_widget(header, chunks[0]);

        if screen.genres.is_empty() {
            let message = Paragraph::new("No genres yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(message, chunks[1]);
            return;
        }

        self.render_genre_cards(frame, chunks[1], &screen.genres, screen.selected);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, books: &[Book], selected: usize) {
        if books.is_empty() || area.height == 0 {
            return;
        }

        let card_height = BOOK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = books.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BOOK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let book_index = start + idx;
            if book_index >= len {
                break;
            }

            let book = &books[book_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if book_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let mut lines = Vec::new();
            let title = if book_index == selected {
                format!("▶ {}", book.title)
            } else {
                book.title.clone()
            };
            lines.push(Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            )));

            let mut details = format!("Published {}", book.publish_year);
            if !book.isbn.trim().is_empty() {
                details.push_str(&format!("  •  ISBN {}", book.isbn.trim()));
            }
            details.push_str(&format!("  •  {} in stock", book.quantity_in_stock));
            lines.push(Line::from(Span::styled(
                details,
                Style::default().fg(Color::Gray),
            )));

            let authors_text = if book.authors.is_empty() {
                "No linked authors".to_string()
            } else {
                book.authors_display()
            };
            lines.push(Line::from(Span::styled(
                authors_text,
                Style::default().fg(Color::Gray),
            )));

            let genres_text = if book.genres.is_empty() {
                "No linked genres".to_string()
            } else {
                book.genres_display()
            };
            lines.push(Line::from(Span::styled(
                genres_text,
                Style::default().fg(Color::Cyan),
            )));

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn render_author_cards(
        &self,
        frame: &mut Frame,
        area: Rect,
        authors: &[Author],
        selected: usize,
    ) {
        if authors.is_empty() || area.height == 0 {
            return;
        }

        let card_height = MANAGE_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = authors.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(MANAGE_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let author_index = start + idx;
            if author_index >= len {
                break;
            }

            let author = &authors[author_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if author_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let name = if author_index == selected {
                format!("▶ {}", author.full_name())
            } else {
                author.full_name()
            };

            let mut details = Vec::new();
            if !author.birth_date.trim().is_empty() {
                details.push(format!("Born {}", author.birth_date.trim()));
            }
            if !author.country.trim().is_empty() {
                details.push(author.country.trim().to_string());
            }
            let detail_text = if details.is_empty() {
                "No details recorded".to_string()
            } else {
                details.join("  •  ")
            };

            let lines = vec![
                Line::from(Span::styled(
                    name,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(detail_text, Style::default().fg(Color::Gray))),
            ];

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn render_genre_cards(&self, frame: &mut Frame, area: Rect, genres: &[Genre], selected: usize) {
        if genres.is_empty() || area.height == 0 {
            return;
        }

        let card_height = MANAGE_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = genres.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(MANAGE_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let genre_index = start + idx;
            if genre_index >= len {
                break;
            }

            let genre = &genres[genre_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if genre_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let name = if genre_index == selected {
                format!("▶ {}", genre.name)
            } else {
                genre.name.clone()
            };

            let description = if genre.description.trim().is_empty() {
                "No description".to_string()
            } else {
                genre.description.trim().to_string()
            };

            let lines = vec![
                Line::from(Span::styled(
                    name,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
            ];

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match (&self.screen, &self.mode) {
            (_, Mode::AddingBook(_)) | (_, Mode::EditingBook { .. }) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Space]", key_style),
                Span::raw(" Toggle   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::AddingAuthor(_))
            | (_, Mode::EditingAuthor { .. })
            | (_, Mode::AddingGenre(_))
            | (_, Mode::EditingGenre { .. }) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::ConfirmBookDelete(_))
            | (_, Mode::ConfirmAuthorDelete(_))
            | (_, Mode::ConfirmGenreDelete(_)) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[N/Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::PickingFilter(_)) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Apply   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            (_, Mode::Searching(_)) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep Filter   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate"),
            ]),
            (Screen::Books, _) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[f]", key_style),
                Span::raw(" Search   "),
                Span::styled("[a]", key_style),
                Span::raw(" Author Filter   "),
                Span::styled("[g]", key_style),
                Span::raw(" Genre Filter   "),
                Span::styled("[r]", key_style),
                Span::raw(" Reset   "),
                Span::styled("[A]", key_style),
                Span::raw(" Authors   "),
                Span::styled("[G]", key_style),
                Span::raw(" Genres   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Authors(_), _) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Back   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
            (Screen::Genres(_), _) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Back   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(inner);

        let lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Year", BookField::PublishYear),
            form.build_line("ISBN", BookField::Isbn),
            form.build_line("Quantity", BookField::Quantity),
        ];
        frame.render_widget(Paragraph::new(lines), chunks[0]);

        let picker_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_selection_list(
            frame,
            picker_chunks[0],
            "Authors",
            &form.authors,
            form.active == BookField::Authors,
        );
        render_selection_list(
            frame,
            picker_chunks[1],
            "Genres",
            &form.genres,
            form.active == BookField::Genres,
        );

        let hint = if let Some(error) = &form.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from(Span::styled(
                "Enter to save • Tab to switch • Space to toggle • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(vec![hint]).wrap(Wrap { trim: true }), chunks[3]);

        let cursor = match form.active {
            BookField::Title => Some(("Title: ", 0u16, BookField::Title)),
            BookField::PublishYear => Some(("Year: ", 1, BookField::PublishYear)),
            BookField::Isbn => Some(("ISBN: ", 2, BookField::Isbn)),
            BookField::Quantity => Some(("Quantity: ", 3, BookField::Quantity)),
            BookField::Authors | BookField::Genres => None,
        };
        if let Some((prefix, row, field)) = cursor {
            let cursor_x = chunks[0].x + prefix.len() as u16 + form.value_len(field) as u16;
            let cursor_y = chunks[0].y + row;
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_author_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &AuthorForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("First name", AuthorField::FirstName),
            form.build_line("Last name", AuthorField::LastName),
            form.build_line("Birth date", AuthorField::BirthDate),
            form.build_line("Country", AuthorField::Country),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (cursor_x, cursor_y) = match form.active {
            AuthorField::FirstName => {
                let prefix = "First name: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AuthorField::FirstName) as u16,
                    inner.y,
                )
            }
            AuthorField::LastName => {
                let prefix = "Last name: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AuthorField::LastName) as u16,
                    inner.y + 1,
                )
            }
            AuthorField::BirthDate => {
                let prefix = "Birth date: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AuthorField::BirthDate) as u16,
                    inner.y + 2,
                )
            }
            AuthorField::Country => {
                let prefix = "Country: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(AuthorField::Country) as u16,
                    inner.y + 3,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_genre_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &GenreForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Name", GenreField::Name),
            form.build_line("Description", GenreField::Description),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (cursor_x, cursor_y) = match form.active {
            GenreField::Name => {
                let prefix = "Name: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(GenreField::Name) as u16,
                    inner.y,
                )
            }
            GenreField::Description => {
                let prefix = "Description: ".len() as u16;
                (
                    inner.x + prefix + form.value_len(GenreField::Description) as u16,
                    inner.y + 1,
                )
            }
        };
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_confirm_book(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}' permanently?", confirm.title)),
            Line::from("Author and genre links are removed with it."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_author(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAuthorDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Author").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete author {} permanently?", confirm.name)),
            Line::from("Their books stay; links to this author are removed."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_genre(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmGenreDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Genre").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete genre '{}' permanently?", confirm.name)),
            Line::from("Books stay; links to this genre are removed."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_filter_picker(&self, frame: &mut Frame, area: Rect, picker: &FilterPicker) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = match picker.kind {
            FilterKind::Author => "Filter by Author",
            FilterKind::Genre => "Filter by Genre",
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let items: Vec<ListItem> = picker
            .entries
            .iter()
            .map(|(_, label)| ListItem::new(label.clone()))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(picker.selected));
        frame.render_stateful_widget(list, inner, &mut list_state);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Title: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Title: ".len() as u16 + state.query.chars().count() as u16;
        let cursor_y = inner.y;
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn current_book(&self) -> Option<&Book> {
        self.filtered_books.get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        if self.filtered_books.is_empty() {
            return;
        }
        let len = self.filtered_books.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    fn select_first(&mut self) {
        if !self.filtered_books.is_empty() {
            self.selected = 0;
        }
    }

    fn select_last(&mut self) {
        if !self.filtered_books.is_empty() {
            self.selected = self.filtered_books.len() - 1;
        }
    }

    fn author_filter_options(&self) -> Vec<(i64, String)> {
        self.authors
            .iter()
            .map(|author| (author.id, author.full_name()))
            .collect()
    }

    fn genre_filter_options(&self) -> Vec<(i64, String)> {
        self.genres
            .iter()
            .map(|genre| (genre.id, genre.name.clone()))
            .collect()
    }

    fn filter_summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.filter.text.trim().is_empty() {
            parts.push(format!("title contains '{}'", self.filter.text.trim()));
        }
        if let Some(id) = self.filter.author_id {
            if let Some(author) = self.authors.iter().find(|author| author.id == id) {
                parts.push(format!("author {}", author.full_name()));
            }
        }
        if let Some(id) = self.filter.genre_id {
            if let Some(genre) = self.genres.iter().find(|genre| genre.id == id) {
                parts.push(format!("genre {}", genre.name));
            }
        }
        if parts.is_empty() {
            "No filters active".to_string()
        } else {
            format!("Filtered by {}", parts.join(", "))
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let book = create_book_with_links(
            &mut self.conn,
            &draft.title,
            draft.publish_year,
            &draft.isbn,
            draft.quantity_in_stock,
            &form.author_ids(),
            &form.genre_ids(),
        )?;
        self.reload_catalog(Some(book.id))?;
        self.set_status(format!("Added '{}'.", book.title), StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, id: i64, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let touched = update_book_with_links(
            &mut self.conn,
            id,
            &draft.title,
            draft.publish_year,
            &draft.isbn,
            draft.quantity_in_stock,
            &form.author_ids(),
            &form.genre_ids(),
        )?;
        self.reload_catalog(Some(id))?;
        if touched {
            self.set_status(format!("Updated '{}'.", draft.title), StatusKind::Info);
        }
        Ok(())
    }

    fn perform_book_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        let removed = delete_book(&self.conn, confirm.id)?;
        self.reload_catalog(None)?;
        if removed {
            self.set_status(format!("Deleted '{}'.", confirm.title), StatusKind::Info);
        }
        Ok(())
    }

    fn save_new_author(&mut self, form: &AuthorForm) -> Result<()> {
        let (first, last, born, country) = form.parse_inputs()?;
        let author = create_author(&self.conn, &first, &last, &born, &country)?;
        self.reload_catalog(None)?;
        if let Screen::Authors(ref mut screen) = self.screen {
            screen.focus(author.id);
        }
        self.set_status(
            format!("Added author {}.", author.full_name()),
            StatusKind::Info,
        );
        Ok(())
    }

    fn save_existing_author(&mut self, id: i64, form: &AuthorForm) -> Result<()> {
        let (first, last, born, country) = form.parse_inputs()?;
        let touched = update_author(&self.conn, id, &first, &last, &born, &country)?;
        self.reload_catalog(None)?;
        if let Screen::Authors(ref mut screen) = self.screen {
            screen.focus(id);
        }
        if touched {
            self.set_status(format!("Updated author {first} {last}."), StatusKind::Info);
        }
        Ok(())
    }

    fn perform_author_delete(&mut self, confirm: &ConfirmAuthorDelete) -> Result<()> {
        let removed = delete_author(&self.conn, confirm.id)?;
        self.reload_catalog(None)?;
        if removed {
            self.set_status(
                format!("Deleted author {}.", confirm.name),
                StatusKind::Info,
            );
        }
        Ok(())
    }

    fn save_new_genre(&mut self, form: &GenreForm) -> Result<()> {
        let (name, description) = form.parse_inputs(&self.genres, None)?;
        let genre = create_genre(&self.conn, &name, &description)?;
        self.reload_catalog(None)?;
        if let Screen::Genres(ref mut screen) = self.screen {
            screen.focus(genre.id);
        }
        self.set_status(format!("Added genre '{}'.", genre.name), StatusKind::Info);
        Ok(())
    }

    fn save_existing_genre(&mut self, id: i64, form: &GenreForm) -> Result<()> {
        let (name, description) = form.parse_inputs(&self.genres, Some(id))?;
        let touched = update_genre(&self.conn, id, &name, &description)?;
        self.reload_catalog(None)?;
        if let Screen::Genres(ref mut screen) = self.screen {
            screen.focus(id);
        }
        if touched {
            self.set_status(format!("Updated genre '{name}'."), StatusKind::Info);
        }
        Ok(())
    }

    fn perform_genre_delete(&mut self, confirm: &ConfirmGenreDelete) -> Result<()> {
        let removed = delete_genre(&self.conn, confirm.id)?;
        self.reload_catalog(None)?;
        if removed {
            self.set_status(format!("Deleted genre '{}'.", confirm.name), StatusKind::Info);
        }
        Ok(())
    }

    /// Refetch every list from the database and re-derive the visible books.
    /// Every mutation funnels through here, so screens never hold rows the
    /// database no longer has. `focus_id` keeps the selection on a specific
    /// book after the reload.
    fn reload_catalog(&mut self, focus_id: Option<i64>) -> Result<()> {
        self.books = fetch_books_with_links(&self.conn)?;
        self.authors = fetch_authors(&self.conn)?;
        self.genres = fetch_genres(&self.conn)?;

        // Filters that point at deleted rows degrade to "no filter".
        if let Some(id) = self.filter.author_id {
            if !self.authors.iter().any(|author| author.id == id) {
                self.filter.author_id = None;
            }
        }
        if let Some(id) = self.filter.genre_id {
            if !self.genres.iter().any(|genre| genre.id == id) {
                self.filter.genre_id = None;
            }
        }

        match &mut self.screen {
            Screen::Authors(screen) => screen.set_authors(self.authors.clone()),
            Screen::Genres(screen) => screen.set_genres(self.genres.clone()),
            Screen::Books => {}
        }

        self.apply_filter(focus_id);
        Ok(())
    }

    /// Re-run the filter over the loaded books and keep the selection sane.
    fn apply_filter(&mut self, focus_id: Option<i64>) {
        self.filtered_books = self.filter.apply(&self.books);
        if self.filtered_books.is_empty() {
            self.selected = 0;
            return;
        }

        if let Some(id) = focus_id {
            if let Some(idx) = self.filtered_books.iter().position(|book| book.id == id) {
                self.selected = idx;
                return;
            }
        }

        if self.selected >= self.filtered_books.len() {
            self.selected = self.filtered_books.len() - 1;
        }
    }

    fn open_authors_screen(&mut self) -> Result<()> {
        self.reload_catalog(None)?;
        self.screen = Screen::Authors(AuthorsScreen::new(self.authors.clone()));
        Ok(())
    }

    fn open_genres_screen(&mut self) -> Result<()> {
        self.reload_catalog(None)?;
        self.screen = Screen::Genres(GenresScreen::new(self.genres.clone()));
        Ok(())
    }

    fn close_manage_screen(&mut self) -> Result<()> {
        self.clear_status();
        self.screen = Screen::Books;
        self.reload_catalog(None)
    }
}

fn render_selection_list(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    list: &SelectionList,
    active: bool,
) {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if active {
        block = block.style(Style::default().fg(Color::Yellow));
    }

    if list.entries.is_empty() {
        let message = Paragraph::new("Nothing to select yet.")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let items: Vec<ListItem> = list
        .entries
        .iter()
        .enumerate()
        .map(|(index, (_, label))| {
            let checkbox = if list.is_checked(index) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{checkbox} {label}"))
        })
        .collect();

    let widget = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Yellow))
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    if active {
        list_state.select(Some(list.selected));
    }
    frame.render_stateful_widget(widget, area, &mut list_state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_test_catalog, seed_if_empty};

    fn seeded_app() -> App {
        let mut conn = open_test_catalog().expect("schema");
        seed_if_empty(&mut conn).expect("seed");
        let books = fetch_books_with_links(&conn).expect("books");
        let authors = fetch_authors(&conn).expect("authors");
        let genres = fetch_genres(&conn).expect("genres");
        App::new(conn, books, authors, genres)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).expect("key");
        }
    }

    #[test]
    fn typing_a_search_narrows_the_visible_books() {
        let mut app = seeded_app();
        assert_eq!(app.filtered_books.len(), 3);

        app.handle_key(KeyCode::Char('f')).expect("open search");
        type_text(&mut app, "война");
        assert_eq!(app.filtered_books.len(), 1);
        assert_eq!(app.filtered_books[0].title, "Война и мир");

        app.handle_key(KeyCode::Esc).expect("clear search");
        assert_eq!(app.filtered_books.len(), 3);
        assert!(app.filter.is_clear());
    }

    #[test]
    fn adding_a_genre_through_the_form_persists_and_reloads() {
        let mut app = seeded_app();
        app.handle_key(KeyCode::Char('G')).expect("open genres");
        app.handle_key(KeyCode::Char('+')).expect("open form");
        type_text(&mut app, "Поэзия");
        app.handle_key(KeyCode::Enter).expect("save");

        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.genres.iter().any(|genre| genre.name == "Поэзия"));
        let count: i64 = app
            .conn
            .query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 4);
    }

    #[test]
    fn duplicate_genre_name_keeps_the_form_open_with_a_reason() {
        let mut app = seeded_app();
        app.handle_key(KeyCode::Char('G')).expect("open genres");
        app.handle_key(KeyCode::Char('+')).expect("open form");
        type_text(&mut app, "роман");
        app.handle_key(KeyCode::Enter).expect("try save");

        match &app.mode {
            Mode::AddingGenre(form) => {
                let error = form.error.as_deref().expect("form keeps the reason");
                assert!(error.contains("already exists"), "got: {error}");
            }
            _ => panic!("form should stay open after a rejected save"),
        }
        assert_eq!(app.genres.len(), 3);
    }

    #[test]
    fn confirmed_book_delete_removes_the_row_and_reloads() {
        let mut app = seeded_app();
        app.handle_key(KeyCode::Char('-')).expect("ask delete");
        assert!(matches!(app.mode, Mode::ConfirmBookDelete(_)));

        app.handle_key(KeyCode::Char('y')).expect("confirm");
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.books.len(), 2);
        let count: i64 = app
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 2);
    }

    #[test]
    fn author_filter_narrows_and_reset_restores() {
        let mut app = seeded_app();
        let chekhov = app
            .authors
            .iter()
            .find(|author| author.last_name == "Чехов")
            .expect("seeded author")
            .id;

        app.handle_key(KeyCode::Char('a')).expect("open picker");
        if let Mode::PickingFilter(ref mut picker) = app.mode {
            let position = picker
                .entries
                .iter()
                .position(|(id, _)| *id == Some(chekhov))
                .expect("author entry");
            picker.selected = position;
        } else {
            panic!("picker should be open");
        }
        app.handle_key(KeyCode::Enter).expect("apply");

        assert_eq!(app.filter.author_id, Some(chekhov));
        assert_eq!(app.filtered_books.len(), 1);
        assert_eq!(app.filtered_books[0].title, "Дама с собачкой");

        app.handle_key(KeyCode::Char('r')).expect("reset");
        assert!(app.filter.is_clear());
        assert_eq!(app.filtered_books.len(), 3);
    }

    #[test]
    fn deleting_a_filtered_author_clears_that_filter_dimension() {
        let mut app = seeded_app();
        let chekhov = app
            .authors
            .iter()
            .find(|author| author.last_name == "Чехов")
            .expect("seeded author")
            .id;
        app.filter.author_id = Some(chekhov);
        app.apply_filter(None);
        assert_eq!(app.filtered_books.len(), 1);

        delete_author(&app.conn, chekhov).expect("delete");
        app.reload_catalog(None).expect("reload");

        assert_eq!(app.filter.author_id, None);
        assert_eq!(app.filtered_books.len(), 3);
    }

    #[test]
    fn edit_form_rejects_a_bad_year_without_touching_the_row() {
        let mut app = seeded_app();
        app.handle_key(KeyCode::Char('e')).expect("open edit");
        let id = match &app.mode {
            Mode::EditingBook { id, .. } => *id,
            _ => panic!("edit form should be open"),
        };

        if let Mode::EditingBook { ref mut form, .. } = app.mode {
            form.publish_year.clear();
            form.publish_year.push_str("1780");
        }
        app.handle_key(KeyCode::Enter).expect("try save");

        match &app.mode {
            Mode::EditingBook { form, .. } => {
                assert!(form.error.is_some(), "reason should be shown inline");
            }
            _ => panic!("form should stay open"),
        }
        let stored: i64 = app
            .conn
            .query_row(
                "SELECT publish_year FROM books WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .expect("year");
        assert_ne!(stored, 1780);
    }
}
