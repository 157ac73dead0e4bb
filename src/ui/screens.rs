use std::collections::HashSet;

use crate::models::{Author, Genre};

/// Backing state for the author management screen.
pub(crate) struct AuthorsScreen {
    pub(crate) authors: Vec<Author>,
    pub(crate) selected: usize,
}

impl AuthorsScreen {
    pub(crate) fn new(authors: Vec<Author>) -> Self {
        let mut screen = Self {
            authors,
            selected: 0,
        };
        screen.ensure_in_bounds();
        screen
    }

    pub(crate) fn current_author(&self) -> Option<&Author> {
        self.authors.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.authors.is_empty() {
            return;
        }
        let len = self.authors.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.authors.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.authors.is_empty() {
            self.selected = self.authors.len() - 1;
        }
    }

    pub(crate) fn set_authors(&mut self, authors: Vec<Author>) {
        self.authors = authors;
        self.ensure_in_bounds();
    }

    /// Move the selection onto a specific author after a reload, falling back
    /// to a clamped index when the row is gone.
    pub(crate) fn focus(&mut self, id: i64) {
        if let Some(idx) = self.authors.iter().position(|author| author.id == id) {
            self.selected = idx;
        } else {
            self.ensure_in_bounds();
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.authors.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.authors.len() {
            self.selected = self.authors.len() - 1;
        }
    }
}

/// Backing state for the genre management screen.
pub(crate) struct GenresScreen {
    pub(crate) genres: Vec<Genre>,
    pub(crate) selected: usize,
}

impl GenresScreen {
    pub(crate) fn new(genres: Vec<Genre>) -> Self {
        let mut screen = Self {
            genres,
            selected: 0,
        };
        screen.ensure_in_bounds();
        screen
    }

    pub(crate) fn current_genre(&self) -> Option<&Genre> {
        self.genres.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.genres.is_empty() {
            return;
        }
        let len = self.genres.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.genres.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.genres.is_empty() {
            self.selected = self.genres.len() - 1;
        }
    }

    pub(crate) fn set_genres(&mut self, genres: Vec<Genre>) {
        self.genres = genres;
        self.ensure_in_bounds();
    }

    pub(crate) fn focus(&mut self, id: i64) {
        if let Some(idx) = self.genres.iter().position(|genre| genre.id == id) {
            self.selected = idx;
        } else {
            self.ensure_in_bounds();
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.genres.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.genres.len() {
            self.selected = self.genres.len() - 1;
        }
    }
}

/// Checkbox list embedded in the book form for picking linked authors or
/// genres. Entries are `(id, label)` pairs in display order; the checked set
/// tracks ids so reordering never loses a selection.
#[derive(Clone)]
pub(crate) struct SelectionList {
    pub(crate) entries: Vec<(i64, String)>,
    pub(crate) selected: usize,
    pub(crate) checked: HashSet<i64>,
}

impl SelectionList {
    pub(crate) fn new(entries: Vec<(i64, String)>, checked: HashSet<i64>) -> Self {
        Self {
            entries,
            selected: 0,
            checked,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn toggle_current(&mut self) {
        if let Some((id, _)) = self.entries.get(self.selected) {
            if !self.checked.remove(id) {
                self.checked.insert(*id);
            }
        }
    }

    pub(crate) fn is_checked(&self, index: usize) -> bool {
        matches!(
            self.entries.get(index),
            Some((id, _)) if self.checked.contains(id)
        )
    }

    pub(crate) fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Checked ids in display order, ready to hand to the link writers.
    pub(crate) fn checked_ids(&self) -> Vec<i64> {
        self.entries
            .iter()
            .filter(|(id, _)| self.checked.contains(id))
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Which filter dimension a picker popup is editing.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum FilterKind {
    Author,
    Genre,
}

/// Popup list for choosing the author or genre filter. The first entry always
/// clears the dimension; the rest mirror the current catalog rows.
pub(crate) struct FilterPicker {
    pub(crate) kind: FilterKind,
    pub(crate) entries: Vec<(Option<i64>, String)>,
    pub(crate) selected: usize,
}

impl FilterPicker {
    pub(crate) fn new(
        kind: FilterKind,
        options: Vec<(i64, String)>,
        current: Option<i64>,
    ) -> Self {
        let clear_label = match kind {
            FilterKind::Author => "All authors",
            FilterKind::Genre => "All genres",
        };
        let mut entries = vec![(None, clear_label.to_string())];
        entries.extend(options.into_iter().map(|(id, label)| (Some(id), label)));

        let selected = entries
            .iter()
            .position(|(id, _)| *id == current)
            .unwrap_or(0);
        Self {
            kind,
            entries,
            selected,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len() as isize;
        let mut new = self.selected as isize + offset;
        if new < 0 {
            new = 0;
        }
        if new >= len {
            new = len - 1;
        }
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        if !self.entries.is_empty() {
            self.selected = 0;
        }
    }

    pub(crate) fn select_last(&mut self) {
        if !self.entries.is_empty() {
            self.selected = self.entries.len() - 1;
        }
    }

    pub(crate) fn current_choice(&self) -> Option<(Option<i64>, &str)> {
        self.entries
            .get(self.selected)
            .map(|(id, label)| (*id, label.as_str()))
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

    #[test]
    fn authors_screen_clamps_selection() {
        let mut screen = AuthorsScreen::new(vec![
            author(1, "Лев", "Толстой"),
            author(2, "Антон", "Чехов"),
        ]);
        screen.move_selection(10);
        assert_eq!(screen.selected, 1);
        screen.move_selection(-10);
        assert_eq!(screen.selected, 0);

        screen.set_authors(vec![author(2, "Антон", "Чехов")]);
        assert_eq!(screen.selected, 0);
        assert_eq!(screen.current_author().map(|a| a.id), Some(2));
    }

    #[test]
    fn focus_falls_back_when_the_row_is_gone() {
        let mut screen = AuthorsScreen::new(vec![author(1, "a", "b"), author(2, "c", "d")]);
        screen.focus(2);
        assert_eq!(screen.selected, 1);
        screen.set_authors(vec![author(1, "a", "b")]);
        screen.focus(2);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn selection_list_toggles_by_id() {
        let mut list = SelectionList::new(
            vec![(10, "Роман".to_string()), (20, "Драма".to_string())],
            HashSet::new(),
        );
        assert_eq!(list.checked_count(), 0);

        list.toggle_current();
        assert!(list.is_checked(0));
        assert_eq!(list.checked_ids(), vec![10]);

        list.move_selection(1);
        list.toggle_current();
        assert_eq!(list.checked_ids(), vec![10, 20]);

        list.toggle_current();
        assert_eq!(list.checked_ids(), vec![10]);
    }

    #[test]
    fn selection_list_preseeds_checked_ids() {
        let checked: HashSet<i64> = [20].into_iter().collect();
        let list = SelectionList::new(
            vec![(10, "a".to_string()), (20, "b".to_string())],
            checked,
        );
        assert!(!list.is_checked(0));
        assert!(list.is_checked(1));
    }

    #[test]
    fn filter_picker_starts_on_the_active_choice() {
        let picker = FilterPicker::new(
            FilterKind::Author,
            vec![(1, "Лев Толстой".to_string()), (2, "Антон Чехов".to_string())],
            Some(2),
        );
        assert_eq!(picker.selected, 2);
        assert_eq!(picker.current_choice(), Some((Some(2), "Антон Чехов")));
    }

    #[test]
    fn filter_picker_offers_a_clear_entry_first() {
        let mut picker = FilterPicker::new(FilterKind::Genre, vec![(7, "Роман".to_string())], None);
        assert_eq!(picker.selected, 0);
        assert_eq!(picker.current_choice(), Some((None, "All genres")));
        picker.move_selection(1);
        assert_eq!(picker.current_choice(), Some((Some(7), "Роман")));
    }
}
