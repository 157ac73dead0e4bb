//! Pure validation for the three edit forms. Each check inspects candidate
//! field values and returns either `Ok` or a [`ValidationError`] whose display
//! text is the exact reason shown to the user. Nothing here touches the
//! database; callers decide whether a failure blocks the save and where the
//! reason gets rendered.

use chrono::{Datelike, Local};
use thiserror::Error;

use crate::models::Genre;

/// Books published before the modern printing era are out of scope for the
/// catalog, so the year range starts here.
pub const MIN_PUBLISH_YEAR: i64 = 1800;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Reasons an edit form can refuse to save. The `Display` text doubles as the
/// user-facing message, so wording changes here show up in the UI directly.
pub enum ValidationError {
    #[error("First name is required")]
    FirstNameRequired,
    #[error("Last name is required")]
    LastNameRequired,
    #[error("Genre name is required")]
    GenreNameRequired,
    #[error("A genre named '{name}' already exists")]
    GenreNameTaken { name: String },
    #[error("Title is required")]
    TitleRequired,
    #[error("Select at least one author")]
    NoAuthorsSelected,
    #[error("Select at least one genre")]
    NoGenresSelected,
    #[error("Publish year '{raw}' is not a whole number")]
    YearNotANumber { raw: String },
    #[error("Publish year {year} must be between {min} and {max}")]
    YearOutOfRange { year: i64, min: i64, max: i64 },
    #[error("ISBN '{raw}' must be 10 or 13 digits (a 10-digit ISBN may end in X)")]
    IsbnInvalid { raw: String },
    #[error("Quantity '{raw}' is not a non-negative whole number")]
    QuantityInvalid { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Typed output of a successful book validation. The save path consumes the
/// parsed numbers from here instead of re-parsing the raw form text.
pub struct BookDraft {
    pub title: String,
    pub publish_year: i64,
    pub isbn: String,
    pub quantity_in_stock: i64,
}

/// The inclusive upper bound for publish years is the current calendar year.
pub fn current_year() -> i64 {
    i64::from(Local::now().year())
}

/// Validate an author edit. Only the two name fields are constrained; birth
/// date and country accept anything the user types.
pub fn check_author(first_name: &str, last_name: &str) -> Result<(), ValidationError> {
    if first_name.trim().is_empty() {
        return Err(ValidationError::FirstNameRequired);
    }
    if last_name.trim().is_empty() {
        return Err(ValidationError::LastNameRequired);
    }
    Ok(())
}

/// Validate a genre edit against the current genre list. `editing_id` is the
/// id of the genre being edited (`None` for a brand-new one); it is excluded
/// from the uniqueness scan so renaming a genre to its own current name is
/// allowed.
pub fn check_genre(
    name: &str,
    existing: &[Genre],
    editing_id: Option<i64>,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::GenreNameRequired);
    }
    let lowered = name.to_lowercase();
    let taken = existing
        .iter()
        .filter(|genre| Some(genre.id) != editing_id)
        .any(|genre| genre.name.to_lowercase() == lowered);
    if taken {
        return Err(ValidationError::GenreNameTaken {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validate a book edit. Raw year and quantity strings are parsed here; on
/// success the caller receives a [`BookDraft`] with typed values. Author and
/// genre selections are checked by count only, keeping the function free of
/// any repository knowledge.
pub fn check_book(
    title: &str,
    year_raw: &str,
    isbn: &str,
    quantity_raw: &str,
    author_count: usize,
    genre_count: usize,
) -> Result<BookDraft, ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if author_count == 0 {
        return Err(ValidationError::NoAuthorsSelected);
    }
    if genre_count == 0 {
        return Err(ValidationError::NoGenresSelected);
    }
    let year: i64 = year_raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::YearNotANumber {
            raw: year_raw.to_string(),
        })?;
    let max = current_year();
    if !(MIN_PUBLISH_YEAR..=max).contains(&year) {
        return Err(ValidationError::YearOutOfRange {
            year,
            min: MIN_PUBLISH_YEAR,
            max,
        });
    }
    if !is_valid_isbn(isbn) {
        return Err(ValidationError::IsbnInvalid {
            raw: isbn.to_string(),
        });
    }
    let quantity: i64 = quantity_raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::QuantityInvalid {
            raw: quantity_raw.to_string(),
        })?;
    if quantity < 0 {
        return Err(ValidationError::QuantityInvalid {
            raw: quantity_raw.to_string(),
        });
    }
    Ok(BookDraft {
        title: title.trim().to_string(),
        publish_year: year,
        isbn: isbn.trim().to_string(),
        quantity_in_stock: quantity,
    })
}

/// Shape-only ISBN check. Hyphens and spaces are stripped, then the remainder
/// must be 10 or 13 characters: all digits for 13, and for 10 the first nine
/// digits followed by a digit or an uppercase `X`. The check digit is never
/// recomputed; a well-formed but arithmetically wrong ISBN passes.
pub fn is_valid_isbn(raw: &str) -> bool {
    let cleaned: Vec<char> = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();
    match cleaned.len() {
        13 => cleaned.iter().all(|c| c.is_ascii_digit()),
        10 => {
            cleaned[..9].iter().all(|c| c.is_ascii_digit())
                && (cleaned[9] == 'X' || cleaned[9].is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i64, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn author_requires_both_names() {
        assert_eq!(
            check_author("", "Толстой"),
            Err(ValidationError::FirstNameRequired)
        );
        assert_eq!(
            check_author("Лев", "   "),
            Err(ValidationError::LastNameRequired)
        );
        assert_eq!(check_author("Лев", "Толстой"), Ok(()));
    }

    #[test]
    fn genre_rename_to_own_name_is_allowed() {
        let existing = vec![genre(1, "Роман"), genre(2, "Драма")];
        assert_eq!(check_genre("Роман", &existing, Some(1)), Ok(()));
    }

    #[test]
    fn genre_rename_to_another_name_is_rejected() {
        let existing = vec![genre(1, "Роман"), genre(2, "Драма")];
        assert_eq!(
            check_genre("Драма", &existing, Some(1)),
            Err(ValidationError::GenreNameTaken {
                name: "Драма".to_string()
            })
        );
    }

    #[test]
    fn genre_uniqueness_ignores_case() {
        let existing = vec![genre(1, "Роман")];
        assert!(check_genre("РОМАН", &existing, None).is_err());
        assert!(check_genre("роман", &existing, None).is_err());
        assert_eq!(check_genre("Поэзия", &existing, None), Ok(()));
    }

    #[test]
    fn new_genre_requires_name() {
        assert_eq!(
            check_genre("  ", &[], None),
            Err(ValidationError::GenreNameRequired)
        );
    }

    #[test]
    fn isbn_shapes() {
        assert!(is_valid_isbn("978-5-699-12014-7"));
        assert!(is_valid_isbn("0-306-40615-2"));
        assert!(is_valid_isbn("030640615X"));
        assert!(!is_valid_isbn("123"));
        assert!(!is_valid_isbn("97850691201"));
        assert!(!is_valid_isbn("030640615x"));
        assert!(!is_valid_isbn("03064061X5"));
    }

    #[test]
    fn isbn_strips_hyphens_and_spaces_only() {
        assert!(is_valid_isbn("978 5 699 12014 7"));
        assert!(!is_valid_isbn("978_5_699_12014_7"));
    }

    #[test]
    fn year_bounds_are_inclusive() {
        let ok = check_book("T", "1800", "030640615X", "0", 1, 1);
        assert!(ok.is_ok());
        let this_year = current_year().to_string();
        assert!(check_book("T", &this_year, "030640615X", "0", 1, 1).is_ok());
        assert!(matches!(
            check_book("T", "1799", "030640615X", "0", 1, 1),
            Err(ValidationError::YearOutOfRange { year: 1799, .. })
        ));
        let next_year = (current_year() + 1).to_string();
        assert!(matches!(
            check_book("T", &next_year, "030640615X", "0", 1, 1),
            Err(ValidationError::YearOutOfRange { .. })
        ));
        assert!(matches!(
            check_book("T", "soon", "030640615X", "0", 1, 1),
            Err(ValidationError::YearNotANumber { .. })
        ));
    }

    #[test]
    fn book_without_genres_is_blocked_even_when_rest_is_valid() {
        assert_eq!(
            check_book("Война и мир", "1869", "978-5-699-12014-7", "5", 1, 0),
            Err(ValidationError::NoGenresSelected)
        );
    }

    #[test]
    fn book_without_authors_is_blocked() {
        assert_eq!(
            check_book("Война и мир", "1869", "978-5-699-12014-7", "5", 0, 1),
            Err(ValidationError::NoAuthorsSelected)
        );
    }

    #[test]
    fn quantity_must_be_a_non_negative_integer() {
        assert!(matches!(
            check_book("T", "1900", "030640615X", "-1", 1, 1),
            Err(ValidationError::QuantityInvalid { .. })
        ));
        assert!(matches!(
            check_book("T", "1900", "030640615X", "many", 1, 1),
            Err(ValidationError::QuantityInvalid { .. })
        ));
    }

    #[test]
    fn valid_book_yields_typed_draft() {
        let draft = check_book("Война и мир", " 1869 ", "978-5-699-12014-7", " 5 ", 1, 1)
            .expect("book should validate");
        assert_eq!(draft.title, "Война и мир");
        assert_eq!(draft.publish_year, 1869);
        assert_eq!(draft.isbn, "978-5-699-12014-7");
        assert_eq!(draft.quantity_in_stock, 5);
    }
}
