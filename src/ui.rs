//! Ratatui front-end for the Library Catalog Manager. State handling lives in
//! [`app`], modal form state in [`forms`], list screens in [`screens`], and
//! the terminal lifecycle in [`terminal`].

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
