//! Ratatui front-end: a filterable component list, a detail pane with the
//! snippet, and modal dialogs for adding and deleting components.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
