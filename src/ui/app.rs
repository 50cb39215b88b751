use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::error::{LibrarianError, StorageError};
use crate::librarian::Librarian;

use super::forms::{ComponentForm, ConfirmComponentDelete, Suggestions};
use super::helpers::{centered_rect, key_hints, surface_error};
use super::screens::BrowserScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height of the search/filter bar above the list.
const FILTER_BAR_HEIGHT: u16 = 3;
/// Height of the metadata block above the code pane.
const DETAILS_HEIGHT: u16 = 8;
/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 5;
/// Lines scrolled by `[` and `]` in the code pane.
const CODE_SCROLL_STEP: i32 = 3;
const SEARCH_PREFIX: &str = "Search: ";

/// Fine-grained modes layered over the browser screen.
enum Mode {
    Normal,
    /// Keystrokes edit the search text and re-run the query live.
    Searching,
    AddingComponent(ComponentForm),
    ConfirmDelete(ConfirmComponentDelete),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, PartialEq, Eq)]
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

/// Central application state. Every change to the library goes through the
/// `Librarian`; a failed call is reported in the footer and the app carries on.
pub struct App {
    librarian: Librarian,
    browser: BrowserScreen,
    suggestions: Suggestions,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Load every component plus the filter/autocomplete lists.
    pub fn load(librarian: Librarian) -> Result<Self, StorageError> {
        let components = librarian.get_all()?;
        let mut app = Self {
            librarian,
            browser: BrowserScreen::new(components),
            suggestions: Suggestions::default(),
            mode: Mode::Normal,
            status: None,
        };
        app.refresh_suggestions()?;
        Ok(app)
    }

    /// Route a key press to the active mode. Returns `true` when the user asked
    /// to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching => self.handle_search(code),
            Mode::AddingComponent(form) => self.handle_add_component(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        exit
    }

    /// Save the add form from whichever field has focus.
    pub(crate) fn handle_ctrl_s(&mut self) {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::AddingComponent(form) => self.submit_form(form),
            other => other,
        };
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.browser.filters.is_active() {
                    self.browser.filters.clear();
                    if self.reload(None) {
                        self.set_status("Filters cleared.", StatusKind::Info);
                    }
                } else {
                    *exit = true;
                }
            }
            KeyCode::Up => self.browser.move_selection(-1),
            KeyCode::Down => self.browser.move_selection(1),
            KeyCode::PageUp => self.browser.move_selection(-PAGE),
            KeyCode::PageDown => self.browser.move_selection(PAGE),
            KeyCode::Home => self.browser.select_first(),
            KeyCode::End => self.browser.select_last(),
            KeyCode::Char('[') => self.browser.scroll_code(-CODE_SCROLL_STEP),
            KeyCode::Char(']') => self.browser.scroll_code(CODE_SCROLL_STEP),
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Searching;
            }
            KeyCode::Char('p') => self.cycle_pattern(true),
            KeyCode::Char('P') => self.cycle_pattern(false),
            KeyCode::Char('l') => self.cycle_language(true),
            KeyCode::Char('L') => self.cycle_language(false),
            KeyCode::Char('c') => {
                self.browser.filters.clear();
                if self.reload(None) {
                    self.set_status("Filters cleared.", StatusKind::Info);
                }
            }
            KeyCode::Char('r') => {
                let refreshed = match self.refresh_suggestions() {
                    Ok(()) => self.reload(None),
                    Err(err) => {
                        self.report_storage_error(&err);
                        false
                    }
                };
                if refreshed {
                    let count = self.browser.components.len();
                    self.set_status(format!("Loaded {count} component(s)."), StatusKind::Info);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                let filters = &self.browser.filters;
                let form =
                    ComponentForm::prefilled(filters.pattern.as_deref(), filters.language.as_deref());
                return Mode::AddingComponent(form);
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(component) = self.browser.current() {
                    let confirm = ConfirmComponentDelete::from(component);
                    self.clear_status();
                    return Mode::ConfirmDelete(confirm);
                }
                self.set_status("No component selected to delete.", StatusKind::Error);
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.browser.filters.text.clear();
                self.reload(None);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.browser.move_selection(-1),
            KeyCode::Down => self.browser.move_selection(1),
            KeyCode::PageUp => self.browser.move_selection(-PAGE),
            KeyCode::PageDown => self.browser.move_selection(PAGE),
            KeyCode::Backspace => {
                if self.browser.filters.text.pop().is_some() {
                    self.reload(None);
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.browser.filters.text.push(ch);
                self.reload(None);
            }
            _ => {}
        }
        Mode::Searching
    }

    fn handle_add_component(&mut self, code: KeyCode, mut form: ComponentForm) -> Mode {
        match code {
            KeyCode::Esc => {
                if !form.cancel_autocomplete() {
                    self.set_status("Add component cancelled.", StatusKind::Info);
                    return Mode::Normal;
                }
            }
            KeyCode::Tab => {
                if !form.accept_suggestion() {
                    form.next_field();
                }
            }
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Enter => {
                if !form.newline() {
                    return self.submit_form(form);
                }
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }

        form.update_suggestion(&self.suggestions);
        Mode::AddingComponent(form)
    }

    fn submit_form(&mut self, mut form: ComponentForm) -> Mode {
        match self.librarian.add_component(form.to_draft()) {
            Ok(id) => {
                if let Err(err) = self.refresh_suggestions() {
                    self.report_storage_error(&err);
                    return Mode::Normal;
                }
                if !self.reload(Some(id)) {
                    return Mode::Normal;
                }
                let name = form.draft.name.trim();
                let visible = self.browser.current().map(|component| component.id) == Some(id);
                let message = if visible {
                    format!("Saved '{name}'.")
                } else {
                    format!("Saved '{name}' (hidden by the current filters).")
                };
                self.set_status(message, StatusKind::Info);
                Mode::Normal
            }
            Err(LibrarianError::Validation(err)) => {
                let message = err.to_string();
                form.missing = err.missing;
                form.focus_first_missing();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Mode::AddingComponent(form)
            }
            Err(LibrarianError::Storage(err)) => {
                self.report_storage_error(&err);
                form.error = Some(surface_error(&err));
                Mode::AddingComponent(form)
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmComponentDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.librarian.delete_component(confirm.id) {
                    Ok(removed) => {
                        if let Err(err) = self.refresh_suggestions() {
                            self.report_storage_error(&err);
                            return Mode::Normal;
                        }
                        if self.reload(None) {
                            let message = if removed {
                                format!("Deleted '{}'.", confirm.name)
                            } else {
                                format!("'{}' was already removed.", confirm.name)
                            };
                            self.set_status(message, StatusKind::Info);
                        }
                        Mode::Normal
                    }
                    Err(err) => {
                        self.report_storage_error(&err);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn cycle_pattern(&mut self, forward: bool) {
        self.browser
            .filters
            .cycle_pattern(&self.suggestions.patterns, forward);
        if self.reload(None) {
            let label = self.browser.filters.pattern.as_deref().unwrap_or("any");
            self.set_status(format!("Pattern filter: {label}"), StatusKind::Info);
        }
    }

    fn cycle_language(&mut self, forward: bool) {
        self.browser
            .filters
            .cycle_language(&self.suggestions.languages, forward);
        if self.reload(None) {
            let label = self.browser.filters.language.as_deref().unwrap_or("any");
            self.set_status(format!("Language filter: {label}"), StatusKind::Info);
        }
    }

    /// Re-run the current search. Returns `false` (after reporting) when the
    /// store could not be read.
    fn reload(&mut self, focus_id: Option<i64>) -> bool {
        let filters = &self.browser.filters;
        let result = self.librarian.search(
            &filters.text,
            filters.pattern.as_deref(),
            filters.language.as_deref(),
        );
        match result {
            Ok(components) => {
                self.browser.set_components(components, focus_id);
                true
            }
            Err(err) => {
                self.report_storage_error(&err);
                false
            }
        }
    }

    fn refresh_suggestions(&mut self) -> Result<(), StorageError> {
        self.suggestions = Suggestions {
            patterns: self.librarian.known_patterns()?,
            languages: self.librarian.known_languages()?,
            categories: self.librarian.known_categories()?,
        };
        Ok(())
    }

    fn report_storage_error(&mut self, err: &StorageError) {
        let message = surface_error(err);
        warn!(error = %message, "storage operation failed");
        self.set_status(message, StatusKind::Error);
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

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(FILTER_BAR_HEIGHT), Constraint::Min(0)])
            .split(content_area);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(sections[1]);

        self.draw_filter_bar(frame, sections[0]);
        self.draw_component_table(frame, panes[0]);
        self.draw_details(frame, panes[1]);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingComponent(form) => self.draw_component_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching | Mode::Normal => {}
        }
    }

    fn draw_filter_bar(&self, frame: &mut Frame, area: Rect) {
        let filters = &self.browser.filters;
        let searching = matches!(self.mode, Mode::Searching);
        let label_style = Style::default().add_modifier(Modifier::BOLD);
        let unset_style = Style::default().fg(Color::DarkGray);
        let set_style = Style::default().fg(Color::Yellow);

        let value_span = |value: Option<&str>| match value {
            Some(value) => Span::styled(value.to_string(), set_style),
            None => Span::styled("any", unset_style),
        };

        let line = Line::from(vec![
            Span::styled(SEARCH_PREFIX, label_style),
            Span::raw(filters.text.clone()),
            Span::raw("   "),
            Span::styled("Pattern: ", label_style),
            value_span(filters.pattern.as_deref()),
            Span::raw("   "),
            Span::styled("Language: ", label_style),
            value_span(filters.language.as_deref()),
        ]);

        let border_style = if searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title("Filters")
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(line).block(block), area);

        if searching && inner.width > 0 && inner.height > 0 {
            let offset = SEARCH_PREFIX.len() + filters.text.chars().count();
            let offset = u16::try_from(offset).unwrap_or(u16::MAX);
            let cursor_x = inner
                .x
                .saturating_add(offset)
                .min(inner.x + inner.width - 1);
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_component_table(&self, frame: &mut Frame, area: Rect) {
        let components = &self.browser.components;
        let block = Block::default()
            .title(format!("Components ({})", components.len()))
            .borders(Borders::ALL);

        if components.is_empty() {
            let message = if self.browser.filters.is_active() {
                "No components match the current filters."
            } else {
                "No components yet. Press '+' to add one."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(["Name", "Pattern", "Language", "Description"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = components.iter().map(|component| {
            Row::new(vec![
                Cell::from(component.name.clone()),
                Cell::from(component.pattern.clone()),
                Cell::from(component.language.clone()),
                Cell::from(component.description_preview()),
            ])
        });
        let widths = [
            Constraint::Percentage(30),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(35),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = TableState::default().with_selected(Some(self.browser.selected));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_details(&self, frame: &mut Frame, area: Rect) {
        let Some(component) = self.browser.current() else {
            let paragraph = Paragraph::new("Select a component to see its details.")
                .alignment(Alignment::Center)
                .block(Block::default().title("Details").borders(Borders::ALL));
            frame.render_widget(paragraph, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(DETAILS_HEIGHT), Constraint::Min(3)])
            .split(area);

        let label = Style::default().add_modifier(Modifier::BOLD);
        let pattern = if component.category.is_empty() {
            component.pattern.clone()
        } else {
            format!("{} ({})", component.pattern, component.category)
        };
        let description = if component.description.is_empty() {
            Span::styled("<none>", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(component.description.clone())
        };

        let lines = vec![
            Line::from(Span::styled(
                component.name.clone(),
                label.fg(Color::Cyan),
            )),
            Line::from(vec![Span::styled("Pattern: ", label), Span::raw(pattern)]),
            Line::from(vec![
                Span::styled("Language: ", label),
                Span::raw(component.language.clone()),
            ]),
            Line::from(vec![
                Span::styled("Added: ", label),
                Span::raw(component.provenance()),
            ]),
            Line::from(vec![Span::styled("Description: ", label), description]),
        ];
        let details = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Details").borders(Borders::ALL));
        frame.render_widget(details, chunks[0]);

        let code_block = Block::default()
            .title(format!("Code ({})", component.language))
            .borders(Borders::ALL);
        let code = if component.code.is_empty() {
            Paragraph::new(Span::styled("<no code>", Style::default().fg(Color::DarkGray)))
        } else {
            Paragraph::new(component.code.as_str()).scroll((self.browser.code_scroll, 0))
        };
        frame.render_widget(code.block(code_block), chunks[1]);
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
        match &self.mode {
            Mode::AddingComponent(_) => key_hints(&[
                ("[Tab]", "Accept/Next"),
                ("[Shift-Tab]", "Previous"),
                ("[Enter]", "Save (newline in Description/Code)"),
                ("[Ctrl-S]", "Save"),
                ("[Esc]", "Cancel"),
            ]),
            Mode::ConfirmDelete(_) => key_hints(&[("[y]", "Delete"), ("[n]", "Cancel")]),
            Mode::Searching => key_hints(&[
                ("[Type]", "Filter"),
                ("[↑↓]", "Select"),
                ("[Enter]", "Keep"),
                ("[Esc]", "Clear"),
            ]),
            Mode::Normal => key_hints(&[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[p/P]", "Pattern"),
                ("[l/L]", "Language"),
                ("[c]", "Clear Filters"),
                ("[[ ]]", "Scroll Code"),
                ("[+]", "Add"),
                ("[-]", "Delete"),
                ("[r]", "Reload"),
                ("[q]", "Quit"),
            ]),
        }
    }

    fn draw_component_form(&self, frame: &mut Frame, area: Rect, form: &ComponentForm) {
        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Component").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(2)])
            .split(inner);
        let body = chunks[0];

        let (lines, (cursor_col, cursor_row)) = form.render_lines();
        let scroll = cursor_row.saturating_sub(body.height.saturating_sub(1));
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), body);

        let hint = if let Some(error) = &form.error {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
        } else {
            Line::from(Span::styled(
                "* required • Ctrl-S saves from any field",
                Style::default().fg(Color::Gray),
            ))
        };
        frame.render_widget(Paragraph::new(vec![Line::from(""), hint]), chunks[1]);

        if body.width > 0 && body.height > 0 {
            let cursor_x = body
                .x
                .saturating_add(cursor_col)
                .min(body.x + body.width - 1);
            let cursor_y = body.y.saturating_add(cursor_row - scroll);
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmComponentDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Confirm Delete").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' ({}, {})?",
                confirm.name, confirm.pattern, confirm.language
            )),
            Line::from(""),
            Line::from(Span::styled(
                "This cannot be undone.",
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            key_hints(&[("[y]", "Delete"), ("[n]", "Cancel")]),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}
