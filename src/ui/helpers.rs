use std::error::Error;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Footer message for a failure: the top-level message, plus the innermost
/// cause when there is one (usually SQLite's own explanation).
pub(crate) fn surface_error(err: &(dyn Error + 'static)) -> String {
    let Some(mut root) = err.source() else {
        return err.to_string();
    };
    while let Some(source) = root.source() {
        root = source;
    }
    format!("{err}: {root}")
}

/// Render `[key] Label` pairs the way every footer shows shortcuts.
pub(crate) fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (index, (key, label)) in hints.iter().enumerate() {
        spans.push(Span::styled(*key, key_style));
        if index + 1 == hints.len() {
            spans.push(Span::raw(format!(" {label}")));
        } else {
            spans.push(Span::raw(format!(" {label}   ")));
        }
    }
    Line::from(spans)
}
