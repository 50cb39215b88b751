use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Component, ComponentDraft, Field};

/// Indent applied to every line of a multi-line field's value.
const MULTILINE_INDENT: &str = "  ";

/// Terminal coordinates are `u16`; anything longer pins to the edge.
fn screen_offset(chars: usize) -> u16 {
    u16::try_from(chars).unwrap_or(u16::MAX)
}

/// Known values offered as ghosted completions in the add form.
#[derive(Debug, Default, Clone)]
pub(crate) struct Suggestions {
    pub(crate) patterns: Vec<String>,
    pub(crate) languages: Vec<String>,
    pub(crate) categories: Vec<String>,
}

impl Suggestions {
    fn for_field(&self, field: FormField) -> &[String] {
        match field {
            FormField::Pattern => &self.patterns,
            FormField::Language => &self.languages,
            FormField::Category => &self.categories,
            _ => &[],
        }
    }
}

/// Fields of the add form, in focus order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum FormField {
    #[default]
    Name,
    Pattern,
    Category,
    Language,
    Author,
    Description,
    Code,
}

impl FormField {
    pub(crate) const ORDER: [FormField; 7] = [
        FormField::Name,
        FormField::Pattern,
        FormField::Category,
        FormField::Language,
        FormField::Author,
        FormField::Description,
        FormField::Code,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name*",
            FormField::Pattern => "Pattern*",
            FormField::Category => "Category",
            FormField::Language => "Language*",
            FormField::Author => "Author",
            FormField::Description => "Description",
            FormField::Code => "Code",
        }
    }

    /// Multi-line fields take `Enter` as a newline instead of "save".
    pub(crate) fn is_multiline(self) -> bool {
        matches!(self, FormField::Description | FormField::Code)
    }

    fn required(self) -> Option<Field> {
        match self {
            FormField::Name => Some(Field::Name),
            FormField::Pattern => Some(Field::Pattern),
            FormField::Language => Some(Field::Language),
            _ => None,
        }
    }

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.position() + len - 1) % len]
    }
}

/// State for the "Add Component" modal, including autocomplete tracking for
/// the pattern, category and language fields.
#[derive(Debug, Default, Clone)]
pub(crate) struct ComponentForm {
    pub(crate) draft: ComponentDraft,
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
    /// Required fields the last save attempt reported as empty.
    pub(crate) missing: Vec<Field>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl ComponentForm {
    /// Start a form with the pattern and language pre-filled from the active
    /// browser filters so repeated entry into one bucket is quick.
    pub(crate) fn prefilled(pattern: Option<&str>, language: Option<&str>) -> Self {
        let mut form = Self::default();
        form.draft.pattern = pattern.unwrap_or_default().to_string();
        form.draft.language = language.unwrap_or_default().to_string();
        form
    }

    pub(crate) fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.draft.name,
            FormField::Pattern => &self.draft.pattern,
            FormField::Category => &self.draft.category,
            FormField::Language => &self.draft.language,
            FormField::Author => &self.draft.author,
            FormField::Description => &self.draft.description,
            FormField::Code => &self.draft.code,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.draft.name,
            FormField::Pattern => &mut self.draft.pattern,
            FormField::Category => &mut self.draft.category,
            FormField::Language => &mut self.draft.language,
            FormField::Author => &mut self.draft.author,
            FormField::Description => &mut self.draft.description,
            FormField::Code => &mut self.draft.code,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.focus(self.active.next());
    }

    pub(crate) fn previous_field(&mut self) {
        self.focus(self.active.previous());
    }

    fn focus(&mut self, field: FormField) {
        self.active = field;
        self.suggestion = None;
        self.autocomplete_disabled = false;
    }

    /// Insert a character into the active field. Control characters are
    /// ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let active = self.active;
        self.value_mut(active).push(ch);
        self.autocomplete_disabled = false;
        self.clear_missing(active);
        true
    }

    /// Break the line in a multi-line field. Returns `false` for single-line
    /// fields so the caller can treat `Enter` as "save".
    pub(crate) fn newline(&mut self) -> bool {
        if !self.active.is_multiline() {
            return false;
        }
        let active = self.active;
        self.value_mut(active).push('\n');
        true
    }

    pub(crate) fn backspace(&mut self) {
        let active = self.active;
        self.value_mut(active).pop();
        self.autocomplete_disabled = false;
    }

    /// Jump to the first field the last save attempt reported as empty.
    pub(crate) fn focus_first_missing(&mut self) {
        let target = FormField::ORDER.into_iter().find(|field| {
            field
                .required()
                .is_some_and(|required| self.missing.contains(&required))
        });
        if let Some(field) = target {
            self.focus(field);
        }
    }

    fn clear_missing(&mut self, field: FormField) {
        if let Some(required) = field.required() {
            self.missing.retain(|missing| *missing != required);
        }
        if self.missing.is_empty() {
            self.error = None;
        }
    }

    /// The draft handed to the librarian. Validation happens there.
    pub(crate) fn to_draft(&self) -> ComponentDraft {
        self.draft.clone()
    }

    /// Recompute the ghosted completion for the active field.
    pub(crate) fn update_suggestion(&mut self, suggestions: &Suggestions) {
        let current = self.value(self.active);
        if self.autocomplete_disabled || current.is_empty() {
            self.suggestion = None;
            return;
        }

        let current_lower = current.to_lowercase();
        let candidate = suggestions
            .for_field(self.active)
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&current_lower));

        self.suggestion = match candidate {
            Some(candidate) if candidate.to_lowercase() == current_lower => None,
            Some(candidate) => Some(candidate.clone()),
            None => None,
        };
    }

    /// Replace the active value with the suggestion, if one is showing.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        match self.suggestion.take() {
            Some(candidate) => {
                let active = self.active;
                *self.value_mut(active) = candidate;
                self.autocomplete_disabled = true;
                self.clear_missing(active);
                true
            }
            None => false,
        }
    }

    /// Hide the suggestion until the user types again.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestion.take().is_some() {
            self.autocomplete_disabled = true;
            return true;
        }
        false
    }

    /// Remaining characters of the suggestion past what has been typed.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let typed = self.value(self.active).chars().count();
        let suffix: String = candidate.chars().skip(typed).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    /// Render every field, returning the lines plus the cursor's (column,
    /// row) relative to the first line.
    pub(crate) fn render_lines(&self) -> (Vec<Line<'static>>, (u16, u16)) {
        let mut lines = Vec::new();
        let mut cursor = (0u16, 0u16);

        for field in FormField::ORDER {
            let is_active = self.active == field;
            let value = self.value(field);
            let missing = field
                .required()
                .map(|required| self.missing.contains(&required))
                .unwrap_or(false);

            let label_style = if missing {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else if is_active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let value_style = if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let placeholder = if field.required().is_some() {
                "<required>"
            } else {
                "<optional>"
            };
            let placeholder_style = Style::default().fg(Color::DarkGray);

            if field.is_multiline() {
                lines.push(Line::from(Span::styled(
                    format!("{}:", field.label()),
                    label_style,
                )));
                if value.is_empty() {
                    if is_active {
                        cursor = (screen_offset(MULTILINE_INDENT.len()), screen_offset(lines.len()));
                    }
                    lines.push(Line::from(Span::styled(
                        format!("{MULTILINE_INDENT}{placeholder}"),
                        placeholder_style,
                    )));
                } else {
                    for text in value.split('\n') {
                        if is_active {
                            let column = MULTILINE_INDENT.len() + text.chars().count();
                            cursor = (screen_offset(column), screen_offset(lines.len()));
                        }
                        lines.push(Line::from(vec![
                            Span::raw(MULTILINE_INDENT),
                            Span::styled(text.to_string(), value_style),
                        ]));
                    }
                }
            } else {
                let prefix = format!("{}: ", field.label());
                if is_active {
                    let column = prefix.chars().count() + value.chars().count();
                    cursor = (screen_offset(column), screen_offset(lines.len()));
                }
                let mut spans = vec![Span::styled(prefix, label_style)];
                if value.is_empty() && !is_active {
                    spans.push(Span::styled(placeholder, placeholder_style));
                } else {
                    spans.push(Span::styled(value.to_string(), value_style));
                    if is_active {
                        if let Some(suffix) = self.suggestion_suffix() {
                            spans.push(Span::styled(suffix, placeholder_style));
                        }
                    }
                }
                lines.push(Line::from(spans));
            }
        }

        (lines, cursor)
    }
}

/// State for confirming permanent component deletion.
#[derive(Debug, Clone)]
pub(crate) struct ConfirmComponentDelete {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) pattern: String,
    pub(crate) language: String,
}

impl ConfirmComponentDelete {
    pub(crate) fn from(component: &Component) -> Self {
        Self {
            id: component.id,
            name: component.name.clone(),
            pattern: component.pattern.clone(),
            language: component.language.clone(),
        }
    }
}
