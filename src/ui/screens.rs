use crate::models::Component;

/// Search text plus the optional exact-match filters shown in the filter bar.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FilterState {
    pub(crate) text: String,
    pub(crate) pattern: Option<String>,
    pub(crate) language: Option<String>,
}

impl FilterState {
    pub(crate) fn is_active(&self) -> bool {
        !self.text.trim().is_empty() || self.pattern.is_some() || self.language.is_some()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Step the pattern filter through "any" followed by each known pattern.
    pub(crate) fn cycle_pattern(&mut self, known: &[String], forward: bool) {
        self.pattern = cycle(self.pattern.as_deref(), known, forward);
    }

    /// Step the language filter through "any" followed by each known language.
    pub(crate) fn cycle_language(&mut self, known: &[String], forward: bool) {
        self.language = cycle(self.language.as_deref(), known, forward);
    }
}

/// Advance through `[None, known[0], known[1], ...]`, wrapping at both ends.
/// A current value no longer in `known` restarts from "any".
fn cycle(current: Option<&str>, known: &[String], forward: bool) -> Option<String> {
    let slots = known.len() + 1;
    let index = match current {
        None => 0,
        Some(value) => match known.iter().position(|candidate| candidate == value) {
            Some(position) => position + 1,
            None => return None,
        },
    };
    let next = if forward {
        (index + 1) % slots
    } else {
        (index + slots - 1) % slots
    };
    if next == 0 {
        None
    } else {
        Some(known[next - 1].clone())
    }
}

/// The main list/detail screen.
pub(crate) struct BrowserScreen {
    pub(crate) components: Vec<Component>,
    pub(crate) selected: usize,
    pub(crate) code_scroll: u16,
    pub(crate) filters: FilterState,
}

impl BrowserScreen {
    pub(crate) fn new(components: Vec<Component>) -> Self {
        Self {
            components,
            selected: 0,
            code_scroll: 0,
            filters: FilterState::default(),
        }
    }

    /// Swap in freshly queried components, keeping the selection on
    /// `focus_id` when it is still visible and otherwise clamping it.
    pub(crate) fn set_components(&mut self, components: Vec<Component>, focus_id: Option<i64>) {
        let previous_id = self.current().map(|component| component.id);
        self.components = components;

        let target = focus_id.or(previous_id);
        if let Some(index) =
            target.and_then(|id| self.components.iter().position(|c| c.id == id))
        {
            if Some(self.components[index].id) != previous_id {
                self.code_scroll = 0;
            }
            self.selected = index;
            return;
        }

        self.code_scroll = 0;
        self.ensure_in_bounds();
    }

    pub(crate) fn current(&self) -> Option<&Component> {
        self.components.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.components.is_empty() {
            return;
        }
        let last = self.components.len() as isize - 1;
        let new = (self.selected as isize + offset).clamp(0, last) as usize;
        if new != self.selected {
            self.selected = new;
            self.code_scroll = 0;
        }
    }

    pub(crate) fn select_first(&mut self) {
        self.move_selection(-(self.selected as isize));
    }

    pub(crate) fn select_last(&mut self) {
        self.move_selection(self.components.len() as isize);
    }

    /// Scroll the code pane, never past the last line of the snippet.
    pub(crate) fn scroll_code(&mut self, delta: i32) {
        let max = self
            .current()
            .map(|component| component.code.lines().count().saturating_sub(1))
            .unwrap_or(0) as i32;
        self.code_scroll = (self.code_scroll as i32 + delta).clamp(0, max) as u16;
    }

    fn ensure_in_bounds(&mut self) {
        if self.components.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.components.len() {
            self.selected = self.components.len() - 1;
        }
    }
}
