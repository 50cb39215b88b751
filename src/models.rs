//! Domain models that mirror the `components` table and get passed between
//! the storage, logic and UI layers. They stay plain data holders; the only
//! behavior living here is the field validation every layer has to agree on.

use std::fmt;

use crate::error::ValidationError;

/// Number of description characters shown in list rows before truncating.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A stored code snippet.
pub struct Component {
    /// Primary key assigned by SQLite. Never reused after a delete.
    pub id: i64,
    pub name: String,
    /// Design-pattern label such as "Creational" or "Observer".
    pub pattern: String,
    /// Optional secondary classification ("Container", "Algorithm", ...).
    pub category: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub author: String,
    /// `YYYY-MM-DD`, stamped by the database at insertion time.
    pub added_on: String,
}

impl Component {
    /// Shorten the description for table rows, appending `...` when cut.
    pub fn description_preview(&self) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    /// `Author - date` line for the detail pane, omitting the author when
    /// blank.
    pub fn provenance(&self) -> String {
        if self.author.trim().is_empty() {
            self.added_on.clone()
        } else {
            format!("{} - {}", self.author, self.added_on)
        }
    }
}

/// Field values for a component that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDraft {
    pub name: String,
    pub pattern: String,
    pub category: String,
    pub language: String,
    pub description: String,
    pub code: String,
    pub author: String,
}

impl ComponentDraft {
    /// Trim every field and check the required ones. On success the trimmed
    /// copy is returned so callers persist exactly what was validated.
    pub fn validate(&self) -> Result<ComponentDraft, ValidationError> {
        let trimmed = ComponentDraft {
            name: self.name.trim().to_string(),
            pattern: self.pattern.trim().to_string(),
            category: self.category.trim().to_string(),
            language: self.language.trim().to_string(),
            description: self.description.trim().to_string(),
            code: self.code.trim().to_string(),
            author: self.author.trim().to_string(),
        };

        let missing: Vec<Field> = Field::REQUIRED
            .into_iter()
            .filter(|field| trimmed.value(*field).is_empty())
            .collect();

        if missing.is_empty() {
            Ok(trimmed)
        } else {
            Err(ValidationError { missing })
        }
    }

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Pattern => &self.pattern,
            Field::Language => &self.language,
        }
    }
}

/// Required component fields, in the order validation reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Pattern,
    Language,
}

impl Field {
    pub const REQUIRED: [Field; 3] = [Field::Name, Field::Pattern, Field::Language];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Pattern => "pattern",
            Field::Language => "language",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Criteria for `Store::filter`. `None` means "no constraint on that axis".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    /// Exact match against `pattern`.
    pub pattern: Option<String>,
    /// Exact match against `language`.
    pub language: Option<String>,
    /// Case-insensitive substring of `name` or `description`.
    pub text: Option<String>,
}

impl ComponentFilter {
    /// Whether `component` satisfies the text criterion. Pattern and language
    /// are matched in SQL, so they are not rechecked here.
    pub(crate) fn matches_text(&self, component: &Component) -> bool {
        match &self.text {
            None => true,
            Some(text) => {
                let needle = text.to_lowercase();
                component.name.to_lowercase().contains(&needle)
                    || component.description.to_lowercase().contains(&needle)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, pattern: &str, language: &str) -> ComponentDraft {
        ComponentDraft {
            name: name.to_string(),
            pattern: pattern.to_string(),
            language: language.to_string(),
            ..ComponentDraft::default()
        }
    }

    #[test]
    fn validate_trims_every_field() {
        let mut input = draft("  Factory ", "\tCreational", "Java\n");
        input.description = "  builds things  ".to_string();
        input.code = "\nclass X{}\n".to_string();

        let ok = input.validate().unwrap();
        assert_eq!(ok.name, "Factory");
        assert_eq!(ok.pattern, "Creational");
        assert_eq!(ok.language, "Java");
        assert_eq!(ok.description, "builds things");
        assert_eq!(ok.code, "class X{}");
    }

    #[test]
    fn validate_lists_all_blank_required_fields() {
        let err = draft("   ", "Observer", "").validate().unwrap_err();
        assert_eq!(err.missing, vec![Field::Name, Field::Language]);
    }

    #[test]
    fn optional_fields_may_be_empty() {
        assert!(draft("Factory", "Creational", "Java").validate().is_ok());
    }

    #[test]
    fn text_match_folds_non_ascii_case() {
        let component = Component {
            id: 1,
            name: "ÉCOLE Registry".into(),
            pattern: "Creational".into(),
            category: String::new(),
            language: "Rust".into(),
            description: "Straße lookups".into(),
            code: String::new(),
            author: String::new(),
            added_on: "2024-01-01".into(),
        };
        let filter = |text: &str| ComponentFilter {
            text: Some(text.into()),
            ..ComponentFilter::default()
        };

        assert!(filter("école").matches_text(&component));
        assert!(filter("STRAßE").matches_text(&component));
        assert!(!filter("ecole").matches_text(&component));
    }

    #[test]
    fn description_preview_truncates_long_text() {
        let component = Component {
            id: 1,
            name: "Cache".into(),
            pattern: "Structural".into(),
            category: String::new(),
            language: "Rust".into(),
            description: "é".repeat(60),
            code: String::new(),
            author: String::new(),
            added_on: "2024-01-01".into(),
        };
        let preview = component.description_preview();
        assert_eq!(preview.chars().count(), DESCRIPTION_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));

        let short = Component {
            description: "short".into(),
            ..component
        };
        assert_eq!(short.description_preview(), "short");
        assert_eq!(short.provenance(), "2024-01-01");
    }
}
