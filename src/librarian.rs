//! Validation and query shaping between the UI and the store. Nothing here
//! retries or swallows storage failures; they travel to the caller untouched.

use tracing::{debug, info, warn};

use crate::db::Store;
use crate::error::{LibrarianError, StorageError};
use crate::models::{Component, ComponentDraft, ComponentFilter};

/// Pattern labels offered before the user has stored any of their own.
pub const DEFAULT_PATTERNS: &[&str] = &["Structural", "Behavioral", "Creational"];
/// Languages offered before the user has stored any of their own.
pub const DEFAULT_LANGUAGES: &[&str] = &["C", "C++", "Python", "Java", "JavaScript"];
/// Pattern categories offered before the user has stored any of their own.
pub const DEFAULT_CATEGORIES: &[&str] = &["Container", "Algorithm", "Utility", "Security", "Other"];

pub struct Librarian {
    store: Store,
}

impl Librarian {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Validate and persist a new component, returning its id. Rejected
    /// drafts never reach the store.
    pub fn add_component(&self, draft: ComponentDraft) -> Result<i64, LibrarianError> {
        let draft = draft.validate().inspect_err(|err| {
            warn!(missing = %err, "rejected component draft");
        })?;

        let id = self.store.insert(&draft)?;
        info!(id, name = %draft.name, pattern = %draft.pattern, "added component");
        Ok(id)
    }

    /// Find components whose name or description contains `query_text`,
    /// optionally narrowed to one pattern and/or language. Blank inputs put
    /// no constraint on their axis; non-blank query text is matched as typed,
    /// surrounding whitespace included.
    pub fn search(
        &self,
        query_text: &str,
        pattern_filter: Option<&str>,
        language_filter: Option<&str>,
    ) -> Result<Vec<Component>, StorageError> {
        let filter = ComponentFilter {
            pattern: normalize(pattern_filter),
            language: normalize(language_filter),
            text: (!query_text.trim().is_empty()).then(|| query_text.to_string()),
        };
        let found = self.store.filter(&filter)?;
        debug!(?filter, matches = found.len(), "search finished");
        Ok(found)
    }

    pub fn get_all(&self) -> Result<Vec<Component>, StorageError> {
        self.store.list_all()
    }

    /// Delete a component permanently. `false` when the id did not exist.
    pub fn delete_component(&self, id: i64) -> Result<bool, StorageError> {
        let removed = self.store.delete(id)?;
        if removed {
            info!(id, "deleted component");
        } else {
            debug!(id, "delete requested for unknown component");
        }
        Ok(removed)
    }

    /// Built-in pattern labels plus any the user has stored.
    pub fn known_patterns(&self) -> Result<Vec<String>, StorageError> {
        Ok(merge_known(DEFAULT_PATTERNS, self.store.patterns()?))
    }

    /// Built-in languages plus any the user has stored.
    pub fn known_languages(&self) -> Result<Vec<String>, StorageError> {
        Ok(merge_known(DEFAULT_LANGUAGES, self.store.languages()?))
    }

    /// Built-in categories plus any the user has stored.
    pub fn known_categories(&self) -> Result<Vec<String>, StorageError> {
        Ok(merge_known(DEFAULT_CATEGORIES, self.store.categories()?))
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Defaults first, in their curated order, followed by stored values that
/// differ from every default ignoring case.
fn merge_known(defaults: &[&str], stored: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = defaults.iter().map(|value| value.to_string()).collect();
    for value in stored {
        let lower = value.to_lowercase();
        if !merged.iter().any(|known| known.to_lowercase() == lower) {
            merged.push(value);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;
    use tempfile::TempDir;

    fn librarian() -> (TempDir, Librarian) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("components.sqlite")).unwrap();
        (dir, Librarian::new(store))
    }

    fn draft(name: &str, pattern: &str, language: &str) -> ComponentDraft {
        ComponentDraft {
            name: name.into(),
            pattern: pattern.into(),
            language: language.into(),
            ..ComponentDraft::default()
        }
    }

    #[test]
    fn add_component_persists_trimmed_values() {
        let (_dir, librarian) = librarian();
        let id = librarian
            .add_component(draft("  Adapter ", " Structural", "Rust "))
            .unwrap();

        let all = librarian.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].name, "Adapter");
        assert_eq!(all[0].pattern, "Structural");
        assert_eq!(all[0].language, "Rust");
    }

    #[test]
    fn whitespace_only_fields_are_rejected_without_touching_storage() {
        let (_dir, librarian) = librarian();
        let err = librarian
            .add_component(draft("Adapter", "  \t", "\n"))
            .unwrap_err();

        match err {
            LibrarianError::Validation(err) => {
                assert_eq!(err.missing, vec![Field::Pattern, Field::Language])
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(librarian.get_all().unwrap().is_empty());
    }

    #[test]
    fn search_treats_blank_inputs_as_unset() {
        let (_dir, librarian) = librarian();
        librarian
            .add_component(draft("Adapter", "Structural", "Rust"))
            .unwrap();
        librarian
            .add_component(draft("Visitor", "Behavioral", "C++"))
            .unwrap();

        assert_eq!(librarian.search("", None, None).unwrap().len(), 2);
        assert_eq!(librarian.search("   ", Some(""), Some(" ")).unwrap().len(), 2);

        let rust = librarian.search("", None, Some(" Rust ")).unwrap();
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].name, "Adapter");

        let visitor = librarian.search("VISIT", Some("Behavioral"), None).unwrap();
        assert_eq!(visitor.len(), 1);
        assert!(librarian.search("visit", Some("Structural"), None).unwrap().is_empty());
    }

    #[test]
    fn search_keeps_whitespace_inside_non_blank_text() {
        let (_dir, librarian) = librarian();
        librarian
            .add_component(draft("Factory", "Creational", "Java"))
            .unwrap();
        librarian
            .add_component(ComponentDraft {
                description: "abstract factory method".into(),
                ..draft("Builder", "Creational", "Java")
            })
            .unwrap();

        assert_eq!(librarian.search("Fact", None, None).unwrap().len(), 2);
        let spaced = librarian.search(" fact", None, None).unwrap();
        assert_eq!(spaced.len(), 1);
        assert_eq!(spaced[0].name, "Builder");
        assert!(librarian.search(" Fact ", None, None).unwrap().is_empty());
    }

    #[test]
    fn delete_component_passes_the_store_result_through() {
        let (_dir, librarian) = librarian();
        let id = librarian
            .add_component(draft("Adapter", "Structural", "Rust"))
            .unwrap();

        assert!(!librarian.delete_component(id + 1).unwrap());
        assert!(librarian.delete_component(id).unwrap());
        assert!(librarian.get_all().unwrap().is_empty());
    }

    #[test]
    fn known_lists_merge_defaults_with_stored_values() {
        let (_dir, librarian) = librarian();
        librarian
            .add_component(draft("Adapter", "structural", "Rust"))
            .unwrap();
        librarian
            .add_component(draft("Pool", "Concurrency", "python"))
            .unwrap();

        assert_eq!(
            librarian.known_patterns().unwrap(),
            vec!["Structural", "Behavioral", "Creational", "Concurrency"]
        );
        assert_eq!(
            librarian.known_languages().unwrap(),
            vec!["C", "C++", "Python", "Java", "JavaScript", "Rust"]
        );
        assert_eq!(librarian.known_categories().unwrap().len(), DEFAULT_CATEGORIES.len());
    }
}
