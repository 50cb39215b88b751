use rusqlite::{params, Connection, Row, ToSql};
use tracing::debug;

use crate::error::{QueryContext, StorageError};
use crate::models::{Component, ComponentDraft, ComponentFilter};

use super::connection::Store;

const SELECT_COLUMNS: &str =
    "SELECT id, name, pattern, category, language, description, code, author, added_on
     FROM components";

impl Store {
    /// Append a new component and return the id SQLite assigned to it.
    pub fn insert(&self, draft: &ComponentDraft) -> Result<i64, StorageError> {
        self.with_connection(|conn| insert_component(conn, draft))
    }

    /// Every stored component in ascending id order.
    pub fn list_all(&self) -> Result<Vec<Component>, StorageError> {
        self.with_connection(fetch_components)
    }

    /// Components matching every criterion that is set. With an empty
    /// filter this is `list_all`.
    pub fn filter(&self, filter: &ComponentFilter) -> Result<Vec<Component>, StorageError> {
        self.with_connection(|conn| fetch_matching_components(conn, filter))
    }

    /// Remove a component. `false` means there was nothing with that id.
    pub fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.with_connection(|conn| delete_component(conn, id))
    }

    /// Distinct pattern labels currently in use.
    pub fn patterns(&self) -> Result<Vec<String>, StorageError> {
        self.with_connection(|conn| fetch_distinct(conn, DistinctColumn::Pattern))
    }

    /// Distinct languages currently in use.
    pub fn languages(&self) -> Result<Vec<String>, StorageError> {
        self.with_connection(|conn| fetch_distinct(conn, DistinctColumn::Language))
    }

    /// Distinct pattern categories currently in use.
    pub fn categories(&self) -> Result<Vec<String>, StorageError> {
        self.with_connection(|conn| fetch_distinct(conn, DistinctColumn::Category))
    }
}

fn insert_component(conn: &Connection, draft: &ComponentDraft) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO components (name, pattern, category, language, description, code, author)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            draft.name,
            draft.pattern,
            draft.category,
            draft.language,
            draft.description,
            draft.code,
            draft.author,
        ],
    )
    .during("insert component")?;

    Ok(conn.last_insert_rowid())
}

fn fetch_components(conn: &Connection) -> Result<Vec<Component>, StorageError> {
    fetch_matching_components(conn, &ComponentFilter::default())
}

/// Pattern and language become SQL equality clauses; the text criterion is
/// applied afterwards in Rust so the comparison is Unicode-aware instead of
/// SQLite's ASCII-only `LIKE` folding.
fn fetch_matching_components(
    conn: &Connection,
    filter: &ComponentFilter,
) -> Result<Vec<Component>, StorageError> {
    let mut sql = format!("{SELECT_COLUMNS} WHERE 1 = 1");
    let mut args: Vec<&dyn ToSql> = Vec::new();

    if let Some(pattern) = &filter.pattern {
        sql.push_str(" AND pattern = ?");
        args.push(pattern);
    }
    if let Some(language) = &filter.language {
        sql.push_str(" AND language = ?");
        args.push(language);
    }
    sql.push_str(" ORDER BY id");

    debug!(?filter, "querying components");

    let mut stmt = conn.prepare(&sql).during("prepare component query")?;
    let components = stmt
        .query_map(args.as_slice(), component_from_row)
        .during("load components")?
        .collect::<Result<Vec<_>, _>>()
        .during("collect components")?;

    Ok(components
        .into_iter()
        .filter(|component| filter.matches_text(component))
        .collect())
}

fn delete_component(conn: &Connection, id: i64) -> Result<bool, StorageError> {
    let deleted = conn
        .execute("DELETE FROM components WHERE id = ?1", params![id])
        .during("delete component")?;
    Ok(deleted > 0)
}

#[derive(Clone, Copy)]
enum DistinctColumn {
    Pattern,
    Language,
    Category,
}

fn fetch_distinct(conn: &Connection, column: DistinctColumn) -> Result<Vec<String>, StorageError> {
    // Column names cannot be bound as parameters, so each query is spelled out.
    let sql = match column {
        DistinctColumn::Pattern => {
            "SELECT DISTINCT pattern FROM components WHERE pattern <> ''
             ORDER BY pattern COLLATE NOCASE"
        }
        DistinctColumn::Language => {
            "SELECT DISTINCT language FROM components WHERE language <> ''
             ORDER BY language COLLATE NOCASE"
        }
        DistinctColumn::Category => {
            "SELECT DISTINCT category FROM components WHERE category <> ''
             ORDER BY category COLLATE NOCASE"
        }
    };

    let mut stmt = conn.prepare(sql).during("prepare distinct value query")?;
    let values = stmt
        .query_map([], |row| row.get(0))
        .during("load distinct values")?
        .collect::<Result<Vec<String>, _>>()
        .during("collect distinct values")?;

    Ok(values)
}

fn component_from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        id: row.get(0)?,
        name: row.get(1)?,
        pattern: row.get(2)?,
        category: row.get(3)?,
        language: row.get(4)?,
        description: row.get(5)?,
        code: row.get(6)?,
        author: row.get(7)?,
        added_on: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("components.sqlite")).unwrap();
        (dir, store)
    }

    fn draft(name: &str, pattern: &str, language: &str, description: &str) -> ComponentDraft {
        ComponentDraft {
            name: name.into(),
            pattern: pattern.into(),
            language: language.into(),
            description: description.into(),
            code: "fn main() {}\n    println!();".into(),
            ..ComponentDraft::default()
        }
    }

    #[test]
    fn list_all_is_empty_on_a_fresh_store() {
        let (_dir, store) = store();
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn insert_round_trips_every_column() {
        let (_dir, store) = store();
        let mut input = draft("Factory", "Creational", "Java", "makes widgets");
        input.category = "Container".into();
        input.author = "Ada".into();

        let id = store.insert(&input).unwrap();
        let all = store.list_all().unwrap();

        assert_eq!(all.len(), 1);
        let stored = &all[0];
        assert_eq!(stored.id, id);
        assert_eq!(stored.name, "Factory");
        assert_eq!(stored.pattern, "Creational");
        assert_eq!(stored.category, "Container");
        assert_eq!(stored.language, "Java");
        assert_eq!(stored.description, "makes widgets");
        assert_eq!(stored.code, "fn main() {}\n    println!();");
        assert_eq!(stored.author, "Ada");
        assert_eq!(stored.added_on.len(), "YYYY-MM-DD".len());
    }

    #[test]
    fn list_all_orders_by_id() {
        let (_dir, store) = store();
        let first = store.insert(&draft("B", "Creational", "Rust", "")).unwrap();
        let second = store.insert(&draft("A", "Creational", "Rust", "")).unwrap();

        let ids: Vec<i64> = store.list_all().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (_dir, store) = store();
        let first = store.insert(&draft("A", "P", "L", "")).unwrap();
        assert!(store.delete(first).unwrap());
        let second = store.insert(&draft("B", "P", "L", "")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let (_dir, store) = store();
        let id = store.insert(&draft("A", "P", "L", "")).unwrap();

        assert!(!store.delete(id + 100).unwrap());
        assert_eq!(store.list_all().unwrap().len(), 1);

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn filter_combines_exact_and_text_criteria() {
        let (_dir, store) = store();
        store
            .insert(&draft("Singleton", "Creational", "Java", "one instance"))
            .unwrap();
        store
            .insert(&draft("Observer", "Behavioral", "Java", "event fan-out"))
            .unwrap();
        store
            .insert(&draft("Builder", "Creational", "Rust", "Step-wise SINGLE object"))
            .unwrap();

        let creational = store
            .filter(&ComponentFilter {
                pattern: Some("Creational".into()),
                ..ComponentFilter::default()
            })
            .unwrap();
        assert_eq!(creational.len(), 2);

        let java_creational = store
            .filter(&ComponentFilter {
                pattern: Some("Creational".into()),
                language: Some("Java".into()),
                text: None,
            })
            .unwrap();
        assert_eq!(java_creational.len(), 1);
        assert_eq!(java_creational[0].name, "Singleton");

        // Matches the name of one and the description of another.
        let single = store
            .filter(&ComponentFilter {
                text: Some("single".into()),
                ..ComponentFilter::default()
            })
            .unwrap();
        let names: Vec<&str> = single.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Singleton", "Builder"]);
    }

    #[test]
    fn text_filter_folds_case_beyond_ascii() {
        let (_dir, store) = store();
        store
            .insert(&draft("Élan Cache", "Structural", "Rust", "lru eviction"))
            .unwrap();
        store
            .insert(&draft("Registry", "Creational", "Rust", "Café menu lookup"))
            .unwrap();
        store
            .insert(&draft("Plain", "Creational", "Rust", "ascii only"))
            .unwrap();

        let text = |needle: &str| ComponentFilter {
            text: Some(needle.into()),
            ..ComponentFilter::default()
        };
        let names = |found: Vec<Component>| {
            found
                .into_iter()
                .map(|component| component.name)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            names(store.filter(&text("é")).unwrap()),
            vec!["Élan Cache", "Registry"]
        );
        assert_eq!(names(store.filter(&text("ÉLAN")).unwrap()), vec!["Élan Cache"]);
        assert_eq!(names(store.filter(&text("CAFÉ")).unwrap()), vec!["Registry"]);
    }

    #[test]
    fn pattern_filter_is_exact_not_substring() {
        let (_dir, store) = store();
        store.insert(&draft("A", "Creational", "Java", "")).unwrap();

        let partial = store
            .filter(&ComponentFilter {
                pattern: Some("Creation".into()),
                ..ComponentFilter::default()
            })
            .unwrap();
        assert!(partial.is_empty());
    }

    #[test]
    fn empty_filter_behaves_like_list_all() {
        let (_dir, store) = store();
        store.insert(&draft("A", "P", "L", "")).unwrap();
        store.insert(&draft("B", "Q", "M", "")).unwrap();

        assert_eq!(
            store.filter(&ComponentFilter::default()).unwrap(),
            store.list_all().unwrap()
        );
    }

    #[test]
    fn distinct_values_are_sorted_and_deduplicated() {
        let (_dir, store) = store();
        store.insert(&draft("A", "structural", "Rust", "")).unwrap();
        store.insert(&draft("B", "Behavioral", "Java", "")).unwrap();
        store.insert(&draft("C", "Behavioral", "Rust", "")).unwrap();

        assert_eq!(store.patterns().unwrap(), vec!["Behavioral", "structural"]);
        assert_eq!(store.languages().unwrap(), vec!["Java", "Rust"]);
        assert!(store.categories().unwrap().is_empty());
    }
}
