//! Integration tests for models, existence lookups and pagination
//!
//! A small `Todo` model is driven end to end through `Database`, `Session`
//! and the `MemoryStore` executor.

use hatchling::{
    Column, ColumnKind, Database, DatabaseConfig, EntitySchema, Filter, FromRow, HatchError,
    MemoryStore, Model, Paginate, RequestArgs, Row, SchemaRegistry,
};
use std::sync::Arc;

// ============================================================================
// Test Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: i64,
    title: String,
    done: bool,
}

impl FromRow for Todo {
    fn from_row(row: &Row) -> Result<Self, HatchError> {
        Ok(Todo {
            id: row.get("id")?,
            title: row.get("title")?,
            done: row.get("done")?,
        })
    }
}

impl Model for Todo {
    fn table_name() -> &'static str {
        "todos"
    }

    fn schema() -> EntitySchema {
        EntitySchema::new("todos")
            .column(Column::primary_key("id"))
            .column(Column::new("title", ColumnKind::String(80)))
            .column(Column::new("done", ColumnKind::Boolean))
    }
}

fn setup(count: i64) -> (Database, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = DatabaseConfig {
        generate_schemas: true,
        ..DatabaseConfig::default()
    };
    let db = Database::init(
        &config,
        SchemaRegistry::new().register::<Todo>(),
        store.clone(),
    )
    .unwrap();
    for id in 1..=count {
        store.insert(
            "todos",
            Row::new()
                .with("id", id)
                .with("title", format!("todo {id}"))
                .with("done", id % 4 == 0),
        );
    }
    (db, store)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_walk_all_pages() {
    let (db, _) = setup(95);
    let session = db.session().unwrap();

    let mut page = Todo::find()
        .order_by("id")
        .paginate(&session, None, Paginate::new().per_page(20))
        .unwrap();
    let mut seen = page.items.len();
    assert_eq!(page.pages(), 5);

    while page.has_next() {
        page = page.next(&session, true).unwrap();
        seen += page.items.len();
    }
    assert_eq!(page.page, 5);
    assert_eq!(page.items.len(), 15);
    assert_eq!(page.items.last().map(|t| t.id), Some(95));
    assert_eq!(seen, 95);

    let back = page.prev(&session, true).unwrap();
    assert_eq!(back.items.first().map(|t| t.id), Some(61));
}

#[test]
fn test_filtered_pagination_counts_matches_only() {
    let (db, _) = setup(100);
    let session = db.session().unwrap();
    let args = RequestArgs::parse("page=2&per_page=10");

    let page = Todo::filter(Filter::eq("done", true))
        .order_by("-id")
        .paginate(&session, Some(&args), Paginate::new())
        .unwrap();

    assert_eq!(page.total, Some(25));
    assert_eq!(page.pages(), 3);
    assert!(page.items.iter().all(|t| t.done));
    assert_eq!(page.items[0].id, 60);
}

#[test]
fn test_request_beyond_last_page() {
    let (db, _) = setup(10);
    let session = db.session().unwrap();
    let args = RequestArgs::parse("page=3");

    let err = Todo::paginate(&session, Some(&args), Paginate::new()).unwrap_err();
    assert!(err.is_not_found());

    let lenient = Todo::paginate(&session, Some(&args), Paginate::new().error_out(false)).unwrap();
    assert!(lenient.items.is_empty());
    assert_eq!(lenient.total, Some(10));
}

#[test]
fn test_get_or_404_through_model() {
    let (db, _) = setup(8);
    let session = db.session().unwrap();

    let todo = Todo::get_or_404([Filter::eq("id", 4)], None).one(&session).unwrap();
    assert_eq!(todo, Todo { id: 4, title: "todo 4".into(), done: true });

    let err = Todo::get_or_404([Filter::eq("id", 40)], Some("no such todo"))
        .fetch(&session)
        .unwrap_err();
    assert_eq!(err.status(), (404, "Not Found"));
    assert_eq!(err.to_string(), "Not found: no such todo");

    let err = Todo::first_or_404([Filter::eq("done", true)], None)
        .fetch(&session)
        .unwrap_err();
    assert!(matches!(err, HatchError::MultipleResults));

    let first = Todo::filter(Filter::eq("done", true)).order_by("id").first();
    assert_eq!(first.one(&session).unwrap().id, 4);
}

#[test]
fn test_derived_queries_do_not_interfere() {
    let (db, _) = setup(30);
    let session = db.session().unwrap();

    let base = Todo::find().filter(Filter::lte("id", 20));
    let done = base.filter(Filter::eq("done", true));
    let open = base.filter(Filter::eq("done", false));

    assert_eq!(base.count(&session).unwrap(), 20);
    assert_eq!(done.count(&session).unwrap(), 5);
    assert_eq!(open.count(&session).unwrap(), 15);
    assert!(done.exists(&session).unwrap());
}

#[test]
fn test_sessions_released_after_use() {
    let (db, _) = setup(3);
    {
        let session = db.session().unwrap();
        let _ = Todo::find().all(&session).unwrap();
        assert_eq!(db.active_sessions(), 1);
    }
    assert_eq!(db.active_sessions(), 0);
    db.remove_schemas().unwrap();
    let session = db.session().unwrap();
    assert!(matches!(Todo::find().all(&session), Err(HatchError::QueryError(_))));
}
