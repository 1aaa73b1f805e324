//! Demo `posts` model and the routes serving it.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use hatchling::{
    metrics, App, Column, ColumnKind, Database, EntitySchema, Filter, FromRow, HatchError,
    MemoryStore, Model, Paginate, Reply, Row, SchemaRegistry,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    pub created_at: NaiveDateTime,
}

impl FromRow for Post {
    fn from_row(row: &Row) -> Result<Self, HatchError> {
        Ok(Post {
            id: row.get("id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
        })
    }
}

impl Model for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn schema() -> EntitySchema {
        EntitySchema::new("posts")
            .column(Column::primary_key("id"))
            .column(Column::new("title", ColumnKind::String(200)))
            .column(Column::new("body", ColumnKind::Text).nullable())
            .column(Column::new("created_at", ColumnKind::DateTime))
    }
}

/// Schemas of every model the CLI knows about
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new().register::<Post>()
}

/// Insert `count` posts with ids starting at 1
pub fn seed(store: &MemoryStore, count: u64) {
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    for n in 1..=count {
        let id = i64::try_from(n).unwrap_or(i64::MAX);
        let body = (id % 3 != 0).then(|| format!("Body of post {id}"));
        store.insert(
            Post::table_name(),
            Row::new()
                .with("id", id)
                .with("title", format!("Post-{id}"))
                .with("body", body)
                .with("created_at", epoch + Duration::hours(id)),
        );
    }
    log::info!("seeded {count} post(s)");
}

/// Routes of the demo application
pub fn app(db: Database) -> App {
    App::new(db)
        .get("/posts", |ctx| {
            let page = Post::find()
                .order_by("-id")
                .paginate(ctx.session, Some(ctx.args), Paginate::new().max_per_page(100))?;
            Ok(Reply::json(&page.to_json()))
        })
        .get("/posts/{id}", |ctx| {
            let id: i64 = ctx.param_as("id")?;
            let post = Post::get_or_404([Filter::eq("id", id)], Some("post not found"))
                .one(ctx.session)?;
            let json = serde_json::to_value(post)
                .map_err(|e| HatchError::ParseError(e.to_string()))?;
            Ok(Reply::json(&json))
        })
        .get("/metrics", |_| Ok(Reply::text(metrics::render())))
}
