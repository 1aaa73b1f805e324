//! End-to-end test of the web layer over a real `may_minihttp` listener

use hatchling::{
    App, Database, DatabaseConfig, Filter, MemoryStore, Paginate, QuerySet, Reply, Row,
    SchemaRegistry,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ADDR: &str = "127.0.0.1:38471";

fn start_server() {
    let store = MemoryStore::new();
    for id in 1..=42 {
        store.insert("posts", Row::new().with("id", id).with("title", format!("Post-{id}")));
    }
    let db = Database::init(
        &DatabaseConfig::default(),
        SchemaRegistry::new(),
        Arc::new(store),
    )
    .unwrap();

    let app = App::new(db)
        .get("/posts", |ctx| {
            let page = QuerySet::<Row>::for_table("posts").order_by("id").paginate(
                ctx.session,
                Some(ctx.args),
                Paginate::new(),
            )?;
            Ok(Reply::json(&page.to_json()))
        })
        .get("/posts/{id}", |ctx| {
            let id: i64 = ctx.param_as("id")?;
            let row = QuerySet::<Row>::for_table("posts")
                .get_or_404([Filter::eq("id", id)], Some("post not found"))
                .one(ctx.session)?;
            Ok(Reply::json(&serde_json::to_value(row).unwrap()))
        });

    // The listener lives until the test process exits
    let _handle = app.serve(ADDR).unwrap();
    for _ in 0..50 {
        if std::net::TcpStream::connect(ADDR).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
    panic!("server did not come up on {ADDR}");
}

fn get(path: &str) -> (u16, serde_json::Value) {
    let url = format!("http://{ADDR}{path}");
    match ureq::get(&url).call() {
        Ok(resp) => (resp.status(), serde_json::from_str(&resp.into_string().unwrap()).unwrap()),
        Err(ureq::Error::Status(code, resp)) => {
            (code, serde_json::from_str(&resp.into_string().unwrap()).unwrap())
        }
        Err(e) => panic!("request to {url} failed: {e}"),
    }
}

#[test]
fn test_http_pagination_and_lookup() {
    start_server();

    let (status, body) = get("/posts?page=3&per_page=20");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 42);
    assert_eq!(body["pages"], 3);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["has_next"], false);
    assert_eq!(body["prev_num"], 2);

    let (status, _) = get("/posts?page=0");
    assert_eq!(status, 404);

    let (status, _) = get("/posts?per_page=-1");
    assert_eq!(status, 404);

    let (status, body) = get("/posts/17");
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Post-17");

    let (status, body) = get("/posts/99");
    assert_eq!(status, 404);
    assert_eq!(body["description"], "Not found: post not found");

    let (status, _) = get("/missing");
    assert_eq!(status, 404);
}
