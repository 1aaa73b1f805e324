//! Minimal web integration over `may_minihttp`.
//!
//! An [`App`] maps `METHOD /path/{param}` routes to handlers. For every
//! request it opens a [`Session`], parses the query string into
//! [`RequestArgs`] and hands both to the handler through a [`RequestContext`].
//! Handler errors are turned into JSON replies with [`HatchError::status`],
//! so a failed `get_or_404` or `paginate` becomes a 404 on its own.

use crate::database::{Database, Session};
use crate::error::HatchError;
use crate::request::RequestArgs;
use may_minihttp::{HttpServer, HttpService, Request, Response};
use std::collections::HashMap;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

const JSON: &str = "Content-Type: application/json";
const TEXT: &str = "Content-Type: text/plain; charset=utf-8";

/// Response produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: JSON,
            body: value.to_string().into_bytes(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: TEXT,
            body: body.into().into_bytes(),
        }
    }

    /// JSON error body with the status the error maps to
    pub fn error(err: &HatchError) -> Self {
        let (status, reason) = err.status();
        Self::failure(status, reason, err.to_string())
    }

    fn failure(status: u16, reason: &'static str, description: String) -> Self {
        let body = serde_json::json!({
            "error": reason,
            "description": description,
        });
        Self {
            status,
            reason,
            ..Self::json(&body)
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    fn write_to(self, res: &mut Response) {
        res.status_code(usize::from(self.status), self.reason);
        res.header(self.content_type);
        res.body_vec(self.body);
    }
}

/// Everything a handler gets to see about the current request
pub struct RequestContext<'a> {
    pub session: &'a Session,
    pub args: &'a RequestArgs,
    params: HashMap<String, String>,
}

impl RequestContext<'_> {
    /// Raw path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Path parameter parsed into `T`; a missing or malformed value is a 404
    pub fn param_as<T: FromStr>(&self, name: &str) -> Result<T, HatchError> {
        self.param(name)
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(HatchError::not_found)
    }
}

type Handler = Arc<dyn Fn(&RequestContext<'_>) -> Result<Reply, HatchError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route {
    method: String,
    segments: Vec<Segment>,
    handler: Handler,
}

impl Route {
    fn parse(method: &str, pattern: &str, handler: Handler) -> Self {
        let segments = split_path(pattern)
            .map(|part| match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(part.to_string()),
            })
            .collect();
        Self {
            method: method.to_ascii_uppercase(),
            segments,
            handler,
        }
    }

    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Router plus the database every request runs against
pub struct App {
    db: Database,
    routes: Vec<Route>,
}

impl App {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            routes: Vec::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Register a handler for `method` and a pattern such as `/posts/{id}`
    pub fn route<F>(mut self, method: &str, pattern: &str, handler: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> Result<Reply, HatchError> + Send + Sync + 'static,
    {
        self.routes.push(Route::parse(method, pattern, Arc::new(handler)));
        self
    }

    pub fn get<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> Result<Reply, HatchError> + Send + Sync + 'static,
    {
        self.route("GET", pattern, handler)
    }

    /// Handle one request given its method and target (`/path?query`)
    pub fn dispatch(&self, method: &str, target: &str) -> Reply {
        let path = target.split_once('?').map_or(target, |(path, _)| path);

        let mut path_matched = false;
        for route in &self.routes {
            let Some(params) = route.matches(path) else {
                continue;
            };
            path_matched = true;
            if !route.method.eq_ignore_ascii_case(method) {
                continue;
            }
            return self.run(route, params, target);
        }

        if path_matched {
            return Reply::failure(405, "Method Not Allowed", format!("{method} {path}"));
        }
        log::debug!("no route for {method} {path}");
        Reply::error(&HatchError::not_found())
    }

    fn run(&self, route: &Route, params: HashMap<String, String>, target: &str) -> Reply {
        let result = self.db.session().and_then(|session| {
            let args = RequestArgs::from_target(target);
            let ctx = RequestContext {
                session: &session,
                args: &args,
                params,
            };
            (route.handler)(&ctx)
        });
        match result {
            Ok(reply) => reply,
            Err(err) if err.is_not_found() => {
                log::debug!("{} {target}: {err}", route.method);
                Reply::error(&err)
            }
            Err(err) => {
                log::error!("{} {target} failed: {err}", route.method);
                Reply::error(&err)
            }
        }
    }

    /// Start serving on `addr`; each connection runs in its own coroutine
    pub fn serve(self, addr: &str) -> io::Result<may::coroutine::JoinHandle<()>> {
        let handle = HttpServer(AppService {
            app: Arc::new(self),
        })
        .start(addr)?;
        log::info!("listening on http://{addr}");
        Ok(handle)
    }
}

#[derive(Clone)]
struct AppService {
    app: Arc<App>,
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        self.app.dispatch(req.method(), req.path()).write_to(res);
        Ok(())
    }
}
