//! Application registry, route groups, and request dispatch.
//!
//! [`App`] is the composition root: it owns the route table and the flat
//! list of route groups. A [`RouteGroup`] handle is just a mutable borrow
//! of the `App` plus an index into that list, so groups never own their
//! registry and nothing is reference-counted at configuration time.
//!
//! Registration happens single-threaded before serving starts; `serve`
//! takes the `App` by value and moves it into an `Arc`, which makes
//! mutating routes while serving unrepresentable rather than merely
//! forbidden in documentation.
//!
//! Dispatch, per request:
//! 1. collect middleware from every group whose prefix covers the path,
//!    in group-creation order (the root group, prefix `""`, always
//!    applies), then registration order within a group;
//! 2. resolve the route; on a miss the terminal link becomes the built-in
//!    404 responder instead of a handler;
//! 3. bind the extracted path parameters into the context;
//! 4. advance the chain once and let it run to completion.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use http::{Method, StatusCode};

use crate::context::{Chain, Context};
use crate::handler::{erase, BoxFuture, ErasedHandler, Handler, HandlerFn};
use crate::middleware::{logger, recovery};
use crate::request::Request;
use crate::response::Response;
use crate::router::RouteTable;

struct GroupEntry {
    prefix: String,
    middleware: Vec<HandlerFn>,
}

/// The application: route table, groups, and the dispatcher over both.
pub struct App {
    table: RouteTable,
    groups: Vec<GroupEntry>,
}

impl App {
    /// An empty application with only the root group (prefix `""`).
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            groups: vec![GroupEntry { prefix: String::new(), middleware: Vec::new() }],
        }
    }

    /// [`App::new`] plus the conventional outermost stack: the request
    /// logger wrapping panic recovery.
    pub fn with_defaults() -> Self {
        let mut app = Self::new();
        app.with(logger()).with(recovery());
        app
    }

    fn root(&mut self) -> RouteGroup<'_> {
        RouteGroup { app: self, index: 0 }
    }

    /// Creates a top-level group. Its middleware applies to every request
    /// whose path the prefix covers, segment-wise.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        self.groups.push(GroupEntry { prefix: prefix.to_owned(), middleware: Vec::new() });
        let index = self.groups.len() - 1;
        RouteGroup { app: self, index }
    }

    /// Appends middleware to the root group.
    pub fn with<H>(&mut self, middleware: H) -> &mut Self
    where
        H: for<'h> Handler<'h>,
    {
        self.root().with(middleware);
        self
    }

    /// Registers a route on the root group.
    ///
    /// # Panics
    ///
    /// Panics if the pattern conflicts with a registered one or places a
    /// wildcard anywhere but last. Routing misconfiguration is fatal at
    /// startup; the process must not serve with an inconsistent table.
    pub fn on<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: for<'h> Handler<'h>,
    {
        self.root().on(method, pattern, handler);
        self
    }

    pub fn get<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::DELETE, pattern, handler)
    }

    pub fn head<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::HEAD, pattern, handler)
    }

    /// Serves files from `dir` under `prefix` on the root group.
    pub fn static_dir(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> &mut Self {
        self.root().static_dir(prefix, dir);
        self
    }

    /// Routes one request through the middleware chain and the matched
    /// handler, producing the response.
    ///
    /// This is the whole request path minus the socket, which makes it the
    /// natural seam for tests and for embedding trellis behind another
    /// transport.
    pub async fn dispatch(&self, request: Request) -> Response {
        let mut links: Vec<HandlerFn> = Vec::new();
        for group in &self.groups {
            if covers(&group.prefix, request.path()) {
                links.extend(group.middleware.iter().cloned());
            }
        }

        let params = match self.table.resolve(request.method(), request.path()) {
            Some((handler, params)) => {
                links.push(handler);
                params
            }
            None => {
                links.push(Arc::new(NotFound));
                HashMap::new()
            }
        };

        let mut ctx = Context::new(request, params, Chain::new(links));
        ctx.next().await;
        ctx.into_response()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// A prefix-scoped registration handle.
///
/// Holds a mutable borrow of the [`App`]; the group's own data lives in the
/// registry. Created via [`App::group`] or nested with [`RouteGroup::group`],
/// where the child's effective prefix is the concatenation of the parent's
/// and the given one. Parent middleware is *not* copied into children; it is
/// rediscovered per request by prefix coverage, so creation order decides
/// chain order.
pub struct RouteGroup<'app> {
    app: &'app mut App,
    index: usize,
}

impl RouteGroup<'_> {
    fn prefix(&self) -> &str {
        &self.app.groups[self.index].prefix
    }

    /// A nested group under this group's prefix.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        let full = format!("{}{}", self.prefix(), prefix);
        self.app.groups.push(GroupEntry { prefix: full, middleware: Vec::new() });
        let index = self.app.groups.len() - 1;
        RouteGroup { app: &mut *self.app, index }
    }

    /// Appends middleware to this group, in execution order. Middleware may
    /// be added any time before serving begins.
    pub fn with<H>(&mut self, middleware: H) -> &mut Self
    where
        H: for<'h> Handler<'h>,
    {
        self.app.groups[self.index].middleware.push(erase(middleware));
        self
    }

    /// Registers `handler` for `method` at this group's prefix plus
    /// `pattern`.
    ///
    /// # Panics
    ///
    /// Panics on a conflicting pattern or a misplaced wildcard; see
    /// [`App::on`].
    pub fn on<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: for<'h> Handler<'h>,
    {
        let full = format!("{}{}", self.prefix(), pattern);
        self.app
            .table
            .add_route(method, &full, erase(handler))
            .unwrap_or_else(|e| panic!("invalid route `{full}`: {e}"));
        self
    }

    pub fn get<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::DELETE, pattern, handler)
    }

    pub fn head<H: for<'h> Handler<'h>>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.on(Method::HEAD, pattern, handler)
    }

    /// Serves files from `dir` at `GET <group prefix><prefix>/*filepath`.
    ///
    /// The handler answers 404 for missing files and for paths that try to
    /// climb out of `dir`; reading the bytes is `tokio::fs`'s job.
    pub fn static_dir(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> &mut Self {
        let pattern = format!("{prefix}/*filepath");
        self.get(&pattern, ServeDir { root: dir.into() })
    }
}

/// Segment-aware prefix coverage: `/user` covers `/user` and `/user/42`
/// but never `/userX`. The empty root prefix covers everything.
fn covers(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return true;
    }
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Terminal link substituted when resolution misses.
struct NotFound;

impl ErasedHandler for NotFound {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            let message = format!("no route for {} {}", ctx.method(), ctx.path());
            ctx.string(StatusCode::NOT_FOUND, message);
        })
    }
}

/// Terminal handler behind [`RouteGroup::static_dir`].
struct ServeDir {
    root: PathBuf,
}

impl<'a> Handler<'a> for ServeDir {
    type Future = BoxFuture<'a>;

    fn invoke(&self, ctx: &'a mut Context) -> BoxFuture<'a> {
        let root = self.root.clone();
        Box::pin(async move {
            let Some(rel) = ctx.param("filepath").map(str::to_owned) else {
                ctx.string(StatusCode::NOT_FOUND, "file not found");
                return;
            };
            if rel.split('/').any(|segment| segment == "..") {
                ctx.string(StatusCode::NOT_FOUND, format!("no such file: {rel}"));
                return;
            }
            match tokio::fs::read(root.join(&rel)).await {
                Ok(bytes) => {
                    let content_type = content_type_for(&rel);
                    ctx.data(StatusCode::OK, content_type, bytes);
                }
                Err(_) => ctx.string(StatusCode::NOT_FOUND, format!("no such file: {rel}")),
            }
        })
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => "text/css",
        Some("html") => "text/html; charset=utf-8",
        Some("ico") => "image/x-icon",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
