//! Per-request context and the middleware chain it drives.
//!
//! A [`Context`] is created fresh for every request and owned exclusively
//! by that request's task. It carries the parsed request, the path
//! parameters bound by the router, the response accumulator, and the chain
//! of handlers assembled for this request.
//!
//! # The `next` primitive
//!
//! The chain is explicitly advanced: [`Context::next`] runs exactly one
//! link, the one under the cursor. A middleware that wants the rest of the
//! chain to run calls `ctx.next().await` and regains control afterwards,
//! which is what lets timing/logging middleware wrap downstream work:
//!
//! ```text
//! logger enter -> recovery enter -> handler -> recovery exit -> logger exit
//! ```
//!
//! A middleware that returns *without* advancing stops the chain right
//! there; that is the ordinary short-circuit (auth rejection and friends),
//! no panic or error involved. Advancing past the end is a no-op.
//!
//! Call `next` at most once per handler invocation. The cursor is plain
//! state, so a second call resumes wherever the cursor stopped and will
//! run links an earlier handler skipped. That is a documented contract,
//! not something the types prevent.

use std::collections::HashMap;

use bytes::Bytes;
use http::{Method, StatusCode};

use crate::handler::{ErasedHandler as _, HandlerFn};
use crate::request::Request;
use crate::response::Response;

/// The ordered links assembled for one request, plus the cursor.
///
/// The cursor starts before the first link; [`Chain::advance`] hands out
/// the link under it and steps past. Exhaustion yields `None` forever.
pub(crate) struct Chain {
    links: Vec<HandlerFn>,
    cursor: usize,
}

impl Chain {
    pub(crate) fn new(links: Vec<HandlerFn>) -> Self {
        Self { links, cursor: 0 }
    }

    fn advance(&mut self) -> Option<HandlerFn> {
        let link = self.links.get(self.cursor).cloned();
        if link.is_some() {
            self.cursor += 1;
        }
        link
    }
}

/// The mutable per-request state threaded through the chain.
pub struct Context {
    request: Request,
    params: HashMap<String, String>,
    response: Response,
    chain: Chain,
}

impl Context {
    pub(crate) fn new(request: Request, params: HashMap<String, String>, chain: Chain) -> Self {
        Self { request, params, response: Response::empty(), chain }
    }

    /// Runs the next unexecuted link of the chain, if one remains.
    ///
    /// See the module docs for the full contract: one link per call,
    /// returning without calling this short-circuits, and calling it past
    /// the end of the chain does nothing.
    pub async fn next(&mut self) {
        if let Some(link) = self.chain.advance() {
            link.call(self).await;
        }
    }

    // ── Request side ─────────────────────────────────────────────────────

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Case-insensitive request-header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    /// A path parameter bound by the matched pattern.
    ///
    /// For the route `/users/:id`, `ctx.param("id")` on `/users/42`
    /// returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// First value for `key` in the query string, percent-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let raw = self.request.query_string()?;
        url::form_urlencoded::parse(raw.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.into_owned())
    }

    /// First value for `key` in an `application/x-www-form-urlencoded`
    /// body. `None` when the body has a different content type.
    pub fn form(&self, key: &str) -> Option<String> {
        let content_type = self.header("content-type")?;
        if !content_type.starts_with("application/x-www-form-urlencoded") {
            return None;
        }
        url::form_urlencoded::parse(self.request.body())
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.into_owned())
    }

    /// The underlying request, for anything the shortcuts above miss.
    pub fn request(&self) -> &Request {
        &self.request
    }

    // ── Response side ────────────────────────────────────────────────────

    pub fn status(&mut self, status: StatusCode) {
        self.response.status = status;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.headers.push((name.to_owned(), value.to_owned()));
    }

    /// `text/plain` response with the given status.
    pub fn string(&mut self, status: StatusCode, body: impl Into<String>) {
        self.status(status);
        self.response.set_body("text/plain; charset=utf-8", Bytes::from(body.into()));
    }

    /// `application/json` response. Takes caller-encoded bytes; trellis
    /// does not serialize for you.
    pub fn json(&mut self, status: StatusCode, body: impl Into<Bytes>) {
        self.status(status);
        self.response.set_body("application/json", body.into());
    }

    /// `text/html` response from caller-rendered bytes.
    pub fn html(&mut self, status: StatusCode, body: impl Into<Bytes>) {
        self.status(status);
        self.response.set_body("text/html; charset=utf-8", body.into());
    }

    /// Raw bytes with an explicit content type.
    pub fn data(&mut self, status: StatusCode, content_type: &str, body: impl Into<Bytes>) {
        self.status(status);
        self.response.set_body(content_type, body.into());
    }

    /// The response as accumulated so far.
    pub fn response(&self) -> &Response {
        &self.response
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}

// Test-only constructor used by the chain and middleware tests; keeps the
// production path (App::dispatch) the single place chains are assembled.
#[cfg(test)]
impl Context {
    pub(crate) fn for_links(links: Vec<HandlerFn>) -> Self {
        let request = Request::new(Method::GET, "/test", Vec::new(), Bytes::new());
        Self::new(request, HashMap::new(), Chain::new(links))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handler::{BoxFuture, ErasedHandler};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records enter/exit around an optional advance.
    struct Tap {
        name: &'static str,
        advances: bool,
        log: Log,
    }

    impl Tap {
        fn link(name: &'static str, advances: bool, log: &Log) -> HandlerFn {
            Arc::new(Self { name, advances, log: Arc::clone(log) })
        }
    }

    impl ErasedHandler for Tap {
        fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:enter", self.name));
                if self.advances {
                    ctx.next().await;
                }
                self.log.lock().unwrap().push(format!("{}:exit", self.name));
            })
        }
    }

    fn events(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn links_wrap_downstream_execution() {
        let log = Log::default();
        let mut ctx = Context::for_links(vec![
            Tap::link("a", true, &log),
            Tap::link("b", true, &log),
            Tap::link("handler", false, &log),
        ]);
        ctx.next().await;

        assert_eq!(
            events(&log),
            ["a:enter", "b:enter", "handler:enter", "handler:exit", "b:exit", "a:exit"],
        );
    }

    #[tokio::test]
    async fn not_advancing_short_circuits_later_links() {
        let log = Log::default();
        let mut ctx = Context::for_links(vec![
            Tap::link("a", true, &log),
            Tap::link("gate", false, &log),
            Tap::link("handler", false, &log),
        ]);
        ctx.next().await;

        // The handler never runs, but "a" still regains control after the
        // gate returns.
        assert_eq!(events(&log), ["a:enter", "gate:enter", "gate:exit", "a:exit"]);
    }

    #[tokio::test]
    async fn advancing_past_the_end_is_a_noop() {
        let log = Log::default();
        let mut ctx = Context::for_links(vec![Tap::link("only", true, &log)]);
        ctx.next().await;
        assert_eq!(events(&log), ["only:enter", "only:exit"]);

        ctx.next().await;
        assert_eq!(events(&log), ["only:enter", "only:exit"]);
    }

    #[tokio::test]
    async fn empty_chain_is_a_noop() {
        let mut ctx = Context::for_links(Vec::new());
        ctx.next().await;
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert!(ctx.response().body().is_empty());
    }

    /// Advances twice; the second call picks up links a downstream gate
    /// skipped. Documented hazard of the plain-cursor design.
    struct DoubleAdvance {
        log: Log,
    }

    impl ErasedHandler for DoubleAdvance {
        fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
            Box::pin(async move {
                self.log.lock().unwrap().push("double:enter".to_owned());
                ctx.next().await;
                ctx.next().await;
                self.log.lock().unwrap().push("double:exit".to_owned());
            })
        }
    }

    #[tokio::test]
    async fn repeated_advance_resumes_skipped_links() {
        let log = Log::default();
        let mut ctx = Context::for_links(vec![
            Arc::new(DoubleAdvance { log: Arc::clone(&log) }),
            Tap::link("gate", false, &log),
            Tap::link("handler", false, &log),
        ]);
        ctx.next().await;

        assert_eq!(
            events(&log),
            [
                "double:enter",
                "gate:enter",
                "gate:exit",
                "handler:enter",
                "handler:exit",
                "double:exit",
            ],
        );
    }

    #[test]
    fn query_and_form_decode() {
        let request = Request::new(
            Method::POST,
            "/search?q=hello%20world&page=2",
            vec![("content-type".to_owned(), "application/x-www-form-urlencoded".to_owned())],
            &b"name=alice&tag=a%2Bb"[..],
        );
        let ctx = Context::new(request, HashMap::new(), Chain::new(Vec::new()));

        assert_eq!(ctx.query("q").as_deref(), Some("hello world"));
        assert_eq!(ctx.query("page").as_deref(), Some("2"));
        assert_eq!(ctx.query("missing"), None);
        assert_eq!(ctx.form("name").as_deref(), Some("alice"));
        assert_eq!(ctx.form("tag").as_deref(), Some("a+b"));
    }

    #[test]
    fn form_requires_urlencoded_content_type() {
        let request = Request::new(
            Method::POST,
            "/submit",
            vec![("content-type".to_owned(), "application/json".to_owned())],
            &b"name=alice"[..],
        );
        let ctx = Context::new(request, HashMap::new(), Chain::new(Vec::new()));
        assert_eq!(ctx.form("name"), None);
    }
}
