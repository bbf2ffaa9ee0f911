//! Minimal trellis example: params, groups, middleware, static files.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/hello/world
//!   curl http://localhost:3000/v1/search?q=trellis
//!   curl http://localhost:3000/v1/admin/stats            # 401
//!   curl -H 'authorization: secret' http://localhost:3000/v1/admin/stats
//!   curl http://localhost:3000/healthz

use trellis::{health, middleware, App, Context, Server, StatusCode};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Logger outermost, then recovery: a panicking handler becomes a 500
    // and still shows up in the request log.
    let mut app = App::new();
    app.with(middleware::logger()).with(middleware::recovery());

    app.get("/hello/:name", hello)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    // GET /assets/css/site.css serves ./public/css/site.css.
    app.static_dir("/assets", "./public");

    let mut v1 = app.group("/v1");
    v1.get("/search", search);

    // Nested group: /v1/admin/* additionally passes through require_token.
    let mut admin = v1.group("/admin");
    admin.with(require_token);
    admin.get("/stats", stats);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /hello/:name
async fn hello(ctx: &mut Context) {
    let name = ctx.param("name").unwrap_or("world").to_owned();
    ctx.string(StatusCode::OK, format!("hello, {name}"));
}

// GET /v1/search?q=...
async fn search(ctx: &mut Context) {
    let q = ctx.query("q").unwrap_or_default();
    ctx.string(StatusCode::OK, format!("searching for: {q}"));
}

// GET /v1/admin/stats
//
// Responses carry bytes; encode with whatever you like:
//   serde_json::to_vec(&stats).unwrap()
//   format!(r#"{{"uptime":{n}}}"#).into_bytes()
async fn stats(ctx: &mut Context) {
    ctx.json(StatusCode::OK, &br#"{"requests":42,"uptime":1337}"#[..]);
}

// Middleware: reject unless the token matches, otherwise hand control to
// the rest of the chain.
async fn require_token(ctx: &mut Context) {
    if ctx.header("authorization") != Some("secret") {
        ctx.string(StatusCode::UNAUTHORIZED, "unauthorized");
        return;
    }
    ctx.next().await;
}
