//! # trellis
//!
//! A small HTTP framework built around three pieces:
//!
//! - **Prefix-tree routing.** Patterns are `/`-delimited segments: literals,
//!   named parameters (`:id`), and a trailing wildcard (`*filepath`). One
//!   tree per HTTP method; conflicting patterns are rejected when routes
//!   are registered, not discovered in production.
//! - **Route groups.** A group scopes a path prefix and carries middleware;
//!   groups nest, and a request picks up the middleware of every group
//!   whose prefix covers its path.
//! - **An explicitly-advanced middleware chain.** Handlers and middleware
//!   are the same shape, an `async fn(&mut Context)`. Middleware calls
//!   [`Context::next`] to run the rest of the chain and regains control
//!   afterwards; returning without calling it short-circuits the request.
//!
//! Everything else (TLS, rate limiting, body-size limits, slow-client
//! protection) is the reverse proxy's job, by design.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{middleware, App, Context, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = App::new();
//!     app.with(middleware::logger()).with(middleware::recovery());
//!     app.get("/hello/:name", hello);
//!
//!     let mut v1 = app.group("/v1");
//!     v1.get("/ping", ping);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn hello(ctx: &mut Context) {
//!     let name = ctx.param("name").unwrap_or("world").to_owned();
//!     ctx.string(StatusCode::OK, format!("hello, {name}"));
//! }
//!
//! async fn ping(ctx: &mut Context) {
//!     ctx.string(StatusCode::OK, "pong");
//! }
//! ```
//!
//! ## Middleware in one paragraph
//!
//! The chain assembled for a request is: middleware of every covering
//! group (creation order, then registration order), then the matched
//! handler (or the built-in 404 responder). `ctx.next().await` runs the
//! next link; code after it runs once everything downstream finished,
//! which is how the logger times whole requests. An auth middleware
//! rejects by writing a response and simply not advancing.

mod app;
mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod trie;

pub mod health;
pub mod middleware;

pub use app::{App, RouteGroup};
pub use context::Context;
pub use error::Error;
pub use handler::{BoxFuture, Handler, HandlerFn};
pub use request::Request;
pub use response::Response;
pub use server::Server;

// The method and status vocabulary comes straight from the `http` crate;
// re-exported so applications do not need to depend on it themselves.
pub use http::{Method, StatusCode};
