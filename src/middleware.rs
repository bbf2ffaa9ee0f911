//! Built-in middleware: request logging and panic recovery.
//!
//! Both are ordinary chain links, the same shape as any handler. Install
//! them on the root group (or any group) with `with`; the conventional
//! stack is the logger outermost so it also times and records requests
//! that recovery had to rescue:
//!
//! ```rust
//! use trellis::{middleware, App};
//!
//! let mut app = App::new();
//! app.with(middleware::logger()).with(middleware::recovery());
//! ```
//!
//! [`App::with_defaults`](crate::App::with_defaults) installs exactly that.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use http::StatusCode;
use tracing::{error, info};

use crate::context::Context;
use crate::handler::{BoxFuture, Handler};

/// Emits one `tracing` event per request: method, path, status, latency.
pub fn logger() -> Logger {
    Logger
}

/// Catches panics anywhere downstream in the chain and turns them into a
/// plain 500 instead of tearing down the request task.
pub fn recovery() -> Recovery {
    Recovery
}

/// See [`logger`].
pub struct Logger;

impl<'a> Handler<'a> for Logger {
    type Future = BoxFuture<'a>;

    fn invoke(&self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            ctx.next().await;
            info!(
                method = %ctx.method(),
                path = ctx.path(),
                status = ctx.response().status().as_u16(),
                elapsed = ?start.elapsed(),
                "request"
            );
        })
    }
}

/// See [`recovery`].
pub struct Recovery;

impl<'a> Handler<'a> for Recovery {
    type Future = BoxFuture<'a>;

    fn invoke(&self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(async move {
            // The context is not unwind-safe in general, but everything a
            // half-run chain can leave behind is response/cursor state that
            // the 500 below replaces outright.
            if let Err(panic) = AssertUnwindSafe(ctx.next()).catch_unwind().await {
                error!(
                    cause = panic_message(panic.as_ref()),
                    backtrace = %Backtrace::force_capture(),
                    "handler panicked"
                );
                ctx.string(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        })
    }
}

/// Panic payloads are almost always `&str` or `String`; anything else is
/// reported generically. The original cause is never sent to the client.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::Method;

    use super::*;
    use crate::app::App;
    use crate::request::Request;

    fn get(path: &str) -> Request {
        Request::new(Method::GET, path, Vec::new(), Bytes::new())
    }

    async fn boom(_ctx: &mut Context) {
        panic!("boom");
    }

    async fn hello(ctx: &mut Context) {
        ctx.string(StatusCode::OK, "hello");
    }

    #[tokio::test]
    async fn recovery_converts_a_panic_into_a_500() {
        let mut app = App::new();
        app.with(recovery());
        app.get("/boom", boom);

        let response = app.dispatch(get("/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"internal server error");
    }

    #[tokio::test]
    async fn recovery_replaces_a_half_written_response() {
        async fn partial(ctx: &mut Context) {
            ctx.string(StatusCode::OK, "half");
            panic!("after writing");
        }

        let mut app = App::new();
        app.with(recovery());
        app.get("/partial", partial);

        let response = app.dispatch(get("/partial")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"internal server error");
    }

    #[tokio::test]
    #[should_panic(expected = "boom")]
    async fn without_recovery_the_panic_propagates() {
        let mut app = App::new();
        app.get("/boom", boom);
        app.dispatch(get("/boom")).await;
    }

    #[tokio::test]
    async fn logger_wraps_without_disturbing_the_response() {
        let mut app = App::new();
        app.with(logger());
        app.get("/hello", hello);

        let response = app.dispatch(get("/hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"hello");
    }

    #[tokio::test]
    async fn default_stack_logs_and_recovers() {
        let mut app = App::with_defaults();
        app.get("/boom", boom);

        let response = app.dispatch(get("/boom")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn panic_payload_rendering() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
