//! Handler trait and type erasure.
//!
//! Routes, middleware and the built-in responders are all one shape: an
//! async function that borrows the request [`Context`] and returns nothing.
//! Whether a handler is "middleware" is purely behavioral: middleware calls
//! [`Context::next`] to yield to the rest of the chain, a terminal handler
//! does not.
//!
//! The chain stores handlers of *different* concrete types in one `Vec`, so
//! each registration erases the concrete type behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn hello(ctx: &mut Context) { ... }    user writes this
//!        |  group.get("/hello", hello)
//! Arc::new(FnHandler(hello))                   heap-allocated wrapper
//!        |  stored as HandlerFn = Arc<dyn ErasedHandler>
//! link.call(ctx).await  at request time        one vtable dispatch
//! ```
//!
//! The borrow of the context lives inside the returned future, which is why
//! [`Handler`] is parameterized over that borrow's lifetime and erasure
//! requires `for<'a> Handler<'a>`. Named `async fn`s satisfy the blanket
//! impl; stateful handlers (the built-in middleware, the static-file
//! responder) implement the trait directly and box their future.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;

/// A heap-allocated, type-erased future tied to the context borrow it holds.
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Internal dispatch interface. `#[doc(hidden)] pub` rather than
/// `pub(crate)` because it bounds the public [`HandlerFn`] alias.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a>;
}

/// A shared, type-erased chain link. Cloning is one atomic increment, so a
/// handler registered once can sit in any number of per-request chains.
pub type HandlerFn = Arc<dyn ErasedHandler + 'static>;

/// Implemented by every valid handler and middleware.
///
/// Satisfied automatically for any `async fn(&mut Context)`. The lifetime
/// parameter names the context borrow captured by the returned future;
/// registration sites demand `for<'a> Handler<'a>`, i.e. the handler must
/// accept a context borrowed for any span.
pub trait Handler<'a>: Send + Sync + 'static {
    type Future: Future<Output = ()> + Send + 'a;

    fn invoke(&self, ctx: &'a mut Context) -> Self::Future;
}

impl<'a, F, Fut> Handler<'a> for F
where
    F: Fn(&'a mut Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'a,
{
    type Future = Fut;

    fn invoke(&self, ctx: &'a mut Context) -> Fut {
        self(ctx)
    }
}

/// Bridges the typed world to the trait-object world.
struct FnHandler<H>(H);

impl<H> ErasedHandler for FnHandler<H>
where
    H: for<'a> Handler<'a>,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a> {
        Box::pin(self.0.invoke(ctx))
    }
}

pub(crate) fn erase<H>(handler: H) -> HandlerFn
where
    H: for<'a> Handler<'a>,
{
    Arc::new(FnHandler(handler))
}
