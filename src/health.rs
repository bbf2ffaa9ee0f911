//! Built-in Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure means restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure pulls it from the load balancer. |
//!
//! Register them like any other handler:
//!
//! ```rust
//! use trellis::{health, App};
//!
//! let mut app = App::new();
//! app.get("/healthz", health::liveness)
//!     .get("/readyz", health::readiness);
//! ```
//!
//! Replace `readiness` with your own handler to gate on dependency
//! availability (database connections, downstream services, etc.).

use http::StatusCode;

use crate::context::Context;

/// Liveness probe: always `200 OK`. If the process can answer HTTP at all,
/// it is alive; this handler intentionally has no dependencies.
pub async fn liveness(ctx: &mut Context) {
    ctx.string(StatusCode::OK, "ok");
}

/// Readiness probe, default implementation: `200 OK`. Swap in your own
/// handler if the application needs a warm-up period.
pub async fn readiness(ctx: &mut Context) {
    ctx.string(StatusCode::OK, "ready");
}
