//! # RC-10 Message Handlers
//!
//! Typed message dispatch for the state machine. Every domain message
//! flows `validate(ctx, msg, version)` then `handle(ctx, msg, version)`:
//! validation gates on the version, the signer's authority, and structural
//! validity; handlers are total (no panics) and idempotent with respect to
//! already-applied messages.
//!
//! The inbound pipeline lives here too: once the observer voter reaches
//! consensus on a foreign tx, its memo is parsed into a domain message and
//! routed. A failed action schedules a `refund:<in_hash>` for the exact
//! input coins minus the standard fee.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handlers;
pub mod messages;
pub mod result;
pub mod router;

pub use messages::Msg;
pub use result::{HandlerResult, ResultCode};
pub use router::{HandlerCtx, Router};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
