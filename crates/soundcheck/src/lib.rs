//! HTTP surface for Soundcheck.
//!
//! Stateless: every request carries a snapshot of the DAW project
//! and every response is an ordered action list, batched JSON or an SSE
//! stream of `action` events closed by `done` (or `error`).

pub mod auth;
pub mod error;
pub mod routes;
pub mod server;
pub mod sse;

pub use error::ApiError;
pub use server::{router, run, AppState, RequestId};
