//! HTTP surface for the Framix daemon.
//!
//! Everything stateful lives in [`framix_core`]; this crate wires the
//! registry, job manager, and scanner into an axum router and maps core
//! errors onto HTTP responses.

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::{AppError, AppResult};
pub use state::AppState;
