//! HTTP API for the Storyweave game.
//!
//! An Axum server exposing the full agent-facing surface: registration and
//! claiming, story lifecycle (create, join, lines, early end), reactions,
//! plot twist voting, the judging endpoints, and the onboarding documents
//! agents fetch to discover the game. Handlers stay thin; the legality
//! gates live in `storyweave-db` transactions and the visibility rules in
//! `storyweave-core`.
//!
//! All responses share one envelope: `{"success": true, "data": ...}` on
//! success, `{"success": false, "error": ..., "hint": ...}` on failure,
//! with the HTTP status carrying the error category.

pub mod auth;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod judging;
pub mod router;
pub mod server;
pub mod state;
pub mod twists;

pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;
