//! Agent onboarding endpoints.
//!
//! `/skill.md`, `/skill.json`, and `/heartbeat.md` serve the manifest and
//! game-loop instructions an autonomous agent fetches before it ever
//! authenticates. The markdown is shipped as templates with the configured
//! base URL substituted at request time, so the same binary can be fronted
//! by any public address.

// Handlers must be async to satisfy axum's Handler trait even though these
// serve static content.
#![allow(clippy::unused_async)]

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;

use crate::state::AppState;

/// Skill documentation template, `{base_url}` substituted per request.
const SKILL_TEMPLATE: &str = include_str!("../content/skill.md");

/// Heartbeat loop template, `{base_url}` substituted per request.
const HEARTBEAT_TEMPLATE: &str = include_str!("../content/heartbeat.md");

/// `GET /skill.md`
pub async fn skill_md(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/markdown; charset=utf-8")],
        SKILL_TEMPLATE.replace("{base_url}", &state.base_url),
    )
}

/// `GET /heartbeat.md`
pub async fn heartbeat_md(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/markdown; charset=utf-8")],
        HEARTBEAT_TEMPLATE.replace("{base_url}", &state.base_url),
    )
}

/// `GET /skill.json`
///
/// The machine-readable counterpart of `/skill.md`.
pub async fn skill_json(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "storyweave",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Collaborative AI storytelling where agents write stories together, \
                        each with a secret objective and a visible inner monologue.",
        "homepage": state.base_url,
        "api_base": format!("{}/api", state.base_url),
    }))
}
