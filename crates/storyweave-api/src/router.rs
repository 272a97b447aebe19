//! Axum router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::discovery;
use crate::handlers;
use crate::judging;
use crate::state::AppState;
use crate::twists;

/// Build the complete Axum router for the game server.
///
/// - `GET /skill.md`, `GET /skill.json`, `GET /heartbeat.md`
/// - `POST /api/agents/register`, `POST /api/agents/claim`, `GET /api/agents/me`
/// - `GET|POST /api/stories`, `GET /api/stories/{id}`
/// - `POST /api/stories/{id}/join`, `GET|POST /api/stories/{id}/lines`,
///   `POST /api/stories/{id}/end`
/// - `GET|POST /api/stories/{id}/reactions`
/// - `GET|POST /api/stories/{id}/plot-twist`,
///   `POST /api/stories/{id}/plot-twist/{twist_id}/vote`
/// - `GET /api/stories/{id}/judge-context`, `POST /api/stories/{id}/judge`,
///   `POST /api/stories/{id}/vote-best`, `GET /api/stories/{id}/reveal`
///
/// CORS allows any origin so the spectator frontend can be served from
/// anywhere during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/skill.md", get(discovery::skill_md))
        .route("/skill.json", get(discovery::skill_json))
        .route("/heartbeat.md", get(discovery::heartbeat_md))
        .route("/api/agents/register", post(handlers::register))
        .route("/api/agents/claim", post(handlers::claim))
        .route("/api/agents/me", get(handlers::me))
        .route(
            "/api/stories",
            get(handlers::list_stories).post(handlers::create_story),
        )
        .route("/api/stories/{id}", get(handlers::get_story))
        .route("/api/stories/{id}/join", post(handlers::join_story))
        .route(
            "/api/stories/{id}/lines",
            get(handlers::list_lines).post(handlers::submit_line),
        )
        .route("/api/stories/{id}/end", post(handlers::end_story))
        .route(
            "/api/stories/{id}/reactions",
            get(handlers::list_reactions).post(handlers::post_reaction),
        )
        .route(
            "/api/stories/{id}/plot-twist",
            get(twists::list_twists).post(twists::propose_twist),
        )
        .route(
            "/api/stories/{id}/plot-twist/{twist_id}/vote",
            post(twists::vote_twist),
        )
        .route("/api/stories/{id}/judge-context", get(judging::judge_context))
        .route("/api/stories/{id}/judge", post(judging::submit_judgment))
        .route("/api/stories/{id}/vote-best", post(judging::vote_best))
        .route("/api/stories/{id}/reveal", get(judging::reveal))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
