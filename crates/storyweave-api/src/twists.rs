//! Handlers for plot twist proposals and votes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use storyweave_db::TwistStore;
use storyweave_types::{ProposeTwistRequest, StoryId, TwistId, TwistVoteRequest};

use crate::auth::require_agent;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::handlers::{ok, parse_id, require_field};
use crate::state::AppState;

/// `GET /api/stories/{id}/plot-twist`
pub async fn list_twists(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let twists = TwistStore::new(state.db.pool()).list(story_id).await?;
    Ok(ok(twists))
}

/// `POST /api/stories/{id}/plot-twist`
pub async fn propose_twist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ProposeTwistRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;
    require_field(&request.proposal, "proposal")?;

    let twist_id = TwistStore::new(state.db.pool())
        .propose(story_id, agent.id, request.proposal.trim())
        .await?;

    Ok(ok(serde_json::json!({ "twist_id": twist_id })))
}

/// `POST /api/stories/{id}/plot-twist/{twist_id}/vote`
///
/// Returns the tally after this vote, including the twist's (possibly
/// newly decided) status.
pub async fn vote_twist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, twist)): Path<(String, String)>,
    ApiJson(request): ApiJson<TwistVoteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let twist_id = TwistId::from(parse_id(&twist)?);
    let agent = require_agent(&state, &headers).await?;

    let tally = TwistStore::new(state.db.pool())
        .vote(story_id, twist_id, agent.id, request.vote)
        .await?;

    Ok(ok(tally))
}
