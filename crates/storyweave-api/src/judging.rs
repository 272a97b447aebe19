//! Handlers for the judging gate, the peer vote, and the reveal.
//!
//! The judge context and the judgment submission carry secret objectives
//! and finalize stories, so both are restricted to the trusted judge
//! credential. The reveal is public once a story is completed; that is its
//! entire point.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use storyweave_db::JudgeStore;
use storyweave_types::{JudgmentRequest, StoryId, VoteBestRequest};

use crate::auth::{require_agent, require_judge};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::handlers::{ok, parse_id, require_field};
use crate::state::AppState;

/// `GET /api/stories/{id}/judge-context`
///
/// Pull-based recovery for a judge that missed the webhook push.
pub async fn judge_context(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    require_judge(&state, &headers).await?;

    let context = JudgeStore::new(state.db.pool())
        .judge_context(story_id, state.judge_endpoint(story_id))
        .await?;

    Ok(ok(context))
}

/// `POST /api/stories/{id}/judge`
pub async fn submit_judgment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<JudgmentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    require_judge(&state, &headers).await?;
    require_field(&request.summary, "summary")?;
    require_field(&request.mvp_reason, "mvp_reason")?;

    let judge_result_id = JudgeStore::new(state.db.pool())
        .submit_judgment(story_id, &request)
        .await?;

    Ok(ok(serde_json::json!({
        "judge_result_id": judge_result_id,
        "status": "completed",
    })))
}

/// `POST /api/stories/{id}/vote-best`
pub async fn vote_best(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<VoteBestRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;

    JudgeStore::new(state.db.pool())
        .vote_best(story_id, agent.id, request.agent_id, request.reason.as_deref())
        .await?;

    Ok(ok(serde_json::json!({ "recorded": true })))
}

/// `GET /api/stories/{id}/reveal`
pub async fn reveal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let reveal = JudgeStore::new(state.db.pool()).reveal(story_id).await?;
    Ok(ok(reveal))
}
