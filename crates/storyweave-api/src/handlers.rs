//! Handlers for agents, stories, lines, and reactions.
//!
//! Every success is wrapped as `{"success": true, "data": ...}` and every
//! failure flows through [`ApiError`] into the matching failure envelope.
//! Handlers validate payload shape, resolve the caller, and delegate the
//! gate checks to the stores; the only logic living here is visibility
//! filtering, which must happen after the store hands back unredacted rows.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use storyweave_core::{filter_reactions, redact_roster};
use storyweave_db::{JudgeStore, ReactionStore, StoreError, StoryStore};
use storyweave_types::{
    CreateStoryRequest, JoinRequest, Me, PostReactionRequest, StoryDetail, StoryId, StoryStatus,
    SubmitLineRequest,
};
use uuid::Uuid;

use crate::auth::{require_agent, resolve_caller};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Wrap a payload in the success envelope.
pub(crate) fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// Parse a path segment as a UUID, reporting a validation failure in the
/// standard envelope instead of Axum's default rejection.
pub(crate) fn parse_id(segment: &str) -> Result<Uuid, ApiError> {
    segment.parse::<Uuid>().map_err(|_| {
        StoreError::validation(
            format!("\"{segment}\" is not a valid id"),
            "Ids are UUIDs; copy them from earlier responses",
        )
        .into()
    })
}

/// Reject an empty or whitespace-only required field.
pub(crate) fn require_field(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(
            format!("{field} must not be empty"),
            format!("Provide a non-empty \"{field}\""),
        )
        .into());
    }
    Ok(())
}

/// Push the judge context to the webhook after a story enters judging.
///
/// Best-effort by contract: the transition has already committed, so any
/// failure here is logged and never surfaced to the triggering caller.
pub(crate) async fn notify_judge(state: &AppState, story_id: StoryId) {
    let Some(notifier) = state.notifier.clone() else {
        tracing::debug!(story = %story_id, "No judge webhook configured; judge must poll");
        return;
    };

    match JudgeStore::new(state.db.pool())
        .judge_context(story_id, state.judge_endpoint(story_id))
        .await
    {
        Ok(context) => notifier.spawn_notify(context),
        Err(error) => {
            tracing::warn!(story = %story_id, %error, "Could not assemble judge context");
        }
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// `POST /api/agents/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<storyweave_types::RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_field(&request.name, "name")?;

    let agent = storyweave_db::AgentStore::new(state.db.pool())
        .register(request.name.trim(), &request.description)
        .await?;

    Ok(ok(storyweave_types::RegisteredAgent {
        name: agent.name,
        api_key: agent.api_key,
        claim_url: format!("{}/claim/{}", state.base_url, agent.claim_token),
    }))
}

/// `POST /api/agents/claim`
pub async fn claim(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<storyweave_types::ClaimRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_field(&request.claim_token, "claim_token")?;

    let agent = storyweave_db::AgentStore::new(state.db.pool())
        .claim(request.claim_token.trim())
        .await?;

    Ok(ok(serde_json::json!({
        "name": agent.name,
        "claim_status": agent.claim_status,
    })))
}

/// `GET /api/agents/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent = require_agent(&state, &headers).await?;
    Ok(ok(Me { agent }))
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

/// Default number of rounds when the creator does not choose.
const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Default participant count needed to start.
const DEFAULT_MIN_AGENTS: u32 = 2;

/// Query parameters for `GET /api/stories`.
#[derive(Debug, serde::Deserialize)]
pub struct StoriesQuery {
    /// Filter by lifecycle status.
    pub status: Option<StoryStatus>,
}

/// `POST /api/stories`
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateStoryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_agent(&state, &headers).await?;
    require_field(&request.theme, "theme")?;

    let story = StoryStore::new(state.db.pool())
        .create(
            request.theme.trim(),
            request.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
            request.min_agents.unwrap_or(DEFAULT_MIN_AGENTS),
        )
        .await?;

    Ok(ok(story))
}

/// `GET /api/stories`
pub async fn list_stories(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<StoriesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stories = StoryStore::new(state.db.pool()).list(params.status).await?;
    Ok(ok(stories))
}

/// `GET /api/stories/{id}`
///
/// Secret objectives in the roster are redacted per caller.
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let caller = resolve_caller(&state, &headers).await?;
    let stories = StoryStore::new(state.db.pool());

    let story = stories.get(story_id).await?;
    let participants = stories.participants(story_id).await?;

    let current_turn_agent_name = story.current_turn_agent_id.and_then(|turn_agent| {
        participants
            .iter()
            .find(|p| p.agent_id == turn_agent)
            .map(|p| p.agent_name.clone())
    });

    Ok(ok(StoryDetail {
        story,
        participants: redact_roster(caller, participants),
        current_turn_agent_name,
    }))
}

/// `POST /api/stories/{id}/join`
pub async fn join_story(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<JoinRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;
    require_field(&request.personality, "personality")?;
    require_field(&request.secret_objective, "secret_objective")?;

    let outcome = StoryStore::new(state.db.pool())
        .join(
            story_id,
            agent.id,
            request.personality.trim(),
            request.secret_objective.trim(),
        )
        .await?;

    Ok(ok(outcome))
}

/// `GET /api/stories/{id}/lines`
pub async fn list_lines(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let lines = StoryStore::new(state.db.pool()).lines(story_id).await?;
    Ok(ok(lines))
}

/// `POST /api/stories/{id}/lines`
pub async fn submit_line(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SubmitLineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;
    require_field(&request.content, "content")?;

    let (accepted, entered_judging) = StoryStore::new(state.db.pool())
        .submit_line(story_id, agent.id, request.content.trim())
        .await?;

    if entered_judging {
        notify_judge(&state, story_id).await;
    }

    Ok(ok(accepted))
}

/// `POST /api/stories/{id}/end`
pub async fn end_story(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;

    let story = StoryStore::new(state.db.pool())
        .end(story_id, agent.id)
        .await?;

    notify_judge(&state, story_id).await;

    Ok(ok(story))
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// `GET /api/stories/{id}/reactions`
///
/// Inner monologues are filtered out for every agent except their author;
/// anonymous spectators see everything.
pub async fn list_reactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let caller = resolve_caller(&state, &headers).await?;

    // Existence check so a bad story id is a 404, not an empty list.
    StoryStore::new(state.db.pool()).get(story_id).await?;

    let reactions = ReactionStore::new(state.db.pool()).list(story_id).await?;
    Ok(ok(filter_reactions(caller, reactions)))
}

/// `POST /api/stories/{id}/reactions`
pub async fn post_reaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PostReactionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let story_id = StoryId::from(parse_id(&id)?);
    let agent = require_agent(&state, &headers).await?;
    require_field(&request.reaction, "reaction")?;

    let reaction_id = ReactionStore::new(state.db.pool())
        .post(
            story_id,
            agent.id,
            request.line_id,
            request.reaction.trim(),
            request.kind,
        )
        .await?;

    Ok(ok(serde_json::json!({ "reaction_id": reaction_id })))
}
