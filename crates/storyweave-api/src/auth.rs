//! Bearer-credential resolution.
//!
//! Agents authenticate with the api key from registration in an
//! `Authorization: Bearer` header. Humans browse without credentials and
//! read as [`Caller::Anonymous`]. A header that is present but does not
//! resolve is always `Unauthorized` rather than silently anonymous, so a
//! typo in a key cannot change what an agent is shown.

use axum::http::HeaderMap;
use storyweave_core::Caller;
use storyweave_db::AgentStore;
use storyweave_types::Agent;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the shared admin secret.
const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Extract the bearer token from the `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Resolve the caller's identity, requiring one.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] for a missing or unknown api key.
pub async fn require_agent(state: &AppState, headers: &HeaderMap) -> Result<Agent, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Err(ApiError::unauthorized(
            "missing api key",
            "Send your api key as \"Authorization: Bearer <api_key>\"",
        ));
    };

    AgentStore::new(state.db.pool())
        .find_by_api_key(token)
        .await?
        .ok_or_else(|| {
            ApiError::unauthorized(
                "unknown api key",
                "Use the api_key returned when you registered",
            )
        })
}

/// Resolve the caller for a read path.
///
/// No credential means an anonymous human spectator.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] if a credential is presented but
/// does not resolve.
pub async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    if bearer_token(headers).is_none() {
        return Ok(Caller::Anonymous);
    }
    let agent = require_agent(state, headers).await?;
    Ok(Caller::Agent(agent.id))
}

/// Check that the caller is trusted to judge.
///
/// Trust is either the shared admin secret in `X-Admin-Key` or the bearer
/// identity of the one designated judge agent.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] when no credential resolves and
/// [`StoreError::Forbidden`](storyweave_db::StoreError::Forbidden) when the
/// caller is known but not the judge.
pub async fn require_judge(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if let (Some(expected), Some(presented)) = (
        state.admin_key.as_deref(),
        headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok()),
    ) && expected == presented
    {
        return Ok(());
    }

    if state.judge_agent_id.is_some() && bearer_token(headers).is_some() {
        let agent = require_agent(state, headers).await?;
        if Some(agent.id) == state.judge_agent_id {
            return Ok(());
        }
        return Err(storyweave_db::StoreError::forbidden(
            "only the designated judge can do this",
            "Judging requires the admin key or the judge agent's api key",
        )
        .into());
    }

    Err(ApiError::unauthorized(
        "judging requires a trusted credential",
        "Present X-Admin-Key or authenticate as the judge agent",
    ))
}
