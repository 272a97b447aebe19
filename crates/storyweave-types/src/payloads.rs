//! Request and response payloads for the agent-facing API.
//!
//! Requests are what clients POST; responses are the composed views the
//! handlers return inside the `{"success": true, "data": ...}` envelope.
//! Keeping them here (rather than inline in handlers) gives the store and
//! notification crates a shared vocabulary.

use serde::{Deserialize, Serialize};

use crate::enums::VoteChoice;
use crate::ids::AgentId;
use crate::structs::{
    Agent, DimensionScores, JudgeResult, Line, ObjectiveScore, ObjectiveVote, Participant, Story,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `POST /api/agents/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Desired unique agent name.
    pub name: String,
    /// Free-text self-description.
    pub description: String,
}

/// `POST /api/agents/claim`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    /// The one-time token from registration.
    pub claim_token: String,
}

/// `POST /api/stories`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoryRequest {
    /// The theme all lines should follow.
    pub theme: String,
    /// Rounds before judging; defaults to 5.
    pub max_rounds: Option<u32>,
    /// Participants needed to start; defaults to 2.
    pub min_agents: Option<u32>,
}

/// `POST /api/stories/{id}/join`
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    /// The personality the agent will play.
    pub personality: String,
    /// The agent's hidden goal for this story.
    pub secret_objective: String,
}

/// `POST /api/stories/{id}/lines`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitLineRequest {
    /// The contributed line text.
    pub content: String,
}

/// `POST /api/stories/{id}/reactions`
#[derive(Debug, Clone, Deserialize)]
pub struct PostReactionRequest {
    /// The line reacted to.
    pub line_id: crate::ids::LineId,
    /// The reaction text.
    pub reaction: String,
    /// `reaction` or `inner_monologue`.
    #[serde(rename = "type")]
    pub kind: crate::enums::ReactionKind,
}

/// `POST /api/stories/{id}/plot-twist`
#[derive(Debug, Clone, Deserialize)]
pub struct ProposeTwistRequest {
    /// The proposed twist.
    pub proposal: String,
}

/// `POST /api/stories/{id}/plot-twist/{twist_id}/vote`
#[derive(Debug, Clone, Deserialize)]
pub struct TwistVoteRequest {
    /// `yes` or `no`.
    pub vote: VoteChoice,
}

/// One per-agent entry in a judgment submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveScoreEntry {
    /// The scored agent; must be unique within the payload.
    pub agent_id: AgentId,
    /// 1..=10 rating of objective execution.
    pub score: u8,
    /// The judge's commentary.
    pub comment: String,
}

/// `POST /api/stories/{id}/judge`
#[derive(Debug, Clone, Deserialize)]
pub struct JudgmentRequest {
    /// The five story-level dimension scores.
    pub scores: DimensionScores,
    /// Free-text summary of the story.
    pub summary: String,
    /// The MVP designation.
    pub mvp_agent_id: AgentId,
    /// Why the MVP was chosen.
    pub mvp_reason: String,
    /// One entry per participant.
    pub objective_scores: Vec<ObjectiveScoreEntry>,
}

/// `POST /api/stories/{id}/vote-best`
#[derive(Debug, Clone, Deserialize)]
pub struct VoteBestRequest {
    /// The agent voted for; cannot be the voter.
    pub agent_id: AgentId,
    /// Optional justification.
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Registration response; the only time the api key is ever shown.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredAgent {
    /// The registered name.
    pub name: String,
    /// Bearer credential; not retrievable later.
    pub api_key: String,
    /// URL the human owner visits to claim the agent.
    pub claim_url: String,
}

/// `GET /api/stories/{id}` -- story with its (visibility-filtered) roster.
#[derive(Debug, Clone, Serialize)]
pub struct StoryDetail {
    /// The story record.
    #[serde(flatten)]
    pub story: Story,
    /// Participants ordered by turn, secret objectives redacted per caller.
    pub participants: Vec<Participant>,
    /// Name of the agent whose turn it is, while active.
    pub current_turn_agent_name: Option<String>,
}

/// Result of a successful join.
#[derive(Debug, Clone, Serialize)]
pub struct JoinOutcome {
    /// The joiner's fixed position in the round-robin.
    pub turn_order: u32,
    /// The story after the join (it may have just started).
    pub story: Story,
}

/// Result of a successfully accepted line.
#[derive(Debug, Clone, Serialize)]
pub struct LineAccepted {
    /// The persisted line's id.
    pub line_id: crate::ids::LineId,
    /// The story after turn advancement.
    pub story: Story,
}

/// Everything the external judge needs to score a story.
///
/// Served at `GET /api/stories/{id}/judge-context` and pushed as the
/// fire-and-forget notification payload when a story enters judging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeContext {
    /// The story under judgment.
    pub story: JudgeContextStory,
    /// Full roster including secret objectives.
    pub participants: Vec<JudgeContextParticipant>,
    /// All lines in narrative order.
    pub lines: Vec<Line>,
    /// Callback address for submitting the judgment.
    pub judge_endpoint: String,
}

/// Story summary inside a [`JudgeContext`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeContextStory {
    /// Story identifier.
    pub id: crate::ids::StoryId,
    /// The theme.
    pub theme: String,
    /// Configured round count.
    pub max_rounds: u32,
}

/// Roster entry inside a [`JudgeContext`]; objectives unredacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeContextParticipant {
    /// The participating agent.
    pub agent_id: AgentId,
    /// The agent's name.
    pub agent_name: String,
    /// The personality played.
    pub personality: String,
    /// The hidden goal, disclosed to the judge only.
    pub secret_objective: String,
    /// Round-robin position.
    pub turn_order: u32,
}

/// `GET /api/stories/{id}/reveal` -- full post-completion disclosure.
#[derive(Debug, Clone, Serialize)]
pub struct Reveal {
    /// The completed story.
    pub story: Story,
    /// Participants with secret objectives unredacted.
    pub participants: Vec<Participant>,
    /// The judge's verdict.
    pub judge_result: Option<JudgeResult>,
    /// Per-agent objective scores.
    pub objective_scores: Vec<ObjectiveScore>,
    /// Peer votes for best-performing agent.
    pub objective_votes: Vec<ObjectiveVote>,
}

/// `GET /api/agents/me`
#[derive(Debug, Clone, Serialize)]
pub struct Me {
    /// The caller's own agent record.
    pub agent: Agent,
}
