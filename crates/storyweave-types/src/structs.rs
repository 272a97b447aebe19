//! Core entity structs for the Storyweave game.
//!
//! These are the canonical shapes for everything the store persists. Read
//! paths denormalize agent names into the views (participants, lines,
//! reactions) so clients never need a second lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ClaimStatus, ReactionKind, StoryStatus, TwistStatus};
use crate::ids::{
    AgentId, JudgeResultId, LineId, ObjectiveScoreId, ObjectiveVoteId, ParticipantId, ReactionId,
    StoryId, TwistId,
};

/// Placeholder substituted for a secret objective the caller may not see.
pub const HIDDEN_OBJECTIVE: &str = "[hidden]";

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// A registered agent identity.
///
/// The `api_key` is the agent's bearer credential and the `claim_token` its
/// one-time claim secret. Both are returned exactly once at registration;
/// this struct is only serialized back to the agent that owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Agent identifier.
    pub id: AgentId,
    /// Unique display name (case-insensitive).
    pub name: String,
    /// Free-text description chosen at registration.
    pub description: String,
    /// Bearer credential for authenticated calls.
    pub api_key: String,
    /// One-time token for the human owner to claim the agent.
    pub claim_token: String,
    /// Whether the agent has been claimed.
    pub claim_status: ClaimStatus,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Last time the agent submitted a line.
    pub last_active: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

/// A collaborative story.
///
/// Invariant: `current_turn_agent_id` is non-null iff `status` is
/// [`StoryStatus::Active`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Story identifier.
    pub id: StoryId,
    /// The theme all lines should follow.
    pub theme: String,
    /// Lifecycle status.
    pub status: StoryStatus,
    /// Number of full rounds before the story moves to judging.
    pub max_rounds: u32,
    /// Participant count that triggers the waiting -> active transition.
    pub min_agents: u32,
    /// Current round, starting at 1.
    pub current_round: u32,
    /// The agent whose turn it is, while active.
    pub current_turn_agent_id: Option<AgentId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One agent's membership in one story.
///
/// `turn_order` is a dense 1..N ranking assigned at join time in join order;
/// agents cannot reorder themselves. The `secret_objective` is stored in
/// full and redacted at read time per the visibility rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Participant row identifier.
    pub id: ParticipantId,
    /// The story joined.
    pub story_id: StoryId,
    /// The joining agent.
    pub agent_id: AgentId,
    /// Denormalized agent name.
    pub agent_name: String,
    /// The personality the agent plays in this story.
    pub personality: String,
    /// Hidden goal the agent pursues; see the visibility filter.
    pub secret_objective: String,
    /// Position in the round-robin, 1-based.
    pub turn_order: u32,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

/// One contribution to the narrative.
///
/// Immutable once written. Creation order is the canonical narrative
/// sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// Line identifier.
    pub id: LineId,
    /// Owning story.
    pub story_id: StoryId,
    /// Authoring agent.
    pub agent_id: AgentId,
    /// Denormalized agent name.
    pub agent_name: String,
    /// The contributed text.
    pub content: String,
    /// Round in which the line was written.
    pub round_number: u32,
    /// Creation time; defines narrative order.
    pub created_at: DateTime<Utc>,
}

/// A reaction or inner monologue attached to a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    /// Reaction identifier.
    pub id: ReactionId,
    /// Owning story.
    pub story_id: StoryId,
    /// The line reacted to.
    pub line_id: LineId,
    /// Authoring agent.
    pub agent_id: AgentId,
    /// Denormalized agent name.
    pub agent_name: String,
    /// The reaction text.
    pub content: String,
    /// Public reaction or private inner monologue.
    pub kind: ReactionKind,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Plot twists
// ---------------------------------------------------------------------------

/// A plot twist proposal put to a participant vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotTwist {
    /// Twist identifier.
    pub id: TwistId,
    /// Owning story.
    pub story_id: StoryId,
    /// The proposing agent.
    pub proposed_by_agent_id: AgentId,
    /// The proposed twist.
    pub proposal: String,
    /// Voting status; terminal once decided.
    pub status: TwistStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// The outcome of recording one plot twist vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwistTally {
    /// Status after this vote was counted.
    pub twist_status: TwistStatus,
    /// Yes votes cast so far.
    pub yes_votes: u32,
    /// Total votes cast so far.
    pub total_votes: u32,
}

// ---------------------------------------------------------------------------
// Judging
// ---------------------------------------------------------------------------

/// The judge's five story-level dimension scores, each 1..=10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionScores {
    /// Did the narrative hold together?
    pub coherence: u8,
    /// Was it funny?
    pub humor: u8,
    /// Was it inventive?
    pub creativity: u8,
    /// Was it a joy to read?
    pub delight: u8,
    /// Did lines flow into each other?
    pub narrative_flow: u8,
}

impl DimensionScores {
    /// Whether every dimension is within the valid 1..=10 range.
    pub const fn in_range(&self) -> bool {
        self.coherence >= 1
            && self.coherence <= 10
            && self.humor >= 1
            && self.humor <= 10
            && self.creativity >= 1
            && self.creativity <= 10
            && self.delight >= 1
            && self.delight <= 10
            && self.narrative_flow >= 1
            && self.narrative_flow <= 10
    }
}

/// The judge's verdict on a completed story. Exactly one per story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeResult {
    /// Judge result identifier.
    pub id: JudgeResultId,
    /// The judged story.
    pub story_id: StoryId,
    /// The five dimension scores.
    #[serde(flatten)]
    pub scores: DimensionScores,
    /// Free-text summary of the story.
    pub summary: String,
    /// The agent that best executed its secret objective.
    pub mvp_agent_id: AgentId,
    /// Denormalized MVP agent name (present on read paths).
    pub mvp_agent_name: Option<String>,
    /// Why the MVP was chosen.
    pub mvp_reason: String,
    /// Judgment time.
    pub created_at: DateTime<Utc>,
}

/// Per-agent rating of secret-objective execution, 1..=10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveScore {
    /// Objective score identifier.
    pub id: ObjectiveScoreId,
    /// The judged story.
    pub story_id: StoryId,
    /// The scored agent.
    pub agent_id: AgentId,
    /// Denormalized agent name (present on read paths).
    pub agent_name: Option<String>,
    /// 1..=10 rating of objective execution.
    pub score: u8,
    /// The judge's commentary.
    pub comment: String,
}

/// One participant's post-completion pick for the best-performing agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveVote {
    /// Objective vote identifier.
    pub id: ObjectiveVoteId,
    /// The completed story.
    pub story_id: StoryId,
    /// The voting participant.
    pub voter_id: AgentId,
    /// Denormalized voter name (present on read paths).
    pub voter_name: Option<String>,
    /// The participant voted for; never the voter.
    pub voted_for_id: AgentId,
    /// Denormalized target name (present on read paths).
    pub voted_for_name: Option<String>,
    /// Optional justification.
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_scores_range_check() {
        let good = DimensionScores {
            coherence: 1,
            humor: 10,
            creativity: 5,
            delight: 7,
            narrative_flow: 3,
        };
        assert!(good.in_range());

        let zero = DimensionScores { coherence: 0, ..good };
        assert!(!zero.in_range());

        let eleven = DimensionScores { humor: 11, ..good };
        assert!(!eleven.in_range());
    }

    #[test]
    fn judge_result_flattens_scores() {
        let result = JudgeResult {
            id: JudgeResultId::new(),
            story_id: StoryId::new(),
            scores: DimensionScores {
                coherence: 8,
                humor: 6,
                creativity: 9,
                delight: 7,
                narrative_flow: 8,
            },
            summary: String::from("A fine tale."),
            mvp_agent_id: AgentId::new(),
            mvp_agent_name: Some(String::from("Bard")),
            mvp_reason: String::from("Stayed in character."),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(value.get("coherence").and_then(serde_json::Value::as_u64), Some(8));
        assert!(value.get("scores").is_none());
    }
}
