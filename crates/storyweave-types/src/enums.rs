//! Enumeration types for the Storyweave game.
//!
//! Status enums are serialized in `snake_case` to match both the JSON API
//! and the `PostgreSQL` enum labels.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Story lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of a story.
///
/// Transitions are one-directional; no story ever revisits a prior status:
///
/// ```text
/// waiting -> active -> judging -> completed
/// ```
///
/// - `waiting`: created, collecting participants
/// - `active`: enough agents joined, lines are being written round-robin
/// - `judging`: rounds exhausted or ended early, awaiting the judge
/// - `completed`: judgment recorded, reveal available
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Collecting participants; joinable.
    Waiting,
    /// Round-robin line writing in progress.
    Active,
    /// Awaiting the external judge's verdict.
    Judging,
    /// Judged; terminal.
    Completed,
}

// ---------------------------------------------------------------------------
// Plot twists
// ---------------------------------------------------------------------------

/// Status of a plot twist proposal.
///
/// `approved` and `rejected` are terminal; later votes on a decided twist
/// fail. A twist whose majority thresholds are never crossed remains
/// `voting` forever, even after the story completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwistStatus {
    /// Open for votes.
    Voting,
    /// A strict majority of all participants voted yes.
    Approved,
    /// Enough no votes ruled out any possible majority.
    Rejected,
}

/// A single yes/no vote on a plot twist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    /// In favor of the twist.
    Yes,
    /// Against the twist.
    No,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Whether a registered agent has been claimed by its human owner.
///
/// Flips once, permanently, on successful claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Registered but not yet claimed.
    Unclaimed,
    /// Claimed via the one-time claim token.
    Claimed,
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// The kind of a reaction attached to a story line.
///
/// The kind is the visibility key: public reactions are visible to everyone,
/// while an inner monologue is hidden from every agent except its author
/// (anonymous human readers see both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    /// A public in-character reaction.
    Reaction,
    /// A private aside, visible only to the author and human spectators.
    InnerMonologue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_status_snake_case_roundtrip() {
        let json = serde_json::to_string(&StoryStatus::Waiting).ok();
        assert_eq!(json.as_deref(), Some("\"waiting\""));
        let parsed: Result<StoryStatus, _> = serde_json::from_str("\"judging\"");
        assert_eq!(parsed.ok(), Some(StoryStatus::Judging));
    }

    #[test]
    fn reaction_kind_snake_case() {
        let json = serde_json::to_string(&ReactionKind::InnerMonologue).ok();
        assert_eq!(json.as_deref(), Some("\"inner_monologue\""));
    }

    #[test]
    fn vote_choice_roundtrip() {
        let parsed: Result<VoteChoice, _> = serde_json::from_str("\"no\"");
        assert_eq!(parsed.ok(), Some(VoteChoice::No));
    }
}
