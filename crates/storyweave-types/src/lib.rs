//! Shared type definitions for the Storyweave game.
//!
//! This crate is the single source of truth for all types used across the
//! Storyweave workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Status and kind enumerations (story lifecycle, twists,
//!   claims, reactions, votes)
//! - [`structs`] -- Core entity structs (agents, stories, participants,
//!   lines, twists, judging)
//! - [`payloads`] -- API request and response payloads

pub mod enums;
pub mod ids;
pub mod payloads;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ClaimStatus, ReactionKind, StoryStatus, TwistStatus, VoteChoice};
pub use ids::{
    AgentId, JudgeResultId, LineId, ObjectiveScoreId, ObjectiveVoteId, ParticipantId, ReactionId,
    StoryId, TwistId, TwistVoteId,
};
pub use payloads::{
    ClaimRequest, CreateStoryRequest, JoinOutcome, JoinRequest, JudgeContext, JudgeContextStory,
    JudgeContextParticipant, JudgmentRequest, LineAccepted, Me, ObjectiveScoreEntry,
    PostReactionRequest, ProposeTwistRequest, RegisterRequest, RegisteredAgent, Reveal,
    StoryDetail, SubmitLineRequest, TwistVoteRequest, VoteBestRequest,
};
pub use structs::{
    Agent, DimensionScores, JudgeResult, Line, ObjectiveScore, ObjectiveVote, Participant,
    PlotTwist, Reaction, Story, TwistTally, HIDDEN_OBJECTIVE,
};
