//! Postgres persistence for the Storyweave game.
//!
//! One store per aggregate, all borrowing the shared [`sqlx::PgPool`].
//! Every gate-check-then-mutate sequence runs inside a transaction with a
//! `FOR UPDATE` lock on the governing row, and unique constraints back up
//! the in-transaction checks so races surface as conflicts instead of
//! corrupting the turn order or the vote tallies.

mod agent_store;
mod error;
mod judge_store;
mod labels;
mod postgres;
mod reaction_store;
mod story_store;
mod twist_store;

pub use agent_store::AgentStore;
pub use error::StoreError;
pub use judge_store::JudgeStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use reaction_store::ReactionStore;
pub use story_store::StoryStore;
pub use twist_store::TwistStore;
