//! Plot twist proposals and majority-vote consensus.
//!
//! Each twist is an independent vote scoped to the story's participant set.
//! Proposing runs under a row lock on the story, so a story sliding into
//! judging cannot accept a twist that passed the status check before the
//! transition. Recording a vote and recomputing the outcome happen under a
//! row lock on the twist, so a decided twist can never accept a late vote
//! and two concurrent votes cannot both observe the pre-decision tally.

use sqlx::{PgPool, Postgres, Transaction};
use storyweave_core::tally_twist;
use storyweave_types::{
    AgentId, PlotTwist, StoryId, StoryStatus, TwistId, TwistStatus, TwistTally, TwistVoteId,
    VoteChoice,
};
use uuid::Uuid;

use crate::error::{conflict_on_unique, StoreError};
use crate::labels::{
    story_status_to_db, twist_status_from_db, twist_status_to_db, vote_choice_to_db,
};

/// Operations on the `plot_twists` and `plot_twist_votes` tables.
pub struct TwistStore<'a> {
    pool: &'a PgPool,
}

impl<'a> TwistStore<'a> {
    /// Create a new twist store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Propose a plot twist for an active story.
    ///
    /// Multiple twists may be open concurrently; proposing is independent
    /// of turn order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] if the story is not active and
    /// [`StoreError::Forbidden`] if the agent is not a participant.
    pub async fn propose(
        &self,
        story_id: StoryId,
        agent_id: AgentId,
        proposal: &str,
    ) -> Result<TwistId, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the story row so the status cannot change under the insert.
        let status = sqlx::query_scalar::<_, String>(
            r"SELECT status::TEXT FROM stories WHERE id = $1 FOR UPDATE",
        )
        .bind(story_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::not_found("story", "Check the story id against GET /api/stories"))?;

        if status != story_status_to_db(StoryStatus::Active) {
            return Err(StoreError::invalid_state(
                "plot twists can only be proposed in active stories",
                "Wait until the story is active",
            ));
        }

        let is_participant = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;
        if is_participant == 0 {
            return Err(StoreError::forbidden(
                "you must be in this story to propose a plot twist",
                "Join the story first",
            ));
        }

        let twist_id = TwistId::new();
        sqlx::query(
            r"INSERT INTO plot_twists (id, story_id, proposed_by_agent_id, proposal)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(twist_id.into_inner())
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(proposal)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(story = %story_id, twist = %twist_id, "Plot twist proposed");
        Ok(twist_id)
    }

    /// Record a vote and recompute the twist's outcome.
    ///
    /// With P participants, Y yes votes, and V votes cast: `Y > P/2`
    /// approves, `(V - Y) > P/2` rejects, anything else stays `voting`.
    /// Approval and rejection are terminal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] for a decided twist,
    /// [`StoreError::Forbidden`] for a non-participant, and
    /// [`StoreError::Conflict`] for a duplicate vote.
    pub async fn vote(
        &self,
        story_id: StoryId,
        twist_id: TwistId,
        agent_id: AgentId,
        choice: VoteChoice,
    ) -> Result<TwistTally, StoreError> {
        let mut tx = self.pool.begin().await?;

        let twist = lock_twist(&mut tx, story_id, twist_id).await?;
        if twist.status != TwistStatus::Voting {
            return Err(StoreError::invalid_state(
                "this plot twist is no longer open for voting",
                "Decided twists are terminal; propose a new twist instead",
            ));
        }

        let is_participant = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;
        if is_participant == 0 {
            return Err(StoreError::forbidden(
                "you must be in this story to vote",
                "Join the story first",
            ));
        }

        sqlx::query(
            r"INSERT INTO plot_twist_votes (id, plot_twist_id, agent_id, vote)
              VALUES ($1, $2, $3, $4::vote_choice)",
        )
        .bind(TwistVoteId::new().into_inner())
        .bind(twist_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(vote_choice_to_db(choice))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                "you have already voted on this twist",
                "Each participant votes once per twist",
            )
        })?;

        let participant_count = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1",
        )
        .bind(story_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;

        let yes_votes = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM plot_twist_votes WHERE plot_twist_id = $1 AND vote = 'yes'",
        )
        .bind(twist_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;

        let total_votes = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM plot_twist_votes WHERE plot_twist_id = $1",
        )
        .bind(twist_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;

        let participant_count = u32::try_from(participant_count).unwrap_or(0);
        let yes_votes = u32::try_from(yes_votes).unwrap_or(0);
        let total_votes = u32::try_from(total_votes).unwrap_or(0);

        let outcome = tally_twist(participant_count, yes_votes, total_votes);
        if outcome != TwistStatus::Voting {
            sqlx::query(r"UPDATE plot_twists SET status = $1::twist_status WHERE id = $2")
                .bind(twist_status_to_db(outcome))
                .bind(twist_id.into_inner())
                .execute(&mut *tx)
                .await?;
            tracing::info!(twist = %twist_id, ?outcome, "Plot twist decided");
        }

        tx.commit().await?;

        Ok(TwistTally {
            twist_status: outcome,
            yes_votes,
            total_votes,
        })
    }

    /// Fetch a story's twists, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list(&self, story_id: StoryId) -> Result<Vec<PlotTwist>, StoreError> {
        let rows = sqlx::query_as::<_, TwistRow>(
            r"SELECT id, story_id, proposed_by_agent_id, proposal,
                     status::TEXT AS status, created_at
              FROM plot_twists WHERE story_id = $1
              ORDER BY created_at DESC",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TwistRow::into_twist).collect()
    }
}

/// Lock a twist row for the duration of the transaction.
async fn lock_twist(
    tx: &mut Transaction<'_, Postgres>,
    story_id: StoryId,
    twist_id: TwistId,
) -> Result<PlotTwist, StoreError> {
    let row = sqlx::query_as::<_, TwistRow>(
        r"SELECT id, story_id, proposed_by_agent_id, proposal,
                 status::TEXT AS status, created_at
          FROM plot_twists WHERE id = $1 AND story_id = $2
          FOR UPDATE",
    )
    .bind(twist_id.into_inner())
    .bind(story_id.into_inner())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| StoreError::not_found("plot twist", "Check the twist id for this story"))?;

    row.into_twist()
}

/// A row from the `plot_twists` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TwistRow {
    id: Uuid,
    story_id: Uuid,
    proposed_by_agent_id: Uuid,
    proposal: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TwistRow {
    fn into_twist(self) -> Result<PlotTwist, StoreError> {
        Ok(PlotTwist {
            id: TwistId::from(self.id),
            story_id: StoryId::from(self.story_id),
            proposed_by_agent_id: AgentId::from(self.proposed_by_agent_id),
            proposal: self.proposal,
            status: twist_status_from_db(&self.status)?,
            created_at: self.created_at,
        })
    }
}
