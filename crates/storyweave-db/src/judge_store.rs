//! The judging gate and the post-completion reveal.
//!
//! A story accepts exactly one judgment, ever: a repeat submission is a
//! conflict even after the story has completed. The check runs under the
//! story row lock, with the uniqueness constraint on
//! `judge_results.story_id` as the backstop. The objective scores ride in
//! the same transaction, so a duplicate agent in the payload aborts the
//! whole submission rather than leaving a partial judgment. The flip to
//! `completed` is the single irreversible terminal transition of the story
//! lifecycle.

use sqlx::{PgPool, Postgres, Transaction};
use storyweave_types::{
    AgentId, JudgeContext, JudgeContextParticipant, JudgeContextStory, JudgeResult, JudgeResultId,
    JudgmentRequest, Line, LineId, ObjectiveScore, ObjectiveScoreId, ObjectiveVote,
    ObjectiveVoteId, Reveal, Story, StoryId, StoryStatus,
};
use uuid::Uuid;

use crate::error::{conflict_on_unique, StoreError};
use crate::labels::story_status_to_db;
use crate::story_store::StoryRow;

/// Columns selected for every story read.
const STORY_COLUMNS: &str = r"id, theme, status::TEXT AS status, max_rounds, min_agents,
       current_round, current_turn_agent_id, created_at";

/// Operations on the `judge_results`, `objective_scores`, and
/// `objective_votes` tables.
pub struct JudgeStore<'a> {
    pool: &'a PgPool,
}

impl<'a> JudgeStore<'a> {
    /// Create a new judge store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Accept the one judgment for a story and complete it.
    ///
    /// Persists the [`JudgeResult`], one objective score per payload entry,
    /// and flips the story to `completed`, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for out-of-range scores,
    /// [`StoreError::InvalidState`] unless the story is `judging`, and
    /// [`StoreError::Conflict`] if the story was already judged or the
    /// payload scores the same agent twice.
    pub async fn submit_judgment(
        &self,
        story_id: StoryId,
        judgment: &JudgmentRequest,
    ) -> Result<JudgeResultId, StoreError> {
        if !judgment.scores.in_range() {
            return Err(StoreError::validation(
                "dimension scores must each be between 1 and 10",
                "Check scores.coherence/humor/creativity/delight/narrative_flow",
            ));
        }
        if judgment
            .objective_scores
            .iter()
            .any(|entry| entry.score < 1 || entry.score > 10)
        {
            return Err(StoreError::validation(
                "objective scores must each be between 1 and 10",
                "Check the objective_scores entries",
            ));
        }

        let mut tx = self.pool.begin().await?;

        let story = lock_story(&mut tx, story_id).await?;

        // A repeat submission is a conflict, whatever the status says.
        let already_judged = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM judge_results WHERE story_id = $1",
        )
        .bind(story_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;
        if already_judged > 0 {
            return Err(StoreError::conflict(
                "this story has already been judged",
                "A story accepts exactly one judgment",
            ));
        }

        if story.status != StoryStatus::Judging {
            return Err(StoreError::invalid_state(
                format!(
                    "story is \"{}\", expected \"judging\"",
                    story_status_to_db(story.status)
                ),
                "Judgments are only accepted while a story is in judging",
            ));
        }

        let judge_result_id = JudgeResultId::new();
        sqlx::query(
            r"INSERT INTO judge_results
                  (id, story_id, coherence_score, humor_score, creativity_score,
                   delight_score, narrative_flow_score, summary, mvp_agent_id, mvp_reason)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(judge_result_id.into_inner())
        .bind(story_id.into_inner())
        .bind(i16::from(judgment.scores.coherence))
        .bind(i16::from(judgment.scores.humor))
        .bind(i16::from(judgment.scores.creativity))
        .bind(i16::from(judgment.scores.delight))
        .bind(i16::from(judgment.scores.narrative_flow))
        .bind(&judgment.summary)
        .bind(judgment.mvp_agent_id.into_inner())
        .bind(&judgment.mvp_reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                "this story has already been judged",
                "A story accepts exactly one judgment",
            )
        })?;

        for entry in &judgment.objective_scores {
            sqlx::query(
                r"INSERT INTO objective_scores (id, story_id, agent_id, score, comment)
                  VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(ObjectiveScoreId::new().into_inner())
            .bind(story_id.into_inner())
            .bind(entry.agent_id.into_inner())
            .bind(i16::from(entry.score))
            .bind(&entry.comment)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                conflict_on_unique(
                    e,
                    "objective_scores contains the same agent twice",
                    "Score each participant at most once",
                )
            })?;
        }

        sqlx::query(r"UPDATE stories SET status = 'completed' WHERE id = $1")
            .bind(story_id.into_inner())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(story = %story_id, "Story judged and completed");
        Ok(judge_result_id)
    }

    /// Assemble everything the external judge needs to score a story.
    ///
    /// Only valid while the story is in `judging`. The same payload serves
    /// the judge-context endpoint and the fire-and-forget notification.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] unless the story is `judging`.
    pub async fn judge_context(
        &self,
        story_id: StoryId,
        judge_endpoint: String,
    ) -> Result<JudgeContext, StoreError> {
        let story = fetch_story(self.pool, story_id).await?;
        if story.status != StoryStatus::Judging {
            return Err(StoreError::invalid_state(
                format!(
                    "story is \"{}\" -- judge context is only available in judging",
                    story_status_to_db(story.status)
                ),
                "Wait for the story to finish its rounds or be ended early",
            ));
        }

        let participants = sqlx::query_as::<_, JudgeRosterRow>(
            r"SELECT sp.agent_id, a.name AS agent_name, sp.personality,
                     sp.secret_objective, sp.turn_order
              FROM story_participants sp
              JOIN agents a ON a.id = sp.agent_id
              WHERE sp.story_id = $1
              ORDER BY sp.turn_order",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        let lines = sqlx::query_as::<_, ContextLineRow>(
            r"SELECT sl.id, sl.story_id, sl.agent_id, a.name AS agent_name,
                     sl.content, sl.round_number, sl.created_at
              FROM story_lines sl
              JOIN agents a ON a.id = sl.agent_id
              WHERE sl.story_id = $1
              ORDER BY sl.created_at",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(JudgeContext {
            story: JudgeContextStory {
                id: story.id,
                theme: story.theme,
                max_rounds: story.max_rounds,
            },
            participants: participants
                .into_iter()
                .map(JudgeRosterRow::into_participant)
                .collect(),
            lines: lines.into_iter().map(ContextLineRow::into_line).collect(),
            judge_endpoint,
        })
    }

    /// Record one participant's post-completion vote for the
    /// best-performing agent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] unless the story is `completed`,
    /// [`StoreError::Forbidden`] for self-votes and non-participant voters,
    /// [`StoreError::Validation`] when the target did not participate, and
    /// [`StoreError::Conflict`] for a second vote by the same voter.
    pub async fn vote_best(
        &self,
        story_id: StoryId,
        voter_id: AgentId,
        voted_for_id: AgentId,
        reason: Option<&str>,
    ) -> Result<(), StoreError> {
        let story = fetch_story(self.pool, story_id).await?;
        if story.status != StoryStatus::Completed {
            return Err(StoreError::invalid_state(
                "voting is only available after the story is completed",
                "Wait for the judge to complete the story",
            ));
        }

        if voter_id == voted_for_id {
            return Err(StoreError::forbidden(
                "you cannot vote for your own performance",
                "Pick another participant",
            ));
        }

        let voter_participates = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(voter_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        if voter_participates == 0 {
            return Err(StoreError::forbidden(
                "you must have participated in this story to vote",
                "Only participants vote on performances",
            ));
        }

        let target_participates = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(voted_for_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        if target_participates == 0 {
            return Err(StoreError::validation(
                "that agent did not participate in this story",
                "Vote for one of the story's participants",
            ));
        }

        sqlx::query(
            r"INSERT INTO objective_votes (id, story_id, voter_id, voted_for_id, reason)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(ObjectiveVoteId::new().into_inner())
        .bind(story_id.into_inner())
        .bind(voter_id.into_inner())
        .bind(voted_for_id.into_inner())
        .bind(reason)
        .execute(self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                "you have already cast your vote for this story",
                "Each participant votes once per story",
            )
        })?;

        tracing::debug!(story = %story_id, voter = %voter_id, "Objective vote recorded");
        Ok(())
    }

    /// The full post-completion disclosure: unredacted roster, judge
    /// verdict, objective scores, and peer votes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] unless the story is `completed`.
    pub async fn reveal(&self, story_id: StoryId) -> Result<Reveal, StoreError> {
        let story = fetch_story(self.pool, story_id).await?;
        if story.status != StoryStatus::Completed {
            return Err(StoreError::invalid_state(
                "the reveal is only available after the story is completed",
                "Poll GET /api/stories/{id} until status is completed",
            ));
        }

        let participants = sqlx::query_as::<_, RevealParticipantRow>(
            r"SELECT sp.id, sp.story_id, sp.agent_id, a.name AS agent_name,
                     sp.personality, sp.secret_objective, sp.turn_order, sp.joined_at
              FROM story_participants sp
              JOIN agents a ON a.id = sp.agent_id
              WHERE sp.story_id = $1
              ORDER BY sp.turn_order",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        let judge_result = sqlx::query_as::<_, JudgeResultRow>(
            r"SELECT jr.id, jr.story_id, jr.coherence_score, jr.humor_score,
                     jr.creativity_score, jr.delight_score, jr.narrative_flow_score,
                     jr.summary, jr.mvp_agent_id, a.name AS mvp_agent_name,
                     jr.mvp_reason, jr.created_at
              FROM judge_results jr
              JOIN agents a ON a.id = jr.mvp_agent_id
              WHERE jr.story_id = $1",
        )
        .bind(story_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        let objective_scores = sqlx::query_as::<_, ObjectiveScoreRow>(
            r"SELECT os.id, os.story_id, os.agent_id, a.name AS agent_name,
                     os.score, os.comment
              FROM objective_scores os
              JOIN agents a ON a.id = os.agent_id
              WHERE os.story_id = $1
              ORDER BY os.score DESC",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        let objective_votes = sqlx::query_as::<_, ObjectiveVoteRow>(
            r"SELECT ov.id, ov.story_id, ov.voter_id, v.name AS voter_name,
                     ov.voted_for_id, vf.name AS voted_for_name, ov.reason
              FROM objective_votes ov
              JOIN agents v ON v.id = ov.voter_id
              JOIN agents vf ON vf.id = ov.voted_for_id
              WHERE ov.story_id = $1",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(Reveal {
            story,
            participants: participants
                .into_iter()
                .map(RevealParticipantRow::into_participant)
                .collect(),
            judge_result: judge_result.map(JudgeResultRow::into_judge_result),
            objective_scores: objective_scores
                .into_iter()
                .map(ObjectiveScoreRow::into_score)
                .collect(),
            objective_votes: objective_votes
                .into_iter()
                .map(ObjectiveVoteRow::into_vote)
                .collect(),
        })
    }
}

/// Lock a story row for the duration of the transaction.
async fn lock_story(
    tx: &mut Transaction<'_, Postgres>,
    story_id: StoryId,
) -> Result<Story, StoreError> {
    let row = sqlx::query_as::<_, StoryRow>(&format!(
        r"SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 FOR UPDATE"
    ))
    .bind(story_id.into_inner())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| StoreError::not_found("story", "Check the story id against GET /api/stories"))?;

    row.into_story()
}

/// Fetch a story without locking.
async fn fetch_story(pool: &PgPool, story_id: StoryId) -> Result<Story, StoreError> {
    let row = sqlx::query_as::<_, StoryRow>(&format!(
        r"SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
    ))
    .bind(story_id.into_inner())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::not_found("story", "Check the story id against GET /api/stories"))?;

    row.into_story()
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Roster row for the judge context.
#[derive(Debug, Clone, sqlx::FromRow)]
struct JudgeRosterRow {
    agent_id: Uuid,
    agent_name: String,
    personality: String,
    secret_objective: String,
    turn_order: i32,
}

impl JudgeRosterRow {
    fn into_participant(self) -> JudgeContextParticipant {
        JudgeContextParticipant {
            agent_id: AgentId::from(self.agent_id),
            agent_name: self.agent_name,
            personality: self.personality,
            secret_objective: self.secret_objective,
            turn_order: u32::try_from(self.turn_order).unwrap_or(0),
        }
    }
}

/// Line row for the judge context.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ContextLineRow {
    id: Uuid,
    story_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    content: String,
    round_number: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ContextLineRow {
    fn into_line(self) -> Line {
        Line {
            id: LineId::from(self.id),
            story_id: StoryId::from(self.story_id),
            agent_id: AgentId::from(self.agent_id),
            agent_name: self.agent_name,
            content: self.content,
            round_number: u32::try_from(self.round_number).unwrap_or(0),
            created_at: self.created_at,
        }
    }
}

/// Participant row for the reveal (duplicated from the story store's view
/// to keep the two stores decoupled).
#[derive(Debug, Clone, sqlx::FromRow)]
struct RevealParticipantRow {
    id: Uuid,
    story_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    personality: String,
    secret_objective: String,
    turn_order: i32,
    joined_at: chrono::DateTime<chrono::Utc>,
}

impl RevealParticipantRow {
    fn into_participant(self) -> storyweave_types::Participant {
        storyweave_types::Participant {
            id: storyweave_types::ParticipantId::from(self.id),
            story_id: StoryId::from(self.story_id),
            agent_id: AgentId::from(self.agent_id),
            agent_name: self.agent_name,
            personality: self.personality,
            secret_objective: self.secret_objective,
            turn_order: u32::try_from(self.turn_order).unwrap_or(0),
            joined_at: self.joined_at,
        }
    }
}

/// A row from the `judge_results` table with the MVP's name joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
struct JudgeResultRow {
    id: Uuid,
    story_id: Uuid,
    coherence_score: i16,
    humor_score: i16,
    creativity_score: i16,
    delight_score: i16,
    narrative_flow_score: i16,
    summary: String,
    mvp_agent_id: Uuid,
    mvp_agent_name: String,
    mvp_reason: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl JudgeResultRow {
    fn into_judge_result(self) -> JudgeResult {
        JudgeResult {
            id: JudgeResultId::from(self.id),
            story_id: StoryId::from(self.story_id),
            scores: storyweave_types::DimensionScores {
                coherence: u8::try_from(self.coherence_score).unwrap_or(0),
                humor: u8::try_from(self.humor_score).unwrap_or(0),
                creativity: u8::try_from(self.creativity_score).unwrap_or(0),
                delight: u8::try_from(self.delight_score).unwrap_or(0),
                narrative_flow: u8::try_from(self.narrative_flow_score).unwrap_or(0),
            },
            summary: self.summary,
            mvp_agent_id: AgentId::from(self.mvp_agent_id),
            mvp_agent_name: Some(self.mvp_agent_name),
            mvp_reason: self.mvp_reason,
            created_at: self.created_at,
        }
    }
}

/// A row from the `objective_scores` table with the agent's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ObjectiveScoreRow {
    id: Uuid,
    story_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    score: i16,
    comment: String,
}

impl ObjectiveScoreRow {
    fn into_score(self) -> ObjectiveScore {
        ObjectiveScore {
            id: ObjectiveScoreId::from(self.id),
            story_id: StoryId::from(self.story_id),
            agent_id: AgentId::from(self.agent_id),
            agent_name: Some(self.agent_name),
            score: u8::try_from(self.score).unwrap_or(0),
            comment: self.comment,
        }
    }
}

/// A row from the `objective_votes` table with both names joined in.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ObjectiveVoteRow {
    id: Uuid,
    story_id: Uuid,
    voter_id: Uuid,
    voter_name: String,
    voted_for_id: Uuid,
    voted_for_name: String,
    reason: Option<String>,
}

impl ObjectiveVoteRow {
    fn into_vote(self) -> ObjectiveVote {
        ObjectiveVote {
            id: ObjectiveVoteId::from(self.id),
            story_id: StoryId::from(self.story_id),
            voter_id: AgentId::from(self.voter_id),
            voter_name: Some(self.voter_name),
            voted_for_id: AgentId::from(self.voted_for_id),
            voted_for_name: Some(self.voted_for_name),
            reason: self.reason,
        }
    }
}
