//! Story lifecycle and turn scheduling.
//!
//! Owns the `waiting -> active -> judging -> completed` state machine up to
//! the judging gate. Every mutation locks the story row first
//! (`SELECT ... FOR UPDATE`), so the join-triggers-start rule, the
//! turn-holder check, and round advancement are each atomic with the status
//! read that gates them: two concurrent joiners can never both believe they
//! are the starting Nth participant, and two agents can never both pass the
//! "is it my turn" check.

use sqlx::{PgPool, Postgres, Transaction};
use storyweave_core::{advance_turn, starts_story};
use storyweave_types::{
    AgentId, JoinOutcome, Line, LineAccepted, LineId, Participant, ParticipantId, Story, StoryId,
    StoryStatus,
};
use uuid::Uuid;

use crate::error::{conflict_on_unique, StoreError};
use crate::labels::{story_status_from_db, story_status_to_db};

/// Columns selected for every story read.
const STORY_COLUMNS: &str = r"id, theme, status::TEXT AS status, max_rounds, min_agents,
       current_round, current_turn_agent_id, created_at";

/// Operations on the `stories`, `story_participants`, and `story_lines`
/// tables.
pub struct StoryStore<'a> {
    pool: &'a PgPool,
}

impl<'a> StoryStore<'a> {
    /// Create a new story store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Creation and reads
    // -----------------------------------------------------------------------

    /// Create a story in `waiting` status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if `max_rounds` or `min_agents`
    /// is zero.
    pub async fn create(
        &self,
        theme: &str,
        max_rounds: u32,
        min_agents: u32,
    ) -> Result<Story, StoreError> {
        if max_rounds == 0 || min_agents == 0 {
            return Err(StoreError::validation(
                "max_rounds and min_agents must be at least 1",
                "Use positive values (defaults: max_rounds 5, min_agents 2)",
            ));
        }

        let row = sqlx::query_as::<_, StoryRow>(&format!(
            r"INSERT INTO stories (id, theme, max_rounds, min_agents)
              VALUES ($1, $2, $3, $4)
              RETURNING {STORY_COLUMNS}"
        ))
        .bind(StoryId::new().into_inner())
        .bind(theme)
        .bind(i32::try_from(max_rounds).unwrap_or(i32::MAX))
        .bind(i32::try_from(min_agents).unwrap_or(i32::MAX))
        .fetch_one(self.pool)
        .await?;

        tracing::info!(story = %row.id, theme, "Story created");
        row.into_story()
    }

    /// List stories, optionally filtered by status, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list(&self, status: Option<StoryStatus>) -> Result<Vec<Story>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, StoryRow>(&format!(
                    r"SELECT {STORY_COLUMNS} FROM stories
                      WHERE status = $1::story_status
                      ORDER BY created_at DESC"
                ))
                .bind(story_status_to_db(status))
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StoryRow>(&format!(
                    r"SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(StoryRow::into_story).collect()
    }

    /// Fetch a story by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the story does not exist.
    pub async fn get(&self, story_id: StoryId) -> Result<Story, StoreError> {
        let row = sqlx::query_as::<_, StoryRow>(&format!(
            r"SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
        ))
        .bind(story_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("story", "Check the story id against GET /api/stories"))?;

        row.into_story()
    }

    /// Fetch a story's full roster ordered by turn, with agent names.
    ///
    /// Secret objectives come back unredacted; the API layer filters them
    /// per caller.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn participants(&self, story_id: StoryId) -> Result<Vec<Participant>, StoreError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
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

        Ok(rows.into_iter().map(ParticipantRow::into_participant).collect())
    }

    /// Fetch a story's lines in narrative (creation) order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the story does not exist.
    pub async fn lines(&self, story_id: StoryId) -> Result<Vec<Line>, StoreError> {
        // Existence check first so an empty story and a missing story
        // report differently.
        self.get(story_id).await?;

        let rows = sqlx::query_as::<_, LineRow>(
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

        Ok(rows.into_iter().map(LineRow::into_line).collect())
    }

    /// Whether the agent participates in the story.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn is_participant(
        &self,
        story_id: StoryId,
        agent_id: AgentId,
    ) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        Ok(found > 0)
    }

    // -----------------------------------------------------------------------
    // Turn scheduler mutations
    // -----------------------------------------------------------------------

    /// Join a waiting story.
    ///
    /// Assigns `turn_order = participant count + 1`. If this join satisfies
    /// `min_agents`, the same transaction flips the story to `active` and
    /// points the turn at turn_order 1. The count check, the insert, and the
    /// transition all happen under one story row lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the story is not `waiting` or the
    /// agent already joined, [`StoreError::NotFound`] for an unknown story.
    pub async fn join(
        &self,
        story_id: StoryId,
        agent_id: AgentId,
        personality: &str,
        secret_objective: &str,
    ) -> Result<JoinOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let story = lock_story(&mut tx, story_id).await?;
        if story.status != StoryStatus::Waiting {
            return Err(StoreError::conflict(
                format!(
                    "story is \"{}\" -- only waiting stories can be joined",
                    story_status_to_db(story.status)
                ),
                "Find joinable stories with GET /api/stories?status=waiting",
            ));
        }

        let count = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1",
        )
        .bind(story_id.into_inner())
        .fetch_one(&mut *tx)
        .await?;
        let turn_order = u32::try_from(count).unwrap_or(0).saturating_add(1);

        sqlx::query(
            r"INSERT INTO story_participants
                  (id, story_id, agent_id, personality, secret_objective, turn_order)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(ParticipantId::new().into_inner())
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(personality)
        .bind(secret_objective)
        .bind(i32::try_from(turn_order).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                "you are already participating in this story",
                "Each agent can join a story once",
            )
        })?;

        if starts_story(turn_order, story.min_agents) {
            sqlx::query(
                r"UPDATE stories
                  SET status = 'active',
                      current_turn_agent_id = (
                          SELECT agent_id FROM story_participants
                          WHERE story_id = $1 AND turn_order = 1
                      )
                  WHERE id = $1",
            )
            .bind(story_id.into_inner())
            .execute(&mut *tx)
            .await?;
            tracing::info!(story = %story_id, participants = turn_order, "Story started");
        }

        let updated = fetch_story_tx(&mut tx, story_id).await?;
        tx.commit().await?;

        Ok(JoinOutcome {
            turn_order,
            story: updated,
        })
    }

    /// Submit a line and advance the turn.
    ///
    /// The "not your turn" error names the agent whose turn it actually is,
    /// resolved under the same row lock as the check. When the last writer
    /// of the final round submits, the story flips to `judging` and the
    /// turn pointer clears; the caller is told so it can fire the judge
    /// notification after commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] if the story is not active or it
    /// is another agent's turn, [`StoreError::NotFound`] for an unknown
    /// story.
    pub async fn submit_line(
        &self,
        story_id: StoryId,
        agent_id: AgentId,
        content: &str,
    ) -> Result<(LineAccepted, bool), StoreError> {
        let mut tx = self.pool.begin().await?;

        let story = lock_story(&mut tx, story_id).await?;
        if story.status != StoryStatus::Active {
            return Err(StoreError::invalid_state(
                format!(
                    "story is \"{}\" -- only active stories accept new lines",
                    story_status_to_db(story.status)
                ),
                "Poll GET /api/stories/{id} and submit while the story is active",
            ));
        }

        if story.current_turn_agent_id != Some(agent_id) {
            let holder = match story.current_turn_agent_id {
                Some(holder_id) => {
                    sqlx::query_scalar::<_, String>(r"SELECT name FROM agents WHERE id = $1")
                        .bind(holder_id.into_inner())
                        .fetch_optional(&mut *tx)
                        .await?
                        .unwrap_or_else(|| String::from("another agent"))
                }
                None => String::from("another agent"),
            };
            return Err(StoreError::invalid_state(
                "not your turn",
                format!("It is currently {holder}'s turn -- poll and retry when it is yours"),
            ));
        }

        let line_id = LineId::new();
        sqlx::query(
            r"INSERT INTO story_lines (id, story_id, agent_id, content, round_number)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(line_id.into_inner())
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(content)
        .bind(i32::try_from(story.current_round).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;

        sqlx::query(r"UPDATE agents SET last_active = now() WHERE id = $1")
            .bind(agent_id.into_inner())
            .execute(&mut *tx)
            .await?;

        // Advance the turn. The roster is stable under the story lock:
        // joins also lock the story row and are impossible once active.
        let roster = sqlx::query_as::<_, RosterRow>(
            r"SELECT agent_id, turn_order FROM story_participants
              WHERE story_id = $1 ORDER BY turn_order",
        )
        .bind(story_id.into_inner())
        .fetch_all(&mut *tx)
        .await?;

        let participant_count = u32::try_from(roster.len()).unwrap_or(u32::MAX);
        let turn_order = roster
            .iter()
            .find(|r| r.agent_id == agent_id.into_inner())
            .map(|r| u32::try_from(r.turn_order).unwrap_or(0))
            .ok_or_else(|| {
                StoreError::forbidden(
                    "you are not a participant in this story",
                    "Join a story before contributing lines",
                )
            })?;

        let advance = advance_turn(
            turn_order,
            participant_count,
            story.current_round,
            story.max_rounds,
        );

        match advance.next_turn_order {
            Some(next_order) => {
                let next_agent = roster
                    .iter()
                    .find(|r| u32::try_from(r.turn_order).unwrap_or(0) == next_order)
                    .map(|r| r.agent_id)
                    .ok_or_else(|| StoreError::Decode {
                        message: format!("no participant at turn_order {next_order}"),
                    })?;
                sqlx::query(
                    r"UPDATE stories SET current_round = $1, current_turn_agent_id = $2
                      WHERE id = $3",
                )
                .bind(i32::try_from(advance.next_round).unwrap_or(i32::MAX))
                .bind(next_agent)
                .bind(story_id.into_inner())
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    r"UPDATE stories
                      SET current_round = $1, current_turn_agent_id = NULL, status = 'judging'
                      WHERE id = $2",
                )
                .bind(i32::try_from(advance.next_round).unwrap_or(i32::MAX))
                .bind(story_id.into_inner())
                .execute(&mut *tx)
                .await?;
                tracing::info!(story = %story_id, "Rounds exhausted; story moved to judging");
            }
        }

        let updated = fetch_story_tx(&mut tx, story_id).await?;
        tx.commit().await?;

        Ok((
            LineAccepted {
                line_id,
                story: updated,
            },
            advance.enters_judging(),
        ))
    }

    /// End an active story early, forcing it into judging.
    ///
    /// Any participant may end the story; it does not have to be their
    /// turn. No line is added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidState`] if the story is not active and
    /// [`StoreError::Forbidden`] if the agent is not a participant.
    pub async fn end(&self, story_id: StoryId, agent_id: AgentId) -> Result<Story, StoreError> {
        let mut tx = self.pool.begin().await?;

        let story = lock_story(&mut tx, story_id).await?;
        if story.status != StoryStatus::Active {
            return Err(StoreError::invalid_state(
                format!(
                    "cannot end a story with status \"{}\"",
                    story_status_to_db(story.status)
                ),
                "Only active stories can be ended early",
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
                "you must be in this story to end it",
                "Only participants can end a story",
            ));
        }

        sqlx::query(
            r"UPDATE stories SET status = 'judging', current_turn_agent_id = NULL WHERE id = $1",
        )
        .bind(story_id.into_inner())
        .execute(&mut *tx)
        .await?;

        let updated = fetch_story_tx(&mut tx, story_id).await?;
        tx.commit().await?;

        tracing::info!(story = %story_id, ended_by = %agent_id, "Story ended early; now judging");
        Ok(updated)
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

/// Re-read a story inside the transaction that just mutated it.
async fn fetch_story_tx(
    tx: &mut Transaction<'_, Postgres>,
    story_id: StoryId,
) -> Result<Story, StoreError> {
    let row = sqlx::query_as::<_, StoryRow>(&format!(
        r"SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
    ))
    .bind(story_id.into_inner())
    .fetch_one(&mut **tx)
    .await?;

    row.into_story()
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `stories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StoryRow {
    pub(crate) id: Uuid,
    pub(crate) theme: String,
    pub(crate) status: String,
    pub(crate) max_rounds: i32,
    pub(crate) min_agents: i32,
    pub(crate) current_round: i32,
    pub(crate) current_turn_agent_id: Option<Uuid>,
    pub(crate) created_at: chrono::DateTime<chrono::Utc>,
}

impl StoryRow {
    pub(crate) fn into_story(self) -> Result<Story, StoreError> {
        Ok(Story {
            id: StoryId::from(self.id),
            theme: self.theme,
            status: story_status_from_db(&self.status)?,
            max_rounds: u32::try_from(self.max_rounds).unwrap_or(0),
            min_agents: u32::try_from(self.min_agents).unwrap_or(0),
            current_round: u32::try_from(self.current_round).unwrap_or(0),
            current_turn_agent_id: self.current_turn_agent_id.map(AgentId::from),
            created_at: self.created_at,
        })
    }
}

/// A roster row from `story_participants` joined with `agents`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ParticipantRow {
    id: Uuid,
    story_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    personality: String,
    secret_objective: String,
    turn_order: i32,
    joined_at: chrono::DateTime<chrono::Utc>,
}

impl ParticipantRow {
    fn into_participant(self) -> Participant {
        Participant {
            id: ParticipantId::from(self.id),
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

/// A line row joined with the author's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LineRow {
    id: Uuid,
    story_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    content: String,
    round_number: i32,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl LineRow {
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

/// Minimal roster projection used for turn advancement.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RosterRow {
    agent_id: Uuid,
    turn_order: i32,
}
