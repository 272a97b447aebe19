//! Reactions and inner monologues attached to story lines.
//!
//! Both kinds share one table, discriminated by the `reaction_kind` enum;
//! visibility is decided at read time from the tag and the caller identity
//! (see `storyweave_core::visibility`), never at write time.

use sqlx::PgPool;
use storyweave_types::{AgentId, LineId, Reaction, ReactionId, ReactionKind, StoryId};
use uuid::Uuid;

use crate::error::StoreError;
use crate::labels::{reaction_kind_from_db, reaction_kind_to_db};

/// Operations on the `reactions` table.
pub struct ReactionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ReactionStore<'a> {
    /// Create a new reaction store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach a reaction to a line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the line does not belong to the
    /// story and [`StoreError::Forbidden`] if the agent is not a
    /// participant.
    pub async fn post(
        &self,
        story_id: StoryId,
        agent_id: AgentId,
        line_id: LineId,
        content: &str,
        kind: ReactionKind,
    ) -> Result<ReactionId, StoreError> {
        let line_exists = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_lines WHERE id = $1 AND story_id = $2",
        )
        .bind(line_id.into_inner())
        .bind(story_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        if line_exists == 0 {
            return Err(StoreError::not_found(
                "line",
                "That line does not exist in this story",
            ));
        }

        let is_participant = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM story_participants WHERE story_id = $1 AND agent_id = $2",
        )
        .bind(story_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_one(self.pool)
        .await?;
        if is_participant == 0 {
            return Err(StoreError::forbidden(
                "you must be in this story to react",
                "Join the story first",
            ));
        }

        let reaction_id = ReactionId::new();
        sqlx::query(
            r"INSERT INTO reactions (id, story_id, line_id, agent_id, content, kind)
              VALUES ($1, $2, $3, $4, $5, $6::reaction_kind)",
        )
        .bind(reaction_id.into_inner())
        .bind(story_id.into_inner())
        .bind(line_id.into_inner())
        .bind(agent_id.into_inner())
        .bind(content)
        .bind(reaction_kind_to_db(kind))
        .execute(self.pool)
        .await?;

        tracing::debug!(story = %story_id, line = %line_id, ?kind, "Reaction posted");
        Ok(reaction_id)
    }

    /// Fetch all of a story's reactions in creation order, unfiltered.
    ///
    /// The API layer applies the caller-specific visibility filter before
    /// serializing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list(&self, story_id: StoryId) -> Result<Vec<Reaction>, StoreError> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            r"SELECT r.id, r.story_id, r.line_id, r.agent_id, a.name AS agent_name,
                     r.content, r.kind::TEXT AS kind, r.created_at
              FROM reactions r
              JOIN agents a ON a.id = r.agent_id
              WHERE r.story_id = $1
              ORDER BY r.created_at",
        )
        .bind(story_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ReactionRow::into_reaction).collect()
    }
}

/// A row from the `reactions` table joined with the author's name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReactionRow {
    id: Uuid,
    story_id: Uuid,
    line_id: Uuid,
    agent_id: Uuid,
    agent_name: String,
    content: String,
    kind: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ReactionRow {
    fn into_reaction(self) -> Result<Reaction, StoreError> {
        Ok(Reaction {
            id: ReactionId::from(self.id),
            story_id: StoryId::from(self.story_id),
            line_id: LineId::from(self.line_id),
            agent_id: AgentId::from(self.agent_id),
            agent_name: self.agent_name,
            content: self.content,
            kind: reaction_kind_from_db(&self.kind)?,
            created_at: self.created_at,
        })
    }
}
