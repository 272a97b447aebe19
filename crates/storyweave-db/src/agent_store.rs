//! Agent registration, claiming, and identity resolution.
//!
//! Registration is the only moment the api key and claim token exist in a
//! response; they are stored and never shown again. The claim flip is a
//! single guarded UPDATE so two concurrent claims cannot both succeed.

use rand::distr::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;
use storyweave_types::{Agent, AgentId, ClaimStatus};
use uuid::Uuid;

use crate::error::{conflict_on_unique, StoreError};
use crate::labels::{claim_status_from_db, claim_status_to_db};

/// Length of the random part of an api key.
const API_KEY_LEN: usize = 32;

/// Length of the random part of a claim token.
const CLAIM_TOKEN_LEN: usize = 24;

/// Operations on the `agents` table.
pub struct AgentStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AgentStore<'a> {
    /// Create a new agent store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a new agent with a unique (case-insensitive) name.
    ///
    /// Generates the api key and claim token. The returned [`Agent`] is the
    /// only copy of either secret the caller will ever see.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the name is already taken.
    pub async fn register(&self, name: &str, description: &str) -> Result<Agent, StoreError> {
        let id = AgentId::new();
        let api_key = format!("sw_{}", random_token(API_KEY_LEN));
        let claim_token = format!("sw_claim_{}", random_token(CLAIM_TOKEN_LEN));

        let row = sqlx::query_as::<_, AgentRow>(
            r"INSERT INTO agents (id, name, description, api_key, claim_token, claim_status)
              VALUES ($1, $2, $3, $4, $5, $6::claim_status)
              RETURNING id, name, description, api_key, claim_token,
                        claim_status::TEXT AS claim_status, created_at, last_active",
        )
        .bind(id.into_inner())
        .bind(name)
        .bind(description)
        .bind(&api_key)
        .bind(&claim_token)
        .bind(claim_status_to_db(ClaimStatus::Unclaimed))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(
                e,
                format!("agent name \"{name}\" is already taken"),
                "Choose a different agent name",
            )
        })?;

        tracing::info!(agent = name, "Agent registered");
        row.into_agent()
    }

    /// Flip an agent from unclaimed to claimed using its one-time token.
    ///
    /// The flip is permanent. The gate and the mutation are one UPDATE
    /// guarded on the current status, so a lost race reports as a conflict
    /// rather than silently re-claiming.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown token and
    /// [`StoreError::Conflict`] if the agent is already claimed.
    pub async fn claim(&self, claim_token: &str) -> Result<Agent, StoreError> {
        let claimed = sqlx::query_as::<_, AgentRow>(
            r"UPDATE agents
              SET claim_status = 'claimed'
              WHERE claim_token = $1 AND claim_status = 'unclaimed'
              RETURNING id, name, description, api_key, claim_token,
                        claim_status::TEXT AS claim_status, created_at, last_active",
        )
        .bind(claim_token)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = claimed {
            tracing::info!(agent = row.name, "Agent claimed");
            return row.into_agent();
        }

        // Distinguish an unknown token from a second claim attempt.
        let existing = sqlx::query_scalar::<_, String>(
            r"SELECT claim_status::TEXT FROM agents WHERE claim_token = $1",
        )
        .bind(claim_token)
        .fetch_optional(self.pool)
        .await?;

        match existing {
            Some(_) => Err(StoreError::conflict(
                "this agent has already been claimed",
                "The claim token is single-use",
            )),
            None => Err(StoreError::not_found(
                "claim token",
                "Provide the claim_token returned at registration",
            )),
        }
    }

    /// Resolve a bearer api key to an agent identity.
    ///
    /// Returns `None` for an unknown key; the API layer decides whether
    /// that means anonymous or unauthorized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn find_by_api_key(&self, api_key: &str) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query_as::<_, AgentRow>(
            r"SELECT id, name, description, api_key, claim_token,
                     claim_status::TEXT AS claim_status, created_at, last_active
              FROM agents WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(self.pool)
        .await?;

        row.map(AgentRow::into_agent).transpose()
    }

    /// Fetch an agent by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn get(&self, id: AgentId) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query_as::<_, AgentRow>(
            r"SELECT id, name, description, api_key, claim_token,
                     claim_status::TEXT AS claim_status, created_at, last_active
              FROM agents WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(AgentRow::into_agent).transpose()
    }
}

/// A row from the `agents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct AgentRow {
    id: Uuid,
    name: String,
    description: String,
    api_key: String,
    claim_token: String,
    claim_status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    last_active: chrono::DateTime<chrono::Utc>,
}

impl AgentRow {
    fn into_agent(self) -> Result<Agent, StoreError> {
        Ok(Agent {
            id: AgentId::from(self.id),
            name: self.name,
            description: self.description,
            api_key: self.api_key,
            claim_token: self.claim_token,
            claim_status: claim_status_from_db(&self.claim_status)?,
            created_at: self.created_at,
            last_active: self.last_active,
        })
    }
}

/// Generate a random alphanumeric token of the given length.
fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_have_requested_length_and_charset() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(char::is_alphanumeric));
    }

    #[test]
    fn tokens_are_not_repeated() {
        // Astronomically unlikely to collide; a repeat means the RNG is
        // not being re-sampled.
        assert_ne!(random_token(24), random_token(24));
    }
}
