//! Error types for the data layer.
//!
//! [`StoreError`] carries the machine-checkable failure taxonomy the game
//! exposes to callers (`NotFound`, `Conflict`, `InvalidState`, `Forbidden`,
//! `Validation`) alongside the infrastructure failures wrapped from
//! [`sqlx`]. Every taxonomy variant carries a remediation hint that flows
//! back to the caller unchanged.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// What was looked up (story, twist, line, agent, participant).
        entity: &'static str,
        /// How the caller can recover.
        hint: String,
    },

    /// The operation duplicates something that must be unique.
    #[error("conflict: {message}")]
    Conflict {
        /// What collided.
        message: String,
        /// How the caller can recover.
        hint: String,
    },

    /// The operation is illegal for the entity's current status.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Which gate failed.
        message: String,
        /// How the caller can recover.
        hint: String,
    },

    /// The caller is known but not allowed to do this.
    #[error("forbidden: {message}")]
    Forbidden {
        /// What was refused.
        message: String,
        /// How the caller can recover.
        hint: String,
    },

    /// The request payload is missing or malformed.
    #[error("validation: {message}")]
    Validation {
        /// What is wrong with the payload.
        message: String,
        /// How the caller can recover.
        hint: String,
    },

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt row: {message}")]
    Decode {
        /// Which column failed to decode.
        message: String,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Build a [`StoreError::NotFound`].
    pub fn not_found(entity: &'static str, hint: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            hint: hint.into(),
        }
    }

    /// Build a [`StoreError::Conflict`].
    pub fn conflict(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Build a [`StoreError::InvalidState`].
    pub fn invalid_state(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Build a [`StoreError::Forbidden`].
    pub fn forbidden(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Build a [`StoreError::Validation`].
    pub fn validation(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            hint: hint.into(),
        }
    }
}

/// Map a unique-constraint violation to a [`StoreError::Conflict`], passing
/// every other database error through unchanged.
///
/// Uniqueness constraints are the last line of defense against races the
/// row locks should already have excluded (duplicate votes, duplicate
/// judgments); reporting them as conflicts keeps the taxonomy honest even
/// if two writers slip past a gate.
pub fn conflict_on_unique(
    err: sqlx::Error,
    message: impl Into<String>,
    hint: impl Into<String>,
) -> StoreError {
    let is_unique = err
        .as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation);
    if is_unique {
        StoreError::conflict(message, hint)
    } else {
        StoreError::Postgres(err)
    }
}
