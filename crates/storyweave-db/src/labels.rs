//! Conversions between domain enums and `PostgreSQL` enum labels.
//!
//! Queries cast `PostgreSQL` enums to `TEXT` on the way out and bind the
//! label strings with an explicit `::enum` cast on the way in, so the
//! whole data layer works without compile-time database access.

use storyweave_types::{ClaimStatus, ReactionKind, StoryStatus, TwistStatus, VoteChoice};

use crate::error::StoreError;

/// Convert a [`StoryStatus`] to its `PostgreSQL` enum label.
pub(crate) const fn story_status_to_db(status: StoryStatus) -> &'static str {
    match status {
        StoryStatus::Waiting => "waiting",
        StoryStatus::Active => "active",
        StoryStatus::Judging => "judging",
        StoryStatus::Completed => "completed",
    }
}

/// Parse a `story_status` label read back from the database.
pub(crate) fn story_status_from_db(label: &str) -> Result<StoryStatus, StoreError> {
    match label {
        "waiting" => Ok(StoryStatus::Waiting),
        "active" => Ok(StoryStatus::Active),
        "judging" => Ok(StoryStatus::Judging),
        "completed" => Ok(StoryStatus::Completed),
        other => Err(StoreError::Decode {
            message: format!("unknown story_status label: {other}"),
        }),
    }
}

/// Convert a [`TwistStatus`] to its `PostgreSQL` enum label.
pub(crate) const fn twist_status_to_db(status: TwistStatus) -> &'static str {
    match status {
        TwistStatus::Voting => "voting",
        TwistStatus::Approved => "approved",
        TwistStatus::Rejected => "rejected",
    }
}

/// Parse a `twist_status` label read back from the database.
pub(crate) fn twist_status_from_db(label: &str) -> Result<TwistStatus, StoreError> {
    match label {
        "voting" => Ok(TwistStatus::Voting),
        "approved" => Ok(TwistStatus::Approved),
        "rejected" => Ok(TwistStatus::Rejected),
        other => Err(StoreError::Decode {
            message: format!("unknown twist_status label: {other}"),
        }),
    }
}

/// Convert a [`ClaimStatus`] to its `PostgreSQL` enum label.
pub(crate) const fn claim_status_to_db(status: ClaimStatus) -> &'static str {
    match status {
        ClaimStatus::Unclaimed => "unclaimed",
        ClaimStatus::Claimed => "claimed",
    }
}

/// Parse a `claim_status` label read back from the database.
pub(crate) fn claim_status_from_db(label: &str) -> Result<ClaimStatus, StoreError> {
    match label {
        "unclaimed" => Ok(ClaimStatus::Unclaimed),
        "claimed" => Ok(ClaimStatus::Claimed),
        other => Err(StoreError::Decode {
            message: format!("unknown claim_status label: {other}"),
        }),
    }
}

/// Convert a [`ReactionKind`] to its `PostgreSQL` enum label.
pub(crate) const fn reaction_kind_to_db(kind: ReactionKind) -> &'static str {
    match kind {
        ReactionKind::Reaction => "reaction",
        ReactionKind::InnerMonologue => "inner_monologue",
    }
}

/// Parse a `reaction_kind` label read back from the database.
pub(crate) fn reaction_kind_from_db(label: &str) -> Result<ReactionKind, StoreError> {
    match label {
        "reaction" => Ok(ReactionKind::Reaction),
        "inner_monologue" => Ok(ReactionKind::InnerMonologue),
        other => Err(StoreError::Decode {
            message: format!("unknown reaction_kind label: {other}"),
        }),
    }
}

/// Convert a [`VoteChoice`] to its `PostgreSQL` enum label.
pub(crate) const fn vote_choice_to_db(choice: VoteChoice) -> &'static str {
    match choice {
        VoteChoice::Yes => "yes",
        VoteChoice::No => "no",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_status_labels_roundtrip() {
        for status in [
            StoryStatus::Waiting,
            StoryStatus::Active,
            StoryStatus::Judging,
            StoryStatus::Completed,
        ] {
            let parsed = story_status_from_db(story_status_to_db(status)).ok();
            assert_eq!(parsed, Some(status));
        }
    }

    #[test]
    fn unknown_label_is_a_decode_error() {
        assert!(story_status_from_db("paused").is_err());
        assert!(twist_status_from_db("tied").is_err());
    }
}
