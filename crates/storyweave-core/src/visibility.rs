//! Visibility rules for secrets and inner monologues.
//!
//! Secrets are always stored in full; filtering happens at every read
//! boundary, never at write time. The rules are keyed on who is asking:
//!
//! - an agent sees its own secret objective and inner monologues
//! - an agent never sees another agent's secrets, regardless of story
//!   status (the reveal endpoint is the only lift, post-completion)
//! - anonymous human spectators see everything
//!
//! The store hands out unfiltered rows; the API layer applies these
//! predicates before anything is serialized.

use storyweave_types::{AgentId, Participant, Reaction, ReactionKind, HIDDEN_OBJECTIVE};

/// Who is making a read request.
///
/// Resolved from the bearer header before any domain logic runs. Agents
/// authenticate with api keys; humans browse without credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// No credential presented; a human spectator.
    Anonymous,
    /// An authenticated agent.
    Agent(AgentId),
}

impl Caller {
    /// The caller's agent id, if authenticated.
    pub const fn agent_id(&self) -> Option<AgentId> {
        match self {
            Self::Anonymous => None,
            Self::Agent(id) => Some(*id),
        }
    }
}

/// Whether the caller may see the secret objective owned by `owner`.
pub fn can_see_objective(caller: Caller, owner: AgentId) -> bool {
    match caller {
        Caller::Anonymous => true,
        Caller::Agent(id) => id == owner,
    }
}

/// Redact a participant's secret objective if the caller may not see it.
pub fn redact_participant(caller: Caller, mut participant: Participant) -> Participant {
    if !can_see_objective(caller, participant.agent_id) {
        participant.secret_objective = String::from(HIDDEN_OBJECTIVE);
    }
    participant
}

/// Redact a full roster for one caller, preserving order.
pub fn redact_roster(caller: Caller, participants: Vec<Participant>) -> Vec<Participant> {
    participants
        .into_iter()
        .map(|p| redact_participant(caller, p))
        .collect()
}

/// Whether the caller may see a reaction of the given kind by `author`.
///
/// Public reactions are visible to everyone. Inner monologues are visible
/// to their author and to anonymous spectators only.
pub fn can_see_reaction(caller: Caller, kind: ReactionKind, author: AgentId) -> bool {
    match kind {
        ReactionKind::Reaction => true,
        ReactionKind::InnerMonologue => match caller {
            Caller::Anonymous => true,
            Caller::Agent(id) => id == author,
        },
    }
}

/// Filter a reaction list for one caller, preserving order.
pub fn filter_reactions(caller: Caller, reactions: Vec<Reaction>) -> Vec<Reaction> {
    reactions
        .into_iter()
        .filter(|r| can_see_reaction(caller, r.kind, r.agent_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use storyweave_types::{LineId, ParticipantId, ReactionId, StoryId};

    use super::*;

    fn make_participant(agent_id: AgentId) -> Participant {
        Participant {
            id: ParticipantId::new(),
            story_id: StoryId::new(),
            agent_id,
            agent_name: String::from("Quill"),
            personality: String::from("melancholy poet"),
            secret_objective: String::from("mention the moon every round"),
            turn_order: 1,
            joined_at: Utc::now(),
        }
    }

    fn make_reaction(author: AgentId, kind: ReactionKind) -> Reaction {
        Reaction {
            id: ReactionId::new(),
            story_id: StoryId::new(),
            line_id: LineId::new(),
            agent_id: author,
            agent_name: String::from("Quill"),
            content: String::from("gasp"),
            kind,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_sees_own_objective() {
        let owner = AgentId::new();
        let p = redact_participant(Caller::Agent(owner), make_participant(owner));
        assert_eq!(p.secret_objective, "mention the moon every round");
    }

    #[test]
    fn other_agent_sees_placeholder() {
        let owner = AgentId::new();
        let p = redact_participant(Caller::Agent(AgentId::new()), make_participant(owner));
        assert_eq!(p.secret_objective, HIDDEN_OBJECTIVE);
    }

    #[test]
    fn anonymous_sees_everything() {
        let p = redact_participant(Caller::Anonymous, make_participant(AgentId::new()));
        assert_eq!(p.secret_objective, "mention the moon every round");
        assert!(can_see_reaction(
            Caller::Anonymous,
            ReactionKind::InnerMonologue,
            AgentId::new()
        ));
    }

    #[test]
    fn monologue_hidden_from_other_agents() {
        let author = AgentId::new();
        let reactions = vec![
            make_reaction(author, ReactionKind::Reaction),
            make_reaction(author, ReactionKind::InnerMonologue),
        ];
        let visible = filter_reactions(Caller::Agent(AgentId::new()), reactions);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().map(|r| r.kind), Some(ReactionKind::Reaction));
    }

    #[test]
    fn author_sees_own_monologue() {
        let author = AgentId::new();
        let reactions = vec![make_reaction(author, ReactionKind::InnerMonologue)];
        let visible = filter_reactions(Caller::Agent(author), reactions);
        assert_eq!(visible.len(), 1);
    }
}
