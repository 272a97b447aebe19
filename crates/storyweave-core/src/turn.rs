//! Turn advancement for the round-robin story scheduler.
//!
//! Turn order is a dense 1..N ranking fixed at join time. Each accepted line
//! moves the turn pointer forward; the last writer of a round either wraps
//! to position 1 or, when the rounds are exhausted, retires the story into
//! judging. The functions here are pure; the store applies their results
//! inside the same transaction that accepted the line.

use storyweave_types::{Story, StoryStatus};

/// Where the turn pointer goes after a line is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnAdvance {
    /// The round after this line. Unchanged unless the round's last
    /// participant just wrote.
    pub next_round: u32,
    /// The turn_order of the next writer, or `None` when the rounds are
    /// exhausted and the story moves to judging.
    pub next_turn_order: Option<u32>,
}

impl TurnAdvance {
    /// Whether this advancement retires the story into judging.
    pub const fn enters_judging(&self) -> bool {
        self.next_turn_order.is_none()
    }
}

/// Compute the turn pointer's next position.
///
/// `turn_order` is the 1-based position of the agent whose line was just
/// accepted, among `participant_count` participants, during `current_round`
/// of at most `max_rounds` rounds.
///
/// - mid-round: the pointer moves to `turn_order + 1`, round unchanged
/// - end of round: the round increments; the pointer wraps to position 1,
///   or clears entirely once the new round exceeds `max_rounds`
pub const fn advance_turn(
    turn_order: u32,
    participant_count: u32,
    current_round: u32,
    max_rounds: u32,
) -> TurnAdvance {
    if turn_order < participant_count {
        return TurnAdvance {
            next_round: current_round,
            next_turn_order: Some(turn_order.saturating_add(1)),
        };
    }

    let next_round = current_round.saturating_add(1);
    if next_round > max_rounds {
        TurnAdvance {
            next_round,
            next_turn_order: None,
        }
    } else {
        TurnAdvance {
            next_round,
            next_turn_order: Some(1),
        }
    }
}

/// Whether a join brings the story to its starting threshold.
///
/// The Nth joiner that satisfies `min_agents` flips the story to active
/// inside the same transaction as its own insert.
pub const fn starts_story(participant_count: u32, min_agents: u32) -> bool {
    participant_count >= min_agents
}

/// Check the turn-pointer invariant: `current_turn_agent_id` is non-null
/// iff the story is active.
pub const fn turn_invariant_holds(story: &Story) -> bool {
    match story.status {
        StoryStatus::Active => story.current_turn_agent_id.is_some(),
        StoryStatus::Waiting | StoryStatus::Judging | StoryStatus::Completed => {
            story.current_turn_agent_id.is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use storyweave_types::{AgentId, StoryId};

    use super::*;

    fn make_story(status: StoryStatus, turn: Option<AgentId>) -> Story {
        Story {
            id: StoryId::new(),
            theme: String::from("haunted lighthouse"),
            status,
            max_rounds: 5,
            min_agents: 2,
            current_round: 1,
            current_turn_agent_id: turn,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn mid_round_passes_to_next_order() {
        let adv = advance_turn(1, 3, 2, 5);
        assert_eq!(adv.next_round, 2);
        assert_eq!(adv.next_turn_order, Some(2));
        assert!(!adv.enters_judging());
    }

    #[test]
    fn last_in_round_wraps_to_first() {
        let adv = advance_turn(3, 3, 2, 5);
        assert_eq!(adv.next_round, 3);
        assert_eq!(adv.next_turn_order, Some(1));
    }

    #[test]
    fn last_round_last_writer_retires_story() {
        let adv = advance_turn(3, 3, 5, 5);
        assert_eq!(adv.next_round, 6);
        assert_eq!(adv.next_turn_order, None);
        assert!(adv.enters_judging());
    }

    #[test]
    fn single_participant_story_counts_rounds() {
        // One participant: every line ends a round.
        let adv = advance_turn(1, 1, 1, 3);
        assert_eq!(adv.next_round, 2);
        assert_eq!(adv.next_turn_order, Some(1));

        let last = advance_turn(1, 1, 3, 3);
        assert!(last.enters_judging());
    }

    #[test]
    fn exactly_n_times_r_lines_accepted() {
        // N participants and R rounds accept exactly N*R lines before
        // the advancement retires the story.
        let (n, r) = (4_u32, 3_u32);
        let mut round = 1;
        let mut order = 1;
        let mut accepted = 0;
        loop {
            accepted += 1;
            let adv = advance_turn(order, n, round, r);
            round = adv.next_round;
            match adv.next_turn_order {
                Some(next) => order = next,
                None => break,
            }
        }
        assert_eq!(accepted, n * r);
    }

    #[test]
    fn two_agents_two_rounds_alternate_then_retire() {
        // min_agents=2, max_rounds=2: A, B alternate; A's third line
        // pushes the round past max_rounds.
        let a_first = advance_turn(1, 2, 1, 2);
        assert_eq!((a_first.next_round, a_first.next_turn_order), (1, Some(2)));

        let b_first = advance_turn(2, 2, 1, 2);
        assert_eq!((b_first.next_round, b_first.next_turn_order), (2, Some(1)));

        let a_second = advance_turn(1, 2, 2, 2);
        assert_eq!((a_second.next_round, a_second.next_turn_order), (2, Some(2)));

        let b_second = advance_turn(2, 2, 2, 2);
        assert_eq!(b_second.next_round, 3);
        assert!(b_second.enters_judging());
    }

    #[test]
    fn start_threshold() {
        assert!(!starts_story(1, 2));
        assert!(starts_story(2, 2));
        assert!(starts_story(3, 2));
    }

    #[test]
    fn invariant_active_requires_turn_pointer() {
        assert!(turn_invariant_holds(&make_story(
            StoryStatus::Active,
            Some(AgentId::new())
        )));
        assert!(!turn_invariant_holds(&make_story(StoryStatus::Active, None)));
        assert!(turn_invariant_holds(&make_story(StoryStatus::Waiting, None)));
        assert!(!turn_invariant_holds(&make_story(
            StoryStatus::Judging,
            Some(AgentId::new())
        )));
        assert!(turn_invariant_holds(&make_story(StoryStatus::Completed, None)));
    }
}
