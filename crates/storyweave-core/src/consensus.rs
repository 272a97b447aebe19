//! Majority-vote consensus for plot twists.
//!
//! The denominator is the story's total participant count, not the votes
//! cast so far. A twist is approved the moment a strict majority of all
//! participants has voted yes, and rejected the moment a strict majority has
//! voted no. Either way a twist can be decided before everyone votes. A
//! twist whose thresholds are never crossed (an even split, or abstentions
//! that leave both sides short) stays in `voting` forever -- there is no
//! auto-resolution when the story completes.

use storyweave_types::TwistStatus;

/// Recompute a twist's status after a vote is recorded.
///
/// `participant_count` is P, the number of participants in the story;
/// `yes_votes` is Y and `total_votes` is V, both counted over this twist.
/// The strict-majority comparisons `Y > P/2` and `(V - Y) > P/2` are done
/// as `2Y > P` and `2(V - Y) > P` to avoid integer truncation.
pub const fn tally_twist(participant_count: u32, yes_votes: u32, total_votes: u32) -> TwistStatus {
    let no_votes = total_votes.saturating_sub(yes_votes);
    if yes_votes.saturating_mul(2) > participant_count {
        TwistStatus::Approved
    } else if no_votes.saturating_mul(2) > participant_count {
        TwistStatus::Rejected
    } else {
        TwistStatus::Voting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_participants_three_yes_approves() {
        // 3 > 4/2 on the third yes vote.
        assert_eq!(tally_twist(4, 1, 1), TwistStatus::Voting);
        assert_eq!(tally_twist(4, 2, 2), TwistStatus::Voting);
        assert_eq!(tally_twist(4, 3, 3), TwistStatus::Approved);
    }

    #[test]
    fn four_participants_three_no_rejects() {
        assert_eq!(tally_twist(4, 0, 2), TwistStatus::Voting);
        assert_eq!(tally_twist(4, 0, 3), TwistStatus::Rejected);
    }

    #[test]
    fn odd_count_majority() {
        // 3 participants: 2 yes is a strict majority.
        assert_eq!(tally_twist(3, 1, 1), TwistStatus::Voting);
        assert_eq!(tally_twist(3, 2, 2), TwistStatus::Approved);
        // 2 no rejects: even if the last vote were yes, 1 <= 3/2.
        assert_eq!(tally_twist(3, 0, 2), TwistStatus::Rejected);
    }

    #[test]
    fn even_split_never_resolves() {
        // 4 participants, 2 yes / 2 no: neither side can reach 3.
        assert_eq!(tally_twist(4, 2, 4), TwistStatus::Voting);
    }

    #[test]
    fn exact_half_is_not_a_majority() {
        // 2 yes of 4 is not > P/2.
        assert_eq!(tally_twist(4, 2, 3), TwistStatus::Voting);
    }

    #[test]
    fn two_participants_need_both() {
        // With P=2 a single yes (1 > 1) is not enough.
        assert_eq!(tally_twist(2, 1, 1), TwistStatus::Voting);
        assert_eq!(tally_twist(2, 2, 2), TwistStatus::Approved);
        assert_eq!(tally_twist(2, 0, 2), TwistStatus::Rejected);
    }

    #[test]
    fn resolution_is_reachable_before_all_votes() {
        // 5 participants: 3 yes approves with 2 abstentions outstanding.
        assert_eq!(tally_twist(5, 3, 3), TwistStatus::Approved);
    }
}
