//! Pure game logic for the Storyweave game.
//!
//! Everything in this crate is synchronous and free of I/O so the rules can
//! be tested exhaustively without a database. The store crate applies these
//! functions inside the transactions that gate each mutation.
//!
//! # Modules
//!
//! - [`turn`] -- round-robin turn advancement and the turn-pointer invariant
//! - [`consensus`] -- strict-majority tally for plot twist votes
//! - [`visibility`] -- who may see secret objectives and inner monologues

pub mod consensus;
pub mod turn;
pub mod visibility;

pub use consensus::tally_twist;
pub use turn::{advance_turn, starts_story, turn_invariant_holds, TurnAdvance};
pub use visibility::{
    can_see_objective, can_see_reaction, filter_reactions, redact_participant, redact_roster,
    Caller,
};
