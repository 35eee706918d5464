//! Round engines for the supported games.
//!
//! Each engine is a pure state machine over its round type: it validates
//! the requested action against the current state before any mutation,
//! advances the state with draws from the round's captured seed inputs,
//! and reports the money the action moved. Balance movement itself is the
//! service layer's job.

pub mod blackjack;
pub mod hilo;
pub mod roulette;

use fairdeck_types::cards::{card_rank, card_suit};
use fairdeck_types::Card;

/// Money moved by one applied action: `staked` is debited before the new
/// state is persisted, `credited` is paid out after.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionReceipt {
    pub staked: u64,
    pub credited: u64,
}

/// Decode a card code known to be valid (drawn from a consistent deck).
pub(crate) fn decode_card(code: u8) -> Card {
    Card {
        rank: card_rank(code),
        suit: card_suit(code),
    }
}
