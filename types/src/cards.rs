//! Playing-card encoding and the no-replacement deck.
//!
//! Cards are encoded as `0..=51`, where:
//! - suit = code / 13 (0..=3)
//! - rank = code % 13 + 1 (1..=13, Ace = 1)
//!
//! Suits 1 and 2 (hearts, diamonds) are red; 0 and 3 (spades, clubs) are
//! black.

use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};

/// Total cards in a standard deck.
pub const CARDS_PER_DECK: u8 = 52;

/// Ranks per suit.
pub const RANKS_PER_SUIT: u8 = 13;

/// Returns true if `code` is within `0..CARDS_PER_DECK`.
pub fn is_valid_code(code: u8) -> bool {
    code < CARDS_PER_DECK
}

/// Returns the 1-based rank (1..=13), where 1 is Ace and 13 is King.
pub fn card_rank(code: u8) -> u8 {
    code % RANKS_PER_SUIT + 1
}

/// Returns the suit (0..=3).
pub fn card_suit(code: u8) -> u8 {
    code / RANKS_PER_SUIT
}

/// Returns the rank for high-card comparisons (2..=14), Ace high.
pub fn card_rank_ace_high(code: u8) -> u8 {
    let rank = card_rank(code);
    if rank == 1 {
        14
    } else {
        rank
    }
}

/// Returns true if the suit renders red (hearts or diamonds).
pub fn is_red_suit(suit: u8) -> bool {
    suit == 1 || suit == 2
}

/// Returns true if the card counts as ten in Blackjack (T, J, Q, K).
pub fn is_ten_value(code: u8) -> bool {
    card_rank(code) >= 10
}

/// A single playing card, the decoded form of a card code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// 1..=13, Ace = 1.
    pub rank: u8,
    /// 0..=3.
    pub suit: u8,
}

impl Card {
    /// Decode a card code. Returns `None` for codes outside `0..52`.
    pub fn from_code(code: u8) -> Option<Self> {
        if !is_valid_code(code) {
            return None;
        }
        Some(Self {
            rank: card_rank(code),
            suit: card_suit(code),
        })
    }

    /// Encode back to the canonical code.
    pub fn code(&self) -> u8 {
        self.suit * RANKS_PER_SUIT + (self.rank - 1)
    }
}

/// The remaining pool of one shoe, drawn without replacement.
///
/// `remaining.len() + draws == 52` holds for the whole life of the shoe;
/// `draws` doubles as the draw index fed to the draw primitive for the
/// next draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeckState {
    pub remaining: Vec<u8>,
    pub draws: u32,
}

impl DeckState {
    /// A full 52-card shoe with no draws taken.
    pub fn fresh() -> Self {
        Self {
            remaining: (0..CARDS_PER_DECK).collect(),
            draws: 0,
        }
    }

    /// Number of cards left in the shoe.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Remove the card at `position`, compacting by swap-to-end and
    /// advancing the draw counter.
    ///
    /// Panics if `position` is out of bounds; callers derive the position
    /// from the draw primitive with `range = remaining.len()` so the bound
    /// always holds.
    pub fn take(&mut self, position: usize) -> u8 {
        let code = self.remaining.swap_remove(position);
        self.draws += 1;
        code
    }

    fn is_consistent(&self) -> bool {
        if self.remaining.len() + self.draws as usize != CARDS_PER_DECK as usize {
            return false;
        }
        let mut seen = [false; CARDS_PER_DECK as usize];
        for &code in &self.remaining {
            if !is_valid_code(code) || seen[code as usize] {
                return false;
            }
            seen[code as usize] = true;
        }
        true
    }
}

impl Write for DeckState {
    fn write(&self, writer: &mut impl BufMut) {
        self.remaining.write(writer);
        self.draws.write(writer);
    }
}

impl Read for DeckState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let deck = Self {
            remaining: Vec::<u8>::read_range(reader, 0..=CARDS_PER_DECK as usize)?,
            draws: u32::read(reader)?,
        };
        if !deck.is_consistent() {
            return Err(Error::Invalid("DeckState", "card pool inconsistent"));
        }
        Ok(deck)
    }
}

impl EncodeSize for DeckState {
    fn encode_size(&self) -> usize {
        self.remaining.encode_size() + self.draws.encode_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt as _, Encode};

    #[test]
    fn test_code_card_bijection() {
        for code in 0..CARDS_PER_DECK {
            let card = Card::from_code(code).expect("valid code");
            assert!(card.rank >= 1 && card.rank <= 13);
            assert!(card.suit <= 3);
            assert_eq!(card.code(), code);
        }
        assert_eq!(Card::from_code(52), None);
    }

    #[test]
    fn test_rank_and_suit() {
        // Ace of each suit
        assert_eq!(card_rank(0), 1);
        assert_eq!(card_rank(13), 1);
        assert_eq!(card_rank(26), 1);
        assert_eq!(card_rank(39), 1);

        // King of spades
        assert_eq!(card_rank(12), 13);
        assert_eq!(card_suit(12), 0);

        // Ten-values
        assert!(is_ten_value(9)); // ten
        assert!(is_ten_value(12)); // king
        assert!(!is_ten_value(8)); // nine
    }

    #[test]
    fn test_fresh_deck_invariant() {
        let mut deck = DeckState::fresh();
        assert_eq!(deck.len(), 52);
        assert_eq!(deck.draws, 0);

        let code = deck.take(0);
        assert!(is_valid_code(code));
        assert_eq!(deck.len(), 51);
        assert_eq!(deck.draws, 1);
        assert!(!deck.remaining.contains(&code));
    }

    #[test]
    fn test_deck_codec_roundtrip() {
        let mut deck = DeckState::fresh();
        deck.take(5);
        deck.take(17);

        let encoded = deck.encode();
        let decoded = DeckState::decode(encoded.as_ref()).expect("decode");
        assert_eq!(decoded, deck);
    }

    #[test]
    fn test_deck_codec_rejects_duplicates() {
        let deck = DeckState {
            remaining: vec![0, 0, 1],
            draws: 49,
        };
        let encoded = deck.encode();
        assert!(DeckState::decode(encoded.as_ref()).is_err());
    }

    #[test]
    fn test_deck_codec_rejects_bad_counter() {
        let deck = DeckState {
            remaining: vec![0, 1, 2],
            draws: 10,
        };
        let encoded = deck.encode();
        assert!(DeckState::decode(encoded.as_ref()).is_err());
    }
}
