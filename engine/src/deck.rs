//! Draw-without-replacement over a [`DeckState`].
//!
//! The deck's draw counter doubles as the draw index fed to the draw
//! primitive, so draws within a round are strictly sequential: draw N+1
//! operates on the pool left behind by draw N. Removal compacts by
//! swap-to-end; any deterministic compaction works as long as it matches
//! how the range shrinks, and this one is O(1).

use crate::draw::DrawContext;
use fairdeck_types::cards::{card_rank, card_suit};
use fairdeck_types::{Card, DeckState, ValidationError};

/// Draw the next card from the shoe.
pub fn draw(deck: &mut DeckState, ctx: &DrawContext) -> Result<Card, ValidationError> {
    let code = draw_code(deck, ctx)?;
    Ok(Card {
        rank: card_rank(code),
        suit: card_suit(code),
    })
}

/// Draw the next card and return its raw code. The round engines store
/// codes, not decoded cards.
pub(crate) fn draw_code(deck: &mut DeckState, ctx: &DrawContext) -> Result<u8, ValidationError> {
    if deck.is_empty() {
        return Err(ValidationError::DeckExhausted);
    }
    let position = ctx.draw(deck.draws, deck.len() as u32) as usize;
    Ok(deck.take(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdeck_types::CARDS_PER_DECK;
    use proptest::prelude::*;

    fn ctx_draw_all(secret: &[u8; 32], client_seed: &str, nonce: u64) -> Vec<u8> {
        let ctx = DrawContext::new(secret, client_seed, nonce);
        let mut deck = DeckState::fresh();
        (0..CARDS_PER_DECK)
            .map(|_| draw_code(&mut deck, &ctx).expect("deck has cards"))
            .collect()
    }

    #[test]
    fn test_full_deck_draw_is_a_permutation() {
        let codes = ctx_draw_all(&[5u8; 32], "client", 9);
        assert_eq!(codes.len(), 52);
        let mut seen = [false; 52];
        for code in codes {
            assert!(!seen[code as usize], "code {} drawn twice", code);
            seen[code as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let a = ctx_draw_all(&[8u8; 32], "abc", 4);
        let b = ctx_draw_all(&[8u8; 32], "abc", 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sequence_depends_on_nonce() {
        let a = ctx_draw_all(&[8u8; 32], "abc", 4);
        let b = ctx_draw_all(&[8u8; 32], "abc", 5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_deck_is_rejected() {
        let secret = [1u8; 32];
        let ctx = DrawContext::new(&secret, "c", 0);
        let mut deck = DeckState {
            remaining: vec![],
            draws: 52,
        };
        assert_eq!(
            draw_code(&mut deck, &ctx),
            Err(ValidationError::DeckExhausted)
        );
    }

    proptest! {
        #[test]
        fn prop_no_replacement_completeness(fill in 0u8..=255, nonce in 0u64..500) {
            let codes = ctx_draw_all(&[fill; 32], "prop", nonce);
            let mut sorted = codes.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), 52);
        }
    }
}
