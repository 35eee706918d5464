//! Public verification of revealed rounds.
//!
//! Once a server seed is rotated out and its secret revealed, anyone can
//! recompute the exact draw sequence of every round played against it.
//! These functions are the reference implementation of that check: they
//! run the same deck and draw primitive the live engine runs, so a
//! reproduced sequence is byte-for-byte the sequence the round saw.

use crate::deck;
use crate::draw::DrawContext;
use crate::games::roulette;
use crate::seed::commitment_of;
use fairdeck_types::{Card, Commitment, DeckState, ValidationError, CARDS_PER_DECK};

/// Check that a revealed secret matches a published commitment.
pub fn verify_commitment(secret: &[u8; 32], commitment: &Commitment) -> bool {
    &commitment_of(secret) == commitment
}

/// Reproduce the first `draw_count` no-replacement card draws a round
/// with these parameters produced. `draw_count` may not exceed the deck.
pub fn verify_draws(
    secret: &[u8; 32],
    client_seed: &str,
    nonce: u64,
    draw_count: u8,
) -> Result<Vec<Card>, ValidationError> {
    if draw_count > CARDS_PER_DECK {
        return Err(ValidationError::DeckExhausted);
    }
    let ctx = DrawContext::new(secret, client_seed, nonce);
    let mut deck = DeckState::fresh();
    let mut cards = Vec::with_capacity(draw_count as usize);
    for _ in 0..draw_count {
        cards.push(deck::draw(&mut deck, &ctx)?);
    }
    Ok(cards)
}

/// Reproduce a roulette spin outcome for these parameters.
pub fn verify_roulette(secret: &[u8; 32], client_seed: &str, nonce: u64) -> u8 {
    let ctx = DrawContext::new(secret, client_seed, nonce);
    roulette::spin(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::draw as deck_draw;

    #[test]
    fn test_verify_commitment() {
        let secret = [0x21u8; 32];
        let commitment = commitment_of(&secret);
        assert!(verify_commitment(&secret, &commitment));
        let mut tampered = secret;
        tampered[0] ^= 0xFF;
        assert!(!verify_commitment(&tampered, &commitment));
    }

    #[test]
    fn test_verify_draws_replays_live_sequence() {
        let secret = [0x33u8; 32];
        let ctx = DrawContext::new(&secret, "replay", 12);

        // Simulate a live round drawing nine cards.
        let mut deck = DeckState::fresh();
        let live: Vec<Card> = (0..9)
            .map(|_| deck_draw(&mut deck, &ctx).expect("draw"))
            .collect();

        let replayed = verify_draws(&secret, "replay", 12, 9).expect("replay");
        assert_eq!(replayed, live);
    }

    #[test]
    fn test_verify_draws_full_deck() {
        let secret = [0x44u8; 32];
        let cards = verify_draws(&secret, "full", 0, 52).expect("full deck");
        assert_eq!(cards.len(), 52);
        let mut codes: Vec<u8> = cards.iter().map(|card| card.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 52);
    }

    #[test]
    fn test_verify_draws_rejects_overdraw() {
        let secret = [0x55u8; 32];
        assert!(matches!(
            verify_draws(&secret, "over", 0, 53),
            Err(ValidationError::DeckExhausted)
        ));
    }

    #[test]
    fn test_verify_roulette_matches_spin() {
        let secret = [0x66u8; 32];
        let ctx = DrawContext::new(&secret, "wheel", 7);
        assert_eq!(verify_roulette(&secret, "wheel", 7), roulette::spin(&ctx));
    }
}
