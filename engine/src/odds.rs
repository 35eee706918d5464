//! Live odds for Hi-Lo, derived from remaining deck composition.
//!
//! Odds must be recomputed after every draw: the deck shrinks and the
//! rank distribution changes, so a multiplier computed against a stale
//! pool is a correctness bug, not an approximation.

use crate::config::HiLoConfig;
use fairdeck_types::cards::card_rank;
use fairdeck_types::{HiLoOddsView, HiLoPrediction};

/// Remaining-deck counts relative to a reference card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OddsCounts {
    pub higher: u32,
    pub lower: u32,
    pub equal: u32,
}

impl OddsCounts {
    /// Total cards counted; always equals the remaining pool size.
    pub fn total(&self) -> u32 {
        self.higher + self.lower + self.equal
    }

    pub fn for_prediction(&self, prediction: HiLoPrediction) -> u32 {
        match prediction {
            HiLoPrediction::Higher => self.higher,
            HiLoPrediction::Lower => self.lower,
            HiLoPrediction::Equal => self.equal,
        }
    }
}

/// Count remaining cards by rank comparison against the reference card.
/// Ace is low (rank 1).
pub fn count(reference: u8, remaining: &[u8]) -> OddsCounts {
    let reference_rank = card_rank(reference);
    let mut counts = OddsCounts {
        higher: 0,
        lower: 0,
        equal: 0,
    };
    for &code in remaining {
        let rank = card_rank(code);
        if rank > reference_rank {
            counts.higher += 1;
        } else if rank < reference_rank {
            counts.lower += 1;
        } else {
            counts.equal += 1;
        }
    }
    counts
}

/// Fair-minus-edge payout multiplier in hundredths.
///
/// For a prediction covering `covering` of `total` remaining cards:
/// `max(1.01, floor(((1 - edge) / p) * 100) / 100)` expressed in integer
/// hundredths. Returns 0 — bet unavailable — when the prediction covers
/// nothing.
pub fn multiplier_x100(covering: u32, total: u32, config: &HiLoConfig) -> u64 {
    if covering == 0 || total == 0 {
        return 0;
    }
    let numerator = (10_000u128 - config.house_edge_bps as u128) * total as u128;
    let denominator = covering as u128 * 100;
    let multiplier = (numerator / denominator) as u64;
    multiplier.max(config.min_multiplier_x100)
}

/// Multipliers for all three predictions against the current pool.
pub fn view(reference: u8, remaining: &[u8], config: &HiLoConfig) -> HiLoOddsView {
    let counts = count(reference, remaining);
    let total = counts.total();
    HiLoOddsView {
        higher_x100: multiplier_x100(counts.higher, total, config),
        lower_x100: multiplier_x100(counts.lower, total, config),
        equal_x100: multiplier_x100(counts.equal, total, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdeck_types::DeckState;
    use proptest::prelude::*;

    fn config() -> HiLoConfig {
        HiLoConfig::default()
    }

    #[test]
    fn test_counts_on_fresh_deck() {
        let deck = DeckState::fresh();
        // Reference: a seven (rank 7). Higher: ranks 8-13 = 6*4 = 24,
        // lower: ranks 1-6 = 24, equal: the other three sevens... the
        // reference card here is still in the pool, so equal = 4.
        let counts = count(6, &deck.remaining); // code 6 = seven of spades
        assert_eq!(counts.higher, 24);
        assert_eq!(counts.lower, 24);
        assert_eq!(counts.equal, 4);
        assert_eq!(counts.total(), 52);
    }

    #[test]
    fn test_conservation_after_removal() {
        let mut deck = DeckState::fresh();
        let reference = deck.take(6);
        let counts = count(reference, &deck.remaining);
        assert_eq!(counts.total() as usize, deck.len());
    }

    #[test]
    fn test_multiplier_formula() {
        let config = config();
        // p = 1/2 with 1% edge: 0.99 / 0.5 = 1.98.
        assert_eq!(multiplier_x100(26, 52, &config), 198);
        // p = 1/52: 0.99 * 52 = 51.48.
        assert_eq!(multiplier_x100(1, 52, &config), 5148);
        // p = 3/51 after the reference is removed: 0.99 * 51 / 3 = 16.83.
        assert_eq!(multiplier_x100(3, 51, &config), 1683);
    }

    #[test]
    fn test_multiplier_floor_is_one_oh_one() {
        let config = config();
        // A near-certain prediction still pays at least 1.01.
        assert_eq!(multiplier_x100(51, 51, &config), 101);
        assert_eq!(multiplier_x100(50, 51, &config), 101);
    }

    #[test]
    fn test_zero_probability_is_unavailable() {
        let config = config();
        assert_eq!(multiplier_x100(0, 51, &config), 0);
    }

    #[test]
    fn test_view_marks_unavailable_sides() {
        let config = config();
        // Pool holding only kings: from a king, higher and lower are both
        // unavailable, equal is certain.
        let kings = vec![12, 25, 38];
        let view = view(51, &kings, &config); // code 51 = king of clubs
        assert_eq!(view.higher_x100, 0);
        assert_eq!(view.lower_x100, 0);
        assert_eq!(view.equal_x100, 101);
    }

    proptest! {
        #[test]
        fn prop_odds_conservation(drawn in 0usize..51, reference in 0u8..52) {
            let mut deck = DeckState::fresh();
            for _ in 0..drawn {
                deck.take(0);
            }
            let counts = count(reference, &deck.remaining);
            prop_assert_eq!(counts.total() as usize, deck.len());
        }
    }
}
