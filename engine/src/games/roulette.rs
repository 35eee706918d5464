//! Roulette spin evaluator.
//!
//! Stateless: a spin is a single draw with `draw_index = 0` over the
//! 37-pocket European wheel, and every submitted bet is evaluated against
//! the winning number's static properties. There is no deck and no shared
//! state between spins.

use crate::draw::DrawContext;
use fairdeck_types::{BetOutcome, RouletteBet, RouletteSelection, ValidationError};

/// Pockets on a European single-zero wheel.
pub const WHEEL_SIZE: u32 = 37;

/// Red numbers on a European wheel.
const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Check if a number is red.
pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

/// Rendered color of a pocket.
pub fn color_of(number: u8) -> &'static str {
    if number == 0 {
        "green"
    } else if is_red(number) {
        "red"
    } else {
        "black"
    }
}

/// Spin the wheel: one draw, index 0, range 37.
pub fn spin(ctx: &DrawContext) -> u8 {
    ctx.draw(0, WHEEL_SIZE) as u8
}

fn validate_set(numbers: &[u8], selection: &'static str) -> Result<(), ValidationError> {
    for (position, &number) in numbers.iter().enumerate() {
        if number > 36 {
            return Err(ValidationError::InvalidBet(selection));
        }
        if numbers[..position].contains(&number) {
            return Err(ValidationError::InvalidBet(selection));
        }
    }
    Ok(())
}

/// Validate a bet's selection shape: numbers in range, sets distinct,
/// group indexes within bounds. Placement geometry (whether a split is
/// physically adjacent on the layout) is a table-policy concern left to
/// the caller.
pub fn validate_bet(bet: &RouletteBet) -> Result<(), ValidationError> {
    match &bet.selection {
        RouletteSelection::Straight(number) => {
            if *number > 36 {
                return Err(ValidationError::InvalidBet("straight number out of range"));
            }
        }
        RouletteSelection::Split(numbers) => validate_set(numbers, "split set invalid")?,
        RouletteSelection::Street(numbers) => validate_set(numbers, "street set invalid")?,
        RouletteSelection::Corner(numbers) => validate_set(numbers, "corner set invalid")?,
        RouletteSelection::Line(numbers) => validate_set(numbers, "line set invalid")?,
        RouletteSelection::Dozen(group) | RouletteSelection::Column(group) => {
            if *group > 2 {
                return Err(ValidationError::InvalidBet("group index out of range"));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Validate a full bet list.
pub fn validate_bets(bets: &[RouletteBet]) -> Result<(), ValidationError> {
    if bets.is_empty() {
        return Err(ValidationError::InvalidBet("no bets submitted"));
    }
    for bet in bets {
        validate_bet(bet)?;
    }
    Ok(())
}

/// Check if a bet covers the winning number.
fn bet_wins(selection: &RouletteSelection, number: u8) -> bool {
    match selection {
        RouletteSelection::Straight(n) => *n == number,
        RouletteSelection::Split(set) => set.contains(&number),
        RouletteSelection::Street(set) => set.contains(&number),
        RouletteSelection::Corner(set) => set.contains(&number),
        RouletteSelection::Line(set) => set.contains(&number),
        // Zero wins only bets whose number set explicitly contains it.
        RouletteSelection::Dozen(group) => number != 0 && (number - 1) / 12 == *group,
        RouletteSelection::Column(group) => number != 0 && (number - 1) % 3 == *group,
        RouletteSelection::Red => number != 0 && is_red(number),
        RouletteSelection::Black => number != 0 && !is_red(number),
        RouletteSelection::Even => number != 0 && number % 2 == 0,
        RouletteSelection::Odd => number % 2 == 1,
        RouletteSelection::Low => (1..=18).contains(&number),
        RouletteSelection::High => (19..=36).contains(&number),
    }
}

/// Payout multiplier (to 1, excludes the returned stake).
fn payout_to_one(selection: &RouletteSelection) -> u64 {
    match selection {
        RouletteSelection::Straight(_) => 35,
        RouletteSelection::Split(_) => 17,
        RouletteSelection::Street(_) => 11,
        RouletteSelection::Corner(_) => 8,
        RouletteSelection::Line(_) => 5,
        RouletteSelection::Dozen(_) | RouletteSelection::Column(_) => 2,
        RouletteSelection::Red
        | RouletteSelection::Black
        | RouletteSelection::Even
        | RouletteSelection::Odd
        | RouletteSelection::Low
        | RouletteSelection::High => 1,
    }
}

/// Evaluate every bet against the winning number. Winning bets return
/// `stake × (payout + 1)`.
pub fn evaluate(number: u8, bets: &[RouletteBet]) -> Vec<BetOutcome> {
    bets.iter()
        .map(|bet| {
            let won = bet_wins(&bet.selection, number);
            let payout = if won {
                bet.stake
                    .saturating_mul(payout_to_one(&bet.selection).saturating_add(1))
            } else {
                0
            };
            BetOutcome {
                selection: bet.selection,
                stake: bet.stake,
                won,
                payout,
            }
        })
        .collect()
}

/// Total staked across a bet list.
pub fn total_staked(bets: &[RouletteBet]) -> u64 {
    bets.iter().fold(0u64, |acc, bet| acc.saturating_add(bet.stake))
}

/// Total returned across evaluated outcomes.
pub fn total_payout(outcomes: &[BetOutcome]) -> u64 {
    outcomes
        .iter()
        .fold(0u64, |acc, outcome| acc.saturating_add(outcome.payout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(selection: RouletteSelection, stake: u64) -> RouletteBet {
        RouletteBet { selection, stake }
    }

    #[test]
    fn test_spin_is_deterministic_and_in_range() {
        let secret = [9u8; 32];
        for nonce in 0..200 {
            let ctx = DrawContext::new(&secret, "spin", nonce);
            let a = spin(&ctx);
            let b = spin(&ctx);
            assert_eq!(a, b);
            assert!(a <= 36);
        }
    }

    #[test]
    fn test_fixture_number_seventeen_pays_385() {
        // 17 is red, odd, dozen 2, column 2 (1-indexed naming; group
        // index 1 in 0-based terms).
        let bets = vec![
            bet(RouletteSelection::Straight(17), 10),
            bet(RouletteSelection::Red, 5),
            bet(RouletteSelection::Dozen(1), 5),
        ];
        let outcomes = evaluate(17, &bets);
        assert!(outcomes.iter().all(|outcome| outcome.won));
        assert_eq!(outcomes[0].payout, 10 * 36);
        assert_eq!(outcomes[1].payout, 5 * 2);
        assert_eq!(outcomes[2].payout, 5 * 3);
        assert_eq!(total_payout(&outcomes), 385);
    }

    #[test]
    fn test_zero_wins_only_explicit_coverage() {
        let bets = vec![
            bet(RouletteSelection::Straight(0), 10),
            bet(RouletteSelection::Split([0, 1]), 10),
            bet(RouletteSelection::Red, 10),
            bet(RouletteSelection::Black, 10),
            bet(RouletteSelection::Even, 10),
            bet(RouletteSelection::Odd, 10),
            bet(RouletteSelection::Low, 10),
            bet(RouletteSelection::High, 10),
            bet(RouletteSelection::Dozen(0), 10),
            bet(RouletteSelection::Column(0), 10),
        ];
        let outcomes = evaluate(0, &bets);
        assert!(outcomes[0].won, "straight on zero wins");
        assert!(outcomes[1].won, "split covering zero wins");
        for outcome in &outcomes[2..] {
            assert!(!outcome.won, "{:?} must lose on zero", outcome.selection);
        }
        assert_eq!(total_payout(&outcomes), 10 * 36 + 10 * 18);
    }

    #[test]
    fn test_outside_bets() {
        // 26: black, even, high, dozen 2 (index 2 covers 25-36), column
        // index 1.
        let outcomes = evaluate(
            26,
            &[
                bet(RouletteSelection::Black, 10),
                bet(RouletteSelection::Even, 10),
                bet(RouletteSelection::High, 10),
                bet(RouletteSelection::Low, 10),
                bet(RouletteSelection::Dozen(2), 10),
                bet(RouletteSelection::Column(1), 10),
                bet(RouletteSelection::Red, 10),
            ],
        );
        let won: Vec<bool> = outcomes.iter().map(|o| o.won).collect();
        assert_eq!(won, vec![true, true, true, false, true, true, false]);
    }

    #[test]
    fn test_inside_set_bets() {
        let outcomes = evaluate(
            14,
            &[
                bet(RouletteSelection::Split([14, 17]), 4),
                bet(RouletteSelection::Street([13, 14, 15]), 3),
                bet(RouletteSelection::Corner([13, 14, 16, 17]), 2),
                bet(RouletteSelection::Line([13, 14, 15, 16, 17, 18]), 1),
                bet(RouletteSelection::Corner([1, 2, 4, 5]), 2),
            ],
        );
        assert_eq!(outcomes[0].payout, 4 * 18);
        assert_eq!(outcomes[1].payout, 3 * 12);
        assert_eq!(outcomes[2].payout, 2 * 9);
        assert_eq!(outcomes[3].payout, 6);
        assert_eq!(outcomes[4].payout, 0);
    }

    #[test]
    fn test_validation_rejects_malformed_bets() {
        assert!(validate_bets(&[]).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Straight(37), 1)).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Split([1, 1]), 1)).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Corner([1, 2, 37, 4]), 1)).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Dozen(3), 1)).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Column(3), 1)).is_err());
        assert!(validate_bet(&bet(RouletteSelection::Split([0, 1]), 1)).is_ok());
    }

    #[test]
    fn test_spin_distribution_covers_wheel() {
        let secret = [3u8; 32];
        let mut seen = [false; 37];
        for nonce in 0..2_000u64 {
            let ctx = DrawContext::new(&secret, "coverage", nonce);
            seen[spin(&ctx) as usize] = true;
        }
        let covered = seen.iter().filter(|&&s| s).count();
        assert_eq!(covered, 37, "all pockets reachable");
    }
}
