//! Hi-Lo round engine.
//!
//! A round holds one shrinking shoe. The reference card may be re-drawn
//! any number of times without staking (`skip`); a single `bet` locks a
//! wager and a prediction, prices it off the live deck composition,
//! resolves it against the next draw, and settles the round for good.
//!
//! Odds are recomputed from the remaining pool on every draw — the
//! multiplier a bet locks is always the one derived from the exact deck
//! it will draw from.

use super::ActionReceipt;
use crate::config::HiLoConfig;
use crate::deck::draw_code;
use crate::draw::DrawContext;
use crate::odds;
use fairdeck_types::cards::card_rank;
use fairdeck_types::{
    DeckState, HiLoAction, HiLoOddsView, HiLoPrediction, HiLoRound, HiLoSettlement, HiLoView,
    ValidationError,
};

/// Minimum pool for a `skip`: the re-draw itself plus a card left to bet
/// against.
const MIN_CARDS_TO_SKIP: usize = 2;

/// Start a round by drawing the reference card.
pub fn deal(ctx: &DrawContext) -> Result<HiLoRound, ValidationError> {
    let mut deck = DeckState::fresh();
    let first = draw_code(&mut deck, ctx)?;
    Ok(HiLoRound {
        deck,
        current_card: first,
        history: vec![first],
        skips: 0,
        settlement: None,
    })
}

/// Rank comparison outcome of a resolving draw.
fn realized(reference: u8, drawn: u8) -> HiLoPrediction {
    let reference_rank = card_rank(reference);
    let drawn_rank = card_rank(drawn);
    if drawn_rank > reference_rank {
        HiLoPrediction::Higher
    } else if drawn_rank < reference_rank {
        HiLoPrediction::Lower
    } else {
        HiLoPrediction::Equal
    }
}

/// Apply one action to an in-play round.
pub fn apply(
    round: &mut HiLoRound,
    action: HiLoAction,
    ctx: &DrawContext,
    config: &HiLoConfig,
) -> Result<ActionReceipt, ValidationError> {
    if round.settlement.is_some() {
        return Err(ValidationError::IllegalAction {
            action: action.name(),
        });
    }

    match action {
        HiLoAction::Skip => {
            if round.deck.len() < MIN_CARDS_TO_SKIP {
                return Err(ValidationError::DeckExhausted);
            }
            let drawn = draw_code(&mut round.deck, ctx)?;
            round.current_card = drawn;
            round.history.push(drawn);
            round.skips += 1;
            Ok(ActionReceipt::default())
        }
        HiLoAction::Bet { prediction, wager } => {
            let counts = odds::count(round.current_card, &round.deck.remaining);
            let multiplier_x100 =
                odds::multiplier_x100(counts.for_prediction(prediction), counts.total(), config);
            if multiplier_x100 == 0 {
                return Err(ValidationError::UnavailablePrediction);
            }

            let drawn = draw_code(&mut round.deck, ctx)?;
            round.history.push(drawn);
            let won = realized(round.current_card, drawn) == prediction;
            let payout = if won {
                wager.saturating_mul(multiplier_x100) / 100
            } else {
                0
            };
            round.settlement = Some(HiLoSettlement {
                prediction,
                wager,
                multiplier_x100,
                drawn,
                won,
                payout,
            });
            Ok(ActionReceipt {
                staked: wager,
                credited: payout,
            })
        }
    }
}

/// Client view with live odds while the round is open.
pub fn view(round: &HiLoRound, config: &HiLoConfig) -> HiLoView {
    let odds: Option<HiLoOddsView> = if round.settlement.is_none() {
        Some(odds::view(
            round.current_card,
            &round.deck.remaining,
            config,
        ))
    } else {
        None
    };
    HiLoView {
        current_card: super::decode_card(round.current_card),
        history: round.history.iter().copied().map(super::decode_card).collect(),
        skips: round.skips,
        cards_remaining: round.deck.len() as u8,
        odds,
        settlement: round.settlement.clone(),
    }
}
