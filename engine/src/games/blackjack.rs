//! Blackjack round engine.
//!
//! Explicit state machine over [`BlackjackRound`]:
//!
//! ```text
//! deal -> InsuranceOffer (dealer Ace up)  -> PlayerTurn -> Settled
//!      \-> PlayerTurn (no peek window)    ---------------^
//!      \-> Settled (peeked dealer natural, or player natural)
//! ```
//!
//! House rules (fixed policy):
//! - Single 52-card shoe per round, drawn without replacement.
//! - Dealer peeks under an Ace or ten-value upcard. Under an Ace the peek
//!   result is withheld while the insurance window is open; any main
//!   action (or an insurance wager, including an explicit zero-stake
//!   decline) closes the window and applies the held result first.
//! - Dealer stands on every 17, soft included; no soft-17 variants.
//! - Split to at most 4 hands; doubles allowed on any two-card hand,
//!   split hands included. A two-card 21 after a split is not a natural.
//! - Natural blackjack pays 3:2; side bets resolve at deal against fixed
//!   paytables, independent of the main outcome; insurance pays 2:1.

use super::{decode_card, ActionReceipt};
use crate::config::BlackjackConfig;
use crate::deck::draw_code;
use crate::draw::DrawContext;
use fairdeck_types::cards::{card_rank, card_rank_ace_high, card_suit, is_red_suit, is_ten_value};
use fairdeck_types::{
    BlackjackAction, BlackjackHand, BlackjackRound, BlackjackStage, BlackjackView, DealerHand,
    DealerView, DeckState, HandOutcome, HandStatus, HandView, Insurance, InsuranceView,
    Settlement, SideBets, ValidationError, MAX_HANDS,
};

/// Calculate the value of a blackjack hand. Aces count 11 while the total
/// stays at or under 21. Returns `(total, is_soft)`.
pub fn hand_value(cards: &[u8]) -> (u8, bool) {
    let mut value: u16 = 0;
    let mut aces: u8 = 0;

    for &card in cards {
        let rank = card_rank(card);
        if rank == 1 {
            aces += 1;
            value += 11;
        } else if rank >= 10 {
            value += 10;
        } else {
            value += rank as u16;
        }
    }

    while value > 21 && aces > 0 {
        value -= 10;
        aces -= 1;
    }

    let is_soft = aces > 0 && value <= 21;
    (value.min(255) as u8, is_soft)
}

/// Check if a hand is a blackjack (21 with 2 cards).
pub fn is_blackjack(cards: &[u8]) -> bool {
    cards.len() == 2 && hand_value(cards).0 == 21
}

/// Perfect Pairs multiplier (to 1) for the player's two initial cards.
fn eval_perfect_pairs(cards: [u8; 2], config: &BlackjackConfig) -> u64 {
    if card_rank(cards[0]) != card_rank(cards[1]) {
        return 0;
    }
    let suit_one = card_suit(cards[0]);
    let suit_two = card_suit(cards[1]);
    if suit_one == suit_two {
        return config.perfect_pairs_suited;
    }
    if is_red_suit(suit_one) == is_red_suit(suit_two) {
        return config.perfect_pairs_colored;
    }
    config.perfect_pairs_mixed
}

fn is_three_card_straight(ranks: &mut [u8; 3]) -> bool {
    ranks.sort_unstable();
    // Ace plays high or low: A-2-3 sorts to [2, 3, 14].
    let is_wheel = *ranks == [2, 3, 14];
    let is_run = ranks[1] == ranks[0].saturating_add(1) && ranks[2] == ranks[1].saturating_add(1);
    is_wheel || is_run
}

/// 21+3 multiplier (to 1) for the player's two cards plus the dealer
/// upcard.
fn eval_twenty_one_plus_three(cards: [u8; 3], config: &BlackjackConfig) -> u64 {
    let suits = [
        card_suit(cards[0]),
        card_suit(cards[1]),
        card_suit(cards[2]),
    ];
    let is_flush = suits[0] == suits[1] && suits[1] == suits[2];

    let is_trips = card_rank(cards[0]) == card_rank(cards[1])
        && card_rank(cards[1]) == card_rank(cards[2]);

    let mut ranks = [
        card_rank_ace_high(cards[0]),
        card_rank_ace_high(cards[1]),
        card_rank_ace_high(cards[2]),
    ];
    let is_straight = is_three_card_straight(&mut ranks);

    if is_straight && is_flush {
        return config.twenty_one_plus_three_straight_flush;
    }
    if is_trips {
        return config.twenty_one_plus_three_trips;
    }
    if is_straight {
        return config.twenty_one_plus_three_straight;
    }
    if is_flush {
        return config.twenty_one_plus_three_flush;
    }
    0
}

fn side_bet_return(stake: u64, multiplier: u64) -> u64 {
    if stake == 0 || multiplier == 0 {
        0
    } else {
        stake.saturating_mul(multiplier.saturating_add(1))
    }
}

/// Deal a fresh round: player, dealer up, player, dealer hole. Side bets
/// resolve immediately; the peek rule may settle the round in the same
/// call. Returns the round and the amount already won (side-bet returns
/// plus any immediate settlement).
pub fn deal(
    ctx: &DrawContext,
    bet: u64,
    side_bets: SideBets,
    config: &BlackjackConfig,
) -> Result<(BlackjackRound, u64), ValidationError> {
    let mut deck = DeckState::fresh();
    let p1 = draw_code(&mut deck, ctx)?;
    let up = draw_code(&mut deck, ctx)?;
    let p2 = draw_code(&mut deck, ctx)?;
    let hole = draw_code(&mut deck, ctx)?;

    let player_cards = vec![p1, p2];
    let player_natural = is_blackjack(&player_cards);

    let perfect_pairs_return = side_bet_return(
        side_bets.perfect_pairs,
        eval_perfect_pairs([p1, p2], config),
    );
    let twenty_one_plus_three_return = side_bet_return(
        side_bets.twenty_one_plus_three,
        eval_twenty_one_plus_three([p1, p2, up], config),
    );

    let mut round = BlackjackRound {
        stage: BlackjackStage::PlayerTurn,
        deck,
        hands: vec![BlackjackHand {
            cards: player_cards,
            bet,
            doubled: false,
            was_split: false,
            status: if player_natural {
                HandStatus::Blackjack
            } else {
                HandStatus::Playing
            },
            outcome: None,
            payout: None,
        }],
        active_hand: 0,
        dealer: DealerHand {
            cards: vec![up, hole],
            hole_revealed: false,
            peeked: false,
        },
        side_bets,
        perfect_pairs_return,
        twenty_one_plus_three_return,
        insurance: None,
        actions_count: 0,
        settlement: None,
    };

    let mut credited = perfect_pairs_return.saturating_add(twenty_one_plus_three_return);
    if card_rank(up) == 1 {
        // Peek now, hold the result open for the insurance window.
        round.dealer.peeked = true;
        round.stage = BlackjackStage::InsuranceOffer;
    } else if is_ten_value(up) {
        round.dealer.peeked = true;
        if is_blackjack(&round.dealer.cards) {
            credited = credited.saturating_add(settle_dealer_natural(&mut round));
        } else if player_natural {
            credited = credited.saturating_add(settle(&mut round, ctx, config)?);
        }
    } else if player_natural {
        // Dealer cannot hold a natural without an Ace or ten up.
        credited = credited.saturating_add(settle(&mut round, ctx, config)?);
    }

    Ok((round, credited))
}

/// Apply one player action to an in-play round.
pub fn apply(
    round: &mut BlackjackRound,
    action: BlackjackAction,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<ActionReceipt, ValidationError> {
    if round.stage == BlackjackStage::Settled {
        return Err(ValidationError::IllegalAction {
            action: action.name(),
        });
    }

    if round.stage == BlackjackStage::InsuranceOffer {
        if let BlackjackAction::Insurance { stake } = action {
            return apply_insurance(round, stake, ctx, config);
        }
        // Any main action declines insurance; the held peek result
        // applies before the action does.
        if let Some(credited) = close_insurance_window(round, ctx, config)? {
            return Ok(ActionReceipt {
                staked: 0,
                credited,
            });
        }
    }

    apply_main(round, action, ctx, config)
}

/// Resolve the withheld peek. Returns `Some(credited)` when the round
/// settled (dealer natural, or nothing left to play), `None` when play
/// continues.
fn close_insurance_window(
    round: &mut BlackjackRound,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<Option<u64>, ValidationError> {
    if is_blackjack(&round.dealer.cards) {
        return Ok(Some(settle_dealer_natural(round)));
    }
    round.stage = BlackjackStage::PlayerTurn;
    if !advance_turn(round) {
        // Player natural under an Ace upcard: nothing left to play.
        return Ok(Some(settle(round, ctx, config)?));
    }
    Ok(None)
}

fn apply_insurance(
    round: &mut BlackjackRound,
    stake: u64,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<ActionReceipt, ValidationError> {
    if round.insurance.is_some() {
        return Err(ValidationError::IllegalAction {
            action: "insurance",
        });
    }
    let base_bet = round.hands[0].bet;
    if stake > base_bet / 2 {
        return Err(ValidationError::InvalidBet(
            "insurance stake exceeds half the base bet",
        ));
    }

    let dealer_natural = is_blackjack(&round.dealer.cards);
    let payout = if dealer_natural { stake.saturating_mul(3) } else { 0 };
    round.insurance = Some(Insurance { stake, payout });

    let mut credited = payout;
    if let Some(settled) = close_insurance_window(round, ctx, config)? {
        credited = credited.saturating_add(settled);
    }
    Ok(ActionReceipt {
        staked: stake,
        credited,
    })
}

fn apply_main(
    round: &mut BlackjackRound,
    action: BlackjackAction,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<ActionReceipt, ValidationError> {
    let idx = round.active_hand as usize;
    if idx >= round.hands.len() {
        return Err(ValidationError::IllegalAction {
            action: action.name(),
        });
    }

    match action {
        BlackjackAction::Hit => {
            if round.hands[idx].status != HandStatus::Playing {
                return Err(ValidationError::IllegalAction { action: "hit" });
            }
            let code = draw_code(&mut round.deck, ctx)?;
            let hand = &mut round.hands[idx];
            hand.cards.push(code);
            let (total, _) = hand_value(&hand.cards);
            if total > 21 {
                hand.status = HandStatus::Busted;
            } else if total == 21 {
                hand.status = HandStatus::Standing;
            }
            round.actions_count += 1;
            let credited = finish_if_done(round, ctx, config)?;
            Ok(ActionReceipt {
                staked: 0,
                credited,
            })
        }
        BlackjackAction::Stand => {
            if round.hands[idx].status != HandStatus::Playing {
                return Err(ValidationError::IllegalAction { action: "stand" });
            }
            round.hands[idx].status = HandStatus::Standing;
            round.actions_count += 1;
            let credited = finish_if_done(round, ctx, config)?;
            Ok(ActionReceipt {
                staked: 0,
                credited,
            })
        }
        BlackjackAction::Double => {
            {
                let hand = &round.hands[idx];
                if hand.status != HandStatus::Playing || hand.cards.len() != 2 || hand.doubled {
                    return Err(ValidationError::IllegalAction { action: "double" });
                }
            }
            let code = draw_code(&mut round.deck, ctx)?;
            let hand = &mut round.hands[idx];
            let staked = hand.bet;
            hand.doubled = true;
            hand.cards.push(code);
            let (total, _) = hand_value(&hand.cards);
            hand.status = if total > 21 {
                HandStatus::Busted
            } else {
                HandStatus::Standing
            };
            round.actions_count += 1;
            let credited = finish_if_done(round, ctx, config)?;
            Ok(ActionReceipt { staked, credited })
        }
        BlackjackAction::Split => {
            if round.hands.len() >= MAX_HANDS {
                return Err(ValidationError::IllegalAction { action: "split" });
            }
            {
                let hand = &round.hands[idx];
                if hand.status != HandStatus::Playing || hand.cards.len() != 2 {
                    return Err(ValidationError::IllegalAction { action: "split" });
                }
                if card_rank(hand.cards[0]) != card_rank(hand.cards[1]) {
                    return Err(ValidationError::IllegalAction { action: "split" });
                }
            }
            let replacement_current = draw_code(&mut round.deck, ctx)?;
            let replacement_new = draw_code(&mut round.deck, ctx)?;
            let hand = &mut round.hands[idx];
            let staked = hand.bet;
            let moved = hand
                .cards
                .pop()
                .ok_or(ValidationError::IllegalAction { action: "split" })?;
            hand.was_split = true;
            hand.cards.push(replacement_current);
            let new_hand = BlackjackHand {
                cards: vec![moved, replacement_new],
                bet: staked,
                doubled: false,
                was_split: true,
                status: HandStatus::Playing,
                outcome: None,
                payout: None,
            };
            round.hands.insert(idx + 1, new_hand);
            round.actions_count += 1;
            Ok(ActionReceipt {
                staked,
                credited: 0,
            })
        }
        BlackjackAction::Insurance { .. } => Err(ValidationError::IllegalAction {
            action: "insurance",
        }),
    }
}

/// Advance the active pointer to the next hand still playing. Returns
/// false when none remains.
fn advance_turn(round: &mut BlackjackRound) -> bool {
    while (round.active_hand as usize) < round.hands.len() {
        if round.hands[round.active_hand as usize].status == HandStatus::Playing {
            return true;
        }
        round.active_hand += 1;
    }
    false
}

fn finish_if_done(
    round: &mut BlackjackRound,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<u64, ValidationError> {
    if advance_turn(round) {
        return Ok(0);
    }
    settle(round, ctx, config)
}

fn total_hand_wagers(round: &BlackjackRound) -> u64 {
    round
        .hands
        .iter()
        .fold(0u64, |acc, hand| acc.saturating_add(hand.wagered()))
}

/// Immediate settlement against a peeked dealer natural: pushes player
/// naturals, loses everything else. No further cards are drawn.
fn settle_dealer_natural(round: &mut BlackjackRound) -> u64 {
    round.dealer.hole_revealed = true;
    let mut returned = 0u64;
    for hand in &mut round.hands {
        let (outcome, payout) = if hand.status == HandStatus::Blackjack {
            (HandOutcome::Push, hand.wagered())
        } else {
            (HandOutcome::Lose, 0)
        };
        hand.outcome = Some(outcome);
        hand.payout = Some(payout);
        returned = returned.saturating_add(payout);
    }
    round.stage = BlackjackStage::Settled;
    round.settlement = Some(Settlement {
        wagered: total_hand_wagers(round),
        returned,
    });
    returned
}

fn resolve_hand(hand: &BlackjackHand, dealer_total: u8, dealer_natural: bool) -> (HandOutcome, u64) {
    let wagered = hand.wagered();
    // A bust loses before any comparison, mutual busts included.
    if hand.status == HandStatus::Busted {
        return (HandOutcome::Bust, 0);
    }
    let natural = hand.status == HandStatus::Blackjack;
    if natural && dealer_natural {
        return (HandOutcome::Push, wagered);
    }
    if natural {
        // 3:2.
        return (HandOutcome::Win, wagered.saturating_mul(5) / 2);
    }
    if dealer_natural {
        return (HandOutcome::Lose, 0);
    }
    let (total, _) = hand_value(&hand.cards);
    if dealer_total > 21 || total > dealer_total {
        return (HandOutcome::Win, wagered.saturating_mul(2));
    }
    if total == dealer_total {
        return (HandOutcome::Push, wagered);
    }
    (HandOutcome::Lose, 0)
}

/// Dealer turn plus per-hand settlement. The hole card is revealed; the
/// dealer draws only while a non-busted, non-natural hand needs beating.
/// Settlement totals are computed once and stored on the round.
fn settle(
    round: &mut BlackjackRound,
    ctx: &DrawContext,
    config: &BlackjackConfig,
) -> Result<u64, ValidationError> {
    round.dealer.hole_revealed = true;

    let any_live = round
        .hands
        .iter()
        .any(|hand| hand.status == HandStatus::Standing);
    if any_live {
        loop {
            let (total, _) = hand_value(&round.dealer.cards);
            if total >= config.dealer_stands_at {
                break;
            }
            let code = draw_code(&mut round.deck, ctx)?;
            round.dealer.cards.push(code);
        }
    }

    let (dealer_total, _) = hand_value(&round.dealer.cards);
    let dealer_natural = is_blackjack(&round.dealer.cards);

    let mut returned = 0u64;
    for hand in &mut round.hands {
        let (outcome, payout) = resolve_hand(hand, dealer_total, dealer_natural);
        hand.outcome = Some(outcome);
        hand.payout = Some(payout);
        returned = returned.saturating_add(payout);
    }

    round.stage = BlackjackStage::Settled;
    round.settlement = Some(Settlement {
        wagered: total_hand_wagers(round),
        returned,
    });
    Ok(returned)
}

/// Client view of the round. The hole card stays masked until revealed.
pub fn view(round: &BlackjackRound) -> BlackjackView {
    let hands = round
        .hands
        .iter()
        .map(|hand| HandView {
            cards: hand.cards.iter().copied().map(decode_card).collect(),
            total: hand_value(&hand.cards).0,
            bet: hand.bet,
            doubled: hand.doubled,
            was_split: hand.was_split,
            status: hand.status,
            outcome: hand.outcome,
            payout: hand.payout,
        })
        .collect();

    let visible: &[u8] = if round.dealer.hole_revealed {
        &round.dealer.cards
    } else {
        &round.dealer.cards[0..1]
    };
    let dealer = DealerView {
        cards: visible.iter().copied().map(decode_card).collect(),
        total: hand_value(visible).0,
        hole_revealed: round.dealer.hole_revealed,
    };

    BlackjackView {
        stage: round.stage,
        hands,
        active_hand: round.active_hand,
        dealer,
        side_bets: round.side_bets,
        perfect_pairs_return: round.perfect_pairs_return,
        twenty_one_plus_three_return: round.twenty_one_plus_three_return,
        insurance: round.insurance.as_ref().map(|insurance| InsuranceView {
            stake: insurance.stake,
            payout: insurance.payout,
        }),
        insurance_open: round.stage == BlackjackStage::InsuranceOffer,
        actions_count: round.actions_count,
        settlement: round.settlement,
    }
}
