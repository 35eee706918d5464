//! Player-facing requests: round creation parameters, in-round actions,
//! and roulette bet descriptions.

use crate::round::{HiLoPrediction, SideBets};
use serde::{Deserialize, Serialize};

/// Stake parameters for `start_round`.
///
/// Hi-Lo wagers are placed per prediction (at `bet` time), so starting a
/// Hi-Lo round stakes nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum StartParams {
    Blackjack { bet: u64, side_bets: SideBets },
    HiLo,
}

/// Blackjack in-round actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BlackjackAction {
    Hit,
    Stand,
    Double,
    Split,
    /// `stake` up to half the base bet; zero is an explicit decline that
    /// closes the insurance window.
    Insurance { stake: u64 },
}

impl BlackjackAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
            Self::Double => "double",
            Self::Split => "split",
            Self::Insurance { .. } => "insurance",
        }
    }
}

/// Hi-Lo in-round actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HiLoAction {
    /// Redraw the reference card without staking.
    Skip,
    /// Lock a wager on a prediction and resolve against the next draw.
    Bet {
        prediction: HiLoPrediction,
        wager: u64,
    },
}

impl HiLoAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Bet { .. } => "bet",
        }
    }
}

/// Any in-round action, dispatched by the service on the round's game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Blackjack(BlackjackAction),
    HiLo(HiLoAction),
}

/// A roulette bet selection. Multi-number inside bets carry their explicit
/// number sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouletteSelection {
    Straight(u8),
    Split([u8; 2]),
    Street([u8; 3]),
    Corner([u8; 4]),
    Line([u8; 6]),
    /// 0 = 1-12, 1 = 13-24, 2 = 25-36.
    Dozen(u8),
    /// 0, 1, 2 counted from the 1-2-3 row.
    Column(u8),
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
}

/// A staked roulette bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouletteBet {
    pub selection: RouletteSelection,
    pub stake: u64,
}
