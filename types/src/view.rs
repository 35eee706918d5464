//! Client-facing snapshots of rounds and spins.
//!
//! Views never carry the server secret, and the dealer's hole card is
//! masked until it is revealed by the dealer turn or an immediate peek
//! settlement. Commitments render as hex so a client can store them
//! alongside the round for later verification.

use crate::action::{RouletteBet, RouletteSelection};
use crate::cards::Card;
use crate::round::{
    BlackjackStage, GameKind, HandOutcome, HandStatus, RoundStatus, Settlement, SideBets,
};
use serde::{Deserialize, Serialize};

/// One player hand as shown to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandView {
    pub cards: Vec<Card>,
    pub total: u8,
    pub bet: u64,
    pub doubled: bool,
    pub was_split: bool,
    pub status: HandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<HandOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<u64>,
}

/// Dealer hand as shown to the client. While the hole card is hidden,
/// `cards` contains only the upcard and `total` counts only the upcard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealerView {
    pub cards: Vec<Card>,
    pub total: u8,
    pub hole_revealed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceView {
    pub stake: u64,
    pub payout: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackjackView {
    pub stage: BlackjackStage,
    pub hands: Vec<HandView>,
    pub active_hand: u8,
    pub dealer: DealerView,
    pub side_bets: SideBets,
    pub perfect_pairs_return: u64,
    pub twenty_one_plus_three_return: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<InsuranceView>,
    /// True while insurance may still be taken (dealer Ace upcard, no
    /// main action played yet).
    pub insurance_open: bool,
    pub actions_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<Settlement>,
}

/// Live Hi-Lo multipliers in hundredths; 0 marks an unavailable side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiLoOddsView {
    pub higher_x100: u64,
    pub lower_x100: u64,
    pub equal_x100: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiLoView {
    pub current_card: Card,
    pub history: Vec<Card>,
    pub skips: u32,
    pub cards_remaining: u8,
    /// Odds for the next prediction; absent once the round settles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds: Option<HiLoOddsView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<crate::round::HiLoSettlement>,
}

/// Game-specific slice of a round view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameView {
    Blackjack(BlackjackView),
    HiLo(HiLoView),
}

/// Snapshot of a round returned from `start_round` and `act`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub id: u64,
    pub user: u64,
    pub status: RoundStatus,
    pub client_seed: String,
    pub nonce: u64,
    /// Hex-encoded server-seed commitment captured at round start.
    pub commitment: String,
    pub version: u64,
    #[serde(flatten)]
    pub game: GameView,
}

/// Outcome of a single evaluated roulette bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetOutcome {
    pub selection: RouletteSelection,
    pub stake: u64,
    pub won: bool,
    /// Total returned for this bet (stake included when it wins).
    pub payout: u64,
}

/// Result of a roulette spin. There is no round object: the spin settles
/// in the same call that draws it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    pub user: u64,
    pub number: u8,
    /// "red", "black", or "green" for zero.
    pub color: String,
    pub bets: Vec<BetOutcome>,
    pub total_staked: u64,
    pub total_payout: u64,
    pub client_seed: String,
    pub nonce: u64,
    pub commitment: String,
}

impl SpinResult {
    /// The original bet list, reconstructed from the outcomes.
    pub fn bets_placed(&self) -> Vec<RouletteBet> {
        self.bets
            .iter()
            .map(|outcome| RouletteBet {
                selection: outcome.selection,
                stake: outcome.stake,
            })
            .collect()
    }
}

/// Fire-and-forget notifications published after settlement. Broadcast
/// failures are logged and never roll back the settled round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    RoundSettled {
        round_id: u64,
        user: u64,
        game: GameKind,
        wagered: u64,
        returned: u64,
    },
    SpinSettled {
        user: u64,
        nonce: u64,
        number: u8,
        staked: u64,
        payout: u64,
    },
    SeedRotated {
        /// Hex commitment of the newly active seed.
        commitment: String,
        /// Hex secret of the outgoing seed, now public for audit.
        revealed_secret: String,
    },
}
