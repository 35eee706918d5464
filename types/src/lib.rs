//! Common types used throughout fairdeck.
//!
//! This crate carries the data model only: card/deck encoding, persisted
//! round state with its wire codec, request/response types, and the error
//! taxonomy. All game logic lives in `fairdeck-engine`.

pub mod action;
pub mod cards;
pub mod error;
pub mod round;
pub mod view;

pub use action::{Action, BlackjackAction, HiLoAction, RouletteBet, RouletteSelection, StartParams};
pub use cards::{Card, DeckState, CARDS_PER_DECK};
pub use error::{ConcurrencyError, ConfigurationError, Error, ValidationError};
pub use round::{
    BlackjackHand, BlackjackRound, BlackjackStage, Commitment, DealerHand, GameKind, GameRound,
    HandOutcome, HandStatus, HiLoPrediction, HiLoRound, HiLoSettlement, Insurance, Round,
    RoundStatus, Settlement, SideBets, MAX_CLIENT_SEED_LEN, MAX_HANDS, MAX_HAND_CARDS,
};
pub use view::{
    BetOutcome, BlackjackView, DealerView, EngineEvent, GameView, HandView, HiLoOddsView,
    HiLoView, InsuranceView, RoundView, SpinResult,
};
