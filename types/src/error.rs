//! Engine error taxonomy.
//!
//! Draw computation itself never fails; every failure path lives in state
//! validation, seed configuration, concurrency control, or the balance
//! boundary. Validation errors are raised before any state mutation, so a
//! rejected action always leaves the round exactly as it was.

use thiserror::Error;

/// Illegal action for the current round state. Rejected before mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("action `{action}` is not legal in the current round state")]
    IllegalAction { action: &'static str },

    #[error("round {0} not found")]
    RoundNotFound(u64),

    #[error("round {0} is not owned by the caller")]
    NotRoundOwner(u64),

    #[error("the shoe has no cards left to draw")]
    DeckExhausted,

    #[error("invalid bet: {0}")]
    InvalidBet(&'static str),

    #[error("client seed exceeds the maximum accepted length")]
    ClientSeedTooLong,

    #[error("prediction has zero probability and cannot be backed")]
    UnavailablePrediction,
}

/// Missing or unknown seed material. Fatal to round creation, not retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no active server seed is configured")]
    NoActiveSeed,

    /// The commitment captured by a round resolves to no known secret.
    /// The engine refuses to guess: substituting any derived value would
    /// silently change the round's draw sequence and break verifiability.
    #[error("no secret is known for commitment {0}")]
    UnknownCommitment(String),
}

/// Conflicting concurrent access to a single round.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConcurrencyError {
    /// Another writer advanced the round between load and save. The caller
    /// must re-fetch and decide whether to retry; the engine never retries
    /// draw-advancing actions on its own.
    #[error("round {round} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        round: u64,
        expected: u64,
        found: u64,
    },
}

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error("insufficient funds: debit of {needed} refused")]
    InsufficientFunds { needed: u64 },

    /// Collaborator (store/ledger) failure. Malformed persisted state
    /// surfaces here too: the store's codec rejects it on load.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    /// True when retrying the same call can never succeed.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Error::Concurrency(_) | Error::Store(_))
    }
}
