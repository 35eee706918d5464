//! Fairdeck outcome engine.
//!
//! This crate contains the provably-fair draw pipeline and the card-game
//! state machines built on it:
//!
//! - [`seed`] — server-seed commitment lifecycle (create, rotate, reveal).
//! - [`draw`] — the pure HMAC-SHA256 draw primitive.
//! - [`deck`] — draw-without-replacement over one 52-card shoe.
//! - [`odds`] — live Hi-Lo multipliers from remaining deck composition.
//! - [`games`] — Blackjack, Hi-Lo, and Roulette engines.
//! - [`service`] — orchestration over storage/ledger/broadcast traits.
//! - [`verify`] — public after-the-fact reproduction of draw sequences.
//!
//! ## Determinism requirements
//! - Draw outcomes derive only from `(secret, client seed, nonce, draw
//!   index)`; wall-clock time and ambient randomness never touch them.
//! - OS entropy is used in exactly one place: generating a fresh server
//!   seed.
//! - A round captures its commitment at start; seed rotation never
//!   changes the outcome of a round in flight.

pub mod config;
pub mod deck;
pub mod draw;
pub mod games;
pub mod odds;
pub mod seed;
pub mod service;
pub mod verify;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use config::{BlackjackConfig, EngineConfig, HiLoConfig};
pub use draw::{draw, hmac_sha256, DrawContext};
pub use seed::{commitment_of, RevealedSeed, SeedManager, ServerSeed};
pub use service::{Broadcast, CasinoService, DebitOutcome, Ledger, RoundStore, SaveOutcome};
pub use verify::{verify_commitment, verify_draws, verify_roulette};
