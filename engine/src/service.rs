//! Service layer: orchestration between the round engines and the
//! storage/ledger/broadcast collaborators.
//!
//! Collaborators are reached through small async traits so the engine
//! stays agnostic of the actual database, balance system, and event bus.
//! The ordering contract per action is fixed:
//!
//! 1. Validate and advance a copy of the round (pure, no side effects).
//! 2. Debit any incremental stake — a refused debit aborts before
//!    anything is persisted.
//! 3. Persist under an optimistic version check — a conflicting
//!    concurrent write is rejected (after refunding step 2) and the
//!    caller must re-fetch and retry explicitly; draw-advancing actions
//!    are never retried on the caller's behalf.
//! 4. Credit any winnings and publish the settlement. Broadcast failures
//!    are logged, never rolled back.

use crate::config::EngineConfig;
use crate::draw::DrawContext;
use crate::games::{blackjack, hilo, roulette};
use crate::seed::SeedManager;
use anyhow::Result;
use commonware_utils::hex;
use fairdeck_types::{
    Action, Commitment, ConcurrencyError, EngineEvent, Error, GameRound, GameView, RouletteBet,
    Round, RoundStatus, RoundView, SpinResult, StartParams, ValidationError, MAX_CLIENT_SEED_LEN,
};
use std::future::Future;
use std::sync::Arc;

/// Result of a conditional round save.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The stored version did not match the expected one.
    Conflict { found: u64 },
}

/// Result of a balance debit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebitOutcome {
    Ok,
    InsufficientFunds,
}

/// Persistent round storage. Rounds are saved after every transition so a
/// crash mid-round loses no deck position.
pub trait RoundStore {
    fn load_round(&self, id: u64) -> impl Future<Output = Result<Option<Round>>>;

    /// Save a round only if the stored version equals `expected_version`
    /// (0 = the round must not exist yet).
    fn save_round(
        &mut self,
        round: Round,
        expected_version: u64,
    ) -> impl Future<Output = Result<SaveOutcome>>;

    /// Allocate the next nonce for `(user, commitment)`: returns the
    /// count of rounds previously started against that commitment and
    /// advances it.
    fn allocate_nonce(
        &mut self,
        user: u64,
        commitment: &Commitment,
    ) -> impl Future<Output = Result<u64>>;

    fn next_round_id(&mut self) -> impl Future<Output = Result<u64>>;
}

/// Balance ledger. Stake debits happen before state is persisted; a
/// refused debit aborts the action with the round untouched.
pub trait Ledger {
    fn debit(&mut self, user: u64, amount: u64) -> impl Future<Output = Result<DebitOutcome>>;
    fn credit(&mut self, user: u64, amount: u64) -> impl Future<Output = Result<()>>;
}

/// Fire-and-forget settlement notifications.
pub trait Broadcast {
    fn publish(&mut self, event: EngineEvent) -> impl Future<Output = Result<()>>;
}

/// The engine facade collaborators talk to.
pub struct CasinoService<S, L, B> {
    store: S,
    ledger: L,
    broadcast: B,
    seeds: Arc<SeedManager>,
    config: EngineConfig,
}

impl<S: RoundStore, L: Ledger, B: Broadcast> CasinoService<S, L, B> {
    pub fn new(store: S, ledger: L, broadcast: B, seeds: Arc<SeedManager>) -> Self {
        Self {
            store,
            ledger,
            broadcast,
            seeds,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Tear the service down into its collaborators (e.g. to rebuild it
    /// over the same store after a simulated restart).
    pub fn into_parts(self) -> (S, L, B) {
        (self.store, self.ledger, self.broadcast)
    }

    /// Start a round: allocate a nonce against the active commitment,
    /// debit the stake, deal, persist.
    pub async fn start_round(
        &mut self,
        user: u64,
        client_seed: String,
        params: StartParams,
    ) -> Result<RoundView, Error> {
        if client_seed.len() > MAX_CLIENT_SEED_LEN {
            return Err(ValidationError::ClientSeedTooLong.into());
        }
        let seed = self.seeds.active_seed()?;

        // Debit before any store mutation: a refused stake aborts with
        // nothing allocated or persisted.
        let staked = match &params {
            StartParams::Blackjack { bet, side_bets } => bet
                .saturating_add(side_bets.perfect_pairs)
                .saturating_add(side_bets.twenty_one_plus_three),
            StartParams::HiLo => 0,
        };
        self.debit_or_abort(user, staked).await?;

        let nonce = self.store.allocate_nonce(user, &seed.commitment).await?;
        let id = self.store.next_round_id().await?;

        let ctx = DrawContext::new(seed.secret(), &client_seed, nonce);
        let (game, credited) = match params {
            StartParams::Blackjack { bet, side_bets } => {
                let (round, credited) =
                    blackjack::deal(&ctx, bet, side_bets, &self.config.blackjack)?;
                (GameRound::Blackjack(round), credited)
            }
            StartParams::HiLo => (GameRound::HiLo(hilo::deal(&ctx)?), 0),
        };

        let round = Round {
            id,
            user,
            client_seed,
            nonce,
            commitment: seed.commitment,
            version: 1,
            game,
        };
        match self.store.save_round(round.clone(), 0).await? {
            SaveOutcome::Saved => {}
            SaveOutcome::Conflict { found } => {
                if staked > 0 {
                    self.ledger.credit(user, staked).await?;
                }
                return Err(ConcurrencyError::Conflict {
                    round: id,
                    expected: 0,
                    found,
                }
                .into());
            }
        }

        if credited > 0 {
            self.ledger.credit(user, credited).await?;
        }
        if round.status() == RoundStatus::Settled {
            self.publish_settlement(&round).await;
        }
        tracing::debug!(round = id, user, nonce, "round started");
        Ok(build_view(&round, &self.config))
    }

    /// Apply an in-round action. Actions against a settled round return
    /// the stored result idempotently; a concurrent write is rejected for
    /// explicit caller retry.
    pub async fn act(
        &mut self,
        round_id: u64,
        user: u64,
        action: Action,
    ) -> Result<RoundView, Error> {
        let stored = self
            .store
            .load_round(round_id)
            .await?
            .ok_or(ValidationError::RoundNotFound(round_id))?;
        if stored.user != user {
            return Err(ValidationError::NotRoundOwner(round_id).into());
        }
        if stored.status() == RoundStatus::Settled {
            tracing::debug!(round = round_id, "action on settled round, returning stored result");
            return Ok(build_view(&stored, &self.config));
        }

        // The round keeps using the secret captured at start, even if the
        // active seed rotated since.
        let secret = self.seeds.secret_for(&stored.commitment)?;
        let client_seed = stored.client_seed.clone();
        let ctx = DrawContext::new(&secret, &client_seed, stored.nonce);

        let mut round = stored;
        let receipt = match (&mut round.game, action) {
            (GameRound::Blackjack(bj), Action::Blackjack(action)) => {
                blackjack::apply(bj, action, &ctx, &self.config.blackjack)?
            }
            (GameRound::HiLo(hilo_round), Action::HiLo(action)) => {
                hilo::apply(hilo_round, action, &ctx, &self.config.hilo)?
            }
            _ => {
                return Err(ValidationError::IllegalAction {
                    action: "wrong game for this round",
                }
                .into())
            }
        };

        self.debit_or_abort(user, receipt.staked).await?;

        let expected = round.version;
        round.version += 1;
        match self.store.save_round(round.clone(), expected).await? {
            SaveOutcome::Saved => {}
            SaveOutcome::Conflict { found } => {
                if receipt.staked > 0 {
                    // The round was not persisted; hand the stake back.
                    self.ledger.credit(user, receipt.staked).await?;
                }
                tracing::warn!(
                    round = round_id,
                    expected,
                    found,
                    "concurrent round write rejected"
                );
                return Err(ConcurrencyError::Conflict {
                    round: round_id,
                    expected,
                    found,
                }
                .into());
            }
        }

        if receipt.credited > 0 {
            self.ledger.credit(user, receipt.credited).await?;
        }
        if round.status() == RoundStatus::Settled {
            self.publish_settlement(&round).await;
        }
        Ok(build_view(&round, &self.config))
    }

    /// Evaluate a roulette spin: one draw, immediate settlement, no round
    /// object.
    pub async fn spin(
        &mut self,
        user: u64,
        client_seed: String,
        bets: Vec<RouletteBet>,
    ) -> Result<SpinResult, Error> {
        if client_seed.len() > MAX_CLIENT_SEED_LEN {
            return Err(ValidationError::ClientSeedTooLong.into());
        }
        roulette::validate_bets(&bets)?;

        let seed = self.seeds.active_seed()?;
        let staked = roulette::total_staked(&bets);
        self.debit_or_abort(user, staked).await?;
        let nonce = self.store.allocate_nonce(user, &seed.commitment).await?;

        let ctx = DrawContext::new(seed.secret(), &client_seed, nonce);
        let number = roulette::spin(&ctx);
        let outcomes = roulette::evaluate(number, &bets);
        let payout = roulette::total_payout(&outcomes);
        if payout > 0 {
            self.ledger.credit(user, payout).await?;
        }

        let event = EngineEvent::SpinSettled {
            user,
            nonce,
            number,
            staked,
            payout,
        };
        tracing::info!(
            user,
            nonce,
            number,
            staked,
            payout,
            event = %serde_json::to_string(&event).unwrap_or_default(),
            "spin settled"
        );
        if let Err(error) = self.broadcast.publish(event).await {
            tracing::warn!(user, nonce, %error, "spin broadcast failed");
        }

        Ok(SpinResult {
            user,
            number,
            color: roulette::color_of(number).to_string(),
            bets: outcomes,
            total_staked: staked,
            total_payout: payout,
            client_seed,
            nonce,
            commitment: hex(&seed.commitment),
        })
    }

    /// Read-only snapshot of a round, owner-checked. Settled rounds
    /// return their stored settlement, never a recomputation.
    pub async fn round_view(&self, round_id: u64, user: u64) -> Result<RoundView, Error> {
        let round = self
            .store
            .load_round(round_id)
            .await?
            .ok_or(ValidationError::RoundNotFound(round_id))?;
        if round.user != user {
            return Err(ValidationError::NotRoundOwner(round_id).into());
        }
        Ok(build_view(&round, &self.config))
    }

    async fn debit_or_abort(&mut self, user: u64, amount: u64) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        match self.ledger.debit(user, amount).await? {
            DebitOutcome::Ok => Ok(()),
            DebitOutcome::InsufficientFunds => Err(Error::InsufficientFunds { needed: amount }),
        }
    }

    async fn publish_settlement(&mut self, round: &Round) {
        let (wagered, returned) = settlement_totals(round);
        let event = EngineEvent::RoundSettled {
            round_id: round.id,
            user: round.user,
            game: round.game.kind(),
            wagered,
            returned,
        };
        tracing::info!(
            round = round.id,
            user = round.user,
            game = ?round.game.kind(),
            wagered,
            returned,
            event = %serde_json::to_string(&event).unwrap_or_default(),
            "round settled"
        );
        if let Err(error) = self.broadcast.publish(event).await {
            tracing::warn!(round = round.id, %error, "settlement broadcast failed");
        }
    }
}

/// Total money in and out of a settled round, side wagers included.
fn settlement_totals(round: &Round) -> (u64, u64) {
    match &round.game {
        GameRound::Blackjack(bj) => {
            let main = bj.settlement.unwrap_or(fairdeck_types::Settlement {
                wagered: 0,
                returned: 0,
            });
            let insurance_stake = bj.insurance.as_ref().map_or(0, |i| i.stake);
            let insurance_payout = bj.insurance.as_ref().map_or(0, |i| i.payout);
            let wagered = main
                .wagered
                .saturating_add(bj.side_bets.perfect_pairs)
                .saturating_add(bj.side_bets.twenty_one_plus_three)
                .saturating_add(insurance_stake);
            let returned = main
                .returned
                .saturating_add(bj.perfect_pairs_return)
                .saturating_add(bj.twenty_one_plus_three_return)
                .saturating_add(insurance_payout);
            (wagered, returned)
        }
        GameRound::HiLo(hilo_round) => hilo_round
            .settlement
            .as_ref()
            .map_or((0, 0), |settlement| (settlement.wager, settlement.payout)),
    }
}

/// Build the client view of a round. The secret never appears; the
/// commitment renders as hex.
pub fn build_view(round: &Round, config: &EngineConfig) -> RoundView {
    let game = match &round.game {
        GameRound::Blackjack(bj) => GameView::Blackjack(blackjack::view(bj)),
        GameRound::HiLo(hilo_round) => GameView::HiLo(hilo::view(hilo_round, &config.hilo)),
    };
    RoundView {
        id: round.id,
        user: round.user,
        status: round.status(),
        client_seed: round.client_seed.clone(),
        nonce: round.nonce,
        commitment: hex(&round.commitment),
        version: round.version,
        game,
    }
}
