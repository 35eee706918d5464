//! In-memory collaborators for tests and embedding-side harnesses.
//!
//! [`MemoryStore`] persists rounds through the real wire codec — every
//! load decodes and re-validates the stored bytes, so tests exercise the
//! same schema boundary a durable store would.

use crate::service::{Broadcast, DebitOutcome, Ledger, RoundStore, SaveOutcome};
use anyhow::{anyhow, Result};
use commonware_codec::{DecodeExt as _, Encode};
use fairdeck_types::{Commitment, EngineEvent, Round};
use std::collections::HashMap;

/// Codec-backed in-memory round store.
#[derive(Default)]
pub struct MemoryStore {
    rounds: HashMap<u64, Vec<u8>>,
    versions: HashMap<u64, u64>,
    nonces: HashMap<(u64, Commitment), u64>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rounds.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Corrupt a stored round's bytes, for schema-boundary tests.
    pub fn corrupt(&mut self, id: u64) {
        if let Some(bytes) = self.rounds.get_mut(&id) {
            bytes.truncate(bytes.len() / 2);
        }
    }
}

impl RoundStore for MemoryStore {
    async fn load_round(&self, id: u64) -> Result<Option<Round>> {
        let Some(bytes) = self.rounds.get(&id) else {
            return Ok(None);
        };
        let round = Round::decode(bytes.as_slice())
            .map_err(|error| anyhow!("stored round {} is malformed: {}", id, error))?;
        Ok(Some(round))
    }

    async fn save_round(&mut self, round: Round, expected_version: u64) -> Result<SaveOutcome> {
        let found = self.versions.get(&round.id).copied().unwrap_or(0);
        if found != expected_version {
            return Ok(SaveOutcome::Conflict { found });
        }
        self.versions.insert(round.id, round.version);
        self.rounds.insert(round.id, round.encode().as_ref().to_vec());
        Ok(SaveOutcome::Saved)
    }

    async fn allocate_nonce(&mut self, user: u64, commitment: &Commitment) -> Result<u64> {
        let counter = self.nonces.entry((user, *commitment)).or_insert(0);
        let nonce = *counter;
        *counter += 1;
        Ok(nonce)
    }

    async fn next_round_id(&mut self) -> Result<u64> {
        self.next_id += 1;
        Ok(self.next_id)
    }
}

/// In-memory balance ledger.
#[derive(Default)]
pub struct MemoryLedger {
    balances: HashMap<u64, u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user balance.
    pub fn fund(&mut self, user: u64, amount: u64) {
        *self.balances.entry(user).or_insert(0) += amount;
    }

    pub fn balance(&self, user: u64) -> u64 {
        self.balances.get(&user).copied().unwrap_or(0)
    }
}

impl Ledger for MemoryLedger {
    async fn debit(&mut self, user: u64, amount: u64) -> Result<DebitOutcome> {
        let balance = self.balances.entry(user).or_insert(0);
        if *balance < amount {
            return Ok(DebitOutcome::InsufficientFunds);
        }
        *balance -= amount;
        Ok(DebitOutcome::Ok)
    }

    async fn credit(&mut self, user: u64, amount: u64) -> Result<()> {
        *self.balances.entry(user).or_insert(0) += amount;
        Ok(())
    }
}

/// Broadcast sink that records every published event.
#[derive(Default)]
pub struct RecordingBroadcast {
    pub events: Vec<EngineEvent>,
}

impl RecordingBroadcast {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Broadcast for RecordingBroadcast {
    async fn publish(&mut self, event: EngineEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}

/// Broadcast sink that always fails, for verifying settlements survive a
/// dead event bus.
#[derive(Default)]
pub struct FailingBroadcast;

impl Broadcast for FailingBroadcast {
    async fn publish(&mut self, _event: EngineEvent) -> Result<()> {
        Err(anyhow!("broadcast channel unavailable"))
    }
}
