//! Server-seed commitment lifecycle.
//!
//! A server seed is a 32-byte secret committed to by its SHA-256 hash. The
//! commitment is published before any round plays against it; the secret
//! stays server-side until the seed is rotated out, at which point it is
//! revealed for public audit and every round played against it becomes
//! verifiable.
//!
//! Rotation never invalidates a round in progress: rounds capture the
//! commitment at start and resolve the secret through
//! [`SeedManager::secret_for`], which keeps retired seeds addressable.
//! An unknown commitment is a hard [`ConfigurationError`] — the manager
//! never substitutes a derived value for a missing secret, since doing so
//! would silently change the round's draw sequence and break the
//! reproducibility the whole scheme exists to provide.

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use commonware_utils::hex;
use fairdeck_types::{Commitment, ConfigurationError};
use rand::{CryptoRng, RngCore};
use std::sync::{Arc, RwLock};

/// An active server seed: the secret and its public commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSeed {
    secret: [u8; 32],
    pub commitment: Commitment,
    pub created_at: u64,
}

impl ServerSeed {
    /// The secret, for internal draw computation only. Never expose this
    /// through a view while the seed is active.
    pub fn secret(&self) -> &[u8; 32] {
        &self.secret
    }
}

/// A seed that has been rotated out and revealed for audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealedSeed {
    pub secret: [u8; 32],
    pub commitment: Commitment,
    pub created_at: u64,
    pub retired_at: u64,
}

/// Compute the public commitment for a secret.
pub fn commitment_of(secret: &[u8; 32]) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.finalize().0
}

#[derive(Default)]
struct SeedSlots {
    active: Option<Arc<ServerSeed>>,
    retired: Vec<RevealedSeed>,
}

/// Process-wide owner of the active seed and the retired-seed history.
///
/// The active pointer is the only shared mutable state in the engine;
/// swaps happen under a write lock while draws read through a clone of the
/// `Arc`, so a rotation mid-round cannot change which secret that round
/// uses.
#[derive(Default)]
pub struct SeedManager {
    slots: RwLock<SeedSlots>,
}

impl SeedManager {
    /// A manager with no active seed. Round creation fails with
    /// `ConfigurationError::NoActiveSeed` until `create_seed` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and activate a fresh seed, deactivating (but not
    /// revealing) any prior one. Returns the new commitment.
    pub fn create_seed<R: RngCore + CryptoRng>(&self, rng: &mut R, now: u64) -> Commitment {
        let seed = Self::fresh_seed(rng, now);
        let commitment = seed.commitment;
        let mut slots = self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slots.active.take() {
            slots.retired.push(RevealedSeed {
                secret: previous.secret,
                commitment: previous.commitment,
                created_at: previous.created_at,
                retired_at: now,
            });
        }
        slots.active = Some(Arc::new(seed));
        commitment
    }

    /// Atomically swap in a fresh seed and return the outgoing one,
    /// revealed for public audit.
    pub fn rotate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        now: u64,
    ) -> Result<RevealedSeed, ConfigurationError> {
        let seed = Self::fresh_seed(rng, now);
        let incoming = seed.commitment;
        let mut slots = self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = slots
            .active
            .take()
            .ok_or(ConfigurationError::NoActiveSeed)?;
        let revealed = RevealedSeed {
            secret: previous.secret,
            commitment: previous.commitment,
            created_at: previous.created_at,
            retired_at: now,
        };
        slots.retired.push(revealed.clone());
        slots.active = Some(Arc::new(seed));
        tracing::info!(
            retired = %hex(&revealed.commitment),
            active = %hex(&incoming),
            "server seed rotated"
        );
        Ok(revealed)
    }

    /// The commitment rounds should publish at creation.
    pub fn active_commitment(&self) -> Result<Commitment, ConfigurationError> {
        Ok(self.active_seed()?.commitment)
    }

    /// The full active seed, for internal draw computation.
    pub fn active_seed(&self) -> Result<Arc<ServerSeed>, ConfigurationError> {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .active
            .clone()
            .ok_or(ConfigurationError::NoActiveSeed)
    }

    /// Resolve the secret for a commitment captured by a round — active or
    /// retired. Unknown commitments fail; the manager never guesses.
    pub fn secret_for(&self, commitment: &Commitment) -> Result<[u8; 32], ConfigurationError> {
        let slots = self
            .slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(active) = &slots.active {
            if &active.commitment == commitment {
                return Ok(active.secret);
            }
        }
        slots
            .retired
            .iter()
            .find(|seed| &seed.commitment == commitment)
            .map(|seed| seed.secret)
            .ok_or_else(|| ConfigurationError::UnknownCommitment(hex(commitment)))
    }

    /// Revealed seeds, oldest first, for the public audit log.
    pub fn revealed(&self) -> Vec<RevealedSeed> {
        self.slots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retired
            .clone()
    }

    /// Install a known secret as the active seed, retiring any prior one.
    /// Test harnesses use this to make draw sequences predictable.
    #[cfg(any(test, feature = "mocks"))]
    pub fn install_secret(&self, secret: [u8; 32], now: u64) -> Commitment {
        let seed = ServerSeed {
            commitment: commitment_of(&secret),
            secret,
            created_at: now,
        };
        let commitment = seed.commitment;
        let mut slots = self.slots.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slots.active.take() {
            slots.retired.push(RevealedSeed {
                secret: previous.secret,
                commitment: previous.commitment,
                created_at: previous.created_at,
                retired_at: now,
            });
        }
        slots.active = Some(Arc::new(seed));
        commitment
    }

    fn fresh_seed<R: RngCore + CryptoRng>(rng: &mut R, now: u64) -> ServerSeed {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        ServerSeed {
            commitment: commitment_of(&secret),
            secret,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_no_active_seed_is_fatal() {
        let manager = SeedManager::new();
        assert_eq!(
            manager.active_commitment(),
            Err(ConfigurationError::NoActiveSeed)
        );
        assert!(manager.rotate(&mut rng(), 1).is_err());
    }

    #[test]
    fn test_commitment_matches_secret() {
        let manager = SeedManager::new();
        let mut rng = rng();
        let commitment = manager.create_seed(&mut rng, 1);
        let seed = manager.active_seed().expect("active");
        assert_eq!(commitment_of(seed.secret()), commitment);
        assert_eq!(seed.commitment, commitment);
    }

    #[test]
    fn test_rotate_reveals_outgoing_and_swaps() {
        let manager = SeedManager::new();
        let mut rng = rng();
        let first = manager.create_seed(&mut rng, 1);
        let revealed = manager.rotate(&mut rng, 2).expect("rotate");
        assert_eq!(revealed.commitment, first);
        assert_eq!(commitment_of(&revealed.secret), first);
        assert_eq!(revealed.retired_at, 2);

        let second = manager.active_commitment().expect("active");
        assert_ne!(first, second);
    }

    #[test]
    fn test_secret_for_resolves_retired_seeds() {
        let manager = SeedManager::new();
        let mut rng = rng();
        let first = manager.create_seed(&mut rng, 1);
        let secret_before = manager.secret_for(&first).expect("active secret");
        manager.rotate(&mut rng, 2).expect("rotate");
        let secret_after = manager.secret_for(&first).expect("retired secret");
        assert_eq!(secret_before, secret_after);
    }

    #[test]
    fn test_unknown_commitment_is_never_guessed() {
        // The original implementation fell back to using the commitment
        // hash itself as the secret when its cache missed, silently
        // changing draw sequences after a restart. That behavior is a
        // reproducibility bug and must not come back: resolution fails
        // loudly instead.
        let manager = SeedManager::new();
        manager.create_seed(&mut rng(), 1);
        let bogus = [0xEE; 32];
        match manager.secret_for(&bogus) {
            Err(ConfigurationError::UnknownCommitment(_)) => {}
            other => panic!("expected UnknownCommitment, got {:?}", other),
        }
    }

    #[test]
    fn test_create_seed_retires_prior_without_loss() {
        let manager = SeedManager::new();
        let mut rng = rng();
        let first = manager.create_seed(&mut rng, 1);
        let second = manager.create_seed(&mut rng, 2);
        assert_ne!(first, second);
        // The first seed's secret remains resolvable for in-flight rounds.
        assert!(manager.secret_for(&first).is_ok());
        assert_eq!(manager.active_commitment().expect("active"), second);
    }
}
