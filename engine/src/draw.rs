//! Deterministic draw primitive.
//!
//! Every random outcome in the engine reduces to
//! `draw(secret, client_seed, nonce, draw_index, range)`:
//!
//! 1. The keystream is seeded with
//!    `HMAC-SHA256(key = secret, message = client_seed ":" nonce ":" draw_index)`
//!    (RFC 2104 construction over SHA-256, 64-byte block).
//! 2. The 32-byte block is consumed as big-endian `u64` words and
//!    rejection-sampled into `[0, range)`: a word is accepted when it falls
//!    below the largest multiple of `range` representable in 64 bits.
//!    Exhausted blocks extend the keystream as `block = SHA-256(block)`.
//!
//! Rejection sampling makes the mapping exactly uniform over the range —
//! there is no modulo or floor-scaling bias to bound. The probability that
//! any single word is rejected is `range / 2^64` (below `2^-58` for every
//! range this engine uses), so keystream extension is vanishingly rare but
//! fully deterministic when it occurs.
//!
//! The function is pure: identical inputs always produce identical output,
//! which is what makes after-the-fact verification possible once the
//! secret is revealed. There is no internal state and no locking; any
//! number of rounds may call it concurrently.

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;

/// HMAC-SHA256 block length in bytes.
const HMAC_BLOCK_LEN: usize = 64;

/// Inputs a round captures at start: everything `draw` needs besides the
/// per-draw index and range.
#[derive(Clone, Copy, Debug)]
pub struct DrawContext<'a> {
    pub secret: &'a [u8; 32],
    pub client_seed: &'a str,
    pub nonce: u64,
}

impl<'a> DrawContext<'a> {
    pub fn new(secret: &'a [u8; 32], client_seed: &'a str, nonce: u64) -> Self {
        Self {
            secret,
            client_seed,
            nonce,
        }
    }

    /// Draw an integer in `[0, range)` for the given draw index.
    pub fn draw(&self, draw_index: u32, range: u32) -> u32 {
        draw(self.secret, self.client_seed, self.nonce, draw_index, range)
    }
}

/// HMAC-SHA256 per RFC 2104 over the 64-byte SHA-256 block.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut key_block = [0u8; HMAC_BLOCK_LEN];
    if key.len() > HMAC_BLOCK_LEN {
        let mut hasher = Sha256::new();
        hasher.update(key);
        key_block[..32].copy_from_slice(&hasher.finalize().0);
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut ipad = [0x36u8; HMAC_BLOCK_LEN];
    let mut opad = [0x5cu8; HMAC_BLOCK_LEN];
    for i in 0..HMAC_BLOCK_LEN {
        ipad[i] ^= key_block[i];
        opad[i] ^= key_block[i];
    }

    let mut inner = Sha256::new();
    inner.update(&ipad);
    inner.update(message);
    let inner_digest = inner.finalize().0;

    let mut outer = Sha256::new();
    outer.update(&opad);
    outer.update(&inner_digest);
    outer.finalize().0
}

/// Map `(secret, client_seed, nonce, draw_index)` to an integer in
/// `[0, range)`. Returns 0 for an empty range.
pub fn draw(secret: &[u8; 32], client_seed: &str, nonce: u64, draw_index: u32, range: u32) -> u32 {
    if range == 0 {
        return 0;
    }

    let message = format!("{}:{}:{}", client_seed, nonce, draw_index);
    let mut block = hmac_sha256(secret, message.as_bytes());

    // Largest multiple of `range` below 2^64; words at or above it are
    // rejected so every residue is equally likely.
    let range = range as u64;
    let limit = u64::MAX - (u64::MAX % range);
    loop {
        for chunk in block.chunks_exact(8) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            let value = u64::from_be_bytes(word);
            if value < limit {
                return (value % range) as u32;
            }
        }
        // Keystream exhausted without an accepted word; extend it.
        let mut hasher = Sha256::new();
        hasher.update(&block);
        block = hasher.finalize().0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn secret(fill: u8) -> [u8; 32] {
        [fill; 32]
    }

    #[test]
    fn test_draw_deterministic() {
        let s = secret(7);
        for index in 0..20 {
            let a = draw(&s, "client", 3, index, 52);
            let b = draw(&s, "client", 3, index, 52);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_draw_in_range() {
        let s = secret(9);
        for index in 0..200 {
            for range in [1u32, 2, 13, 37, 52] {
                let value = draw(&s, "seed", index as u64, index, range);
                assert!(value < range, "value {} out of range {}", value, range);
            }
        }
    }

    #[test]
    fn test_draw_varies_with_each_input() {
        let s = secret(1);
        let base = draw(&s, "client", 5, 0, 52);
        // Flipping any single input should (overwhelmingly) change the
        // output; check a handful of neighbors differ somewhere.
        let variants = [
            draw(&secret(2), "client", 5, 0, 52),
            draw(&s, "client2", 5, 0, 52),
            draw(&s, "client", 6, 0, 52),
            draw(&s, "client", 5, 1, 52),
        ];
        assert!(
            variants.iter().any(|&v| v != base),
            "all input variations collided"
        );
    }

    #[test]
    fn test_draw_distribution_is_roughly_uniform() {
        let s = secret(3);
        let range = 13u32;
        let samples = 13_000u32;
        let mut counts = [0u32; 13];
        for index in 0..samples {
            counts[draw(&s, "dist", 0, index, range) as usize] += 1;
        }
        let expected = (samples / range) as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&count| {
                let diff = count as f64 - expected;
                diff * diff / expected
            })
            .sum();
        // 12 degrees of freedom; p=0.001 critical value is ~32.9.
        assert!(chi_square < 40.0, "chi-square = {}", chi_square);
    }

    #[test]
    fn test_hmac_known_structure() {
        // HMAC with all-zero key equals HMAC with the zero-padded empty
        // key; sanity-check the construction is key-sensitive instead of
        // degenerate.
        let a = hmac_sha256(&[0u8; 32], b"message");
        let b = hmac_sha256(&[1u8; 32], b"message");
        assert_ne!(a, b);
        let c = hmac_sha256(&[0u8; 32], b"other");
        assert_ne!(a, c);
    }

    #[test]
    fn test_long_key_is_hashed_down() {
        let long_key = [0xAAu8; 100];
        let short_key = [0xAAu8; 64];
        assert_ne!(
            hmac_sha256(&long_key, b"m"),
            hmac_sha256(&short_key, b"m"),
            "keys longer than the block must be hashed first"
        );
    }

    proptest! {
        #[test]
        fn prop_draw_deterministic(fill in 0u8..=255, nonce in 0u64..1_000, index in 0u32..1_000) {
            let s = secret(fill);
            prop_assert_eq!(
                draw(&s, "prop", nonce, index, 52),
                draw(&s, "prop", nonce, index, 52)
            );
        }

        #[test]
        fn prop_draw_in_range(fill in 0u8..=255, index in 0u32..1_000, range in 1u32..100) {
            let s = secret(fill);
            prop_assert!(draw(&s, "prop", 0, index, range) < range);
        }
    }
}
