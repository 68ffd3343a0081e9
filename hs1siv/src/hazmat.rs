//! Hazardous materials: functionality which can be misused and needs to be used with care.
//!
//! <div class="warning">
//! Functionality provided in this module is low-level and intended for testing, benchmarking and
//! constructing higher-level primitives as opposed to being used directly.
//! </div>

use crate::{
    Hs1Siv,
    backend::{self, Backend, REFERENCE},
    chacha, hs1,
    siv::KeySchedule,
};
use core::fmt::{self, Debug};

/// Size of an HS1 block in bytes
pub const NH_LEN: usize = hs1::NH_LEN;

/// Number of parallel hash rounds (accumulator lanes)
pub const HASH_ROUNDS: usize = hs1::HASH_ROUNDS;

/// Size of a raw HS1 hash key in bytes
pub const HASH_KEY_SIZE: usize = hs1::HASH_KEY_SIZE;

/// Size of an HS1 digest in bytes
pub const DIGEST_SIZE: usize = hs1::DIGEST_SIZE;

/// A set of HS1-SIV inner loops (ChaCha20 keystream and HS1 block step).
#[derive(Clone, Copy)]
pub struct Implementation(&'static Backend);

impl Implementation {
    /// The portable implementation, available on every target.
    #[must_use]
    pub fn reference() -> Self {
        Self(&REFERENCE)
    }

    /// The implementation [`Hs1Siv::new`] picks on this machine.
    #[must_use]
    pub fn detected() -> Self {
        Self(backend::detect())
    }

    /// The CPU-specific implementation, if the running CPU supports one.
    #[must_use]
    pub fn accelerated() -> Option<Self> {
        backend::accelerated().map(Self)
    }

    /// Human-readable name, e.g. `"Reference"` or `"AVX2"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name
    }

    /// Whether this implementation relies on CPU-specific instructions.
    #[must_use]
    pub fn is_accelerated(self) -> bool {
        self.0.accelerated
    }
}

impl Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Implementation").field(&self.0.name).finish()
    }
}

impl Hs1Siv {
    /// Initialize HS1-SIV with the given key, forcing a specific
    /// implementation.
    ///
    /// # Panics
    ///
    /// If `key` is not exactly [`KEY_SIZE`](crate::KEY_SIZE) bytes long.
    #[must_use]
    pub fn with_implementation(key: &[u8], implementation: Implementation) -> Self {
        Self::with_backend(implementation.0, key)
    }
}

/// HS1 hash key, as expanded from a user key by the HS1-SIV key schedule.
#[derive(Clone)]
pub struct HashKey(hs1::HashKey);

impl HashKey {
    /// Expand the hash key belonging to an HS1-SIV `key`.
    ///
    /// # Panics
    ///
    /// If `key` is not exactly [`KEY_SIZE`](crate::KEY_SIZE) bytes long.
    #[must_use]
    pub fn from_aead_key(key: &[u8]) -> Self {
        let Ok(key) = <&[u8; crate::KEY_SIZE]>::try_from(key) else {
            panic!("hs1siv: invalid key size");
        };
        Self(KeySchedule::new(&REFERENCE, key).hash_key().clone())
    }

    /// Parse a raw little-endian `nh || poly || asu` key. Poly keys are
    /// masked to 60 bits.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HASH_KEY_SIZE]) -> Self {
        Self(hs1::HashKey::from_bytes(bytes))
    }
}

impl Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashKey").finish_non_exhaustive()
    }
}

/// XOR the ChaCha20 keystream for `key` and `nonce`, starting at block
/// `counter`, into `buf`.
///
/// # Panics
///
/// If `buf` needs more blocks than remain before the 32-bit counter wraps.
pub fn chacha20_xor(
    implementation: Implementation,
    key: &[u8; 32],
    nonce: &[u8; 12],
    counter: u32,
    buf: &mut [u8],
) {
    chacha::apply_keystream(implementation.0, key, nonce, counter, buf);
}

/// Absorb whole [`NH_LEN`]-byte blocks into the per-round accumulators.
///
/// Fresh accumulators start with every lane set to 1.
///
/// # Panics
///
/// If `input` is not a multiple of [`NH_LEN`] bytes long.
pub fn hash_step(
    implementation: Implementation,
    key: &HashKey,
    input: &[u8],
    accum: &mut [u64; HASH_ROUNDS],
) {
    assert!(
        input.len() % NH_LEN == 0,
        "hs1siv: hash input must be a multiple of the block size"
    );
    (implementation.0.hash_step)(&key.0, input, accum);
}

/// Absorb a final partial block and return the [`DIGEST_SIZE`]-byte digest.
///
/// # Panics
///
/// If `input` is longer than [`NH_LEN`] or not a multiple of 16 bytes.
#[must_use]
pub fn hash_finalize(
    key: &HashKey,
    input: &[u8],
    accum: &mut [u64; HASH_ROUNDS],
) -> [u8; DIGEST_SIZE] {
    assert!(
        input.len() <= NH_LEN && input.len() % hs1::WINDOW_LEN == 0,
        "hs1siv: invalid hash tail length"
    );
    *hs1::hash_finalize(&key.0, input, accum)
}
