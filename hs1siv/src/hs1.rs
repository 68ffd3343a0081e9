//! HS1: the universal hash underlying HS1-SIV.
//!
//! HS1 is built in three layers:
//!
//! 1. **NH**: a multiply-accumulate hash over 64-byte blocks of 32-bit words,
//!    computed independently for each of the six hash rounds (lanes).
//! 2. **Poly**: each lane's NH output is folded into a running polynomial
//!    evaluation modulo the Mersenne prime `2^61 - 1`.
//! 3. **ASU**: each finished 61-bit polynomial value is compressed to 32 bits
//!    by an almost-strongly-universal hash.
//!
//! The bulk block loop ([`Backend::hash_step`](crate::backend::Backend)) is
//! dispatched to the selected backend; finalization is shared.

use core::ops::{Deref, DerefMut};
use zeroize::{Zeroize, Zeroizing};

/// NH block length in bytes (parameter `b`).
pub(crate) const NH_LEN: usize = 64;

/// Number of parallel hash rounds (parameter `t`).
pub(crate) const HASH_ROUNDS: usize = 6;

/// SIV length in bytes (parameter `l`).
pub(crate) const SIV_LEN: usize = 32;

/// Size of an NH window in bytes: NH pairs up words `(0, 2)` and `(1, 3)`.
pub(crate) const WINDOW_LEN: usize = 16;

/// Number of 32-bit NH key words: one block plus 4 words per extra round.
pub(crate) const NH_KEY_WORDS: usize = NH_LEN / 4 + 4 * (HASH_ROUNDS - 1);

/// Number of 64-bit ASU key words: 3 per round.
pub(crate) const ASU_KEY_WORDS: usize = 3 * HASH_ROUNDS;

/// Size of the serialized hash key in bytes.
pub(crate) const HASH_KEY_SIZE: usize = NH_KEY_WORDS * 4 + HASH_ROUNDS * 8 + ASU_KEY_WORDS * 8;

/// Size of a finalized hash in bytes: 32 bits per round.
pub(crate) const DIGEST_SIZE: usize = 4 * HASH_ROUNDS;

/// `2^60 - 1`
pub(crate) const M60: u64 = (1 << 60) - 1;

/// `2^61 - 1`
pub(crate) const M61: u64 = (1 << 61) - 1;

/// HS1 key material, derived from the ChaCha20 key schedule.
#[derive(Clone)]
pub(crate) struct HashKey {
    /// NH key words.
    pub(crate) nh: [u32; NH_KEY_WORDS],

    /// Poly keys, one per round, reduced to 60 bits.
    pub(crate) poly: [u64; HASH_ROUNDS],

    /// ASU keys, a triple per round.
    pub(crate) asu: [u64; ASU_KEY_WORDS],
}

impl HashKey {
    /// Parse the little-endian key layout `nh || poly || asu`.
    pub(crate) fn from_bytes(bytes: &[u8; HASH_KEY_SIZE]) -> Self {
        let (nh_bytes, rest) = bytes.split_at(NH_KEY_WORDS * 4);
        let (poly_bytes, asu_bytes) = rest.split_at(HASH_ROUNDS * 8);

        let mut key = Self {
            nh: [0; NH_KEY_WORDS],
            poly: [0; HASH_ROUNDS],
            asu: [0; ASU_KEY_WORDS],
        };

        for (word, chunk) in key.nh.iter_mut().zip(nh_bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for (word, chunk) in key.poly.iter_mut().zip(poly_bytes.chunks_exact(8)) {
            *word = load_u64(chunk) & M60;
        }

        for (word, chunk) in key.asu.iter_mut().zip(asu_bytes.chunks_exact(8)) {
            *word = load_u64(chunk);
        }

        key
    }
}

impl Zeroize for HashKey {
    fn zeroize(&mut self) {
        self.nh.zeroize();
        self.poly.zeroize();
        self.asu.zeroize();
    }
}

impl Drop for HashKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Per-round polynomial accumulators.
///
/// Every lane starts at 1 rather than 0 so that hashing no input at all
/// still yields a key-dependent digest.
pub(crate) struct Accumulator([u64; HASH_ROUNDS]);

impl Accumulator {
    pub(crate) fn new() -> Self {
        Self([1; HASH_ROUNDS])
    }
}

impl Deref for Accumulator {
    type Target = [u64; HASH_ROUNDS];

    fn deref(&self) -> &[u64; HASH_ROUNDS] {
        &self.0
    }
}

impl DerefMut for Accumulator {
    fn deref_mut(&mut self) -> &mut [u64; HASH_ROUNDS] {
        &mut self.0
    }
}

impl Drop for Accumulator {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Return 63 bits congruent to `a*k + b mod (2^61 - 1)`.
///
/// Assumes a 60-bit `k` and `b` and a 63-bit `a`. The 64x64-bit product is
/// assembled from 32x32-bit partial products so that no wide multiply is
/// required.
#[inline(always)]
pub(crate) fn poly_step(a: u64, b: u64, k: u64) -> u64 {
    let (a_hi, a_lo) = (a >> 32, a & 0xffff_ffff);
    let (k_hi, k_lo) = (k >> 32, k & 0xffff_ffff);

    let m = (a_hi * k_lo).wrapping_add(k_hi * a_lo);
    let h = a_hi * k_hi;
    let l = a_lo * k_lo;

    (l & M61)
        .wrapping_add(h << 3)
        .wrapping_add(l >> 61)
        .wrapping_add(b)
        .wrapping_add(m >> 29)
        .wrapping_add((m << 32) & M61)
}

/// Reduce `a` to its canonical residue mod `2^61 - 1` in constant time.
#[inline]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn poly_finalize(a: u64) -> u64 {
    let a = (a & M61) + (a >> 61);
    // all ones iff `a >= 2^61 - 1`
    let mask = ((M61 - 1).wrapping_sub(a) as i64 >> 63) as u64;
    a - (mask & M61)
}

/// Compress a 61-bit value to 32 bits.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn asu_hash(x: u64, k: &[u64]) -> u32 {
    let t = k[0]
        .wrapping_add(k[1].wrapping_mul(x & 0xffff_ffff))
        .wrapping_add(k[2].wrapping_mul(x >> 32));
    (t >> 32) as u32
}

/// NH over up to one block of input, one 16-byte window at a time.
///
/// `input` must be a multiple of [`WINDOW_LEN`] and at most [`NH_LEN`] bytes.
#[inline]
pub(crate) fn nh(key: &[u32; NH_KEY_WORDS], input: &[u8]) -> [u64; HASH_ROUNDS] {
    debug_assert!(input.len() % WINDOW_LEN == 0 && input.len() <= NH_LEN);

    let mut res = [0u64; HASH_ROUNDS];

    for (i, window) in input.chunks_exact(WINDOW_LEN).enumerate() {
        let mut m = [0u32; 4];
        for (word, chunk) in m.iter_mut().zip(window.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for (round, acc) in res.iter_mut().enumerate() {
            let k = &key[4 * (i + round)..][..4];
            let p0 = u64::from(m[0].wrapping_add(k[0])) * u64::from(m[2].wrapping_add(k[2]));
            let p1 = u64::from(m[1].wrapping_add(k[1])) * u64::from(m[3].wrapping_add(k[3]));
            *acc = acc.wrapping_add(p0).wrapping_add(p1);
        }

        m.zeroize();
    }

    res
}

/// Fold one block's NH output into the polynomial accumulators.
#[inline(always)]
pub(crate) fn poly_absorb(key: &HashKey, nh: &[u64; HASH_ROUNDS], accum: &mut [u64; HASH_ROUNDS]) {
    for ((acc, &n), &k) in accum.iter_mut().zip(nh).zip(&key.poly) {
        *acc = poly_step(*acc, n & M60, k);
    }
}

/// Absorb a final (possibly empty) partial block and produce the digest.
///
/// Unlike the block path, the tail is not zero-padded to a full block: NH only
/// runs over the 16-byte windows actually present. `input` must be a multiple
/// of [`WINDOW_LEN`] and at most [`NH_LEN`] bytes.
pub(crate) fn hash_finalize(
    key: &HashKey,
    input: &[u8],
    accum: &mut [u64; HASH_ROUNDS],
) -> Zeroizing<[u8; DIGEST_SIZE]> {
    if !input.is_empty() {
        let mut res = nh(&key.nh, input);
        poly_absorb(key, &res, accum);
        res.zeroize();
    }

    let mut digest = Zeroizing::new([0u8; DIGEST_SIZE]);
    for (round, (out, &acc)) in digest.chunks_exact_mut(4).zip(accum.iter()).enumerate() {
        let s = asu_hash(poly_finalize(acc), &key.asu[3 * round..][..3]);
        out.copy_from_slice(&s.to_le_bytes());
    }

    digest
}

fn load_u64(chunk: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(chunk);
    u64::from_le_bytes(bytes)
}
