//! Portable pure Rust reference implementation of the HS1-SIV inner loops.
//!
//! Every other backend is tested for exact equivalence against this one.

use crate::{
    chacha::{BLOCK_SIZE, COUNTER_WORD, ROUNDS, STATE_WORDS},
    hs1::{self, HASH_ROUNDS, HashKey, NH_LEN},
};
use zeroize::{Zeroize, Zeroizing};

/// XOR ChaCha20 keystream blocks into `buf`.
///
/// A trailing partial block is generated in full into a scratch block and
/// only the required prefix is used.
pub(crate) fn xor_keystream(state: &mut [u32; STATE_WORDS], buf: &mut [u8]) {
    let mut chunks = buf.chunks_exact_mut(BLOCK_SIZE);

    for chunk in &mut chunks {
        let block = Zeroizing::new(keystream_block(state));
        xor_in_place(chunk, &block[..]);
        state[COUNTER_WORD] = state[COUNTER_WORD].wrapping_add(1);
    }

    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let block = Zeroizing::new(keystream_block(state));
        xor_in_place(tail, &block[..tail.len()]);
        state[COUNTER_WORD] = state[COUNTER_WORD].wrapping_add(1);
    }
}

/// Absorb whole NH blocks into the accumulators.
pub(crate) fn hash_step(key: &HashKey, input: &[u8], accum: &mut [u64; HASH_ROUNDS]) {
    debug_assert_eq!(input.len() % NH_LEN, 0);

    for block in input.chunks_exact(NH_LEN) {
        let mut nh = hs1::nh(&key.nh, block);
        hs1::poly_absorb(key, &nh, accum);
        nh.zeroize();
    }
}

/// Compute one serialized keystream block for the current state.
fn keystream_block(state: &[u32; STATE_WORDS]) -> [u8; BLOCK_SIZE] {
    let mut x = *state;

    for _ in 0..(ROUNDS / 2) {
        // column rounds
        quarter_round(0, 4, 8, 12, &mut x);
        quarter_round(1, 5, 9, 13, &mut x);
        quarter_round(2, 6, 10, 14, &mut x);
        quarter_round(3, 7, 11, 15, &mut x);

        // diagonal rounds
        quarter_round(0, 5, 10, 15, &mut x);
        quarter_round(1, 6, 11, 12, &mut x);
        quarter_round(2, 7, 8, 13, &mut x);
        quarter_round(3, 4, 9, 14, &mut x);
    }

    let mut out = [0u8; BLOCK_SIZE];
    for ((chunk, w), s) in out.chunks_exact_mut(4).zip(&x).zip(state) {
        chunk.copy_from_slice(&w.wrapping_add(*s).to_le_bytes());
    }

    x.zeroize();
    out
}

/// The ChaCha quarter round function.
#[inline(always)]
fn quarter_round(a: usize, b: usize, c: usize, d: usize, x: &mut [u32; STATE_WORDS]) {
    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(16);

    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(12);

    x[a] = x[a].wrapping_add(x[b]);
    x[d] = (x[d] ^ x[a]).rotate_left(8);

    x[c] = x[c].wrapping_add(x[d]);
    x[b] = (x[b] ^ x[c]).rotate_left(7);
}

#[inline(always)]
fn xor_in_place(dst: &mut [u8], keystream: &[u8]) {
    for (d, k) in dst.iter_mut().zip(keystream) {
        *d ^= k;
    }
}
