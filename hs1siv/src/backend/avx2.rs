//! AVX2 implementation of the HS1-SIV inner loops for x86/x86_64 CPUs
//! (i.e. Intel Haswell-compatible or newer).
//!
//! ChaCha20 runs two blocks at a time with each 256-bit register holding the
//! same state row for two consecutive counters. The NH pass multiplies all
//! eight word pairs of a block per round with `vpmuludq`; the polynomial step
//! is shared with the reference code.

#![allow(unused_unsafe)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::{
    chacha::{BLOCK_SIZE, COUNTER_WORD, ROUNDS, STATE_WORDS},
    hs1::{self, HASH_ROUNDS, HashKey, NH_LEN},
};
use zeroize::Zeroize;

/// Number of keystream blocks generated per iteration.
const PAR_BLOCKS: usize = 2;

/// XOR ChaCha20 keystream blocks into `buf`.
///
/// # Safety
///
/// The AVX2 target feature must be available.
#[allow(clippy::cast_possible_truncation)]
#[target_feature(enable = "avx2")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; STATE_WORDS], buf: &mut [u8]) {
    let rows = unsafe { load_rows(state) };

    let mut chunks = buf.chunks_exact_mut(PAR_BLOCKS * BLOCK_SIZE);
    for chunk in &mut chunks {
        let ks = unsafe { keystream_blocks(&rows, state[COUNTER_WORD]) };
        for (part, k) in chunk.chunks_exact_mut(32).zip(&ks) {
            unsafe {
                let p = _mm256_loadu_si256(part.as_ptr().cast());
                _mm256_storeu_si256(part.as_mut_ptr().cast(), _mm256_xor_si256(p, *k));
            }
        }
        state[COUNTER_WORD] = state[COUNTER_WORD].wrapping_add(PAR_BLOCKS as u32);
    }

    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let ks = unsafe { keystream_blocks(&rows, state[COUNTER_WORD]) };
        let mut scratch = [0u8; PAR_BLOCKS * BLOCK_SIZE];
        for (part, k) in scratch.chunks_exact_mut(32).zip(&ks) {
            unsafe { _mm256_storeu_si256(part.as_mut_ptr().cast(), *k) };
        }

        for (b, k) in tail.iter_mut().zip(&scratch) {
            *b ^= k;
        }

        scratch.zeroize();
        let used = tail.len().div_ceil(BLOCK_SIZE) as u32;
        state[COUNTER_WORD] = state[COUNTER_WORD].wrapping_add(used);
    }
}

/// Absorb whole NH blocks into the accumulators.
///
/// # Safety
///
/// The AVX2 and BMI2 target features must be available.
#[target_feature(enable = "avx2,bmi2")]
pub(super) unsafe fn hash_step(key: &HashKey, input: &[u8], accum: &mut [u64; HASH_ROUNDS]) {
    debug_assert_eq!(input.len() % NH_LEN, 0);

    // Round `r` uses NH key words `4r..4r + 16`, loaded as two 8-word halves.
    let mut k = [[unsafe { _mm256_setzero_si256() }; 2]; HASH_ROUNDS];
    for (round, halves) in k.iter_mut().enumerate() {
        let words = &key.nh[4 * round..][..16];
        unsafe {
            halves[0] = _mm256_loadu_si256(words.as_ptr().cast());
            halves[1] = _mm256_loadu_si256(words[8..].as_ptr().cast());
        }
    }

    for block in input.chunks_exact(NH_LEN) {
        let (m0, m1) = unsafe {
            (
                _mm256_loadu_si256(block.as_ptr().cast()),
                _mm256_loadu_si256(block[32..].as_ptr().cast()),
            )
        };

        let mut nh = [0u64; HASH_ROUNDS];
        for (out, halves) in nh.iter_mut().zip(&k) {
            *out = unsafe { nh_round(m0, m1, halves) };
        }

        hs1::poly_absorb(key, &nh, accum);
        nh.zeroize();
    }

    for halves in k.iter_mut() {
        *halves = unsafe { [_mm256_setzero_si256(); 2] };
    }
}

/// NH for a single round over one block.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn nh_round(m0: __m256i, m1: __m256i, k: &[__m256i; 2]) -> u64 {
    unsafe {
        let t0 = _mm256_add_epi32(m0, k[0]);
        let t1 = _mm256_add_epi32(m1, k[1]);

        // Each 128-bit lane holds one window `[w0, w1, w2, w3]`: spread
        // `w0, w1` and `w2, w3` into the even dwords and take
        // `w0 * w2` and `w1 * w3` as 64-bit products.
        let p0 = _mm256_mul_epu32(_mm256_shuffle_epi32(t0, 0x50), _mm256_shuffle_epi32(t0, 0xfa));
        let p1 = _mm256_mul_epu32(_mm256_shuffle_epi32(t1, 0x50), _mm256_shuffle_epi32(t1, 0xfa));
        let sum = _mm256_add_epi64(p0, p1);

        let mut lanes = [0u64; 4];
        _mm256_storeu_si256(lanes.as_mut_ptr().cast(), sum);
        let res = lanes.iter().fold(0u64, |acc, &x| acc.wrapping_add(x));
        lanes.zeroize();
        res
    }
}

/// Broadcast the four state rows into both 128-bit lanes.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load_rows(state: &[u32; STATE_WORDS]) -> [__m256i; 4] {
    unsafe {
        [
            _mm256_broadcastsi128_si256(_mm_loadu_si128(state[0..].as_ptr().cast())),
            _mm256_broadcastsi128_si256(_mm_loadu_si128(state[4..].as_ptr().cast())),
            _mm256_broadcastsi128_si256(_mm_loadu_si128(state[8..].as_ptr().cast())),
            _mm256_broadcastsi128_si256(_mm_loadu_si128(state[12..].as_ptr().cast())),
        ]
    }
}

/// Generate keystream blocks `counter` and `counter + 1`, serialized as four
/// 32-byte parts in output order.
#[inline]
#[allow(clippy::cast_possible_wrap)]
#[target_feature(enable = "avx2")]
unsafe fn keystream_blocks(rows: &[__m256i; 4], counter: u32) -> [__m256i; 4] {
    unsafe {
        // low lane: block `counter`, high lane: block `counter + 1`
        let ctr = _mm256_add_epi32(
            _mm256_set1_epi32(counter as i32),
            _mm256_set_epi32(0, 0, 0, 1, 0, 0, 0, 0),
        );
        let d = _mm256_blend_epi32(rows[3], ctr, 0b0001_0001);

        let mut v = [rows[0], rows[1], rows[2], d];
        for _ in 0..(ROUNDS / 2) {
            double_round(&mut v);
        }

        let a = _mm256_add_epi32(v[0], rows[0]);
        let b = _mm256_add_epi32(v[1], rows[1]);
        let c = _mm256_add_epi32(v[2], rows[2]);
        let d = _mm256_add_epi32(v[3], d);

        [
            _mm256_permute2x128_si256(a, b, 0x20),
            _mm256_permute2x128_si256(c, d, 0x20),
            _mm256_permute2x128_si256(a, b, 0x31),
            _mm256_permute2x128_si256(c, d, 0x31),
        ]
    }
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn double_round(v: &mut [__m256i; 4]) {
    unsafe {
        add_xor_rot(v);
        rows_to_cols(v);
        add_xor_rot(v);
        cols_to_rows(v);
    }
}

/// Four quarter rounds in parallel, one per column.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn add_xor_rot([a, b, c, d]: &mut [__m256i; 4]) {
    unsafe {
        let rol16 = _mm256_setr_epi8(
            2, 3, 0, 1, 6, 7, 4, 5, 10, 11, 8, 9, 14, 15, 12, 13, //
            2, 3, 0, 1, 6, 7, 4, 5, 10, 11, 8, 9, 14, 15, 12, 13,
        );
        let rol8 = _mm256_setr_epi8(
            3, 0, 1, 2, 7, 4, 5, 6, 11, 8, 9, 10, 15, 12, 13, 14, //
            3, 0, 1, 2, 7, 4, 5, 6, 11, 8, 9, 10, 15, 12, 13, 14,
        );

        // a += b; d ^= a; d <<<= (16, 16, 16, 16);
        *a = _mm256_add_epi32(*a, *b);
        *d = _mm256_xor_si256(*d, *a);
        *d = _mm256_shuffle_epi8(*d, rol16);

        // c += d; b ^= c; b <<<= (12, 12, 12, 12);
        *c = _mm256_add_epi32(*c, *d);
        *b = _mm256_xor_si256(*b, *c);
        *b = _mm256_xor_si256(_mm256_slli_epi32(*b, 12), _mm256_srli_epi32(*b, 20));

        // a += b; d ^= a; d <<<= (8, 8, 8, 8);
        *a = _mm256_add_epi32(*a, *b);
        *d = _mm256_xor_si256(*d, *a);
        *d = _mm256_shuffle_epi8(*d, rol8);

        // c += d; b ^= c; b <<<= (7, 7, 7, 7);
        *c = _mm256_add_epi32(*c, *d);
        *b = _mm256_xor_si256(*b, *c);
        *b = _mm256_xor_si256(_mm256_slli_epi32(*b, 7), _mm256_srli_epi32(*b, 25));
    }
}

/// Rotate rows so the diagonals line up as columns.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rows_to_cols([_, b, c, d]: &mut [__m256i; 4]) {
    unsafe {
        *b = _mm256_shuffle_epi32(*b, 0b_00_11_10_01); // <<< 1
        *c = _mm256_shuffle_epi32(*c, 0b_01_00_11_10); // <<< 2
        *d = _mm256_shuffle_epi32(*d, 0b_10_01_00_11); // <<< 3
    }
}

/// Undo [`rows_to_cols`].
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn cols_to_rows([_, b, c, d]: &mut [__m256i; 4]) {
    unsafe {
        *b = _mm256_shuffle_epi32(*b, 0b_10_01_00_11); // >>> 1
        *c = _mm256_shuffle_epi32(*c, 0b_01_00_11_10); // >>> 2
        *d = _mm256_shuffle_epi32(*d, 0b_00_11_10_01); // >>> 3
    }
}
