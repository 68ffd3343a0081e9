//! Runtime selection between the AVX2 and reference backends.

use super::{Backend, REFERENCE, avx2};
use crate::{
    chacha::STATE_WORDS,
    hs1::{HASH_ROUNDS, HashKey},
};

cpufeatures::new!(avx2_bmi2, "avx2", "bmi2");

/// AVX2 backend. Only reachable through [`accelerated`], which checks the
/// CPU features first.
static AVX2: Backend = Backend {
    name: "AVX2",
    accelerated: true,
    xor_keystream,
    hash_step,
};

fn xor_keystream(state: &mut [u32; STATE_WORDS], buf: &mut [u8]) {
    // SAFETY: `AVX2` is only handed out once `avx2_bmi2` has been detected
    unsafe { avx2::xor_keystream(state, buf) }
}

fn hash_step(key: &HashKey, input: &[u8], accum: &mut [u64; HASH_ROUNDS]) {
    // SAFETY: `AVX2` is only handed out once `avx2_bmi2` has been detected
    unsafe { avx2::hash_step(key, input, accum) }
}

/// Best backend for the running CPU.
pub(crate) fn detect() -> &'static Backend {
    accelerated().unwrap_or(&REFERENCE)
}

/// The AVX2 backend, if the running CPU supports it.
pub(crate) fn accelerated() -> Option<&'static Backend> {
    if avx2_bmi2::init().get() {
        Some(&AVX2)
    } else {
        None
    }
}
