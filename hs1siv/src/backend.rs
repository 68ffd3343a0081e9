//! HS1-SIV backends
//!
//! Only the two inner loops are backend-specific: ChaCha20 keystream
//! generation and the HS1 block step. Everything else calls through a
//! [`Backend`] pair, so every backend must be bit-for-bit identical to the
//! reference code.

use crate::{
    chacha::STATE_WORDS,
    hs1::{HASH_ROUNDS, HashKey},
};
use cfg_if::cfg_if;
use core::fmt::{self, Debug};

pub(crate) mod soft;

/// XOR keystream blocks into a buffer, advancing the counter word of the
/// state by one per (possibly partial) block.
pub(crate) type XorKeystreamFn = fn(state: &mut [u32; STATE_WORDS], buf: &mut [u8]);

/// Absorb whole NH blocks into the accumulators. The input length must be a
/// multiple of [`NH_LEN`](crate::hs1::NH_LEN).
pub(crate) type HashStepFn = fn(key: &HashKey, input: &[u8], accum: &mut [u64; HASH_ROUNDS]);

/// An implementation pair for the performance-critical loops.
#[derive(Clone, Copy)]
pub(crate) struct Backend {
    /// Human-readable name of the implementation.
    pub(crate) name: &'static str,

    /// Whether this pair relies on CPU-specific instructions.
    pub(crate) accelerated: bool,

    /// ChaCha20 keystream generation.
    pub(crate) xor_keystream: XorKeystreamFn,

    /// HS1 NH + poly block step.
    pub(crate) hash_step: HashStepFn,
}

impl Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("accelerated", &self.accelerated)
            .finish_non_exhaustive()
    }
}

/// Portable reference implementation, available on every target.
pub(crate) static REFERENCE: Backend = Backend {
    name: "Reference",
    accelerated: false,
    xor_keystream: soft::xor_keystream,
    hash_step: soft::hash_step,
};

cfg_if! {
    if #[cfg(all(
        any(target_arch = "x86_64", target_arch = "x86"),
        not(hs1siv_backend = "soft")
    ))] {
        mod autodetect;
        mod avx2;
        pub(crate) use autodetect::{accelerated, detect};
    } else {
        /// Backend selected for this process: always the reference code.
        pub(crate) fn detect() -> &'static Backend {
            &REFERENCE
        }

        /// No accelerated backend exists for this target.
        #[cfg_attr(not(any(test, feature = "hazmat")), allow(dead_code))]
        pub(crate) fn accelerated() -> Option<&'static Backend> {
            None
        }
    }
}
