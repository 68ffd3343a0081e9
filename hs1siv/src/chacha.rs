//! ChaCha20 stream cipher (IETF variant: 96-bit nonce, 32-bit block counter).
//!
//! HS1-SIV uses ChaCha20 three ways: to expand the user key into the key
//! schedule, to turn the hash output into the SIV, and to encrypt the message
//! under a key derived from that SIV. The per-block work is delegated to the
//! selected [`Backend`].

use crate::backend::Backend;
use zeroize::Zeroize;

/// Size of a ChaCha20 key in bytes.
pub(crate) const KEY_SIZE: usize = 32;

/// Size of a ChaCha20 nonce in bytes.
pub(crate) const NONCE_SIZE: usize = 12;

/// Size of a ChaCha20 keystream block in bytes.
pub(crate) const BLOCK_SIZE: usize = 64;

/// Number of rounds (HS1-SIV only supports ChaCha20).
pub(crate) const ROUNDS: usize = 20;

/// Number of 32-bit words in the ChaCha20 state.
pub(crate) const STATE_WORDS: usize = 16;

/// Index of the block counter word within the state.
pub(crate) const COUNTER_WORD: usize = 12;

/// "expand 32-byte k"
pub(crate) const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// ChaCha20 input block: 4 constant words, 8 key words, 1 counter word and
/// 3 nonce words.
pub(crate) struct State([u32; STATE_WORDS]);

impl State {
    pub(crate) fn new(key: &[u8; KEY_SIZE], nonce: &[u8; NONCE_SIZE], counter: u32) -> Self {
        let mut state = [0u32; STATE_WORDS];
        state[..4].copy_from_slice(&CONSTANTS);

        for (word, chunk) in state[4..COUNTER_WORD].iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        state[COUNTER_WORD] = counter;

        for (word, chunk) in state[COUNTER_WORD + 1..].iter_mut().zip(nonce.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Self(state)
    }

    /// Current value of the block counter.
    #[cfg(test)]
    pub(crate) fn counter(&self) -> u32 {
        self.0[COUNTER_WORD]
    }

    #[cfg(test)]
    pub(crate) fn words_mut(&mut self) -> &mut [u32; STATE_WORDS] {
        &mut self.0
    }
}

impl Drop for State {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// XOR the ChaCha20 keystream for `key` and `nonce`, starting at block
/// `counter`, into `buf`.
///
/// Applying the keystream twice restores the original contents.
///
/// # Panics
///
/// If `buf` would need more keystream blocks than remain before the 32-bit
/// block counter wraps.
pub(crate) fn apply_keystream(
    backend: &Backend,
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    counter: u32,
    buf: &mut [u8],
) {
    let blocks = buf.len().div_ceil(BLOCK_SIZE) as u64;
    assert!(
        u64::from(counter) + blocks <= 1 << 32,
        "hs1siv: chacha20 block counter overflow"
    );

    let mut state = State::new(key, nonce, counter);
    (backend.xor_keystream)(&mut state.0, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{self, REFERENCE};
    use hex_literal::hex;

    const KEY: [u8; KEY_SIZE] = hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");

    // RFC 8439 §2.4.2
    const NONCE: [u8; NONCE_SIZE] = hex!("000000000000004a00000000");
    const PLAINTEXT: &[u8] = b"Ladies and Gentlemen of the class of '99: If I could offer you only one tip for the future, sunscreen would be it.";
    const CIPHERTEXT: [u8; 114] = hex!(
        "6e2e359a2568f98041ba0728dd0d6981e97e7aec1d4360c20a27afccfd9fae0b"
        "f91b65c5524733ab8f593dabcd62b3571639d624e65152ab8f530c359f0861d8"
        "07ca0dbf500d6a6156a38e088a22b65e52bc514d16ccf806818ce91ab7793736"
        "5af90bbf74a35be6b40b8eedf2785e42874d"
    );

    // RFC 8439 §A.1, test vector #1
    const ZERO_BLOCK: [u8; BLOCK_SIZE] = hex!(
        "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7"
        "da41597c5157488d7724e03fb8d84a376a43b8f41518a11cc387b669b2ee6586"
    );

    fn backends() -> impl Iterator<Item = &'static Backend> {
        core::iter::once(&REFERENCE).chain(backend::accelerated())
    }

    #[test]
    fn state_layout() {
        let state = State::new(&KEY, &NONCE, 7);
        assert_eq!(state.0[..4], CONSTANTS);
        assert_eq!(state.0[4], 0x0302_0100);
        assert_eq!(state.0[11], 0x1f1e_1d1c);
        assert_eq!(state.counter(), 7);
        assert_eq!(state.0[13..], [0x0000_0000, 0x4a00_0000, 0x0000_0000]);
    }

    #[test]
    fn rfc8439_encryption() {
        for backend in backends() {
            let mut buf = [0u8; 114];
            buf.copy_from_slice(PLAINTEXT);
            apply_keystream(backend, &KEY, &NONCE, 1, &mut buf);
            assert_eq!(buf, CIPHERTEXT, "{}", backend.name);

            apply_keystream(backend, &KEY, &NONCE, 1, &mut buf);
            assert_eq!(&buf[..], PLAINTEXT, "{}", backend.name);
        }
    }

    #[test]
    fn rfc8439_zero_block() {
        for backend in backends() {
            let mut buf = [0u8; BLOCK_SIZE];
            apply_keystream(backend, &[0; KEY_SIZE], &[0; NONCE_SIZE], 0, &mut buf);
            assert_eq!(buf, ZERO_BLOCK, "{}", backend.name);
        }
    }

    #[test]
    fn partial_blocks_match_prefix() {
        for backend in backends() {
            let mut full = [0u8; 5 * BLOCK_SIZE];
            apply_keystream(backend, &KEY, &NONCE, 3, &mut full);

            for len in [0, 1, 63, 64, 65, 127, 128, 129, 200, 255] {
                let mut partial = [0u8; 5 * BLOCK_SIZE];
                apply_keystream(backend, &KEY, &NONCE, 3, &mut partial[..len]);
                assert_eq!(partial[..len], full[..len], "{} len={}", backend.name, len);
                assert!(partial[len..].iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn last_counter_block_is_usable() {
        let mut buf = [0u8; BLOCK_SIZE];
        apply_keystream(&REFERENCE, &KEY, &NONCE, u32::MAX, &mut buf);
    }

    #[test]
    #[should_panic(expected = "counter overflow")]
    fn counter_overflow_panics() {
        let mut buf = [0u8; BLOCK_SIZE + 1];
        apply_keystream(&REFERENCE, &KEY, &NONCE, u32::MAX, &mut buf);
    }
}
