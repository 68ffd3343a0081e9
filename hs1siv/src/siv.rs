//! HS1-SIV construction: key schedule, SIV derivation and in-place
//! encryption/decryption.

use crate::{
    backend::Backend,
    chacha::{self, KEY_SIZE, NONCE_SIZE, ROUNDS},
    hs1::{
        self, Accumulator, DIGEST_SIZE, HASH_KEY_SIZE, HASH_ROUNDS, HashKey, NH_LEN, SIV_LEN,
        WINDOW_LEN,
    },
};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

/// Bytes of ChaCha20 output consumed by the key schedule.
pub(crate) const STATE_SIZE: usize = KEY_SIZE + HASH_KEY_SIZE;

/// Key-schedule nonce: encodes the key length and the HS1-SIV parameters.
#[allow(clippy::cast_possible_truncation)]
const SETTINGS: [u8; NONCE_SIZE] = [
    KEY_SIZE as u8,
    0,
    SIV_LEN as u8,
    0,
    ROUNDS as u8,
    HASH_ROUNDS as u8,
    NH_LEN as u8,
    0,
    0,
    0,
    0,
    0,
];

/// Per-key state: the ChaCha20 sub-key plus the HS1 hash key.
#[derive(Clone)]
pub(crate) struct KeySchedule {
    chacha_key: [u8; KEY_SIZE],
    hash_key: HashKey,
}

impl KeySchedule {
    /// Expand a user key with ChaCha20 under the settings nonce.
    pub(crate) fn new(backend: &Backend, key: &[u8; KEY_SIZE]) -> Self {
        let mut state = Zeroizing::new([0u8; STATE_SIZE]);
        chacha::apply_keystream(backend, key, &SETTINGS, 0, &mut state[..]);

        let mut chacha_key = [0u8; KEY_SIZE];
        chacha_key.copy_from_slice(&state[..KEY_SIZE]);

        let mut hash_bytes = Zeroizing::new([0u8; HASH_KEY_SIZE]);
        hash_bytes.copy_from_slice(&state[KEY_SIZE..]);

        Self {
            chacha_key,
            hash_key: HashKey::from_bytes(&hash_bytes),
        }
    }

    pub(crate) fn hash_key(&self) -> &HashKey {
        &self.hash_key
    }

    /// Mix a digest into the ChaCha20 sub-key: the first [`DIGEST_SIZE`]
    /// bytes are XORed, the rest copied.
    fn derive_key(&self, digest: &[u8; DIGEST_SIZE]) -> Zeroizing<[u8; KEY_SIZE]> {
        let mut key = Zeroizing::new(self.chacha_key);
        for (k, d) in key.iter_mut().zip(digest) {
            *k ^= d;
        }
        key
    }

    /// Key used to encrypt the message body, derived from the SIV alone.
    pub(crate) fn message_key(&self, siv: &[u8; SIV_LEN]) -> Zeroizing<[u8; KEY_SIZE]> {
        let mut accum = Accumulator::new();
        let digest = hs1::hash_finalize(&self.hash_key, siv, &mut accum);
        self.derive_key(&digest)
    }

    /// Encrypt `buf` in place and return the SIV, which doubles as the tag.
    pub(crate) fn encrypt_in_place(
        &self,
        backend: &Backend,
        nonce: &[u8; NONCE_SIZE],
        ad: &[u8],
        buf: &mut [u8],
    ) -> [u8; SIV_LEN] {
        let mut hasher = SivHasher::new(self, backend, ad.len(), buf.len());
        hasher.update_ad(ad);
        let siv = hasher.finalize(buf, nonce);

        let key = self.message_key(&siv);
        chacha::apply_keystream(backend, &key, nonce, 1, buf);
        siv
    }

    /// Decrypt `buf` in place and verify `tag`.
    ///
    /// Returns `false` and wipes `buf` if the recomputed SIV does not match.
    pub(crate) fn decrypt_in_place(
        &self,
        backend: &Backend,
        nonce: &[u8; NONCE_SIZE],
        ad: &[u8],
        buf: &mut [u8],
        tag: &[u8; SIV_LEN],
    ) -> bool {
        let key = self.message_key(tag);

        // AD is absorbed before `buf` is overwritten with plaintext
        let mut hasher = SivHasher::new(self, backend, ad.len(), buf.len());
        hasher.update_ad(ad);

        chacha::apply_keystream(backend, &key, nonce, 1, buf);
        let expected = Zeroizing::new(hasher.finalize(buf, nonce));

        if expected[..].ct_eq(&tag[..]).into() {
            true
        } else {
            buf.zeroize();
            false
        }
    }
}

// `HashKey` wipes itself on drop
impl Drop for KeySchedule {
    fn drop(&mut self) {
        self.chacha_key.zeroize();
    }
}

/// First HS1 pass: hashes the AD and message, then expands the digest into
/// the SIV.
struct SivHasher<'a> {
    schedule: &'a KeySchedule,
    backend: &'a Backend,
    accum: Accumulator,
    lengths: [u8; 16],
}

impl<'a> SivHasher<'a> {
    fn new(schedule: &'a KeySchedule, backend: &'a Backend, ad_len: usize, msg_len: usize) -> Self {
        let mut lengths = [0u8; 16];
        lengths[..8].copy_from_slice(&(ad_len as u64).to_le_bytes());
        lengths[8..].copy_from_slice(&(msg_len as u64).to_le_bytes());

        Self {
            schedule,
            backend,
            accum: Accumulator::new(),
            lengths,
        }
    }

    /// Absorb the associated data, zero-padding a partial last block.
    fn update_ad(&mut self, ad: &[u8]) {
        let key = self.schedule.hash_key();
        let full = ad.len() - ad.len() % NH_LEN;
        (self.backend.hash_step)(key, &ad[..full], &mut self.accum);

        let tail = &ad[full..];
        if !tail.is_empty() {
            let mut block = Zeroizing::new([0u8; NH_LEN]);
            block[..tail.len()].copy_from_slice(tail);
            (self.backend.hash_step)(key, &block[..], &mut self.accum);
        }
    }

    /// Absorb the message and the length block, and derive the SIV.
    ///
    /// The message tail is padded to a whole number of NH windows and the
    /// length block appended to it, unless that would overflow a block, in
    /// which case the padded tail is absorbed on its own.
    fn finalize(mut self, msg: &[u8], nonce: &[u8; NONCE_SIZE]) -> [u8; SIV_LEN] {
        let key = self.schedule.hash_key();
        let full = msg.len() - msg.len() % NH_LEN;
        (self.backend.hash_step)(key, &msg[..full], &mut self.accum);

        let tail = &msg[full..];
        let padded = tail.len().next_multiple_of(WINDOW_LEN);
        let mut block = Zeroizing::new([0u8; NH_LEN]);
        block[..tail.len()].copy_from_slice(tail);

        let digest = if padded == NH_LEN {
            (self.backend.hash_step)(key, &block[..], &mut self.accum);
            hs1::hash_finalize(key, &self.lengths, &mut self.accum)
        } else {
            let end = padded + self.lengths.len();
            block[padded..end].copy_from_slice(&self.lengths);
            hs1::hash_finalize(key, &block[..end], &mut self.accum)
        };

        let siv_key = self.schedule.derive_key(&digest);
        let mut siv = [0u8; SIV_LEN];
        chacha::apply_keystream(self.backend, &siv_key, nonce, 0, &mut siv);
        siv
    }
}
