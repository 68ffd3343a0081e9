#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/8f1a9894/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/8f1a9894/logo.svg"
)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "hazmat")]
pub mod hazmat;

mod backend;
mod chacha;
mod hs1;
mod siv;

pub use aead;

use crate::{backend::Backend, siv::KeySchedule};
use aead::{
    AeadCore, AeadInPlace, KeyInit, KeySizeUser,
    consts::{U0, U12, U32},
};
use core::fmt::{self, Debug};

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Size of an HS1-SIV key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an HS1-SIV nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of an HS1-SIV tag (the SIV) in bytes
pub const TAG_SIZE: usize = hs1::SIV_LEN;

/// HS1-SIV keys (32-bytes)
pub type Key = aead::Key<Hs1Siv>;

/// HS1-SIV nonces (12-bytes)
pub type Nonce = aead::Nonce<Hs1Siv>;

/// HS1-SIV tags (32-bytes)
pub type Tag = aead::Tag<Hs1Siv>;

/// **HS1-SIV**: nonce misuse-resistant AEAD built from ChaCha20 and the HS1
/// universal hash.
///
/// The tag is a synthetic IV computed over the associated data and the
/// plaintext, so sealing is deterministic: the same key, nonce, plaintext and
/// associated data always produce the same ciphertext. Reusing a nonce only
/// reveals whether two messages (with their associated data) were identical.
///
/// Ciphertexts are laid out as `encrypted message || tag`.
#[derive(Clone)]
pub struct Hs1Siv {
    /// Expanded key material.
    schedule: KeySchedule,

    /// Implementation selected at construction.
    backend: &'static Backend,
}

impl Hs1Siv {
    /// Initialize HS1-SIV with the given 32-byte key, using the fastest
    /// implementation supported by the running CPU.
    ///
    /// # Panics
    ///
    /// If `key` is not exactly [`KEY_SIZE`] bytes long.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self::with_backend(backend::detect(), key)
    }

    pub(crate) fn with_backend(backend: &'static Backend, key: &[u8]) -> Self {
        let Ok(key) = <&[u8; KEY_SIZE]>::try_from(key) else {
            panic!("hs1siv: invalid key size");
        };

        Self {
            schedule: KeySchedule::new(backend, key),
            backend,
        }
    }

    /// Size of the nonce accepted by [`Hs1Siv::seal_in_place`] and friends.
    #[must_use]
    pub const fn nonce_size(&self) -> usize {
        NONCE_SIZE
    }

    /// Number of bytes a ciphertext is longer than its plaintext.
    #[must_use]
    pub const fn overhead(&self) -> usize {
        TAG_SIZE
    }

    /// Encrypt `buffer` in place and return the detached tag.
    ///
    /// # Panics
    ///
    /// If `nonce` is not exactly [`NONCE_SIZE`] bytes long, or the message is
    /// too long for the ChaCha20 block counter (256 GiB).
    pub fn seal_in_place(&self, nonce: &[u8], associated_data: &[u8], buffer: &mut [u8]) -> Tag {
        let nonce = nonce_array(nonce);
        let siv = self
            .schedule
            .encrypt_in_place(self.backend, &nonce, associated_data, buffer);
        Tag::from(siv)
    }

    /// Decrypt `buffer` in place, verifying it against a detached `tag`.
    ///
    /// On failure `buffer` is overwritten with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `tag` is not [`TAG_SIZE`] bytes long or does not
    /// authenticate the ciphertext and associated data.
    ///
    /// # Panics
    ///
    /// If `nonce` is not exactly [`NONCE_SIZE`] bytes long, or the message is
    /// too long for the ChaCha20 block counter (256 GiB).
    pub fn open_in_place(
        &self,
        nonce: &[u8],
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &[u8],
    ) -> Result<(), Error> {
        let nonce = nonce_array(nonce);
        let Ok(tag) = <&[u8; TAG_SIZE]>::try_from(tag) else {
            buffer.fill(0);
            return Err(Error);
        };

        if self
            .schedule
            .decrypt_in_place(self.backend, &nonce, associated_data, buffer, tag)
        {
            Ok(())
        } else {
            Err(Error)
        }
    }

    /// Encrypt `plaintext`, appending `ciphertext || tag` to `dst`.
    ///
    /// # Panics
    ///
    /// If `nonce` is not exactly [`NONCE_SIZE`] bytes long, or the message is
    /// too long for the ChaCha20 block counter (256 GiB).
    #[cfg(feature = "alloc")]
    pub fn seal(&self, dst: &mut Vec<u8>, nonce: &[u8], plaintext: &[u8], associated_data: &[u8]) {
        let nonce = nonce_array(nonce);
        let start = dst.len();
        dst.reserve(plaintext.len() + TAG_SIZE);
        dst.extend_from_slice(plaintext);

        let tag = self.seal_in_place(&nonce, associated_data, &mut dst[start..]);
        dst.extend_from_slice(&tag);
    }

    /// Authenticate and decrypt `ciphertext || tag`, appending the plaintext to
    /// `dst`.
    ///
    /// On failure `dst` is left as it was before the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] if `ciphertext` is shorter than [`TAG_SIZE`] or does
    /// not authenticate.
    ///
    /// # Panics
    ///
    /// If `nonce` is not exactly [`NONCE_SIZE`] bytes long.
    #[cfg(feature = "alloc")]
    pub fn open(
        &self,
        dst: &mut Vec<u8>,
        nonce: &[u8],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<(), Error> {
        let nonce = nonce_array(nonce);
        let Some(body_len) = ciphertext.len().checked_sub(TAG_SIZE) else {
            return Err(Error);
        };
        let (body, tag) = ciphertext.split_at(body_len);

        let start = dst.len();
        dst.extend_from_slice(body);

        let res = self.open_in_place(&nonce, associated_data, &mut dst[start..], tag);
        if res.is_err() {
            // already wiped
            dst.truncate(start);
        }
        res
    }

    /// Whether this instance uses a CPU-specific implementation.
    #[must_use]
    pub fn is_hardware_accelerated(&self) -> bool {
        self.backend.accelerated
    }
}

impl KeySizeUser for Hs1Siv {
    type KeySize = U32;
}

impl KeyInit for Hs1Siv {
    fn new(key: &Key) -> Self {
        Self::new(key.as_slice())
    }
}

impl AeadCore for Hs1Siv {
    type NonceSize = U12;
    type TagSize = U32;
    type CiphertextOverhead = U0;
}

impl AeadInPlace for Hs1Siv {
    fn encrypt_in_place_detached(
        &self,
        nonce: &Nonce,
        associated_data: &[u8],
        buffer: &mut [u8],
    ) -> aead::Result<Tag> {
        Ok(self.seal_in_place(nonce, associated_data, buffer))
    }

    fn decrypt_in_place_detached(
        &self,
        nonce: &Nonce,
        associated_data: &[u8],
        buffer: &mut [u8],
        tag: &Tag,
    ) -> aead::Result<()> {
        self.open_in_place(nonce, associated_data, buffer, tag)
            .map_err(Into::into)
    }
}

impl Debug for Hs1Siv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hs1Siv")
            .field("implementation", &self.backend.name)
            .finish_non_exhaustive()
    }
}

/// Message authentication failure.
///
/// The only recoverable error HS1-SIV reports: the ciphertext, tag or
/// associated data was modified, or the wrong key or nonce was used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Error;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("hs1siv: message authentication failed")
    }
}

impl core::error::Error for Error {}

impl From<Error> for aead::Error {
    fn from(_: Error) -> Self {
        aead::Error
    }
}

/// Whether [`Hs1Siv::new`] selects a CPU-specific implementation on this
/// machine.
#[must_use]
pub fn is_hardware_accelerated() -> bool {
    backend::detect().accelerated
}

fn nonce_array(nonce: &[u8]) -> [u8; NONCE_SIZE] {
    let Ok(nonce) = nonce.try_into() else {
        panic!("hs1siv: invalid nonce size");
    };
    nonce
}
