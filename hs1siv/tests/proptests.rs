//! Property-based tests.

#![cfg(all(any(unix, windows), feature = "hazmat", feature = "alloc"))]

use hs1siv::{
    Hs1Siv, KEY_SIZE, NONCE_SIZE,
    hazmat::{self, HASH_ROUNDS, HashKey, Implementation, NH_LEN},
};
use proptest::prelude::*;

/// Number of NH blocks hashed per case
const BLOCKS: usize = 8;

proptest! {
    #[test]
    fn roundtrip(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
        msg in prop::collection::vec(any::<u8>(), 0..600),
        ad in prop::collection::vec(any::<u8>(), 0..300),
    ) {
        let cipher = Hs1Siv::new(&key);

        let mut ct = Vec::new();
        cipher.seal(&mut ct, &nonce, &msg, &ad);
        prop_assert_eq!(ct.len(), msg.len() + cipher.overhead());

        let mut again = Vec::new();
        cipher.seal(&mut again, &nonce, &msg, &ad);
        prop_assert_eq!(&ct, &again);

        let mut pt = Vec::new();
        prop_assert!(cipher.open(&mut pt, &nonce, &ct, &ad).is_ok());
        prop_assert_eq!(pt, msg);
    }

    #[test]
    fn tampering_is_detected(
        key in any::<[u8; KEY_SIZE]>(),
        msg in prop::collection::vec(any::<u8>(), 0..200),
        flip in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let cipher = Hs1Siv::new(&key);
        let nonce = [0u8; NONCE_SIZE];

        let mut ct = Vec::new();
        cipher.seal(&mut ct, &nonce, &msg, b"header");
        let i = flip.index(ct.len());
        ct[i] ^= 1 << bit;

        let mut pt = Vec::new();
        prop_assert!(cipher.open(&mut pt, &nonce, &ct, b"header").is_err());
        prop_assert!(pt.is_empty());
    }

    /// Test the accelerated implementation (if any) for equivalence to the reference one.
    #[test]
    fn implementation_equivalence(
        key in any::<[u8; KEY_SIZE]>(),
        nonce in any::<[u8; NONCE_SIZE]>(),
        counter in any::<u32>(),
        data in prop::collection::vec(any::<u8>(), BLOCKS * NH_LEN..=BLOCKS * NH_LEN),
        len in 0..BLOCKS * NH_LEN,
    ) {
        let reference = Implementation::reference();
        let Some(accelerated) = Implementation::accelerated() else {
            return Ok(());
        };

        // keep the counter clear of exhaustion
        let counter = counter.min(u32::MAX - BLOCKS as u32);

        let mut expected = data.clone();
        let mut actual = data.clone();
        hazmat::chacha20_xor(reference, &key, &nonce, counter, &mut expected[..len]);
        hazmat::chacha20_xor(accelerated, &key, &nonce, counter, &mut actual[..len]);
        prop_assert_eq!(&expected, &actual);

        let hash_key = HashKey::from_aead_key(&key);
        let mut expected = [1u64; HASH_ROUNDS];
        let mut actual = [1u64; HASH_ROUNDS];
        hazmat::hash_step(reference, &hash_key, &data, &mut expected);
        hazmat::hash_step(accelerated, &hash_key, &data, &mut actual);
        prop_assert_eq!(expected, actual);
    }
}
