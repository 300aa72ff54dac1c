//! Cryptographic primitives for sealpost
//!
//! This module provides the two halves of the hybrid scheme used for every
//! encrypted transfer:
//!
//! - **Identity**: an RSA keypair (`SecretKey`/`PublicKey`, 4096-bit, e = 65537)
//!   per node, persisted as PEM by the [`KeyStore`](crate::keystore::KeyStore)
//! - **Content encryption**: AES-256-CBC with PKCS#7 padding under a one-time
//!   [`SessionKey`] and random [`Iv`]
//! - **Key wrapping**: RSA-OAEP (SHA-256 digest and MGF1, empty label) of the
//!   session key under the recipient's public key
//!
//! # Transfer Flow
//!
//! Sender:
//! 1. Fetch the recipient's `PublicKey`
//! 2. [`encrypt`] the file, producing a fresh session key, IV and ciphertext
//! 3. [`PublicKey::wrap`] the session key
//! 4. Ship `(wrapped key, iv, ciphertext, filename)`
//!
//! Recipient:
//! 1. [`SecretKey::unwrap`] the session key with its own private key
//! 2. [`decrypt`] the ciphertext with that key and the IV
//!
//! # Known Limitations
//!
//! Nothing binds a fetched public key to the peer it was fetched from, and the
//! private key is stored unencrypted. CBC provides no integrity: tampering is
//! only caught when it happens to break the padding.

mod keys;
mod session;

pub use keys::{
    KeyError, PublicKey, SecretKey, UnwrapError, WrapError, DEFAULT_KEY_BITS, PRIVATE_KEY_TAG,
    PUBLIC_EXPONENT, PUBLIC_KEY_TAG,
};
pub use session::{
    decrypt, encrypt, CipherError, Iv, Sealed, SessionKey, BLOCK_SIZE, IV_SIZE, SESSION_KEY_SIZE,
};

#[cfg(test)]
pub(crate) use keys::test::{alice as test_alice, bob as test_bob, TEST_KEY_BITS};
