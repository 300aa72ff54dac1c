//! One-time content encryption using AES-256-CBC with PKCS#7 padding
//!
//! Every transfer gets a freshly generated [`SessionKey`] and [`Iv`], both drawn
//! straight from the operating system's CSPRNG. Nothing is ever derived from a
//! password or reused across transfers. The session key travels to the recipient
//! wrapped under their RSA public key; the IV travels in the clear.

use std::fmt;

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of an AES-256 session key in bytes (256 bits)
pub const SESSION_KEY_SIZE: usize = 32;
/// Size of a CBC initialization vector in bytes (128 bits)
pub const IV_SIZE: usize = 16;
/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Errors that can occur during symmetric encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// Trailing padding is inconsistent, or the ciphertext is not block aligned.
    #[error("invalid padding or ciphertext length")]
    Padding,
    #[error("invalid session key size, expected {SESSION_KEY_SIZE}, got {0}")]
    KeyLength(usize),
    #[error("invalid iv size, expected {IV_SIZE}, got {0}")]
    IvLength(usize),
    #[error("failed to gather randomness: {0}")]
    Entropy(String),
}

/// A 256-bit symmetric key used for exactly one transfer
///
/// The bytes are wiped from memory when the key is dropped and are never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Generate a new random session key using the OS CSPRNG
    pub fn generate() -> Result<Self, CipherError> {
        let mut buff = [0; SESSION_KEY_SIZE];
        fill_random(&mut buff)?;
        Ok(Self(buff))
    }

    /// Rebuild a session key from raw bytes (e.g. after unwrapping)
    pub fn from_slice(data: &[u8]) -> Result<Self, CipherError> {
        let buff: [u8; SESSION_KEY_SIZE] = data
            .try_into()
            .map_err(|_| CipherError::KeyLength(data.len()))?;
        Ok(Self(buff))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A 128-bit CBC initialization vector
///
/// Not secret, but must never repeat under the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    pub fn generate() -> Result<Self, CipherError> {
        let mut buff = [0; IV_SIZE];
        fill_random(&mut buff)?;
        Ok(Self(buff))
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, CipherError> {
        let buff: [u8; IV_SIZE] = data
            .try_into()
            .map_err(|_| CipherError::IvLength(data.len()))?;
        Ok(Self(buff))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Output of [`encrypt`]: everything the recipient needs, minus the wrapping
#[derive(Debug)]
pub struct Sealed {
    pub session_key: SessionKey,
    pub iv: Iv,
    pub ciphertext: Vec<u8>,
}

fn fill_random(buff: &mut [u8]) -> Result<(), CipherError> {
    getrandom::getrandom(buff).map_err(|e| CipherError::Entropy(e.to_string()))
}

/// Encrypt `plaintext` under a fresh session key and IV
///
/// The plaintext is PKCS#7 padded to the 16-byte block size, so the output is
/// always between 1 and 16 bytes longer than the input. Empty input yields a
/// single block of padding.
pub fn encrypt(plaintext: &[u8]) -> Result<Sealed, CipherError> {
    let session_key = SessionKey::generate()?;
    let iv = Iv::generate()?;

    let ciphertext = Aes256CbcEnc::new_from_slices(session_key.bytes(), iv.bytes())
        .map_err(|_| CipherError::KeyLength(session_key.bytes().len()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(Sealed {
        session_key,
        iv,
        ciphertext,
    })
}

/// Decrypt a CBC ciphertext and strip its PKCS#7 padding
///
/// # Errors
///
/// Returns [`CipherError::Padding`] if:
/// - the ciphertext is empty or not a multiple of the block size
///   (checked before any block is decrypted)
/// - the trailing padding is not self-consistent
pub fn decrypt(session_key: &SessionKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::Padding);
    }

    Aes256CbcDec::new_from_slices(session_key.bytes(), iv.bytes())
        .map_err(|_| CipherError::KeyLength(session_key.bytes().len()))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::Padding)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let data = b"hello world, this is a test message for encryption";

        let sealed = encrypt(data).unwrap();
        let decrypted = decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext).unwrap();

        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_round_trip_lengths() {
        for len in [0usize, 1, 15, 16, 17, 31, 32, 33, 1000, 4096] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let sealed = encrypt(&data).unwrap();

            // always padded, always at least one extra byte
            assert_eq!(sealed.ciphertext.len() % BLOCK_SIZE, 0);
            assert!(sealed.ciphertext.len() > data.len());
            assert!(sealed.ciphertext.len() <= data.len() + BLOCK_SIZE);

            let decrypted = decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext).unwrap();
            assert_eq!(decrypted, data, "round trip failed for length {}", len);
        }
    }

    #[test]
    fn test_empty_data_encryption() {
        let sealed = encrypt(b"").unwrap();
        assert_eq!(sealed.ciphertext.len(), BLOCK_SIZE);

        let decrypted = decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_fresh_key_and_iv_per_call() {
        let data = b"same plaintext every time";
        let first = encrypt(data).unwrap();

        for _ in 0..16 {
            let next = encrypt(data).unwrap();
            assert_ne!(first.iv, next.iv);
            assert_ne!(first.session_key, next.session_key);
            assert_ne!(first.ciphertext, next.ciphertext);
        }
    }

    #[test]
    fn test_unaligned_ciphertext_rejected() {
        let sealed = encrypt(b"some data that spans more than one block").unwrap();

        let truncated = &sealed.ciphertext[..sealed.ciphertext.len() - 1];
        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, truncated),
            Err(CipherError::Padding)
        ));

        let mut extended = sealed.ciphertext.clone();
        extended.push(0);
        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, &extended),
            Err(CipherError::Padding)
        ));

        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, &[]),
            Err(CipherError::Padding)
        ));
    }

    #[test]
    fn test_wrong_key_fails_or_garbles() {
        let data = b"attack at dawn";
        let sealed = encrypt(data).unwrap();
        let other = SessionKey::generate().unwrap();

        // CBC is unauthenticated: a wrong key almost always breaks the padding,
        // and it never yields the original plaintext.
        match decrypt(&other, &sealed.iv, &sealed.ciphertext) {
            Ok(garbage) => assert_ne!(garbage, data.to_vec()),
            Err(e) => assert!(matches!(e, CipherError::Padding)),
        }
    }

    #[test]
    fn test_inconsistent_padding_rejected() {
        // A block-aligned payload encrypts to payload || full padding block.
        // CBC decryption of a prefix does not depend on later blocks, so dropping
        // the padding block leaves the payload's own last byte as the trailer.
        let mut block = [7u8; BLOCK_SIZE];
        block[BLOCK_SIZE - 1] = 0; // pad length 0 is never valid
        let sealed = encrypt(&block).unwrap();
        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext[..BLOCK_SIZE]),
            Err(CipherError::Padding)
        ));

        let mut block = [0u8; BLOCK_SIZE];
        block[BLOCK_SIZE - 1] = 4;
        block[BLOCK_SIZE - 2] = 4;
        block[BLOCK_SIZE - 3] = 9; // mismatched pad byte
        block[BLOCK_SIZE - 4] = 4;
        let sealed = encrypt(&block).unwrap();
        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext[..BLOCK_SIZE]),
            Err(CipherError::Padding)
        ));

        let mut block = [0u8; BLOCK_SIZE];
        block[BLOCK_SIZE - 1] = 17; // longer than a block
        let sealed = encrypt(&block).unwrap();
        assert!(matches!(
            decrypt(&sealed.session_key, &sealed.iv, &sealed.ciphertext[..BLOCK_SIZE]),
            Err(CipherError::Padding)
        ));
    }

    #[test]
    fn test_size_validation() {
        assert!(matches!(
            SessionKey::from_slice(&[1u8; 16]),
            Err(CipherError::KeyLength(16))
        ));
        assert!(SessionKey::from_slice(&[1u8; SESSION_KEY_SIZE]).is_ok());

        assert!(matches!(Iv::from_slice(&[1u8; 8]), Err(CipherError::IvLength(8))));
        assert!(Iv::from_slice(&[1u8; IV_SIZE]).is_ok());
    }

    #[test]
    fn test_session_key_debug_redacted() {
        let key = SessionKey::from_slice(&[0xAB; SESSION_KEY_SIZE]).unwrap();
        let printed = format!("{:?}", key);
        assert!(!printed.contains("171"));
        assert!(!printed.to_lowercase().contains("ab"));
    }
}
