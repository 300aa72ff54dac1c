use std::path::PathBuf;

use zeroize::Zeroizing;

use super::bundle::RawBundle;
use super::storage::ReceiveDir;
use super::{ReceiveState, TransferError, TransferMode};
use crate::crypto::{self, Iv, SecretKey, SessionKey, UnwrapError};

/// What a completed receive stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveReport {
    pub mode: TransferMode,
    /// Name as declared by the sender
    pub filename: String,
    pub stored_as: PathBuf,
    pub bytes: usize,
}

/// Handle one incoming bundle end to end
///
/// Encrypted: `Idle -> Parsing -> UnwrappingKey -> Decrypting -> Persisting -> Done`.
/// Plain: `Idle -> Parsing -> Persisting -> Done`.
///
/// Blocking: does RSA and AES work plus file I/O. Async callers should run it
/// on a blocking thread.
pub fn receive(
    bundle: RawBundle,
    secret: &SecretKey,
    storage: &ReceiveDir,
) -> Result<ReceiveReport, TransferError> {
    let mode = bundle.mode;
    let mut state = ReceiveState::Idle;
    let result = match mode {
        TransferMode::Encrypted => receive_encrypted(bundle, secret, storage, &mut state),
        TransferMode::Plain => receive_plain(bundle, storage, &mut state),
    };

    match &result {
        Ok(report) => tracing::info!(
            %mode,
            filename = %report.filename,
            stored_as = %report.stored_as.display(),
            bytes = report.bytes,
            "transfer received"
        ),
        Err(e) => {
            let failed_in = state.fail();
            tracing::warn!(%mode, %failed_in, error = %e, "receive failed");
        }
    }
    result
}

fn receive_encrypted(
    bundle: RawBundle,
    secret: &SecretKey,
    storage: &ReceiveDir,
    state: &mut ReceiveState,
) -> Result<ReceiveReport, TransferError> {
    state.advance(ReceiveState::Parsing);
    let bundle = bundle.into_encrypted()?;
    let iv = Iv::from_slice(&bundle.iv)?;
    let target = storage.resolve(TransferMode::Encrypted, &bundle.filename)?;

    state.advance(ReceiveState::UnwrappingKey);
    let key_bytes = Zeroizing::new(secret.unwrap(&bundle.session_key)?);
    let session_key = SessionKey::from_slice(&key_bytes).map_err(|_| UnwrapError)?;

    state.advance(ReceiveState::Decrypting);
    let plaintext = crypto::decrypt(&session_key, &iv, &bundle.ciphertext)?;

    state.advance(ReceiveState::Persisting);
    storage.persist(&target, &plaintext)?;

    state.advance(ReceiveState::Done);
    Ok(ReceiveReport {
        mode: TransferMode::Encrypted,
        filename: bundle.filename,
        stored_as: target,
        bytes: plaintext.len(),
    })
}

fn receive_plain(
    bundle: RawBundle,
    storage: &ReceiveDir,
    state: &mut ReceiveState,
) -> Result<ReceiveReport, TransferError> {
    state.advance(ReceiveState::Parsing);
    let bundle = bundle.into_plain()?;
    let target = storage.resolve(TransferMode::Plain, &bundle.filename)?;

    state.advance(ReceiveState::Persisting);
    storage.persist(&target, &bundle.file)?;

    state.advance(ReceiveState::Done);
    Ok(ReceiveReport {
        mode: TransferMode::Plain,
        filename: bundle.filename,
        stored_as: target,
        bytes: bundle.file.len(),
    })
}

#[cfg(test)]
mod test {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::crypto::{test_alice, test_bob, CipherError};
    use crate::transfer::bundle::{EncryptedBundle, PlainBundle};
    use crate::transfer::StorageError;

    /// What a sender would produce for `recipient`
    fn seal_for(recipient: &SecretKey, data: &[u8], filename: &str) -> EncryptedBundle {
        let sealed = crypto::encrypt(data).unwrap();
        EncryptedBundle {
            session_key: recipient.public().wrap(sealed.session_key.bytes()).unwrap(),
            iv: sealed.iv.bytes().to_vec(),
            ciphertext: sealed.ciphertext,
            filename: filename.to_string(),
        }
    }

    #[test]
    fn test_receive_encrypted() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let bundle = seal_for(test_bob(), b"hello world", "greeting.txt");
        let report = receive(bundle.into(), test_bob(), &storage).unwrap();

        assert_eq!(report.mode, TransferMode::Encrypted);
        assert_eq!(report.bytes, 11);
        assert_eq!(report.stored_as, temp.path().join("DECRYPTED_greeting.txt"));
        assert_eq!(fs::read(&report.stored_as).unwrap(), b"hello world".to_vec());
    }

    #[test]
    fn test_receive_empty_file() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let bundle = seal_for(test_bob(), b"", "empty.bin");
        let report = receive(bundle.into(), test_bob(), &storage).unwrap();
        assert_eq!(fs::read(&report.stored_as).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_receive_plain() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let bundle = PlainBundle {
            file: b"hello world".to_vec(),
            filename: "greeting.txt".to_string(),
        };
        let report = receive(bundle.into(), test_bob(), &storage).unwrap();

        assert_eq!(report.stored_as, temp.path().join("RECEIVED_greeting.txt"));
        assert_eq!(fs::read(&report.stored_as).unwrap(), b"hello world".to_vec());
    }

    #[test]
    fn test_wrong_recipient_fails_to_unwrap() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let bundle = seal_for(test_bob(), b"for bob only", "secret.txt");
        let result = receive(bundle.into(), test_alice(), &storage);

        assert!(matches!(result, Err(TransferError::Unwrap(_))));
        assert!(!temp.path().join("DECRYPTED_secret.txt").exists());
    }

    #[test]
    fn test_partial_bundle_rejected_before_crypto() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        // a garbage session key would fail unwrapping; the missing iv must be
        // reported first
        let mut raw = RawBundle::from(EncryptedBundle {
            session_key: vec![0; 3],
            iv: vec![],
            ciphertext: vec![1; 16],
            filename: "x.txt".to_string(),
        });
        raw.iv = None;

        match receive(raw, test_bob(), &storage) {
            Err(TransferError::MalformedBundle(missing)) => assert_eq!(missing, vec!["iv"]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tampered_ciphertext_length_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let mut bundle = seal_for(test_bob(), b"some content here", "t.txt");
        bundle.ciphertext.pop();

        assert!(matches!(
            receive(bundle.into(), test_bob(), &storage),
            Err(TransferError::Cipher(CipherError::Padding))
        ));
        assert!(!temp.path().join("DECRYPTED_t.txt").exists());
    }

    #[test]
    fn test_bad_iv_length_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let mut bundle = seal_for(test_bob(), b"content", "t.txt");
        bundle.iv.truncate(8);

        assert!(matches!(
            receive(bundle.into(), test_bob(), &storage),
            Err(TransferError::Cipher(CipherError::IvLength(8)))
        ));
    }

    #[test]
    fn test_wrapped_key_of_wrong_size_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = ReceiveDir::new(temp.path());

        let mut bundle = seal_for(test_bob(), b"content", "t.txt");
        bundle.session_key = test_bob().public().wrap(&[5u8; 16]).unwrap();

        assert!(matches!(
            receive(bundle.into(), test_bob(), &storage),
            Err(TransferError::Unwrap(_))
        ));
    }

    #[test]
    fn test_traversal_name_stays_in_storage() {
        let temp = TempDir::new().unwrap();
        let inbox = temp.path().join("inbox");
        let storage = ReceiveDir::new(&inbox);

        let bundle = PlainBundle {
            file: b"payload".to_vec(),
            filename: "../../escape.txt".to_string(),
        };
        let report = receive(bundle.into(), test_bob(), &storage).unwrap();
        assert_eq!(report.stored_as, inbox.join("RECEIVED_escape.txt"));
        assert!(!temp.path().join("escape.txt").exists());

        let bundle = PlainBundle {
            file: b"payload".to_vec(),
            filename: "..".to_string(),
        };
        assert!(matches!(
            receive(bundle.into(), test_bob(), &storage),
            Err(TransferError::Storage(StorageError::InvalidFilename(_)))
        ));
    }
}
