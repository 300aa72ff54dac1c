use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{TransferError, TransferMode};

/// Multipart field carrying the RSA-OAEP wrapped session key
pub const SESSION_KEY_FIELD: &str = "session_key";
/// Multipart field carrying the 16-byte IV
pub const IV_FIELD: &str = "iv";
/// Multipart field carrying the padded AES-CBC ciphertext
pub const CIPHERTEXT_FIELD: &str = "ciphertext";
/// Multipart text field carrying the original file name
pub const FILENAME_FIELD: &str = "filename";
/// Multipart field carrying raw bytes in a plain transfer
pub const FILE_FIELD: &str = "file";

const OCTET_STREAM: &str = "application/octet-stream";

/// Wire form of one encrypted transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBundle {
    pub session_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub filename: String,
}

impl EncryptedBundle {
    /// Encode as `multipart/form-data`
    ///
    /// The binary fields are sent as file parts so that any multipart server
    /// (not just ours) sees them as uploads.
    pub fn into_form(self) -> Result<Form, TransferError> {
        Ok(Form::new()
            .part(SESSION_KEY_FIELD, binary_part(self.session_key, SESSION_KEY_FIELD)?)
            .part(IV_FIELD, binary_part(self.iv, IV_FIELD)?)
            .part(CIPHERTEXT_FIELD, binary_part(self.ciphertext, CIPHERTEXT_FIELD)?)
            .text(FILENAME_FIELD, self.filename))
    }
}

/// Wire form of one unencrypted transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainBundle {
    pub file: Vec<u8>,
    pub filename: String,
}

impl PlainBundle {
    pub fn into_form(self) -> Result<Form, TransferError> {
        let part = binary_part(self.file, &self.filename)?;
        Ok(Form::new()
            .part(FILE_FIELD, part)
            .text(FILENAME_FIELD, self.filename))
    }
}

fn binary_part(bytes: Vec<u8>, file_name: &str) -> Result<Part, TransferError> {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(OCTET_STREAM)
        .map_err(|e| TransferError::Encoding(e.to_string()))
}

/// A received multipart request, before any validation
///
/// The HTTP layer fills this in field by field; nothing here has been
/// checked yet. Turning it into a typed bundle either yields every required
/// field or fails as a whole.
#[derive(Debug, Clone)]
pub struct RawBundle {
    pub mode: TransferMode,
    pub session_key: Option<Vec<u8>>,
    pub iv: Option<Vec<u8>>,
    pub ciphertext: Option<Vec<u8>>,
    pub file: Option<Vec<u8>>,
    pub filename: Option<String>,
}

impl RawBundle {
    pub fn new(mode: TransferMode) -> Self {
        Self {
            mode,
            session_key: None,
            iv: None,
            ciphertext: None,
            file: None,
            filename: None,
        }
    }

    /// Field names this bundle's mode needs
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self.mode {
            TransferMode::Encrypted => &[SESSION_KEY_FIELD, IV_FIELD, CIPHERTEXT_FIELD, FILENAME_FIELD],
            TransferMode::Plain => &[FILE_FIELD, FILENAME_FIELD],
        }
    }

    /// Store a binary field; returns `false` for names this bundle does not use
    pub fn set_bytes(&mut self, name: &str, data: Vec<u8>) -> bool {
        let slot = match (self.mode, name) {
            (TransferMode::Encrypted, SESSION_KEY_FIELD) => &mut self.session_key,
            (TransferMode::Encrypted, IV_FIELD) => &mut self.iv,
            (TransferMode::Encrypted, CIPHERTEXT_FIELD) => &mut self.ciphertext,
            (TransferMode::Plain, FILE_FIELD) => &mut self.file,
            _ => return false,
        };
        *slot = Some(data);
        true
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    fn missing(&self) -> Vec<&'static str> {
        self.expected_fields()
            .iter()
            .copied()
            .filter(|field| match *field {
                SESSION_KEY_FIELD => self.session_key.is_none(),
                IV_FIELD => self.iv.is_none(),
                CIPHERTEXT_FIELD => self.ciphertext.is_none(),
                FILE_FIELD => self.file.is_none(),
                FILENAME_FIELD => self.filename.is_none(),
                _ => false,
            })
            .collect()
    }

    /// Validate and convert into an [`EncryptedBundle`]
    ///
    /// Fails with [`TransferError::MalformedBundle`] listing every absent field.
    pub fn into_encrypted(self) -> Result<EncryptedBundle, TransferError> {
        if self.mode != TransferMode::Encrypted {
            return Err(TransferError::ModeMismatch(self.mode));
        }
        let missing = self.missing();
        match (self.session_key, self.iv, self.ciphertext, self.filename) {
            (Some(session_key), Some(iv), Some(ciphertext), Some(filename)) => Ok(EncryptedBundle {
                session_key,
                iv,
                ciphertext,
                filename,
            }),
            _ => Err(TransferError::MalformedBundle(missing)),
        }
    }

    /// Validate and convert into a [`PlainBundle`]
    pub fn into_plain(self) -> Result<PlainBundle, TransferError> {
        if self.mode != TransferMode::Plain {
            return Err(TransferError::ModeMismatch(self.mode));
        }
        let missing = self.missing();
        match (self.file, self.filename) {
            (Some(file), Some(filename)) => Ok(PlainBundle { file, filename }),
            _ => Err(TransferError::MalformedBundle(missing)),
        }
    }
}

impl From<EncryptedBundle> for RawBundle {
    fn from(bundle: EncryptedBundle) -> Self {
        let mut raw = RawBundle::new(TransferMode::Encrypted);
        raw.session_key = Some(bundle.session_key);
        raw.iv = Some(bundle.iv);
        raw.ciphertext = Some(bundle.ciphertext);
        raw.filename = Some(bundle.filename);
        raw
    }
}

impl From<PlainBundle> for RawBundle {
    fn from(bundle: PlainBundle) -> Self {
        let mut raw = RawBundle::new(TransferMode::Plain);
        raw.file = Some(bundle.file);
        raw.filename = Some(bundle.filename);
        raw
    }
}

/// Body of every acknowledgment a node sends back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    pub message: String,
}

impl TransferResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
