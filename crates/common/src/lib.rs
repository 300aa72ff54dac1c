/**
 * Cryptographic types and operations.
 *  - RSA key pairs and session-key wrapping
 *  - AES-256-CBC content encryption
 */
pub mod crypto;
/**
 * On-disk storage of this node's key pair.
 *  Generates a pair on first use and hands
 *  out the public half as PEM.
 */
pub mod keystore;
/**
 * The transfer protocol: addressing peers,
 *  fetching their keys, building and posting
 *  bundles, and turning received bundles
 *  back into files.
 */
pub mod transfer;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::keystore::{KeyStore, KeyStoreConfig, KeyStoreError};
    pub use crate::transfer::{
        receive, PeerAddress, ReceiveDir, ReceiveReport, SendReport, Transfer, TransferConfig,
        TransferError, TransferMode, TransferResponse,
    };
    pub use crate::version::build_info;
}
