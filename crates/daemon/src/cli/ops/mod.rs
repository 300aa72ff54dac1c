pub mod daemon;
pub mod health;
pub mod init;
pub mod key;
pub mod send;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use init::Init;
pub use key::Key;
pub use send::SendFile;
pub use version::Version;
