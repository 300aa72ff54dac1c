use std::net::SocketAddr;

/// Largest multipart body the node accepts (500 MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Settings for the node's HTTP listener
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Level at which completed requests are traced
    pub log_level: tracing::Level,
    /// Body limit applied to every route, uploads included
    pub max_body_bytes: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            log_level: tracing::Level::INFO,
            max_body_bytes: MAX_UPLOAD_SIZE_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
