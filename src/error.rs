use thiserror::Error;

#[derive(Error, Debug)]
pub enum KiriError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notification backend error: {0}")]
    Notification(#[from] notify_rust::error::Error),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    /// The other half of a relay channel went away before answering.
    #[error("Relay channel closed: {0}")]
    RelayClosed(&'static str),

    #[error("Native message too large: {0} bytes")]
    MessageTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, KiriError>;
