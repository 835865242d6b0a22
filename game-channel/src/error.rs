use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
    #[error("Could not connect: {0}")]
    Connect(String),
}

/// Failures a channel reports. The `Display` output is meant for the end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Game state id must not be empty.")]
    EmptyTarget,
    #[error("Could not reconnect to server.")]
    RetriesExhausted,
    #[error("Could not reconnect to server. Server connection error: {0}")]
    TransportFailed(String),
    #[error("Received an unreadable game state: {0}")]
    Decode(String),
}
