//! # WebSocket transport for the OpAMP client.

pub mod client;
pub mod config;
mod framing;
mod receiver;
mod sender;

use thiserror::Error;

// export public structs
pub use {
    client::{NotStartedWsClient, StartedWsClient},
    config::{WsConfig, WsConfigError, DEFAULT_HEARTBEAT_INTERVAL},
};

/// An enumeration of potential errors related to the WebSocket transport.
#[derive(Error, Debug)]
pub enum WsError {
    /// Represents an underlying WebSocket/transport error.
    #[error("`{0}`")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// Represents a frame decoding error.
    #[error("`{0}`")]
    Framing(#[from] framing::FramingError),
    /// The close frame was not acknowledged within the shutdown deadline.
    #[error("timed out waiting for the close handshake to complete")]
    CloseTimedOut,
    /// The sender task panicked or was dropped before completing.
    #[error("sender task failed: `{0}`")]
    SenderTaskFailed(String),
}
