//! OpAMP client common crate errors.

use crate::http::HttpClientError;
use thiserror::Error;

/// Represents errors that can occur on network operations, regardless of
/// which transport (HTTP polling or WebSocket) is in use.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Error while sending or receiving over HTTP.
    #[error(transparent)]
    HTTPClientError(#[from] HttpClientError),
    /// Error while sending or receiving over a WebSocket connection.
    #[error("websocket error: `{0}`")]
    WsClientError(String),
}
