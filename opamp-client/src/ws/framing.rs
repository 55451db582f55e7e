//! WebSocket wire framing: each frame carries a single encoded message
//! behind a reserved header byte (always zero on write). Decoding accepts
//! frames with or without the header byte, since the header byte is
//! reserved rather than load-bearing.

use prost::{DecodeError, Message};
use thiserror::Error;

use crate::opamp::proto::{AgentToServer, ServerToAgent};

#[derive(Error, Debug)]
pub enum FramingError {
    #[error("`{0}`")]
    Decode(#[from] DecodeError),
}

/// Encodes `msg` into a binary WebSocket frame body: one reserved header
/// byte (zero) followed by the protobuf-encoded message.
pub(crate) fn encode_frame(msg: &AgentToServer) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.encoded_len() + 1);
    buf.push(0u8);
    msg.encode(&mut buf).expect("Vec<u8> grows without bound");
    buf
}

/// Decodes a binary WebSocket frame body into a `ServerToAgent`. Strips a
/// leading zero header byte when present; falls back to decoding the raw
/// bytes when it isn't, so peers that omit the header byte still decode
/// correctly.
pub(crate) fn decode_frame(bytes: &[u8]) -> Result<ServerToAgent, FramingError> {
    if let Some(0) = bytes.first() {
        if let Ok(msg) = ServerToAgent::decode(&bytes[1..]) {
            return Ok(msg);
        }
    }
    Ok(ServerToAgent::decode(bytes)?)
}
