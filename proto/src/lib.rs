//! Generated OpAMP protobuf types and hand-written extensions on top of them.

#![allow(clippy::derive_partial_eq_without_eq)]

/// Generated protobuf message and enum definitions for the OpAMP wire protocol.
pub mod proto {
    include!("../opamp.proto.rs");
}

mod impls;

pub use proto::*;
