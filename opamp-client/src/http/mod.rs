//! # Polled HTTP transport for the OpAMP client.

pub mod client;
pub mod config;
pub mod http_client;
mod managed_client;
mod sender;
mod ticker;

// export public structs
pub use {
    config::{HttpConfig, HttpConfigError},
    http_client::{HttpClient, HttpClientError, HttpClientReqwest},
    managed_client::{NotStartedHttpClient, StartedHttpClient, DEFAULT_POLLING_INTERVAL},
    ticker::{Ticker, TickerError, TokioTicker},
};
