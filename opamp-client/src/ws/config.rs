//! # Common WebSocket configuration.

use std::str::FromStr;
use std::time::Duration;

use http::header::{InvalidHeaderName, InvalidHeaderValue};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::{ParseError, Url};

/// Default heartbeat interval; a zero interval disables heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// A struct representing the configuration for the internal WebSocket client.
///
/// # Examples
///
/// ```rust
/// use opamp_client::ws::WsConfig;
///
/// let config = WsConfig::new("wss://my-server.com/v1/opamp").unwrap();
/// ```
pub struct WsConfig {
    pub(super) url: Url,
    pub(super) headers: HeaderMap,
    pub(super) heartbeat_interval: Duration,
}

/// An enumeration of potential errors related to the WebSocket client configuration.
#[derive(thiserror::Error, Debug)]
pub enum WsConfigError {
    /// WebSocket client with an invalid url.
    #[error("`{0}`")]
    InvalidUrl(#[from] ParseError),
    /// WebSocket client with an invalid header value.
    #[error("`{0}`")]
    InvalidHeader(#[from] InvalidHeaderValue),
    /// WebSocket client with an invalid header name.
    #[error("`{0}`")]
    InvalidHeaderName(#[from] InvalidHeaderName),
}

impl WsConfig {
    /// Construct a new `WsConfig` with a given URL as a string.
    ///
    /// # Errors
    ///
    /// This function will return an error if the provided URL is not valid.
    pub fn new(url: &str) -> Result<Self, WsConfigError> {
        Ok(Self {
            url: Url::from_str(url)?,
            headers: HeaderMap::new(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        })
    }

    /// Optionally include custom headers in the initial handshake request.
    ///
    /// # Errors
    ///
    /// This function will return an error if the provided key or value is not valid.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Result<Self, WsConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (ref key, ref val) in headers {
            let _ = self
                .headers
                .insert(HeaderName::from_str(key.as_ref())?, val.as_ref().parse()?);
        }
        Ok(self)
    }

    /// Sets the heartbeat interval. A zero interval disables heartbeats.
    pub fn with_heartbeat_interval(self, heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            ..self
        }
    }
}
