//! # HTTP Client Module
//!
//! This module defines an HTTP client for a Rust application, its configuration, and common errors. GZIP compression is enabled by default.
//!

use super::HttpConfig;
use crate::common::compression::{Compressor, CompressorError, DecoderError, EncoderError};
use async_trait::async_trait;
use reqwest::Response;
use thiserror::Error;
use url::Url;

/// An enumeration of potential errors related to the HTTP client.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// Represents a reqwest error.
    #[error("`{0}`")]
    ReqwestError(#[from] reqwest::Error),
    /// Represents a decode error.
    #[error("`{0}`")]
    DecoderError(#[from] DecoderError),
    /// Represents an encode error.
    #[error("`{0}`")]
    EncoderError(#[from] EncoderError),
    /// Represents a compression error.
    #[error("`{0}`")]
    CompressionError(#[from] CompressorError),
    /// Unsuccessful HTTP response.
    #[error("Status code: `{0}` Canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
}

/// An asynchronous trait that defines the internal methods for HTTP clients.
#[async_trait]
pub trait HttpClient {
    /// An asynchronous function that defines the `post` method for HTTP client.
    async fn post(&self, body: Vec<u8>) -> Result<Response, HttpClientError>;
}

/// An implementation of the `HttpClient` trait using the reqwest library.
pub struct HttpClientReqwest {
    client: reqwest::Client,
    url: Url,
}

impl HttpClientReqwest {
    /// Construct a new `HttpClientReqwest` from the given `HttpConfig`.
    ///
    /// # Examples
    ///
    /// ```
    /// use opamp_client::http::{HttpClientReqwest, HttpConfig};
    ///
    /// let config = HttpConfig::new("https://my-server.com/v1/opamp").unwrap();
    /// let client = HttpClientReqwest::new(config).unwrap();
    /// ```
    pub fn new(config: HttpConfig) -> Result<Self, HttpClientError> {
        let url = config.url.clone();
        Ok(Self {
            client: reqwest::Client::try_from(config)?,
            url,
        })
    }
}

#[async_trait]
impl HttpClient for HttpClientReqwest {
    async fn post(&self, body: Vec<u8>) -> Result<Response, HttpClientError> {
        Ok(self.client.post(self.url.clone()).body(body).send().await?)
    }
}

/// Implement TryFrom trait to create a reqwest::Client from HttpConfig
impl TryFrom<HttpConfig> for reqwest::Client {
    type Error = HttpClientError;
    fn try_from(value: HttpConfig) -> Result<Self, Self::Error> {
        Ok(reqwest::Client::builder()
            .default_headers(value.headers)
            .connect_timeout(value.timeout)
            .timeout(value.timeout)
            .build()?)
    }
}

/// Implement From trait to create a Compressor from a reference to HttpConfig
impl From<&HttpConfig> for Compressor {
    fn from(value: &HttpConfig) -> Self {
        if value.compression {
            return Compressor::Gzip;
        }
        Compressor::Plain
    }
}
