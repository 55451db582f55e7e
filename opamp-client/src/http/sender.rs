use crate::{
    common::backoff::{parse_retry_after, Backoff},
    common::compression::{decode_message, encode_message, Compressor},
    http::HttpClientError,
    opamp::proto::AgentToServer,
    opamp::proto::ServerToAgent,
};

use crate::http::http_client::HttpClient;

/// Sends `AgentToServer` messages over HTTP and decompresses the `ServerToAgent` response.
/// Retries indefinitely on 429/503, honoring the Server's `Retry-After` hint; any other
/// non-success status is terminal.
pub struct HttpSender<C>
where
    C: HttpClient,
{
    compressor: Compressor,
    client: C,
}

impl<C> HttpSender<C>
where
    C: HttpClient,
{
    pub(super) fn new(client: C) -> Result<Self, HttpClientError> {
        Ok(Self {
            compressor: Compressor::Plain,
            client,
        })
    }

    pub(super) async fn send(&self, msg: AgentToServer) -> Result<ServerToAgent, HttpClientError> {
        let bytes = encode_message(&self.compressor, msg)?;
        let mut backoff = Backoff::new();

        loop {
            let response = self.client.post(bytes.clone()).await?;
            let status = response.status();

            if status.is_success() {
                let compression = match response.headers().get("Content-Encoding") {
                    Some(algorithm) => Compressor::try_from(algorithm.as_ref())?,
                    None => Compressor::Plain,
                };
                return decode_message::<ServerToAgent>(&compression, &response.bytes().await?)
                    .map_err(HttpClientError::from);
            }

            if status.as_u16() == 429 || status.as_u16() == 503 {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);
                let delay = backoff.next_delay(retry_after);
                tracing::debug!("server asked to retry after {delay:?}, status {status}");
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(HttpClientError::UnsuccessfulResponse(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default().to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use http::StatusCode;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use prost::Message;

    use crate::{
        common::compression::CompressorError,
        http::http_client::{
            test::{reqwest_response_from_server_to_agent, MockHttpClientMockall, ResponseParts},
            HttpClientError,
        },
        opamp::proto::{AgentConfigFile, AgentConfigMap, AgentRemoteConfig},
        opamp::proto::{AgentToServer, ServerToAgent},
    };

    use super::HttpSender;
    use crate::http::{HttpClientReqwest, HttpConfig};

    #[tokio::test]
    async fn retries_on_429_then_succeeds() {
        let mut mock_client = MockHttpClientMockall::new();
        let mut seq = mockall::Sequence::new();

        mock_client
            .expect_post()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| {
                Ok(reqwest_response_from_server_to_agent(
                    &ServerToAgent::default(),
                    ResponseParts {
                        status: StatusCode::TOO_MANY_REQUESTS,
                        headers: HashMap::from([("Retry-After".to_string(), "0".to_string())]),
                    },
                ))
            });
        mock_client
            .expect_post()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(|_| {
                Ok(reqwest_response_from_server_to_agent(
                    &ServerToAgent::default(),
                    Default::default(),
                ))
            });

        let sender = HttpSender::new(mock_client).unwrap();
        let res = sender.send(AgentToServer::default()).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn errors_when_unsupported_compression_is_received() {
        let mut mock_client = MockHttpClientMockall::new();
        mock_client.should_post(reqwest_response_from_server_to_agent(
            &ServerToAgent::default(),
            ResponseParts {
                headers: HashMap::from([(
                    "Content-Encoding".to_string(),
                    "unsupported".to_string(),
                )]),
                ..Default::default()
            },
        ));

        let sender = HttpSender::new(mock_client).unwrap();
        let res = sender.send(AgentToServer::default()).await;
        assert!(res.is_err());

        let expected_err = CompressorError::UnsupportedEncoding("unsupported".to_string());
        match res.unwrap_err() {
            HttpClientError::CompressionError(e) => assert_eq!(expected_err, e),
            err => panic!("Wrong error variant was returned. Expected `HttpClientError::CompressionError`, found {}", err)
        }
    }

    #[tokio::test]
    async fn error_when_invalid_status_code() {
        let mut mock_client = MockHttpClientMockall::new();
        mock_client.should_post(reqwest_response_from_server_to_agent(
            &ServerToAgent::default(),
            ResponseParts {
                status: StatusCode::FORBIDDEN,
                ..Default::default()
            },
        ));

        let sender = HttpSender::new(mock_client).unwrap();
        let res = sender.send(AgentToServer::default()).await;
        assert!(res.is_err());

        match res.unwrap_err() {
            HttpClientError::UnsuccessfulResponse(status_code, message) => {
                assert_eq!(StatusCode::FORBIDDEN, status_code);
                assert_eq!("Forbidden".to_string(), message);
            }
            err => panic!("Wrong error variant was returned. Expected `HttpClientError::CompressionError`, found {}", err)
        }
    }

    #[tokio::test]
    async fn assert_message_is_decoded() {
        let mut buf = vec![];
        let body = r#"
staging: true
license_key: F4K3L1C3NS3-0N3
custom_attributes:
  environment: test
"#;

        let server_to_agent = ServerToAgent {
            instance_uid: "N0L1C3NS3INV3NT3D".into(),
            remote_config: Some(AgentRemoteConfig {
                config: Some(AgentConfigMap {
                    config_map: std::collections::HashMap::from([(
                        "test".to_string(),
                        AgentConfigFile {
                            body: body.into(),
                            content_type: " text/yaml".to_string(),
                        },
                    )]),
                }),
                config_hash: "@d7ae6e67b68b05f444464ca5652fddd891824c5e336c4dc5dda6ed7f6b8be2998"
                    .into(),
            }),
            ..Default::default()
        };
        server_to_agent.encode(&mut buf).unwrap();

        let server = MockServer::start();

        let _ = server.mock(|when, then| {
            when.method(POST).path("/v1/opamp");
            then.status(200)
                .header("content-type", "application/x-protobuf")
                .body(buf);
        });

        let http_config = HttpConfig::new(server.url("/v1/opamp").as_str())
            .unwrap()
            .with_headers(HashMap::from([(
                "super-key".to_string(),
                "5UP4H-K3Y".to_string(),
            )]))
            .unwrap()
            .with_gzip_compression(false);

        let http_client_reqwest = HttpClientReqwest::new(http_config).unwrap();
        let sender = HttpSender::new(http_client_reqwest).unwrap();
        let res = sender.send(AgentToServer::default()).await;
        assert!(res.is_ok());
        assert_eq!(res.unwrap(), server_to_agent)
    }
}
