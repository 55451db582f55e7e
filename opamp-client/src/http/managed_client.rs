//! # HTTP managed client
//!
//! Wraps [`super::client::OpAMPHttpClient`] with a background polling task driven
//! by a [`Ticker`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::client::{Client, ClientError, ClientResult, NotStartedClient, StartedClient};
use crate::common::clientstate::ClientSyncedState;
use crate::operation::callbacks::Callbacks;
use crate::operation::capabilities::Capabilities;
use crate::operation::settings::StartSettings;
use crate::opamp::proto::{AgentDescription, ComponentHealth, CustomCapabilities, RemoteConfigStatus};

use super::client::OpAMPHttpClient;
use super::http_client::HttpClient;
use super::ticker::{Ticker, TokioTicker};

/// Polling interval used unless a different one is requested with [`NotStartedHttpClient::with_interval`].
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(30);

/// A not-yet-started HTTP managed client.
pub struct NotStartedHttpClient<L, T = TokioTicker>
where
    L: HttpClient + Send + Sync + 'static,
    T: Ticker + Send + Sync + 'static,
{
    ticker: T,
    http_client: L,
}

impl<L> NotStartedHttpClient<L, TokioTicker>
where
    L: HttpClient + Send + Sync + 'static,
{
    /// Builds a new client polling at [`DEFAULT_POLLING_INTERVAL`].
    pub fn new(http_client: L) -> Self {
        Self {
            ticker: TokioTicker::new(DEFAULT_POLLING_INTERVAL),
            http_client,
        }
    }

    /// Builds a new client polling at the given `interval`.
    ///
    /// Falls back to [`DEFAULT_POLLING_INTERVAL`] (and logs a warning) if
    /// `interval` is smaller than the default, to avoid hammering the server.
    pub fn with_interval(http_client: L, interval: Duration) -> Self {
        let interval = if interval < DEFAULT_POLLING_INTERVAL {
            warn!(
                "polling interval `{:?}` is smaller than the minimum `{:?}`, using the minimum instead",
                interval, DEFAULT_POLLING_INTERVAL
            );
            DEFAULT_POLLING_INTERVAL
        } else {
            interval
        };
        Self {
            ticker: TokioTicker::new(interval),
            http_client,
        }
    }
}

/// A started HTTP managed client, running its polling loop in a background task.
pub struct StartedHttpClient<C, L, T = TokioTicker>
where
    C: Callbacks + Send + Sync + 'static,
    L: HttpClient + Send + Sync + 'static,
    T: Ticker + Send + Sync + 'static,
{
    handle: JoinHandle<()>,
    ticker: Arc<T>,
    opamp_client: Arc<OpAMPHttpClient<C, L>>,
}

#[async_trait]
impl<C, L, T> NotStartedClient for NotStartedHttpClient<L, T>
where
    C: Callbacks + Send + Sync + 'static,
    L: HttpClient + Send + Sync + 'static,
    T: Ticker + Send + Sync + 'static,
{
    type Callbacks = C;
    type StartedClient = StartedHttpClient<C, L, T>;

    async fn start(
        self,
        callbacks: Self::Callbacks,
        start_settings: StartSettings,
    ) -> ClientResult<Self::StartedClient> {
        let opamp_client = Arc::new(
            OpAMPHttpClient::new(
                callbacks,
                start_settings,
                self.http_client,
                ClientSyncedState::default(),
            )
            .await?,
        );

        // poll once up front so the agent reports its initial state before
        // waiting out a full interval.
        opamp_client.poll().await?;

        let ticker = Arc::new(self.ticker);
        let handle = tokio::spawn({
            let ticker = ticker.clone();
            let opamp_client = opamp_client.clone();
            async move {
                loop {
                    if ticker.next().await.is_err() {
                        return;
                    }
                    if let Err(err) = opamp_client.poll().await {
                        tracing::error!("polling the opamp server failed: {err}");
                    }
                }
            }
        });

        Ok(StartedHttpClient {
            handle,
            ticker,
            opamp_client,
        })
    }
}

#[async_trait]
impl<C, L, T> StartedClient for StartedHttpClient<C, L, T>
where
    C: Callbacks + Send + Sync + 'static,
    L: HttpClient + Send + Sync + 'static,
    T: Ticker + Send + Sync + 'static,
{
    async fn stop(self) -> ClientResult<()> {
        self.ticker
            .stop()
            .await
            .map_err(|e| ClientError::ClientStopError(e.to_string()))?;
        self.handle
            .await
            .map_err(|e| ClientError::ClientStopError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<C, L, T> Client for StartedHttpClient<C, L, T>
where
    C: Callbacks + Send + Sync + 'static,
    L: HttpClient + Send + Sync + 'static,
    T: Ticker + Send + Sync + 'static,
{
    async fn set_agent_description(&self, description: AgentDescription) -> ClientResult<()> {
        self.ticker.reset().await.ok();
        self.opamp_client.set_agent_description(description).await
    }

    async fn agent_description(&self) -> ClientResult<AgentDescription> {
        self.opamp_client.agent_description().await
    }

    async fn set_health(&self, health: ComponentHealth) -> ClientResult<()> {
        self.ticker.reset().await.ok();
        self.opamp_client.set_health(health).await
    }

    async fn update_effective_config(&self) -> ClientResult<()> {
        self.ticker.reset().await.ok();
        self.opamp_client.update_effective_config().await
    }

    async fn set_remote_config_status(&self, status: RemoteConfigStatus) -> ClientResult<()> {
        self.ticker.reset().await.ok();
        self.opamp_client.set_remote_config_status(status).await
    }

    async fn set_custom_capabilities(&self, capabilities: CustomCapabilities) -> ClientResult<()> {
        self.ticker.reset().await.ok();
        self.opamp_client.set_custom_capabilities(capabilities).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::http::http_client::test::MockHttpClientMockall;
    use crate::operation::callbacks::test::MockCallbacksMockall;
    use crate::http::ticker::test::MockTickerMockall;

    fn start_settings() -> StartSettings {
        StartSettings {
            instance_id: crate::operation::instance_uid::InstanceUid::create().into(),
            capabilities: Capabilities::default(),
            agent_description: Default::default(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_stop() {
        let mut http_client = MockHttpClientMockall::new();
        http_client.should_post(
            crate::http::http_client::test::reqwest_response_from_server_to_agent(
                &crate::opamp::proto::ServerToAgent::default(),
                Default::default(),
            ),
        );

        let mut callbacks = MockCallbacksMockall::new();
        callbacks.should_on_connect();

        let mut ticker = MockTickerMockall::new();
        ticker.should_next();
        ticker.should_stop();

        let not_started = NotStartedHttpClient {
            ticker,
            http_client,
        };

        let started = not_started.start(callbacks, start_settings()).await.unwrap();
        started.stop().await.unwrap();
    }
}
