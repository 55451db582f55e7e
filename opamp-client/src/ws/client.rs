//! # WebSocket transport for the OpAMP client
//!
//! Maintains a single long-lived connection: a sender task drains
//! `NextMessage` onto the wire, a receiver task decodes incoming frames
//! into [`OpAMPWsClient::handle_frame`]. Unlike the HTTP transport, a
//! `NeedsResend` result from `process_message` requires no extra action:
//! it has already called `NextMessage::update`, which wakes the sender
//! task directly.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_util::sync::CancellationToken;

use crate::client::{Client, ClientError, ClientResult, NotStartedClient, StartedClient};
use crate::common::clientstate::ClientSyncedState;
use crate::common::message_processor::process_message;
use crate::common::nextmessage::NextMessage;
use crate::error::ConnectionError;
use crate::opamp::proto::{
    AgentCapabilities, AgentDescription, AgentToServer, ComponentHealth, CustomCapabilities,
    PackagesAvailable, RemoteConfigStatus, ServerToAgent,
};
use crate::operation::callbacks::Callbacks;
use crate::operation::capabilities::Capabilities;
use crate::operation::settings::StartSettings;
use crate::packagesync::PackageSyncer;

use super::config::WsConfig;
use super::sender::SenderHandle;
use super::{receiver, sender, WsError};

/// WebSocket implementation of the OpAMP client core. Holds the same
/// coalescing state as the HTTP core; the transport-specific pieces
/// (sender/receiver tasks) live in [`NotStartedWsClient`]/[`StartedWsClient`].
pub struct OpAMPWsClient<C>
where
    C: Callbacks + Send + Sync,
{
    callbacks: C,
    message: Arc<RwLock<NextMessage>>,
    synced_state: ClientSyncedState,
    capabilities: Capabilities,
    download_reporter_interval: std::time::Duration,
}

impl<C> OpAMPWsClient<C>
where
    C: Callbacks + Send + Sync,
{
    async fn new(
        callbacks: C,
        start_settings: StartSettings,
        synced_state: ClientSyncedState,
    ) -> ClientResult<Self> {
        if !start_settings
            .capabilities
            .has_capability(AgentCapabilities::ReportsStatus)
        {
            tracing::warn!("ReportsStatus capability not set; adding it, as it is required");
        }
        let capabilities = start_settings.capabilities.with_reports_status();
        let download_reporter_interval = start_settings
            .download_reporter_interval
            .unwrap_or(crate::packagesync::MIN_REPORT_INTERVAL)
            .max(crate::packagesync::MIN_REPORT_INTERVAL);

        let mut agent_to_server = AgentToServer {
            instance_uid: start_settings.instance_id.clone(),
            agent_description: Some(start_settings.agent_description.clone().into()),
            capabilities: u64::from(capabilities),
            custom_capabilities: start_settings.custom_capabilities.clone(),
            ..Default::default()
        };

        synced_state
            .set_agent_description(start_settings.agent_description.clone())
            .map_err(ClientError::SyncedStateError)?;
        synced_state
            .set_capabilities(u64::from(capabilities))
            .map_err(ClientError::SyncedStateError)?;

        if capabilities.has_capability(AgentCapabilities::ReportsRemoteConfig) {
            let status = RemoteConfigStatus::default();
            synced_state
                .set_remote_config_status(status.clone())
                .map_err(ClientError::SyncedStateError)?;
            agent_to_server.remote_config_status = Some(status);
        }

        if capabilities.has_capability(AgentCapabilities::AcceptsPackages) {
            if let Some(store) = callbacks.package_store() {
                match store.last_reported_statuses().await {
                    Ok(statuses) => {
                        synced_state
                            .set_package_statuses(statuses.clone())
                            .map_err(ClientError::SyncedStateError)?;
                        agent_to_server.package_statuses = Some(statuses);
                    }
                    Err(e) => {
                        tracing::warn!("failed to load last-reported package statuses: {e}");
                    }
                }
            }
        }

        Ok(Self {
            callbacks,
            message: Arc::new(RwLock::new(NextMessage::new(agent_to_server))),
            synced_state,
            capabilities,
            download_reporter_interval,
        })
    }

    pub(super) async fn handle_frame(&self, msg: ServerToAgent) -> ClientResult<()> {
        let (_process_result, packages_available) = process_message(
            msg,
            &self.callbacks,
            &self.synced_state,
            &self.capabilities,
            self.message.clone(),
        )
        .map_err(ClientError::ProcessError)?;

        if let Some(available) = packages_available {
            if self.capabilities.has_capability(AgentCapabilities::AcceptsPackages) {
                self.sync_packages(available).await;
            }
        }

        Ok(())
    }

    async fn sync_packages(&self, available: PackagesAvailable) {
        let Some(store) = self.callbacks.package_store() else {
            tracing::warn!(
                "server offered packages but no package store is configured; ignoring"
            );
            return;
        };
        let syncer = PackageSyncer::new(
            store,
            self.callbacks.download_client(),
            self.message.clone(),
            self.download_reporter_interval,
        );
        syncer.sync(available).await;
    }
}

#[async_trait]
impl<C> Client for OpAMPWsClient<C>
where
    C: Callbacks + Send + Sync,
{
    async fn set_agent_description(&self, description: AgentDescription) -> ClientResult<()> {
        if self
            .synced_state
            .agent_description_unchanged(&description)
            .map_err(ClientError::SyncedStateError)?
        {
            return Ok(());
        }

        self.message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .update(|msg| msg.agent_description = Some(description.clone().into()));

        self.synced_state
            .set_agent_description(description)
            .map_err(ClientError::SyncedStateError)?;

        Ok(())
    }

    async fn agent_description(&self) -> ClientResult<AgentDescription> {
        Ok(self
            .synced_state
            .agent_description()
            .map_err(ClientError::SyncedStateError)?
            .unwrap_or_default())
    }

    async fn set_health(&self, health: ComponentHealth) -> ClientResult<()> {
        self.message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .update(|msg| msg.health = Some(health.clone().into()));

        self.synced_state
            .set_health(health)
            .map_err(ClientError::SyncedStateError)?;

        Ok(())
    }

    async fn update_effective_config(&self) -> ClientResult<()> {
        if !self.capabilities.has_capability(AgentCapabilities::ReportsEffectiveConfig) {
            return Err(ClientError::UnsetCapability(
                "ReportsEffectiveConfig".to_string(),
            ));
        }

        let config = self
            .callbacks
            .get_effective_config()
            .map_err(|e| ClientError::EffectiveConfigError(e.to_string()))?;

        self.message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .update(|msg| msg.effective_config = Some(config.clone()));

        Ok(())
    }

    async fn set_remote_config_status(&self, status: RemoteConfigStatus) -> ClientResult<()> {
        if !self.capabilities.has_capability(AgentCapabilities::ReportsRemoteConfig) {
            return Err(ClientError::UnsetCapability(
                "ReportsRemoteConfig".to_string(),
            ));
        }

        if self
            .synced_state
            .remote_config_status_unchanged(&status)
            .map_err(ClientError::SyncedStateError)?
        {
            return Ok(());
        }

        self.message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .update(|msg| msg.remote_config_status = Some(status.clone()));

        self.synced_state
            .set_remote_config_status(status)
            .map_err(ClientError::SyncedStateError)?;

        Ok(())
    }

    async fn set_custom_capabilities(&self, capabilities: CustomCapabilities) -> ClientResult<()> {
        self.message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .update(|msg| msg.custom_capabilities = Some(capabilities.clone()));

        self.synced_state
            .set_custom_capabilities(capabilities)
            .map_err(ClientError::SyncedStateError)?;

        Ok(())
    }
}

/// A not-yet-started WebSocket client.
pub struct NotStartedWsClient {
    config: WsConfig,
}

impl NotStartedWsClient {
    /// Builds a new client that will connect to `config.url` once started.
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }
}

/// A started WebSocket client, driven by a sender and a receiver task.
pub struct StartedWsClient<C>
where
    C: Callbacks + Send + Sync + 'static,
{
    opamp_client: Arc<OpAMPWsClient<C>>,
    sender_handle: SenderHandle,
    receiver_handle: JoinHandle<()>,
    cancel: CancellationToken,
}

#[async_trait]
impl<C> NotStartedClient for NotStartedWsClient
where
    C: Callbacks + Send + Sync + 'static,
{
    type Callbacks = C;
    type StartedClient = StartedWsClient<C>;

    async fn start(
        self,
        callbacks: Self::Callbacks,
        start_settings: StartSettings,
    ) -> ClientResult<Self::StartedClient> {
        let mut request = match self.config.url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                let err = WsError::Transport(e);
                callbacks.on_connect_failed(ConnectionError::WsClientError(err.to_string()));
                return Err(ClientError::ConnectionFailed(err.to_string()));
            }
        };

        for (name, value) in self.config.headers.iter() {
            request.headers_mut().insert(name, value.clone());
        }

        let (ws_stream, _response) = match tokio_tungstenite::connect_async(request).await {
            Ok(connected) => connected,
            Err(e) => {
                let err = WsError::Transport(e);
                callbacks.on_connect_failed(ConnectionError::WsClientError(err.to_string()));
                return Err(ClientError::ConnectionFailed(err.to_string()));
            }
        };

        let (sink, stream) = ws_stream.split();

        let heartbeat_interval = start_settings
            .heartbeat_interval
            .unwrap_or(self.config.heartbeat_interval);

        let opamp_client = Arc::new(
            OpAMPWsClient::new(callbacks, start_settings, ClientSyncedState::default()).await?,
        );
        opamp_client.callbacks.on_connect();

        let cancel = CancellationToken::new();
        let sender_handle = sender::spawn(
            sink,
            opamp_client.message.clone(),
            heartbeat_interval,
            cancel.clone(),
        );

        let receiver_handle = tokio::spawn(receiver::run(
            stream,
            opamp_client.clone(),
            cancel.clone(),
        ));

        Ok(StartedWsClient {
            opamp_client,
            sender_handle,
            receiver_handle,
            cancel,
        })
    }
}

#[async_trait]
impl<C> StartedClient for StartedWsClient<C>
where
    C: Callbacks + Send + Sync + 'static,
{
    async fn stop(self) -> ClientResult<()> {
        self.cancel.cancel();
        if let Err(e) = self.sender_handle.stop().await {
            tracing::warn!("error while closing the websocket sender: {e}");
        }
        self.receiver_handle
            .await
            .map_err(|e| ClientError::ClientStopError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl<C> Client for StartedWsClient<C>
where
    C: Callbacks + Send + Sync + 'static,
{
    async fn set_agent_description(&self, description: AgentDescription) -> ClientResult<()> {
        self.opamp_client.set_agent_description(description).await
    }

    async fn agent_description(&self) -> ClientResult<AgentDescription> {
        self.opamp_client.agent_description().await
    }

    async fn set_health(&self, health: ComponentHealth) -> ClientResult<()> {
        self.opamp_client.set_health(health).await
    }

    async fn update_effective_config(&self) -> ClientResult<()> {
        self.opamp_client.update_effective_config().await
    }

    async fn set_remote_config_status(&self, status: RemoteConfigStatus) -> ClientResult<()> {
        self.opamp_client.set_remote_config_status(status).await
    }

    async fn set_custom_capabilities(&self, capabilities: CustomCapabilities) -> ClientResult<()> {
        self.opamp_client.set_custom_capabilities(capabilities).await
    }
}
