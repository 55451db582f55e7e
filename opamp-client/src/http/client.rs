//! # HTTP transport for the OpAMP client
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::client::{Client, ClientError, ClientResult};
use crate::common::clientstate::ClientSyncedState;
use crate::common::message_processor::{process_message, ProcessResult};
use crate::common::nextmessage::NextMessage;
use crate::error::ConnectionError;
use crate::opamp::proto::{
    AgentCapabilities, AgentDescription, AgentToServer, ComponentHealth, CustomCapabilities,
    RemoteConfigStatus,
};
use crate::operation::callbacks::Callbacks;
use crate::operation::capabilities::Capabilities;
use crate::operation::settings::StartSettings;
use crate::packagesync::PackageSyncer;

use super::http_client::HttpClient;
use super::sender::HttpSender;

/// Polled HTTP implementation of the OpAMP client core, shared by
/// [`super::managed_client::NotStartedHttpClient`] and its started counterpart.
pub struct OpAMPHttpClient<C, L>
where
    C: Callbacks + Send + Sync,
    L: HttpClient + Send + Sync,
{
    sender: HttpSender<L>,
    callbacks: C,
    message: Arc<RwLock<NextMessage>>,
    synced_state: ClientSyncedState,
    capabilities: Capabilities,
    download_reporter_interval: std::time::Duration,
}

impl<C, L> OpAMPHttpClient<C, L>
where
    C: Callbacks + Send + Sync,
    L: HttpClient + Send + Sync,
{
    pub(super) async fn new(
        callbacks: C,
        start_settings: StartSettings,
        http_client: L,
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
            sender: HttpSender::new(http_client).map_err(ClientError::HttpClientError)?,
            callbacks,
            message: Arc::new(RwLock::new(NextMessage::new(agent_to_server))),
            synced_state,
            capabilities,
            download_reporter_interval,
        })
    }

    pub(super) async fn poll(&self) -> ClientResult<()> {
        self.send_process().await
    }

    async fn send_process(&self) -> ClientResult<()> {
        let msg = self
            .message
            .write()
            .map_err(|_| ClientError::PoisonError)?
            .pop();

        let result = self.sender.send(msg).await;

        let server_to_agent = match result {
            Ok(server_to_agent) => {
                self.callbacks.on_connect();
                server_to_agent
            }
            Err(err) => {
                let message = err.to_string();
                self.callbacks
                    .on_connect_failed(ConnectionError::HTTPClientError(err));
                return Err(ClientError::ConnectionFailed(message));
            }
        };

        let (process_result, packages_available) = process_message(
            server_to_agent,
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

        if process_result == ProcessResult::NeedsResend {
            return Box::pin(self.send_process()).await;
        }

        Ok(())
    }

    async fn sync_packages(&self, available: crate::opamp::proto::PackagesAvailable) {
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
impl<C, L> Client for OpAMPHttpClient<C, L>
where
    C: Callbacks + Send + Sync,
    L: HttpClient + Send + Sync,
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
