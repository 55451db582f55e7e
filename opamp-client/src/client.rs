//! OpAMP client trait and error.

use async_trait::async_trait;
use thiserror::Error;

use crate::common::clientstate::SyncedStateError;
use crate::common::message_processor::ProcessError;
use crate::http::HttpClientError;
use crate::operation::callbacks::Callbacks;
use crate::operation::settings::StartSettings;
use crate::opamp::proto::{
    AgentDescription, ComponentHealth, CustomCapabilities, RemoteConfigStatus,
};

/// Represents various errors that can occur during OpAMP connections.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Indicates a poison error, where a thread panicked while holding a lock.
    #[error("poison error, a thread panicked while holding a lock")]
    PoisonError,
    /// Represents a process message error.
    #[error("`{0}`")]
    ProcessError(#[from] ProcessError),
    /// Represents an HTTP transport error.
    #[error("`{0}`")]
    HttpClientError(#[from] HttpClientError),
    /// The connection to the Server could not be established or was lost.
    #[error("connection failed: `{0}`")]
    ConnectionFailed(String),
    /// Represents a synchronized state error.
    #[error("`{0}`")]
    SyncedStateError(#[from] SyncedStateError),
    /// Indicates that the required capability is not set.
    #[error("capability is not set: `{0}`")]
    UnsetCapability(String),
    /// Indicates an error while fetching effective configuration from the
    /// [`Callbacks::get_effective_config`] callback.
    #[error("error while fetching effective config: `{0}`")]
    EffectiveConfigError(String),
    /// An error occurred while stopping the background polling task.
    #[error("error while stopping client: `{0}`")]
    ClientStopError(String),
}

/// A type alias for results from OpAMP operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client defines the communication methods with the OpAMP server.
/// It must be shared among tasks safely.
#[async_trait]
pub trait Client: Send + Sync {
    /// Sets attributes of the Agent. The attributes will be included
    /// in the next status report sent to the Server.
    async fn set_agent_description(&self, description: AgentDescription) -> ClientResult<()>;

    /// Returns the last agent description set via [`Client::set_agent_description`].
    async fn agent_description(&self) -> ClientResult<AgentDescription>;

    /// Sets the health status of the Agent. The `ComponentHealth` will be included
    /// in the next status report sent to the Server.
    async fn set_health(&self, health: ComponentHealth) -> ClientResult<()>;

    /// Fetches the current local effective config using the
    /// [`Callbacks::get_effective_config`] callback and sends it to the Server.
    ///
    /// The reason there is a callback to fetch the effective config from the
    /// Agent, instead of it being provided directly like health, is to allow
    /// compression without storing the full configuration in memory.
    async fn update_effective_config(&self) -> ClientResult<()>;

    /// Sets the current `RemoteConfigStatus`.
    async fn set_remote_config_status(&self, status: RemoteConfigStatus) -> ClientResult<()>;

    /// Sets the custom capabilities of the Agent.
    async fn set_custom_capabilities(&self, capabilities: CustomCapabilities) -> ClientResult<()>;
}

/// A trait defining the methods necessary for starting an OpAMP client.
#[async_trait]
pub trait NotStartedClient {
    /// The [`Callbacks`] implementation used by the started client.
    type Callbacks: Callbacks;
    /// The type of the client once started.
    type StartedClient: StartedClient;

    /// Starts the client and begins attempts to connect to the Server. Once a
    /// connection is established the client will attempt to maintain it by
    /// reconnecting (HTTP polling) or resending (WebSocket) if the connection
    /// is lost. All failed connection attempts are reported via the
    /// `on_connect_failed` callback.
    ///
    /// Returns immediately with an error if `start_settings` are incorrect,
    /// e.g. the server URL is not valid.
    ///
    /// It is guaranteed that after `start()` returns without error one of the
    /// following callbacks will eventually be called (unless `stop()` is
    /// called first): `on_connect_failed`, `on_message` with an error, or
    /// `on_message` with a remote config.
    async fn start(
        self,
        callbacks: Self::Callbacks,
        start_settings: StartSettings,
    ) -> ClientResult<Self::StartedClient>;
}

/// A trait defining the `stop()` method for stopping a client in the OpAMP library.
#[async_trait]
pub trait StartedClient: Client {
    /// After this call returns successfully it is guaranteed that no
    /// further callbacks will be called. `stop()` cancels any in-flight
    /// polling/connection but waits for it to wind down before returning.
    /// Once stopped, the client cannot be started again.
    async fn stop(self) -> ClientResult<()>;
}
