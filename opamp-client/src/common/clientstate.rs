//! Stores the state of the Agent messages that the OpAMP Client needs to
//! have access to in order to synchronize with the Server.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::opamp::proto::{
    AgentDescription, AvailableComponents, ComponentHealth, CustomCapabilities,
    PackageStatuses, RemoteConfigStatus,
};

/// Errors returned while reading or writing `ClientSyncedState`.
#[derive(Error, Debug)]
pub enum SyncedStateError {
    /// A field required before starting the client has not been set.
    #[error("`{0}` is missing")]
    FieldMissing(&'static str),
    /// `AgentDescription` was set with no identifying or non-identifying
    /// attributes.
    #[error("agent description has no attributes set")]
    NoAttributes,
    /// A thread holding the internal lock panicked.
    #[error("poison error, a thread panicked while holding a lock")]
    PoisonError,
}

impl<T> From<PoisonError<T>> for SyncedStateError {
    fn from(_: PoisonError<T>) -> Self {
        SyncedStateError::PoisonError
    }
}

#[derive(Debug, Default)]
struct Inner {
    agent_description: Option<AgentDescription>,
    health: Option<ComponentHealth>,
    remote_config_status: Option<RemoteConfigStatus>,
    package_statuses: Option<PackageStatuses>,
    custom_capabilities: Vec<String>,
    available_components: Option<AvailableComponents>,
    /// Bitmask of `AgentCapabilities`. Always includes `ReportsStatus`.
    capabilities: u64,
    /// Bitmask of `AgentToServerFlags`.
    flags: u64,
}

/// ClientSyncedState stores the last-reported-to-the-Server value of each
/// Agent-to-Server message that supports partial updates: `AgentDescription`,
/// `ComponentHealth`, `RemoteConfigStatus` and `PackageStatuses`.
///
/// See the OpAMP specification for how state synchronization works:
/// <https://github.com/open-telemetry/opamp-spec/blob/main/specification.md#Agent-to-Server-state-synchronization>
///
/// The `EffectiveConfig` is subject to the same synchronization logic,
/// however it is not stored in this struct since it can be large. Instead it
/// is fetched on demand via `Callbacks::get_effective_config` and discarded
/// immediately after use; see `Client::update_effective_config`.
///
/// It is safe to call methods of this struct concurrently.
#[derive(Debug, Default)]
pub(crate) struct ClientSyncedState {
    inner: Mutex<Inner>,
}

impl ClientSyncedState {
    pub(crate) fn agent_description(&self) -> Result<Option<AgentDescription>, SyncedStateError> {
        Ok(self.inner.lock()?.agent_description.clone())
    }

    pub(crate) fn set_agent_description(
        &self,
        description: AgentDescription,
    ) -> Result<(), SyncedStateError> {
        if description.identifying_attributes.is_empty()
            && description.non_identifying_attributes.is_empty()
        {
            return Err(SyncedStateError::NoAttributes);
        }
        self.inner.lock()?.agent_description = Some(description);
        Ok(())
    }

    /// Returns whether `description` matches the last value set via
    /// `set_agent_description`, avoiding a redundant resend.
    pub(crate) fn agent_description_unchanged(
        &self,
        description: &AgentDescription,
    ) -> Result<bool, SyncedStateError> {
        Ok(self.inner.lock()?.agent_description.as_ref() == Some(description))
    }

    pub(crate) fn health(&self) -> Result<Option<ComponentHealth>, SyncedStateError> {
        Ok(self.inner.lock()?.health.clone())
    }

    pub(crate) fn set_health(&self, health: ComponentHealth) -> Result<(), SyncedStateError> {
        self.inner.lock()?.health = Some(health);
        Ok(())
    }

    pub(crate) fn remote_config_status(
        &self,
    ) -> Result<Option<RemoteConfigStatus>, SyncedStateError> {
        Ok(self.inner.lock()?.remote_config_status.clone())
    }

    pub(crate) fn set_remote_config_status(
        &self,
        status: RemoteConfigStatus,
    ) -> Result<(), SyncedStateError> {
        self.inner.lock()?.remote_config_status = Some(status);
        Ok(())
    }

    pub(crate) fn remote_config_status_unchanged(
        &self,
        status: &RemoteConfigStatus,
    ) -> Result<bool, SyncedStateError> {
        Ok(self.inner.lock()?.remote_config_status.as_ref() == Some(status))
    }

    pub(crate) fn package_statuses(&self) -> Result<Option<PackageStatuses>, SyncedStateError> {
        Ok(self.inner.lock()?.package_statuses.clone())
    }

    pub(crate) fn set_package_statuses(
        &self,
        statuses: PackageStatuses,
    ) -> Result<(), SyncedStateError> {
        self.inner.lock()?.package_statuses = Some(statuses);
        Ok(())
    }

    pub(crate) fn available_components(
        &self,
    ) -> Result<Option<AvailableComponents>, SyncedStateError> {
        Ok(self.inner.lock()?.available_components.clone())
    }

    pub(crate) fn set_available_components(
        &self,
        components: AvailableComponents,
    ) -> Result<(), SyncedStateError> {
        self.inner.lock()?.available_components = Some(components);
        Ok(())
    }

    pub(crate) fn custom_capabilities(&self) -> Result<Vec<String>, SyncedStateError> {
        Ok(self.inner.lock()?.custom_capabilities.clone())
    }

    pub(crate) fn set_custom_capabilities(
        &self,
        capabilities: CustomCapabilities,
    ) -> Result<(), SyncedStateError> {
        self.inner.lock()?.custom_capabilities = capabilities.capabilities;
        Ok(())
    }

    /// Linear lookup; the number of custom capabilities an Agent supports is
    /// expected to be small.
    pub(crate) fn has_custom_capability(&self, capability: &str) -> Result<bool, SyncedStateError> {
        Ok(self
            .inner
            .lock()?
            .custom_capabilities
            .iter()
            .any(|c| c == capability))
    }

    pub(crate) fn capabilities(&self) -> Result<u64, SyncedStateError> {
        Ok(self.inner.lock()?.capabilities)
    }

    /// Stores `capabilities`, always unioning in `ReportsStatus` since every
    /// OpAMP Agent is required to report status.
    pub(crate) fn set_capabilities(&self, capabilities: u64) -> Result<(), SyncedStateError> {
        use crate::opamp::proto::AgentCapabilities;
        self.inner.lock()?.capabilities = capabilities | AgentCapabilities::ReportsStatus as u64;
        Ok(())
    }

    pub(crate) fn flags(&self) -> Result<u64, SyncedStateError> {
        Ok(self.inner.lock()?.flags)
    }

    pub(crate) fn set_flags(&self, flags: u64) -> Result<(), SyncedStateError> {
        self.inner.lock()?.flags = flags;
        Ok(())
    }
}
