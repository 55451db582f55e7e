//! Provides an abstraction over the OpAMP AgentCapabilities protobuffer definition.

use crate::opamp::proto::AgentCapabilities;

/// A set of capabilities represented as bit flags.
///
/// Backed by a `u64` to match the width of the `AgentToServer.capabilities`
/// wire field; `AgentCapabilities` enum discriminants only span the lower 16
/// bits today but new capability bits may be added beyond `i32`'s range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(u64);

impl Capabilities {
    /// Creates a new `Capabilities` instance from a vector of `AgentCapabilities`.
    ///
    /// # Example
    ///
    /// ```
    /// use opamp_client::operation::capabilities::Capabilities;
    /// use opamp_client::opamp::proto::AgentCapabilities;
    ///
    /// let caps = Capabilities::new(vec![AgentCapabilities::AcceptsRestartCommand]);
    /// ```
    pub fn new(caps: Vec<AgentCapabilities>) -> Self {
        Self(caps.into_iter().fold(0u64, |c1, c2| c1 | c2 as u64))
    }

    /// Checks if the `Capabilities` instance has a specific capability.
    ///
    /// # Example
    ///
    /// ```
    /// use opamp_client::operation::capabilities::Capabilities;
    /// use opamp_client::opamp::proto::AgentCapabilities;
    ///
    /// let caps = Capabilities::new(vec![AgentCapabilities::AcceptsRestartCommand]);
    /// assert!(caps.has_capability(AgentCapabilities::AcceptsRestartCommand));
    /// assert!(!caps.has_capability(AgentCapabilities::AcceptsPackages));
    /// ```
    pub fn has_capability(self, capability: AgentCapabilities) -> bool {
        self.0 & capability as u64 != 0
    }

    /// Returns a copy of this set of capabilities with `ReportsStatus` added.
    /// `ReportsStatus` MUST always be set; the OpAMP protocol requires every
    /// Agent to report status.
    pub fn with_reports_status(self) -> Self {
        Self(self.0 | AgentCapabilities::ReportsStatus as u64)
    }
}

/// A macro for creating a `Capabilities` instance with multiple capabilities.
///
/// # Example
///
/// ```
/// use opamp_client::{capabilities, operation::capabilities::{Capabilities}};
/// use opamp_client::opamp::proto::AgentCapabilities;
///
/// let caps = capabilities!(
///     AgentCapabilities::AcceptsRestartCommand,
///     AgentCapabilities::AcceptsPackages,
///     AgentCapabilities::AcceptsRemoteConfig
/// );
/// ```
#[macro_export]
macro_rules! capabilities {
    ($($cap:expr),*) => {{
        use $crate::operation::capabilities::Capabilities;
        let caps: Vec<AgentCapabilities> = vec![AgentCapabilities::Unspecified $(, $cap)*];
        Capabilities::new(caps)
    }};
}

impl From<Capabilities> for u64 {
    fn from(value: Capabilities) -> Self {
        value.0
    }
}
