//! Abstractions for syncing Agent packages offered by the Server.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::opamp::proto::{PackageStatuses, PackageType};

/// The locally known state of a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageState {
    /// Whether the package exists in local storage.
    pub exists: bool,
    /// The package type. Only meaningful when `exists` is `true`.
    pub r#type: PackageType,
    /// The content hash of the package file. Only meaningful when `exists`
    /// is `true`.
    pub hash: Vec<u8>,
    /// The version string last offered by the Server for this package.
    /// Only meaningful when `exists` is `true`.
    pub version: String,
}

impl Default for PackageState {
    fn default() -> Self {
        Self {
            exists: false,
            r#type: PackageType::TopLevel,
            hash: Vec::new(),
            version: String::new(),
        }
    }
}

/// PackageStore is implemented by the Agent to let a package syncer query
/// and update the Agent's local state of packages.
///
/// It is recommended that the local state is stored persistently so that
/// after Agent restarts a full resync is not required.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Associated error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the hash of all packages previously set via
    /// `set_all_packages_hash`.
    async fn all_packages_hash(&self) -> Result<Vec<u8>, Self::Error>;

    /// Remembers `hash`, returned later by `all_packages_hash`. Called
    /// after all package updates complete successfully.
    async fn set_all_packages_hash(&self, hash: Vec<u8>) -> Result<(), Self::Error>;

    /// Returns the names of all packages that exist in local storage.
    async fn packages(&self) -> Result<Vec<String>, Self::Error>;

    /// Returns the state of a local package. `PackageState::exists` is
    /// `false` if the package does not exist locally.
    async fn package_state(&self, package_name: &str) -> Result<PackageState, Self::Error>;

    /// Remembers the state for the specified package, returned later by
    /// `package_state`. Called after `update_content` completes
    /// successfully.
    async fn set_package_state(
        &self,
        package_name: &str,
        state: PackageState,
    ) -> Result<(), Self::Error>;

    /// Creates the package locally. Returns an error if the package already
    /// exists.
    async fn create_package(
        &self,
        package_name: &str,
        package_type: PackageType,
    ) -> Result<(), Self::Error>;

    /// Returns the content hash of the package file that exists locally, or
    /// an empty vector if the package or its file is not found.
    async fn file_content_hash(&self, package_name: &str) -> Result<Vec<u8>, Self::Error>;

    /// Replaces the entire content of the package file with bytes read from
    /// `data` until EOF, then records `content_hash` as the package's new
    /// content hash. `signature` is the offer's optional detached signature,
    /// empty if the Server didn't provide one; the store is responsible for
    /// verifying it. Must abort and leave stored state unmodified if
    /// reading from `data` fails.
    async fn update_content(
        &self,
        package_name: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        content_hash: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;

    /// Deletes the package from local storage.
    async fn delete_package(&self, package_name: &str) -> Result<(), Self::Error>;

    /// Returns the value previously set via `set_last_reported_statuses`.
    async fn last_reported_statuses(&self) -> Result<PackageStatuses, Self::Error>;

    /// Saves `statuses` in local state. Called periodically while syncing
    /// so progress survives an Agent restart.
    async fn set_last_reported_statuses(
        &self,
        statuses: &PackageStatuses,
    ) -> Result<(), Self::Error>;
}

/// Object-safe counterpart of [`PackageStore`], used so
/// [`Callbacks::package_store`](crate::operation::callbacks::Callbacks::package_store)
/// can hand back a store without the `Callbacks` trait itself needing to
/// name the store's associated error type. Errors are boxed instead.
///
/// Any `PackageStore` implementation gets this for free via the blanket
/// impl below; Agents only ever need to implement `PackageStore`.
#[async_trait]
pub trait DynPackageStore: Send + Sync {
    /// See [`PackageStore::all_packages_hash`].
    async fn all_packages_hash(&self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::set_all_packages_hash`].
    async fn set_all_packages_hash(
        &self,
        hash: Vec<u8>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::package_state`].
    async fn package_state(
        &self,
        package_name: &str,
    ) -> Result<PackageState, Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::set_package_state`].
    async fn set_package_state(
        &self,
        package_name: &str,
        state: PackageState,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::create_package`].
    async fn create_package(
        &self,
        package_name: &str,
        package_type: PackageType,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::packages`].
    async fn packages(&self) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::update_content`].
    async fn update_content(
        &self,
        package_name: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        content_hash: &[u8],
        signature: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::delete_package`].
    async fn delete_package(
        &self,
        package_name: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::last_reported_statuses`].
    async fn last_reported_statuses(
        &self,
    ) -> Result<PackageStatuses, Box<dyn std::error::Error + Send + Sync>>;
    /// See [`PackageStore::set_last_reported_statuses`].
    async fn set_last_reported_statuses(
        &self,
        statuses: &PackageStatuses,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

#[async_trait]
impl<T: PackageStore> DynPackageStore for T {
    async fn all_packages_hash(&self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::all_packages_hash(self).await?)
    }

    async fn set_all_packages_hash(
        &self,
        hash: Vec<u8>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::set_all_packages_hash(self, hash).await?)
    }

    async fn package_state(
        &self,
        package_name: &str,
    ) -> Result<PackageState, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::package_state(self, package_name).await?)
    }

    async fn set_package_state(
        &self,
        package_name: &str,
        state: PackageState,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::set_package_state(self, package_name, state).await?)
    }

    async fn create_package(
        &self,
        package_name: &str,
        package_type: PackageType,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::create_package(self, package_name, package_type).await?)
    }

    async fn packages(&self) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::packages(self).await?)
    }

    async fn update_content(
        &self,
        package_name: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        content_hash: &[u8],
        signature: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::update_content(self, package_name, data, content_hash, signature).await?)
    }

    async fn delete_package(
        &self,
        package_name: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::delete_package(self, package_name).await?)
    }

    async fn last_reported_statuses(
        &self,
    ) -> Result<PackageStatuses, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::last_reported_statuses(self).await?)
    }

    async fn set_last_reported_statuses(
        &self,
        statuses: &PackageStatuses,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(PackageStore::set_last_reported_statuses(self, statuses).await?)
    }
}
