//! Syncs packages offered by the Server (`PackagesAvailable`) against the
//! Agent's local `PackageStore`, downloading and installing what's missing
//! or outdated and reporting the resulting `PackageStatuses` back.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::io::StreamReader;
use tracing::{debug, error, warn};

use crate::common::nextmessage::NextMessage;
use crate::opamp::proto::{
    AgentToServer, PackageAvailable, PackageStatus, PackageStatusEnum, PackageStatuses,
    PackagesAvailable,
};
use crate::operation::packages::{DynPackageStore, PackageState};

use super::reporter::{CountingReader, DownloadReporter};

/// Guards against two syncs running concurrently, mirroring a process-wide
/// advisory lock: acquired inside the spawned worker so a second `sync`
/// call returns immediately and its `doSync` body waits for the first to
/// finish rather than being dropped.
fn package_sync_mutex() -> Arc<tokio::sync::Mutex<()>> {
    static MUTEX: OnceLock<Arc<tokio::sync::Mutex<()>>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Arc::new(tokio::sync::Mutex::new(())))
        .clone()
}

/// Drives a single package sync against a `PackageStore`.
pub(crate) struct PackageSyncer {
    store: Arc<dyn DynPackageStore>,
    http_client: reqwest::Client,
    next_message: Arc<std::sync::RwLock<NextMessage>>,
    download_reporter_interval: Duration,
}

impl PackageSyncer {
    pub(crate) fn new(
        store: Arc<dyn DynPackageStore>,
        http_client: reqwest::Client,
        next_message: Arc<std::sync::RwLock<NextMessage>>,
        download_reporter_interval: Duration,
    ) -> Self {
        Self {
            store,
            http_client,
            next_message,
            download_reporter_interval,
        }
    }

    /// Starts syncing `available` in the background. Returns immediately;
    /// the result is reported to the Server as a `PackageStatuses` update
    /// on the next send. At most one sync's `doSync` body runs at a time
    /// across every `PackageSyncer`/`Client` in the process: a sync that
    /// arrives while another is in flight still returns promptly, but its
    /// background worker waits for the earlier one to finish before doing
    /// any work.
    pub(crate) async fn sync(&self, available: PackagesAvailable) {
        let mut statuses = match self.store.last_reported_statuses().await {
            Ok(statuses) => statuses.packages,
            Err(e) => {
                warn!("failed to read last reported package statuses: {e}");
                HashMap::new()
            }
        };
        statuses.retain(|name, _| available.packages.contains_key(name));

        let initial = PackageStatuses {
            packages: statuses.clone(),
            server_provided_all_packages_hash: available.all_packages_hash.clone(),
            error_message: String::new(),
        };
        self.next_message
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .update(move |msg: &mut AgentToServer| {
                msg.package_statuses = Some(initial);
            });

        let store = self.store.clone();
        let http_client = self.http_client.clone();
        let next_message = self.next_message.clone();
        let download_reporter_interval = self.download_reporter_interval;

        tokio::spawn(async move {
            let _guard = package_sync_mutex().lock_owned().await;
            do_sync(
                store.as_ref(),
                &http_client,
                &next_message,
                available,
                statuses,
                download_reporter_interval,
            )
            .await;
        });
    }
}

async fn do_sync(
    store: &dyn DynPackageStore,
    http_client: &reqwest::Client,
    next_message: &std::sync::RwLock<NextMessage>,
    available: PackagesAvailable,
    mut statuses: HashMap<String, PackageStatus>,
    download_reporter_interval: Duration,
) {
    match store.all_packages_hash().await {
        Ok(hash) if hash == available.all_packages_hash => {
            debug!("all packages already match the offered hash, nothing to sync");
            return;
        }
        Ok(_) => {}
        Err(e) => error!("failed to read local all_packages_hash: {e}"),
    }

    match store.packages().await {
        Ok(local_names) => {
            for name in local_names {
                if !available.packages.contains_key(&name) {
                    if let Err(e) = store.delete_package(&name).await {
                        error!(package = %name, "failed to delete local package: {e}");
                        continue;
                    }
                    statuses.remove(&name);
                }
            }
        }
        Err(e) => error!("failed to list local packages: {e}"),
    }

    for (name, package) in available.packages {
        let status = sync_package(
            store,
            http_client,
            &name,
            &package,
            download_reporter_interval,
        )
        .await;
        statuses.insert(name, status);
    }

    if let Err(e) = store
        .set_all_packages_hash(available.all_packages_hash.clone())
        .await
    {
        error!("failed to persist all_packages_hash: {e}");
    }

    let package_statuses = PackageStatuses {
        packages: statuses,
        server_provided_all_packages_hash: available.all_packages_hash,
        error_message: String::new(),
    };

    if let Err(e) = store.set_last_reported_statuses(&package_statuses).await {
        error!("failed to persist package statuses: {e}");
    }

    next_message
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .update(move |msg: &mut AgentToServer| {
            msg.package_statuses = Some(package_statuses);
        });
}

async fn sync_package(
    store: &dyn DynPackageStore,
    http_client: &reqwest::Client,
    name: &str,
    available: &PackageAvailable,
    download_reporter_interval: Duration,
) -> PackageStatus {
    let base = PackageStatus {
        name: name.to_string(),
        server_offered_version: available.version.clone(),
        server_offered_hash: available.hash.clone(),
        ..Default::default()
    };

    let local_state = match store.package_state(name).await {
        Ok(state) => state,
        Err(e) => {
            return PackageStatus {
                status: PackageStatusEnum::InstallFailed as i32,
                error_message: format!("failed to read local package state: {e}"),
                ..base
            };
        }
    };

    if local_state.exists && local_state.hash == available.hash {
        debug!(package = name, "package already up to date");
        return PackageStatus {
            agent_has_version: local_state.version,
            agent_has_hash: local_state.hash,
            status: PackageStatusEnum::Installed as i32,
            ..base
        };
    }

    if let Err(e) = install_package(
        store,
        http_client,
        name,
        available,
        &local_state,
        download_reporter_interval,
    )
    .await
    {
        warn!(package = name, "failed to install package: {e}");
        return PackageStatus {
            agent_has_version: local_state.version,
            agent_has_hash: local_state.hash,
            status: PackageStatusEnum::InstallFailed as i32,
            error_message: e,
            ..base
        };
    }

    PackageStatus {
        agent_has_version: available.version.clone(),
        agent_has_hash: available.hash.clone(),
        status: PackageStatusEnum::Installed as i32,
        ..base
    }
}

async fn install_package(
    store: &dyn DynPackageStore,
    http_client: &reqwest::Client,
    name: &str,
    available: &PackageAvailable,
    local_state: &PackageState,
    download_reporter_interval: Duration,
) -> Result<(), String> {
    let package_type = crate::opamp::proto::PackageType::try_from(available.r#type)
        .unwrap_or(crate::opamp::proto::PackageType::TopLevel);

    if !local_state.exists {
        store
            .create_package(name, package_type)
            .await
            .map_err(|e| format!("failed to create package: {e}"))?;
    }

    let file = available
        .file
        .as_ref()
        .ok_or_else(|| "server offered a package with no downloadable file".to_string())?;

    let response = http_client
        .get(&file.download_url)
        .send()
        .await
        .map_err(|e| format!("download request failed: {e}"))?
        .error_for_status()
        .map_err(|e| format!("download returned an error status: {e}"))?;

    let content_len = response.content_length().unwrap_or(0);
    let reporter = DownloadReporter::new(content_len);

    let stream = response
        .bytes_stream()
        .map(|r| r.map_err(std::io::Error::other));
    let body_reader = StreamReader::new(stream);
    let mut counting_reader = CountingReader::new(body_reader, reporter.clone());

    let ticker = reporter.spawn_ticker(name.to_string(), download_reporter_interval);
    let store_result = store
        .update_content(
            name,
            &mut counting_reader,
            &file.content_hash,
            &file.signature,
        )
        .await;
    ticker.stop().await;
    store_result.map_err(|e| format!("failed to store package content: {e}"))?;

    debug!(
        package = name,
        percent = reporter.percent(),
        bytes_per_sec = reporter.bytes_per_sec(),
        "package download complete"
    );

    store
        .set_package_state(
            name,
            PackageState {
                exists: true,
                r#type: package_type,
                hash: available.hash.clone(),
                version: available.version.clone(),
            },
        )
        .await
        .map_err(|e| format!("failed to persist package state: {e}"))
}

use futures_util::StreamExt;

#[cfg(test)]
mod test {
    use super::*;
    use crate::opamp::proto::PackageType;

    #[tokio::test]
    async fn sync_package_skips_download_when_hash_matches() {
        use crate::operation::packages::test::MockPackageStoreMockall;

        let mut store = MockPackageStoreMockall::new();
        store.expect_package_state().returning(|_| {
            Ok(PackageState {
                exists: true,
                r#type: PackageType::TopLevel,
                hash: vec![1, 2, 3],
                version: "1.0.0".to_string(),
            })
        });

        let available = PackageAvailable {
            r#type: PackageType::TopLevel as i32,
            version: "1.0.0".to_string(),
            file: None,
            hash: vec![1, 2, 3],
        };

        let http_client = reqwest::Client::new();
        let status = sync_package(
            &store,
            &http_client,
            "agent",
            &available,
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(status.status, PackageStatusEnum::Installed as i32);
        assert_eq!(status.agent_has_hash, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn do_sync_short_circuits_when_all_packages_hash_matches() {
        use crate::operation::packages::test::MockPackageStoreMockall;

        let mut store = MockPackageStoreMockall::new();
        store
            .expect_all_packages_hash()
            .returning(|| Ok(vec![9, 9, 9]));
        store.expect_packages().never();
        store.expect_package_state().never();

        let available = PackagesAvailable {
            packages: HashMap::new(),
            all_packages_hash: vec![9, 9, 9],
        };
        let next_message = std::sync::RwLock::new(NextMessage::default());
        let http_client = reqwest::Client::new();

        do_sync(
            &store,
            &http_client,
            &next_message,
            available,
            HashMap::new(),
            Duration::from_secs(1),
        )
        .await;
    }

    #[tokio::test]
    async fn do_sync_deletes_local_packages_absent_from_offer() {
        use crate::operation::packages::test::MockPackageStoreMockall;

        let mut store = MockPackageStoreMockall::new();
        store
            .expect_all_packages_hash()
            .returning(|| Ok(vec![1]));
        store
            .expect_packages()
            .returning(|| Ok(vec!["stale".to_string()]));
        store
            .expect_delete_package()
            .withf(|name| name == "stale")
            .returning(|_| Ok(()));
        store
            .expect_set_all_packages_hash()
            .returning(|_| Ok(()));
        store
            .expect_set_last_reported_statuses()
            .returning(|_| Ok(()));

        let available = PackagesAvailable {
            packages: HashMap::new(),
            all_packages_hash: vec![2],
        };
        let mut statuses = HashMap::new();
        statuses.insert("stale".to_string(), PackageStatus::default());

        let next_message = std::sync::RwLock::new(NextMessage::default());
        let http_client = reqwest::Client::new();

        do_sync(
            &store,
            &http_client,
            &next_message,
            available,
            statuses,
            Duration::from_secs(1),
        )
        .await;

        let popped = next_message.write().unwrap().pop();
        let reported = popped.package_statuses.unwrap();
        assert!(!reported.packages.contains_key("stale"));
    }
}
