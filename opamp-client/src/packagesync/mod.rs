//! Downloads and installs packages offered by the Server into an Agent's
//! local [`PackageStore`](crate::operation::packages::PackageStore).

mod reporter;
mod syncer;

pub(crate) use reporter::MIN_REPORT_INTERVAL;
pub(crate) use syncer::PackageSyncer;
