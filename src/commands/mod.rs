pub mod config;
pub mod status;
pub mod sync;
pub mod watch;

use anyhow::Result;
use calsync_core::config::SyncConfig;
use calsync_core::event::Side;
use calsync_core::reconcile::Reconciler;
use calsync_core::remote::RemoteSource;
use calsync_core::store::FileStore;

pub type SyncReconciler = Reconciler<RemoteSource, RemoteSource, FileStore>;

/// Wire both configured sources and the store into a reconciler.
pub fn reconciler(config: &SyncConfig) -> Result<SyncReconciler> {
    let tz = config.tz()?;
    let tasks = RemoteSource::new(Side::Tasks, config.remote(Side::Tasks)?.clone(), tz);
    let schedule = RemoteSource::new(Side::Schedule, config.remote(Side::Schedule)?.clone(), tz);
    let store = FileStore::new(config.store_path());

    Ok(Reconciler::new(tasks, schedule, store)?.with_deadline(config.pass_timeout()?))
}
