//! Cache generation lifecycle
//!
//! A generation is the partition of the cache store belonging to one worker
//! deployment. It's populated on install, becomes the serving generation on
//! activate and is discarded once a newer generation activates

use std::{
    cell::Cell,
    fmt::{self, Display},
};

use futures::future::try_join_all;
use shared::ServiceWorkerPackage;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::{
    cache::{CacheEntry, CachePartition, CacheStore},
    environment::{Clients, Network},
    error::WorkerError,
    request::{Request, RequestKey},
    worker::EventKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(String);

impl GenerationId {
    /// `{prefix}-v{version}-{digest}`, so any change to what gets precached
    /// gives a new generation
    pub fn for_package(prefix: &str, package: &ServiceWorkerPackage) -> Self {
        Self(format!("{prefix}-v{}-{}", package.version, package.digest()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for GenerationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GenerationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
    /// Install failed. A later evaluation may install again
    Redundant,
}

impl Lifecycle {
    /// State a freshly evaluated worker starts in, given the first event the
    /// host delivers to it
    ///
    /// Hosts only activate installed workers and only send functional events
    /// to active ones, so a worker restarted mid-life resumes where it was
    pub fn initial_for(kind: EventKind) -> Self {
        match kind {
            EventKind::Install => Lifecycle::Parsed,
            EventKind::Activate => Lifecycle::Installed,
            EventKind::Fetch | EventKind::Push | EventKind::NotificationClick => Lifecycle::Active,
        }
    }
}

pub struct GenerationManager {
    id: GenerationId,
    package: ServiceWorkerPackage,
    origin: Url,
    offline: RequestKey,
    state: Cell<Lifecycle>,
}

impl GenerationManager {
    pub fn new(
        id: GenerationId,
        package: ServiceWorkerPackage,
        origin: Url,
        state: Lifecycle,
    ) -> Result<Self, WorkerError> {
        let offline = origin.join(&package.offline.path).map_err(|e| WorkerError::Config {
            message: format!("offline document {:?}: {e}", package.offline.path),
        })?;

        Ok(Self {
            id,
            package,
            origin,
            offline: RequestKey::get(&offline),
            state: Cell::new(state),
        })
    }

    pub fn current_id(&self) -> &GenerationId {
        &self.id
    }

    pub fn state(&self) -> Lifecycle {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state() == Lifecycle::Active
    }

    pub fn package(&self) -> &ServiceWorkerPackage {
        &self.package
    }

    /// Key of the document served when a page is neither reachable nor cached
    pub fn offline_key(&self) -> &RequestKey {
        &self.offline
    }

    /// Opens the current generation's partition
    pub async fn partition<S: CacheStore>(&self, store: &S) -> Result<S::Partition, WorkerError> {
        Ok(store.open(&self.id).await?)
    }

    /// Precaches the package into the current generation
    ///
    /// All or nothing: every file is fetched before anything is written and a
    /// failed write leaves the store as it was before. Doesn't activate
    pub async fn install<S: CacheStore, N: Network>(
        &self,
        store: &S,
        network: &N,
    ) -> Result<usize, WorkerError> {
        match self.state() {
            Lifecycle::Parsed | Lifecycle::Redundant => {}
            state => return Err(WorkerError::Lifecycle { action: "install", state }),
        }

        debug!("Installing {}", self.id);
        self.state.set(Lifecycle::Installing);

        match self.precache(store, network).await {
            Ok(count) => {
                self.state.set(Lifecycle::Installed);
                info!("Install successful: {} ({count} files)", self.id);
                Ok(count)
            }
            Err(e) => {
                self.state.set(Lifecycle::Redundant);
                error!("Install of {} failed: {e}", self.id);
                Err(e)
            }
        }
    }

    async fn precache<S: CacheStore, N: Network>(
        &self,
        store: &S,
        network: &N,
    ) -> Result<usize, WorkerError> {
        let precache_err = |path: &str, reason: String| WorkerError::Precache {
            path: path.to_string(),
            reason,
        };

        let mut fetched = Vec::new();
        for f in self.package.precache() {
            let url = self.origin.join(&f.path).map_err(|e| precache_err(&f.path, e.to_string()))?;
            let request = Request::get(url);

            let response = network
                .fetch(&request)
                .await
                .map_err(|e| precache_err(&f.path, e.to_string()))?;

            if !response.is_success() {
                return Err(precache_err(&f.path, format!("status {}", response.status)));
            }
            f.verify(&response.body).map_err(|e| precache_err(&f.path, e.to_string()))?;

            trace!("Fetched {}", f.path);
            fetched.push((request.key(), response));
        }

        let count = fetched.len();
        let existed = store.list_generations().await?.contains(&self.id);
        let partition = store.open(&self.id).await?;

        // Entries the writes replace, restored if a later write fails
        let mut previous = Vec::with_capacity(count);
        for (key, _) in fetched.iter() {
            previous.push(if existed { partition.lookup(key).await? } else { None });
        }

        let mut written = Vec::with_capacity(count);
        for ((key, response), previous) in fetched.into_iter().zip(previous) {
            if let Err(e) = partition.put(key.clone(), response).await {
                if existed {
                    self.restore(&partition, written).await;
                } else if let Err(delete_err) = store.delete(&self.id).await {
                    warn!("Rolling back {} failed: {delete_err}", self.id);
                }
                return Err(e.into());
            }
            written.push((key, previous));
        }

        Ok(count)
    }

    /// Undoes the writes of a failed install into a generation that was
    /// already there, which happens when a redeploy leaves the package as is
    async fn restore<P: CachePartition>(&self, partition: &P, written: Vec<(RequestKey, Option<CacheEntry>)>) {
        for (key, previous) in written {
            let result = match previous {
                Some(entry) => partition.put(key.clone(), entry.response).await,
                None => partition.remove(&key).await.map(|_| ()),
            };
            if let Err(e) = result {
                warn!("Rolling back {key} in {} failed: {e}", self.id);
            }
        }
    }

    /// Deletes every other generation then claims the open pages
    ///
    /// Only reports [`Lifecycle::Active`] once both steps are done. If claiming
    /// fails the generation stays installed so activation can run again
    pub async fn activate<S: CacheStore, C: Clients>(
        &self,
        store: &S,
        clients: &C,
    ) -> Result<Vec<GenerationId>, WorkerError> {
        match self.state() {
            Lifecycle::Installed => {}
            state => return Err(WorkerError::Lifecycle { action: "activate", state }),
        }

        debug!("Activating {}", self.id);
        self.state.set(Lifecycle::Activating);

        let result = async {
            let stale: Vec<_> = store
                .list_generations()
                .await?
                .into_iter()
                .filter(|g| g != &self.id)
                .collect();

            try_join_all(stale.iter().map(|g| store.delete(g))).await?;
            for g in stale.iter() {
                debug!("Deleted stale generation {g}");
            }

            clients.claim().await?;
            Ok::<_, WorkerError>(stale)
        }
        .await;

        match result {
            Ok(stale) => {
                self.state.set(Lifecycle::Active);
                info!("Activated {} ({} stale generations removed)", self.id, stale.len());
                Ok(stale)
            }
            Err(e) => {
                self.state.set(Lifecycle::Installed);
                error!("Activation of {} failed: {e}", self.id);
                Err(e)
            }
        }
    }
}
