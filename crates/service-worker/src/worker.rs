use shared::api::{error::ResultContext, payloads::NotificationRecord};
use tracing::{debug, trace};
use url::Url;

use crate::{
    cache::CacheStore,
    config::WorkerConfig,
    environment::Environment,
    error::WorkerError,
    generation::{GenerationId, GenerationManager, Lifecycle},
    notification::{ClickAction, NotificationAgent},
    request::Request,
    router::{PassthroughReason, Route, Router},
    strategy::{cache_first, network_first, Fetched},
};

/// Partition type of an environment's cache store
pub type PartitionOf<E> = <<E as Environment>::Store as CacheStore>::Partition;

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Raw push data, if the push carried any
    Push(Option<Vec<u8>>),
    NotificationClick(NotificationRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Push(_) => EventKind::Push,
            WorkerEvent::NotificationClick(_) => EventKind::NotificationClick,
        }
    }
}

#[derive(Debug)]
pub enum Outcome<P> {
    Installed { entries: usize },
    Activated { removed: Vec<GenerationId> },
    /// Answer the page with `response`, and commit `write` when convenient
    Respond(Fetched<P>),
    Passthrough(PassthroughReason),
    Notified(NotificationRecord),
    Clicked(ClickAction),
}

pub struct Worker<E: Environment> {
    env: E,
    generations: GenerationManager,
    router: Router,
    notifications: NotificationAgent,
}

impl<E: Environment> Worker<E> {
    /// A freshly installed worker
    pub fn new(config: WorkerConfig, origin: Url, env: E) -> Result<Self, WorkerError> {
        Self::with_lifecycle(config, origin, env, Lifecycle::Parsed)
    }

    /// A worker resuming in `lifecycle`, see [`Lifecycle::initial_for`]
    pub fn with_lifecycle(
        config: WorkerConfig,
        origin: Url,
        env: E,
        lifecycle: Lifecycle,
    ) -> Result<Self, WorkerError> {
        let generations =
            GenerationManager::new(config.generation_id(), config.package.clone(), origin.clone(), lifecycle)?;
        let router = Router::new(&origin, config.static_prefix.clone());
        let notifications = NotificationAgent::new(config.notification, origin);

        Ok(Self {
            env,
            generations,
            router,
            notifications,
        })
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    pub fn generations(&self) -> &GenerationManager {
        &self.generations
    }

    /// Whether and how a request will be handled, without touching the network
    /// or the cache
    pub fn route(&self, request: &Request) -> Route {
        match self.router.classify(request) {
            Route::Passthrough(reason) => Route::Passthrough(reason),
            _ if !self.generations.is_active() => Route::Passthrough(PassthroughReason::Inactive),
            route => route,
        }
    }

    pub async fn dispatch(&self, event: WorkerEvent) -> Result<Outcome<PartitionOf<E>>, WorkerError> {
        trace!("Dispatching {:?}", event.kind());

        match event {
            WorkerEvent::Install => {
                let entries = self
                    .generations
                    .install(self.env.store(), self.env.network())
                    .await?;
                Ok(Outcome::Installed { entries })
            }
            WorkerEvent::Activate => {
                let removed = self
                    .generations
                    .activate(self.env.store(), self.env.clients())
                    .await?;
                Ok(Outcome::Activated { removed })
            }
            WorkerEvent::Fetch(request) => self.fetch(&request).await,
            WorkerEvent::Push(data) => {
                let record = self
                    .notifications
                    .on_push(self.env.notifications(), data.as_deref())
                    .await?;
                Ok(Outcome::Notified(record))
            }
            WorkerEvent::NotificationClick(record) => {
                let action = self
                    .notifications
                    .on_notification_click(self.env.notifications(), self.env.clients(), &record)
                    .await?;
                Ok(Outcome::Clicked(action))
            }
        }
    }

    async fn fetch(&self, request: &Request) -> Result<Outcome<PartitionOf<E>>, WorkerError> {
        let route = self.route(request);
        if let Route::Passthrough(reason) = route {
            debug!("Passing through {} {}: {reason:?}", request.method, request.url);
            return Ok(Outcome::Passthrough(reason));
        }

        let partition = self
            .generations
            .partition(self.env.store())
            .await
            .with_context(|| format!("Opening {}", self.generations.current_id()))?;
        let network = self.env.network();

        let fetched = match route {
            Route::CacheFirst => cache_first(&partition, network, request).await?,
            _ => network_first(&partition, network, request, self.generations.offline_key()).await?,
        };
        Ok(Outcome::Respond(fetched))
    }
}
