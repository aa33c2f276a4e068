//! In-process fakes for the worker's environment

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use http::StatusCode;
use url::Url;

use crate::{
    cache::{CacheEntry, CachePartition, CacheStore, MemoryCacheStore, MemoryPartition},
    environment::{ClientWindow, Clients, Environment, Network},
    error::{CacheError, NetworkError, WorkerError},
    generation::GenerationId,
    notification::NotificationTray,
    request::{Request, RequestKey, Response},
};

pub fn origin() -> Url {
    Url::parse("https://finai.test/").unwrap()
}

/// Serves canned responses by path, anything else fails as if offline
#[derive(Debug, Clone, Default)]
pub struct FakeNetwork {
    responses: HashMap<String, Response>,
    calls: Cell<usize>,
}

impl FakeNetwork {
    pub fn offline() -> Self {
        Self::default()
    }

    /// Each path answers 200 with the path as the body
    pub fn serving(paths: &[&str]) -> Self {
        paths
            .iter()
            .fold(Self::default(), |network, path| network.with_body(path, *path))
    }

    pub fn with_body(mut self, path: &str, body: &str) -> Self {
        self.responses.insert(path.to_string(), Response::ok(body));
        self
    }

    pub fn with_status(mut self, path: &str, status: StatusCode) -> Self {
        self.responses.insert(path.to_string(), Response::new(status, status.as_str()));
        self
    }

    /// `path` answers with `to`'s page, as if a redirect had been followed
    pub fn with_redirect(mut self, path: &str, to: &str) -> Self {
        let response = Response::ok(to).redirected(origin().join(to).unwrap());
        self.responses.insert(path.to_string(), response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.set(self.calls.get() + 1);
        self.responses
            .get(request.url.path())
            .cloned()
            .ok_or_else(|| NetworkError::new(request.key(), "offline"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeClients {
    windows: RefCell<Vec<ClientWindow>>,
    claims: Cell<usize>,
    fail_claim: bool,
    focused: RefCell<Vec<ClientWindow>>,
    opened: RefCell<Vec<Url>>,
}

impl FakeClients {
    pub fn with_window(self, url: &str) -> Self {
        let id = self.windows.borrow().len().to_string();
        self.windows.borrow_mut().push(ClientWindow {
            id,
            url: Url::parse(url).unwrap(),
        });
        self
    }

    pub fn failing_claim(mut self) -> Self {
        self.fail_claim = true;
        self
    }

    pub fn claims(&self) -> usize {
        self.claims.get()
    }

    pub fn focused(&self) -> Vec<ClientWindow> {
        self.focused.borrow().clone()
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.borrow().clone()
    }
}

impl Clients for FakeClients {
    async fn claim(&self) -> Result<(), WorkerError> {
        if self.fail_claim {
            return Err(WorkerError::clients("claim", "not allowed"));
        }
        self.claims.set(self.claims.get() + 1);
        Ok(())
    }

    async fn windows(&self) -> Result<Vec<ClientWindow>, WorkerError> {
        Ok(self.windows.borrow().clone())
    }

    async fn focus(&self, window: &ClientWindow) -> Result<(), WorkerError> {
        self.focused.borrow_mut().push(window.clone());
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), WorkerError> {
        self.opened.borrow_mut().push(url.clone());
        Ok(())
    }
}

/// Memory store whose partitions refuse to store one path
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: MemoryCacheStore,
    fail_put: String,
}

impl FlakyStore {
    pub fn failing_put_on(path: &str) -> Self {
        Self::sharing(MemoryCacheStore::new(), path)
    }

    /// Fails puts on `path` while reading and writing `store`'s entries
    pub fn sharing(store: MemoryCacheStore, path: &str) -> Self {
        Self {
            inner: store,
            fail_put: path.to_string(),
        }
    }
}

impl CacheStore for FlakyStore {
    type Partition = FlakyPartition;

    async fn open(&self, generation: &GenerationId) -> Result<FlakyPartition, CacheError> {
        Ok(FlakyPartition {
            inner: self.inner.open(generation).await?,
            fail_put: Some(self.fail_put.clone()),
            fail_lookup: false,
        })
    }

    async fn delete(&self, generation: &GenerationId) -> Result<bool, CacheError> {
        self.inner.delete(generation).await
    }

    async fn list_generations(&self) -> Result<Vec<GenerationId>, CacheError> {
        self.inner.list_generations().await
    }
}

#[derive(Debug, Clone)]
pub struct FlakyPartition {
    inner: MemoryPartition,
    fail_put: Option<String>,
    fail_lookup: bool,
}

impl FlakyPartition {
    pub fn failing_lookup() -> Self {
        Self {
            inner: MemoryPartition::detached(GenerationId::from("flaky")),
            fail_put: None,
            fail_lookup: true,
        }
    }
}

impl CachePartition for FlakyPartition {
    fn generation(&self) -> &GenerationId {
        self.inner.generation()
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<CacheEntry>, CacheError> {
        if self.fail_lookup {
            return Err(CacheError::new("lookup", key, "quota exceeded"));
        }
        self.inner.lookup(key).await
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError> {
        if let Some(path) = &self.fail_put {
            if key.url().ends_with(path.as_str()) {
                return Err(CacheError::new("put", key, "quota exceeded"));
            }
        }
        self.inner.put(key, response).await
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        self.inner.remove(key).await
    }
}

#[derive(Debug, Clone)]
pub struct TestEnvironment {
    pub store: MemoryCacheStore,
    pub network: FakeNetwork,
    pub clients: FakeClients,
    pub tray: std::rc::Rc<NotificationTray>,
}

impl TestEnvironment {
    pub fn new(network: FakeNetwork) -> Self {
        Self {
            store: MemoryCacheStore::new(),
            network,
            clients: FakeClients::default(),
            tray: Default::default(),
        }
    }
}

impl Environment for TestEnvironment {
    type Store = MemoryCacheStore;
    type Network = FakeNetwork;
    type Clients = FakeClients;
    type Notifications = NotificationTray;

    fn store(&self) -> &MemoryCacheStore {
        &self.store
    }

    fn network(&self) -> &FakeNetwork {
        &self.network
    }

    fn clients(&self) -> &FakeClients {
        &self.clients
    }

    fn notifications(&self) -> &NotificationTray {
        &self.tray
    }
}
