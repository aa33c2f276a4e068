//! What the worker needs from its host
//!
//! In the browser these wrap the service worker global scope, natively they're
//! whatever the embedder provides

use shared::api::payloads::NotificationRecord;
use url::Url;

use crate::{
    cache::CacheStore,
    error::{NetworkError, WorkerError},
    request::{Request, Response},
};

#[allow(async_fn_in_trait)]
pub trait Network {
    /// Any status counts as a response. Only a missing response is an error
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// A window the worker can see
#[derive(Debug, Clone, PartialEq)]
pub struct ClientWindow {
    pub id: String,
    pub url: Url,
}

#[allow(async_fn_in_trait)]
pub trait Clients {
    /// Takes control of every open page in scope
    async fn claim(&self) -> Result<(), WorkerError>;

    /// All same origin windows, including ones this worker doesn't control yet
    async fn windows(&self) -> Result<Vec<ClientWindow>, WorkerError>;

    async fn focus(&self, window: &ClientWindow) -> Result<(), WorkerError>;

    async fn open_window(&self, url: &Url) -> Result<(), WorkerError>;
}

#[allow(async_fn_in_trait)]
pub trait NotificationSurface {
    /// Replaces any notification already showing with the same tag
    async fn show(&self, record: &NotificationRecord) -> Result<(), WorkerError>;

    async fn close(&self, tag: &str) -> Result<(), WorkerError>;
}

/// Everything a [`crate::Worker`] talks to
pub trait Environment {
    type Store: CacheStore;
    type Network: Network;
    type Clients: Clients;
    type Notifications: NotificationSurface;

    fn store(&self) -> &Self::Store;
    fn network(&self) -> &Self::Network;
    fn clients(&self) -> &Self::Clients;
    fn notifications(&self) -> &Self::Notifications;
}
