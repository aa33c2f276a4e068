//! Offline cache and push notification worker
//!
//! [`Worker`] is platform independent. The host provides storage, network,
//! window clients and a notification surface through [`Environment`]; in the
//! browser that's the `web` module

pub mod cache;
pub mod config;
pub mod environment;
pub mod error;
pub mod generation;
pub mod notification;
pub mod request;
pub mod router;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use cache::{CacheEntry, CachePartition, CacheStore, MemoryCacheStore};
pub use config::{NotificationConfig, WorkerConfig};
pub use environment::{ClientWindow, Clients, Environment, Network, NotificationSurface};
pub use error::{CacheError, NetworkError, WorkerError};
pub use generation::{GenerationId, GenerationManager, Lifecycle};
pub use notification::{ClickAction, NotificationAgent, NotificationTray};
pub use request::{Request, RequestKey, Response, ResponseSource};
pub use router::{PassthroughReason, Route, Router};
pub use strategy::{CacheWrite, Fetched};
pub use worker::{EventKind, Outcome, Worker, WorkerEvent};
