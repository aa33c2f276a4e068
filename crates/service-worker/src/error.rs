use shared::api::error::ErrorContext;
use thiserror::Error;

use crate::{generation::Lifecycle, request::RequestKey};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cache::{operation} {target}: {message}")]
pub struct CacheError {
    pub operation: &'static str,
    pub target: String,
    pub message: String,
}

impl CacheError {
    pub fn new<T: ToString, M: ToString>(operation: &'static str, target: T, message: M) -> Self {
        Self {
            operation,
            target: target.to_string(),
            message: message.to_string(),
        }
    }
}

/// The network layer couldn't produce a response at all
///
/// An error status is still a response, this is for the cases where there is
/// nothing to return (offline, dns, aborted)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("fetch {key}: {message}")]
pub struct NetworkError {
    pub key: RequestKey,
    pub message: String,
}

impl NetworkError {
    pub fn new<M: ToString>(key: RequestKey, message: M) -> Self {
        Self { key, message: message.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkerError {
    #[error("config: {message}")]
    Config { message: String },
    #[error("precache {path}: {reason}")]
    Precache { path: String, reason: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{key} isn't cached and the offline document is missing")]
    Offline { key: RequestKey },
    #[error("can't {action} while {state:?}")]
    Lifecycle { action: &'static str, state: Lifecycle },
    #[error("clients::{operation}: {message}")]
    Clients { operation: &'static str, message: String },
    #[error("notification::{operation}: {message}")]
    Notification { operation: &'static str, message: String },
    #[error("{context}: {inner}")]
    WithContext { context: String, inner: Box<Self> },
}

impl WorkerError {
    /// Strips any context wrappers
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    pub fn clients<M: ToString>(operation: &'static str, message: M) -> Self {
        Self::Clients { operation, message: message.to_string() }
    }

    pub fn notification<M: ToString>(operation: &'static str, message: M) -> Self {
        Self::Notification { operation, message: message.to_string() }
    }
}

impl ErrorContext<WorkerError> for WorkerError {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> WorkerError {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> WorkerError {
        WorkerError::WithContext {
            context: context.into(),
            inner: Box::new(self),
        }
    }
}
