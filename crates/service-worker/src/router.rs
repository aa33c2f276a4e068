use http::Method;
use tracing::debug;
use url::{Origin, Url};

use crate::request::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    /// Only GETs are intercepted
    Method,
    CrossOrigin,
    /// No generation is serving yet
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Leave the request to the host, as if there were no worker
    Passthrough(PassthroughReason),
    CacheFirst,
    NetworkFirst,
}

impl Route {
    pub fn is_intercepted(&self) -> bool {
        !matches!(self, Route::Passthrough(_))
    }
}

/// Picks a fetch strategy from the request alone
pub struct Router {
    origin: Origin,
    static_prefix: String,
}

impl Router {
    pub fn new<S: Into<String>>(origin: &Url, static_prefix: S) -> Self {
        Self {
            origin: origin.origin(),
            static_prefix: static_prefix.into(),
        }
    }

    pub fn classify(&self, request: &Request) -> Route {
        let route = if request.method != Method::GET {
            Route::Passthrough(PassthroughReason::Method)
        } else if request.url.origin() != self.origin {
            Route::Passthrough(PassthroughReason::CrossOrigin)
        } else if request.url.path().starts_with(&self.static_prefix) {
            Route::CacheFirst
        } else {
            Route::NetworkFirst
        };

        debug!("{} {} -> {route:?}", request.method, request.url);
        route
    }
}
