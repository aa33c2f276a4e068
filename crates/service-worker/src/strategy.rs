//! Cache-First and Network-First-with-Fallback
//!
//! Both return the response for the page together with an optional
//! [`CacheWrite`]. The two are independent: the page can be answered
//! before, after or without the write ever happening

use tracing::{debug, trace, warn};

use crate::{
    cache::CachePartition,
    environment::Network,
    error::{CacheError, WorkerError},
    request::{Request, RequestKey, Response},
};

/// A pending store of a network response into the serving generation
///
/// Dropping it writes nothing
#[must_use = "the response is only stored once the write is committed"]
#[derive(Debug)]
pub struct CacheWrite<P> {
    partition: P,
    key: RequestKey,
    response: Response,
}

impl<P: CachePartition> CacheWrite<P> {
    fn new(partition: &P, key: RequestKey, response: &Response) -> Self {
        Self {
            partition: partition.clone(),
            key,
            response: response.clone(),
        }
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub async fn commit(self) -> Result<(), CacheError> {
        trace!("Storing {}", self.key);
        self.partition.put(self.key, self.response).await
    }
}

#[must_use]
#[derive(Debug)]
pub struct Fetched<P> {
    pub response: Response,
    pub write: Option<CacheWrite<P>>,
}

impl<P> Fetched<P> {
    fn cached(response: Response) -> Self {
        Self { response, write: None }
    }
}

impl<P: CachePartition> Fetched<P> {
    /// Only 2xx responses are stored, and only when they belong to the
    /// requested url rather than to wherever a redirect led
    fn from_network(partition: &P, key: RequestKey, response: Response) -> Self {
        let write = if let Some(to) = &response.redirected_to {
            debug!("Not storing {key}: redirected to {to}");
            None
        } else if response.is_success() {
            Some(CacheWrite::new(partition, key, &response))
        } else {
            debug!("Not storing {key}: status {}", response.status);
            None
        };
        Self { response, write }
    }
}

/// A failed read is only worth a warning, the caller carries on as on a miss
async fn lookup<P: CachePartition>(partition: &P, key: &RequestKey) -> Option<Response> {
    match partition.lookup(key).await {
        Ok(Some(entry)) => {
            trace!("Cache hit: {key}");
            Some(entry.into_response())
        }
        Ok(None) => {
            trace!("Cache miss: {key}");
            None
        }
        Err(e) => {
            warn!("Cache lookup failed, treating as a miss: {e}");
            None
        }
    }
}

pub async fn cache_first<P: CachePartition, N: Network>(
    partition: &P,
    network: &N,
    request: &Request,
) -> Result<Fetched<P>, WorkerError> {
    let key = request.key();
    if let Some(response) = lookup(partition, &key).await {
        return Ok(Fetched::cached(response));
    }

    let response = network.fetch(request).await?;
    Ok(Fetched::from_network(partition, key, response))
}

/// Falls back to the cached copy, then to the offline document at
/// `offline_key`
pub async fn network_first<P: CachePartition, N: Network>(
    partition: &P,
    network: &N,
    request: &Request,
    offline_key: &RequestKey,
) -> Result<Fetched<P>, WorkerError> {
    let key = request.key();
    let network_err = match network.fetch(request).await {
        Ok(response) => return Ok(Fetched::from_network(partition, key, response)),
        Err(e) => e,
    };

    debug!("Network failed, falling back to the cache: {network_err}");
    if let Some(response) = lookup(partition, &key).await {
        return Ok(Fetched::cached(response));
    }

    match lookup(partition, offline_key).await {
        Some(response) => {
            debug!("Serving the offline document for {key}");
            Ok(Fetched::cached(response))
        }
        None => Err(WorkerError::Offline { key }),
    }
}
