use chrono::{DateTime, Utc};
use js_sys::Array;
use shared::api::error::{FrontendError, Nothing};
use tracing::trace;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, CacheStorage};

use super::convert::{headers_to_js, response_from_js, response_to_js};
use crate::{
    cache::{CacheEntry, CachePartition, CacheStore},
    error::CacheError,
    generation::GenerationId,
    request::{RequestKey, Response, ResponseSource},
};

/// Holds the time an entry was stored, browser caches don't keep one
const CACHED_AT_HEADER: &str = "sw-cached-at";

fn cache_err<T: ToString>(operation: &'static str, target: T) -> impl FnOnce(JsValue) -> CacheError {
    move |e| CacheError::new(operation, target, FrontendError::<Nothing>::from(e))
}

/// [`CacheStore`] over the browser's `CacheStorage`, one named cache per
/// generation
#[derive(Debug, Clone)]
pub struct WebCacheStore {
    caches: CacheStorage,
}

impl WebCacheStore {
    pub fn new(caches: CacheStorage) -> Self {
        Self { caches }
    }
}

impl CacheStore for WebCacheStore {
    type Partition = WebCachePartition;

    async fn open(&self, generation: &GenerationId) -> Result<WebCachePartition, CacheError> {
        let cache: Cache = JsFuture::from(self.caches.open(generation.as_str()))
            .await
            .map_err(cache_err("open", generation))?
            .unchecked_into();

        Ok(WebCachePartition {
            generation: generation.clone(),
            cache,
        })
    }

    async fn delete(&self, generation: &GenerationId) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.caches.delete(generation.as_str()))
            .await
            .map_err(cache_err("delete", generation))?;
        Ok(deleted.as_bool().unwrap_or_default())
    }

    async fn list_generations(&self) -> Result<Vec<GenerationId>, CacheError> {
        let keys: Array = JsFuture::from(self.caches.keys())
            .await
            .map_err(cache_err("keys", "caches"))?
            .unchecked_into();

        let mut generations: Vec<_> = keys
            .iter()
            .filter_map(|k| k.as_string())
            .map(GenerationId::from)
            .collect();
        generations.sort();
        Ok(generations)
    }
}

#[derive(Debug, Clone)]
pub struct WebCachePartition {
    generation: GenerationId,
    cache: Cache,
}

impl CachePartition for WebCachePartition {
    fn generation(&self) -> &GenerationId {
        &self.generation
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<CacheEntry>, CacheError> {
        let cached = JsFuture::from(self.cache.match_with_str(key.url()))
            .await
            .map_err(cache_err("match", key))?;

        let Ok(cached) = cached.dyn_into::<web_sys::Response>() else {
            return Ok(None);
        };

        let mut response = response_from_js(cached, ResponseSource::Cache)
            .await
            .map_err(cache_err("match", key))?;

        let stored_at = response
            .headers
            .remove(CACHED_AT_HEADER)
            .and_then(|v| v.to_str().ok().and_then(|v| DateTime::parse_from_rfc3339(v).ok()))
            .map(|t| t.with_timezone(&Utc));

        Ok(Some(CacheEntry {
            generation: self.generation.clone(),
            response,
            stored_at,
        }))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError> {
        trace!("{}: put {key}", self.generation);

        let js_response = headers_to_js(&response.headers)
            .and_then(|headers| {
                headers.set(CACHED_AT_HEADER, &Utc::now().to_rfc3339())?;
                response_to_js(&response, headers)
            })
            .map_err(cache_err("put", &key))?;

        JsFuture::from(self.cache.put_with_str(key.url(), &js_response))
            .await
            .map_err(cache_err("put", &key))?;
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        let removed = JsFuture::from(self.cache.delete_with_str(key.url()))
            .await
            .map_err(cache_err("delete", key))?;
        Ok(removed.as_bool().unwrap_or_default())
    }
}
