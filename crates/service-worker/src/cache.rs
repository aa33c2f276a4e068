//! Generation partitioned response store

use chrono::{DateTime, Utc};

use crate::{
    error::CacheError,
    generation::GenerationId,
    request::{RequestKey, Response, ResponseSource},
};

mod memory;
pub use memory::{MemoryCacheStore, MemoryPartition};

/// A stored response and the generation it was written into
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub generation: GenerationId,
    pub response: Response,
    pub stored_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn into_response(self) -> Response {
        Response {
            source: ResponseSource::Cache,
            ..self.response
        }
    }
}

/// Named partitions of stored responses, one per generation
///
/// `open` creates the partition if it doesn't exist yet
#[allow(async_fn_in_trait)]
pub trait CacheStore {
    type Partition: CachePartition;

    async fn open(&self, generation: &GenerationId) -> Result<Self::Partition, CacheError>;

    /// Returns whether there was anything to delete
    async fn delete(&self, generation: &GenerationId) -> Result<bool, CacheError>;

    async fn list_generations(&self) -> Result<Vec<GenerationId>, CacheError>;
}

/// The entries of a single generation
///
/// A put is only visible to lookups once it has completed. Handles are cheap
/// to clone and all refer to the same partition
#[allow(async_fn_in_trait)]
pub trait CachePartition: Clone {
    fn generation(&self) -> &GenerationId;

    async fn lookup(&self, key: &RequestKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Last write wins
    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError>;

    /// Returns whether there was an entry to remove
    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError>;
}
