use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::trace;

use super::{CacheEntry, CachePartition, CacheStore};
use crate::{
    error::CacheError,
    generation::GenerationId,
    request::{RequestKey, Response},
};

type Entries = Arc<DashMap<RequestKey, CacheEntry>>;

/// In-process store for hosts without a browser cache (and for tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    generations: Arc<DashMap<GenerationId, Entries>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a generation, 0 if it doesn't exist
    pub fn len(&self, generation: &GenerationId) -> usize {
        self.generations.get(generation).map_or(0, |entries| entries.len())
    }

    /// Looks a key up in any generation, regardless of which one is active
    pub fn find_anywhere(&self, key: &RequestKey) -> Vec<GenerationId> {
        self.generations
            .iter()
            .filter(|g| g.value().contains_key(key))
            .map(|g| g.key().clone())
            .collect()
    }
}

impl CacheStore for MemoryCacheStore {
    type Partition = MemoryPartition;

    async fn open(&self, generation: &GenerationId) -> Result<MemoryPartition, CacheError> {
        let entries = self.generations.entry(generation.clone()).or_default().value().clone();
        Ok(MemoryPartition { generation: generation.clone(), entries })
    }

    async fn delete(&self, generation: &GenerationId) -> Result<bool, CacheError> {
        Ok(self.generations.remove(generation).is_some())
    }

    async fn list_generations(&self) -> Result<Vec<GenerationId>, CacheError> {
        let mut generations: Vec<_> = self.generations.iter().map(|g| g.key().clone()).collect();
        generations.sort();
        Ok(generations)
    }
}

/// Handle to one generation of a [`MemoryCacheStore`]
///
/// A handle outliving a delete keeps its entries, they just can't be reached
/// through the store any more
#[derive(Debug, Clone)]
pub struct MemoryPartition {
    generation: GenerationId,
    entries: Entries,
}

impl MemoryPartition {
    /// A partition that doesn't belong to any store
    pub fn detached(generation: GenerationId) -> Self {
        Self { generation, entries: Entries::default() }
    }
}

impl CachePartition for MemoryPartition {
    fn generation(&self) -> &GenerationId {
        &self.generation
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), CacheError> {
        trace!("{}: put {key}", self.generation);
        let entry = CacheEntry {
            generation: self.generation.clone(),
            response,
            stored_at: Some(Utc::now()),
        };
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }
}
