//! Bounded, synchronous card lookup for the command path.
//!
//! The terminal protocol is strictly request/response with a reply budget of
//! tens of milliseconds, so the dispatcher must never touch disk or network
//! while a command is in flight. [`CardCache`] fronts the [`CardRepository`]
//! with an in-memory map that is refreshed asynchronously (at startup, after
//! scans, after deletions); the dispatcher only ever sees the synchronous
//! [`CardLookup`] view.

use crate::error::EngineResult;
use ghostcard_core::CardId;
use ghostcard_storage::{CardRecord, CardRepository};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Synchronous card lookup, the only store access allowed during dispatch.
pub trait CardLookup: Send + Sync {
    /// Get a card record by id. Must be bounded and non-blocking.
    fn get(&self, id: CardId) -> Option<CardRecord>;
}

/// In-memory card cache, refreshed asynchronously from the repository.
#[derive(Debug, Clone, Default)]
pub struct CardCache {
    inner: Arc<RwLock<HashMap<CardId, CardRecord>>>,
}

impl CardCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache contents from the repository.
    ///
    /// Returns the number of cached records. Readers observe either the old
    /// or the new map, never a mix.
    pub async fn refresh<R: CardRepository>(&self, repo: &R) -> EngineResult<usize> {
        let cards = repo.find_all().await?;
        let mut map = HashMap::with_capacity(cards.len());
        for card in cards {
            match CardId::new(card.id) {
                Ok(id) => {
                    map.insert(id, card);
                }
                Err(e) => warn!("skipping card with invalid id during refresh: {e}"),
            }
        }
        let count = map.len();
        *self.write() = map;
        debug!(count, "card cache refreshed");
        Ok(count)
    }

    /// Insert or replace a single record (e.g. after a scan completes).
    ///
    /// Records without a store-assigned id are refused.
    pub fn insert(&self, card: CardRecord) {
        match CardId::new(card.id) {
            Ok(id) => {
                self.write().insert(id, card);
            }
            Err(_) => warn!("refusing to cache a card record without a store id"),
        }
    }

    /// Drop a record (e.g. after deletion).
    pub fn remove(&self, id: CardId) {
        self.write().remove(&id);
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CardId, CardRecord>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CardId, CardRecord>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CardLookup for CardCache {
    fn get(&self, id: CardId) -> Option<CardRecord> {
        self.read().get(&id).cloned()
    }
}
