// src/utils/locks.rs

use std::{hash::Hash, sync::Arc};

use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keys currently being worked on. Claims are exclusive and never wait:
/// a second claim on a held key fails immediately.
#[derive(Debug, Default)]
pub struct InFlight {
    keys: DashSet<String>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and marks `key`. The mark is removed when the claim drops.
    pub fn try_claim(&self, key: &str) -> Option<Claim<'_>> {
        if !self.keys.insert(key.to_string()) {
            return None;
        }
        Some(Claim {
            owner: self,
            key: key.to_string(),
        })
    }
}

pub struct Claim<'a> {
    owner: &'a InFlight,
    key: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.owner.keys.remove(&self.key);
    }
}

/// One async mutex per key, created on demand and dropped once unused.
pub struct KeyedLocks<K: Eq + Hash> {
    slots: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `key` is free and holds it until the guard drops.
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyedGuard {
            owner: self,
            key,
            guard: Some(guard),
        }
    }
}

pub struct KeyedGuard<'a, K: Eq + Hash> {
    owner: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the slot: nobody holds or awaits it.
        self.owner
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
