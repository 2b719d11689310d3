// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Mutex;

use crate::data::{Frozen, Row};

/// Values that can be wiped for reuse by an [`ObjectPool`].
pub trait Recycle: Default {
    fn reset(&mut self);
}

impl Recycle for Row {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Shared free-list of reusable record instances.
///
/// One emitted record is read by every consumer of an output, so a record may
/// only go back into the pool once nobody else can see it. [`ObjectPool::recycle`]
/// checks that through the frozen handle's reference count and leaves shared
/// records alone.
pub struct ObjectPool<T> {
    free: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Recycle> ObjectPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Pop a recycled instance, or build a fresh one when the pool is empty.
    pub fn take(&self) -> T {
        self.lock().pop().unwrap_or_default()
    }

    /// Return an owned instance to the pool. Dropped when the pool is full.
    pub fn give_back(&self, mut item: T) {
        item.reset();
        let mut free = self.lock();
        if free.len() < self.capacity {
            free.push(item);
        }
    }

    /// Return an emitted record if the caller holds its last reference.
    ///
    /// Returns `false` (and leaves the record untouched) while another reader
    /// still holds it.
    pub fn recycle(&self, item: Frozen<T>) -> bool {
        match Frozen::try_unwrap(item) {
            Ok(owned) => {
                self.give_back(owned);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every pooled instance, returning how many were released.
    pub fn drain(&self) -> usize {
        let mut free = self.lock();
        let released = free.len();
        free.clear();
        free.shrink_to_fit();
        released
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.free.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Recycle> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new(crate::config::consts::DEFAULT_POOL_CAPACITY)
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
