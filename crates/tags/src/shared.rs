use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::TagError;
use crate::index::TagIndex;

/// 多執行緒共用的標籤索引。 / Tag index handle for multi-threaded hosts.
///
/// Every [`SharedTagIndex::update`] runs the mutation and the following save
/// under one lock, so a save never observes a half-applied change.
#[derive(Debug, Clone)]
pub struct SharedTagIndex {
    inner: Arc<Mutex<TagIndex>>,
}

impl SharedTagIndex {
    pub fn new(index: TagIndex) -> Self {
        Self {
            inner: Arc::new(Mutex::new(index)),
        }
    }

    /// Applies `op` and saves the result. A failed save leaves the mutation
    /// applied in memory so the caller can retry with [`SharedTagIndex::save`].
    pub fn update<F, T>(&self, op: F) -> Result<T, TagError>
    where
        F: FnOnce(&mut TagIndex) -> Result<T, TagError>,
    {
        let mut guard = self.lock();
        let output = op(&mut guard)?;
        guard.save()?;
        Ok(output)
    }

    pub fn read<F, T>(&self, op: F) -> T
    where
        F: FnOnce(&TagIndex) -> T,
    {
        op(&self.lock())
    }

    pub fn save(&self) -> Result<(), TagError> {
        self.lock().save()
    }

    fn lock(&self) -> MutexGuard<'_, TagIndex> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
