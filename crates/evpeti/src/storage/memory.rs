use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Record, Repository, RepositoryError};

/// Process-local repository backed by an ordered map.
///
/// Clones share the same underlying map, so a test can keep a handle while a service owns
/// another.
pub struct MemoryRepository<E: Record> {
    records: Arc<Mutex<BTreeMap<E::Id, E>>>,
}

impl<E: Record> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<E: Record> Clone for MemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: Record> MemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `records`, keyed by their own ids.
    pub fn seeded(records: impl IntoIterator<Item = E>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id().clone(), record))
            .collect();
        Self {
            records: Arc::new(Mutex::new(map)),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<E::Id, E>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

fn check_revision<E: Record>(stored: &E, next: &E) -> Result<(), RepositoryError> {
    match (stored.revision(), next.revision()) {
        (Some(current), Some(incoming)) if incoming != current + 1 => {
            Err(RepositoryError::StaleRevision)
        }
        _ => Ok(()),
    }
}

impl<E: Record> Repository<E> for MemoryRepository<E> {
    fn insert(&self, record: E) -> Result<E, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: E) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard.get(record.id()).ok_or(RepositoryError::NotFound)?;
        check_revision(stored, &record)?;
        guard.insert(record.id().clone(), record);
        Ok(())
    }

    fn update_batch(&self, records: Vec<E>) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        for record in &records {
            let stored = guard.get(record.id()).ok_or(RepositoryError::NotFound)?;
            check_revision(stored, record)?;
        }
        for record in records {
            guard.insert(record.id().clone(), record);
        }
        Ok(())
    }

    fn fetch(&self, id: &E::Id) -> Result<Option<E>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn query(&self, filter: &E::Filter) -> Result<Vec<E>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|record| record.matches(filter))
            .cloned()
            .collect())
    }

    fn remove(&self, id: &E::Id) -> Result<E, RepositoryError> {
        let mut guard = self.lock()?;
        guard.remove(id).ok_or(RepositoryError::NotFound)
    }
}
