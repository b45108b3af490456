//! Storage abstraction shared by every marketplace component.
//!
//! Each persisted entity implements [`Record`] and is reached through the single generic
//! [`Repository`] trait, so services can be exercised against [`MemoryRepository`] in tests and
//! against a relational adapter in production without one bespoke interface per entity.

mod memory;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use memory::MemoryRepository;

/// Entity that can be stored behind a [`Repository`].
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Clone + Ord + fmt::Debug + Send + Sync;
    /// Typed query predicate; adapters translate it into their native filter language.
    type Filter: fmt::Debug + Send + Sync;

    fn id(&self) -> &Self::Id;

    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Row token checked on update. Records without one are last-write-wins.
    fn revision(&self) -> Option<u64> {
        None
    }
}

/// Create/read/update/delete plus filtered queries over one entity type.
pub trait Repository<E: Record>: Send + Sync {
    fn insert(&self, record: E) -> Result<E, RepositoryError>;
    fn update(&self, record: E) -> Result<(), RepositoryError>;
    /// Apply several updates as one logical batch: either all are stored or none are.
    fn update_batch(&self, records: Vec<E>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &E::Id) -> Result<Option<E>, RepositoryError>;
    fn query(&self, filter: &E::Filter) -> Result<Vec<E>, RepositoryError>;
    fn remove(&self, id: &E::Id) -> Result<E, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently")]
    StaleRevision,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

const MAX_SEQUENCE_ATTEMPTS: usize = 64;

/// Monotonic id source for records whose identity is assigned on creation.
#[derive(Debug)]
pub struct Sequence(AtomicU64);

impl Sequence {
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert a record built from the next sequence value, skipping ids already taken by records
/// that were stored with explicit identities.
pub fn insert_sequenced<E, R>(
    repository: &R,
    sequence: &Sequence,
    mut build: impl FnMut(u64) -> E,
) -> Result<E, RepositoryError>
where
    E: Record,
    R: Repository<E> + ?Sized,
{
    for _ in 0..MAX_SEQUENCE_ATTEMPTS {
        match repository.insert(build(sequence.next())) {
            Err(RepositoryError::Conflict) => continue,
            other => return other,
        }
    }
    Err(RepositoryError::Conflict)
}
