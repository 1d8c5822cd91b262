//! # Job registry: live jobs keyed by engine entry id.
//!
//! The registry mirrors the engine's entry table from the job side. Every operation that
//! touches both (scheduling, debounce, sweep, removal) holds the registry write lock across
//! the engine call, so the two never disagree for an observer that also takes the lock.
//!
//! ## Rules
//! - Lock order: registry → engine entries → job mutex.
//! - A job may appear under several entry ids (scheduled more than once).
//! - Removal never touches guards or permits; in-flight executions finish on their own.

use std::collections::HashMap;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::EntryId;
use crate::jobs::JobRef;

/// Entry table guarded by [`Registry`].
#[derive(Default)]
pub(crate) struct Table {
    jobs: HashMap<EntryId, JobRef>,
}

impl Table {
    pub(crate) fn insert(&mut self, id: EntryId, job: JobRef) {
        self.jobs.insert(id, job);
    }

    pub(crate) fn remove(&mut self, id: EntryId) -> Option<JobRef> {
        self.jobs.remove(&id)
    }

    pub(crate) fn get(&self, id: EntryId) -> Option<&JobRef> {
        self.jobs.get(&id)
    }

    /// Entry ids whose job carries `name`, sorted.
    pub(crate) fn find_by_name(&self, name: &str) -> Vec<EntryId> {
        let mut ids: Vec<EntryId> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.name() == name)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Sorted `(id, job)` pairs.
    pub(crate) fn list(&self) -> Vec<(EntryId, JobRef)> {
        let mut all: Vec<(EntryId, JobRef)> = self
            .jobs
            .iter()
            .map(|(id, job)| (*id, JobRef::clone(job)))
            .collect();
        all.sort_unstable_by_key(|(id, _)| *id);
        all
    }
}

/// Registry of live jobs.
#[derive(Default)]
pub(crate) struct Registry {
    table: RwLock<Table>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().await
    }

    /// Names of jobs currently registered, sorted and deduplicated.
    pub(crate) async fn names(&self) -> Vec<String> {
        let table = self.table.read().await;
        let mut names: Vec<String> = table.jobs.values().map(|j| j.name().to_string()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
