//! Owned list cache for one resource collection.
//!
//! Holds the last fetched entities plus a load status. Mutation results are
//! folded in locally (append on create, replace-by-id on update, remove-by-id
//! on delete); anything the store cannot fold marks it stale so the next
//! `ensure_fresh` refetches.

use shared::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ResourceStore<R: Resource> {
    entries: Vec<R>,
    status: QueryStatus,
    stale: bool,
}

impl<R: Resource> Default for ResourceStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ResourceStore<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            status: QueryStatus::Idle,
            stale: false,
        }
    }

    pub fn entries(&self) -> &[R] {
        &self.entries
    }

    pub fn status(&self) -> &QueryStatus {
        &self.status
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn entry(&self, index: usize) -> Option<&R> {
        self.entries.get(index)
    }

    pub fn find(&self, id: R::Id) -> Option<&R> {
        self.entries.iter().find(|entry| entry.id() == Some(id))
    }

    pub fn needs_fetch(&self) -> bool {
        match self.status {
            QueryStatus::Loading => false,
            QueryStatus::Idle | QueryStatus::Failed(_) => true,
            QueryStatus::Ready => self.stale,
        }
    }

    pub fn begin_loading(&mut self) {
        self.status = QueryStatus::Loading;
    }

    pub fn set_loaded(&mut self, entries: Vec<R>) {
        self.entries = entries;
        self.status = QueryStatus::Ready;
        self.stale = false;
    }

    /// Keeps previously loaded entries so the view can still show them.
    pub fn set_failed(&mut self, message: impl Into<String>) {
        self.status = QueryStatus::Failed(message.into());
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn apply_created(&mut self, created: R) {
        self.entries.push(created);
    }

    /// Returns false when no entry carries the updated entity's id; the store
    /// is then marked stale.
    pub fn apply_updated(&mut self, updated: R) -> bool {
        let Some(id) = updated.id() else {
            self.stale = true;
            return false;
        };
        match self.entries.iter_mut().find(|entry| entry.id() == Some(id)) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => {
                self.stale = true;
                false
            }
        }
    }

    pub fn apply_removed(&mut self, id: R::Id) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id() != Some(id));
        self.entries.len() != before
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
