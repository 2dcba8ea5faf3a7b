use tracing::debug;
use uuid::Uuid;

use crate::datastore::BlobStore;
use crate::store::TaskStore;
use crate::task::Task;

/// Gate in front of `TaskStore::remove`. Holds at most one pending target;
/// a new request replaces the old one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteFlow {
    #[default]
    Idle,
    PendingDelete(Uuid),
}

impl DeleteFlow {
    pub fn pending(&self) -> Option<Uuid> {
        match self {
            DeleteFlow::Idle => None,
            DeleteFlow::PendingDelete(id) => Some(*id),
        }
    }

    pub fn request(&mut self, id: Uuid) {
        if let Some(previous) = self.pending() {
            debug!(%previous, %id, "replacing pending delete");
        }
        *self = DeleteFlow::PendingDelete(id);
    }

    /// Removes the pending task, if any, and returns to `Idle`.
    pub fn confirm<B: BlobStore>(&mut self, store: &mut TaskStore<B>) -> Option<Task> {
        let id = std::mem::take(self).pending()?;
        debug!(%id, "delete confirmed");
        store.remove(id)
    }

    pub fn cancel(&mut self) -> Option<Uuid> {
        let id = std::mem::take(self).pending();
        debug!(?id, "delete cancelled");
        id
    }
}
