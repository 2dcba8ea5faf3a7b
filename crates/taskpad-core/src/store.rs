use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::datastore::{BlobStore, TASKS_KEY};
use crate::task::{Task, TaskDraft};

/// The session's task collection, mirrored into a blob store after every
/// mutation.
///
/// A failed write never rolls back the mutation. The in-memory list stays
/// authoritative and the failure is kept in `last_save_error` until a later
/// save succeeds.
#[derive(Debug)]
pub struct TaskStore<B: BlobStore> {
    blob: B,
    tasks: Vec<Task>,
    last_save_error: Option<String>,
}

impl<B: BlobStore> TaskStore<B> {
    /// Absent or corrupted data yields an empty collection.
    #[tracing::instrument(skip(blob))]
    pub fn load(blob: B) -> Self {
        let tasks = match blob.read(TASKS_KEY) {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(tasks) => tasks,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "stored tasks unreadable; starting empty");
                    vec![]
                }
            },
            Ok(None) => vec![],
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed reading stored tasks; starting empty");
                vec![]
            }
        };

        info!(count = tasks.len(), "loaded tasks");
        Self {
            blob,
            tasks,
            last_save_error: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn into_blob(self) -> B {
        self.blob
    }

    #[tracing::instrument(skip(self, draft), fields(task_name = %draft.task_name))]
    pub fn add(&mut self, draft: TaskDraft) -> &Task {
        let mut id = Uuid::new_v4();
        while self.get(id).is_some() {
            id = Uuid::new_v4();
        }

        self.tasks.push(Task::from_draft(id, draft));
        debug!(%id, count = self.tasks.len(), "task added");
        self.persist();

        let idx = self.tasks.len() - 1;
        &self.tasks[idx]
    }

    /// Returns the new completion state, or `None` when no task has `id`.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn toggle_completed(&mut self, id: Uuid) -> Option<bool> {
        let toggled = self.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            task.completed = !task.completed;
            task.completed
        });
        debug!(?toggled, "toggle completed");
        self.persist();
        toggled
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn remove(&mut self, id: Uuid) -> Option<Task> {
        let removed = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .map(|idx| self.tasks.remove(idx));
        debug!(removed = removed.is_some(), "remove task");
        self.persist();
        removed
    }

    #[tracing::instrument(skip(self))]
    pub fn save(&mut self) -> anyhow::Result<()> {
        let payload = encode(&self.tasks)?;
        self.blob
            .write(TASKS_KEY, &payload)
            .context("failed to save tasks")
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => self.last_save_error = None,
            Err(err) => {
                let msg = format!("{err:#}");
                warn!(error = %msg, "tasks not persisted; keeping in-memory state");
                self.last_save_error = Some(msg);
            }
        }
    }

    /// Finds the single task whose id is `selector` or starts with it.
    ///
    /// Matching ignores case and hyphens. `Ok(None)` means nothing matched.
    pub fn resolve(&self, selector: &str) -> anyhow::Result<Option<Uuid>> {
        let needle: String = selector
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if needle.is_empty() {
            return Err(anyhow!("empty task id"));
        }

        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle));
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        if matches.next().is_some() {
            return Err(anyhow!("task id prefix is ambiguous: {selector}"));
        }
        Ok(Some(first.id))
    }
}

pub fn encode(tasks: &[Task]) -> anyhow::Result<String> {
    serde_json::to_string_pretty(tasks).context("failed to serialize tasks")
}

pub fn decode(raw: &str) -> anyhow::Result<Vec<Task>> {
    serde_json::from_str(raw).context("failed to parse stored tasks")
}
