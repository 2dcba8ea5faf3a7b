use tracing::trace;

use crate::task::Task;

/// What the task list is currently showing.
///
/// The completion toggle is exclusive: a view shows either pending or
/// completed tasks, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewFilter {
    pub search: String,
    pub show_completed: bool,
}

impl ViewFilter {
    pub fn new(search: impl Into<String>, show_completed: bool) -> Self {
        Self {
            search: search.into(),
            show_completed,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        matches_search(task, &self.search.to_lowercase())
            && task.completed == self.show_completed
    }

    /// Matching tasks in input order.
    #[tracing::instrument(skip(self, tasks), fields(search = %self.search, show_completed = self.show_completed))]
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let needle = self.search.to_lowercase();
        let out: Vec<&Task> = tasks
            .iter()
            .filter(|task| matches_search(task, &needle) && task.completed == self.show_completed)
            .collect();
        trace!(total = tasks.len(), shown = out.len(), "filtered tasks");
        out
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], search: &str, show_completed: bool) -> Vec<&'a Task> {
    ViewFilter::new(search, show_completed).apply(tasks)
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.task_name.to_lowercase().contains(needle)
        || task.assignee.to_lowercase().contains(needle)
}
