use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match on the variant name.
impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| anyhow!("unknown priority: {s}"))
    }
}

/// Fields of a task that passed validation. Only `schema::validate` builds one
/// from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub task_name: String,
    pub priority: Priority,
    pub story_points: u8,
    pub assignee: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub task_name: String,
    pub priority: Priority,
    pub story_points: u8,
    pub assignee: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn from_draft(id: Uuid, draft: TaskDraft) -> Self {
        Self {
            id,
            task_name: draft.task_name,
            priority: draft.priority,
            story_points: draft.story_points,
            assignee: draft.assignee,
            due_date: draft.due_date,
            completed: false,
        }
    }

    pub fn short_id(&self) -> String {
        short_id(self.id)
    }
}

/// First eight hex digits of `id`, as shown in listings.
pub fn short_id(id: Uuid) -> String {
    let mut text = id.simple().to_string();
    text.truncate(8);
    text
}
