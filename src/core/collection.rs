//! The ordered set of tasks for one session, and its persisted form.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::TaskId;
use super::status::Status;
use super::task::Task;
use crate::error::{Error, Result};

/// Name given to the task seeded into an empty collection.
pub const DEMO_TASK_NAME: &str = "Example task";

/// Everything that gets written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            tasks: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// All tasks of the session, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tasks: snapshot.tasks,
        }
    }

    /// Copy of the current state stamped with the current time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            updated_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// Resolve a full ID or a unique ID prefix.
    pub fn resolve(&self, query: &str) -> Result<TaskId> {
        if let Some(task) = self.tasks.iter().find(|t| t.id.as_str() == query) {
            return Ok(task.id.clone());
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| !query.is_empty() && t.id.as_str().starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id.clone()),
            (Some(_), Some(_)) => Err(Error::Validation(format!(
                "task prefix '{}' is ambiguous",
                query
            ))),
            (None, _) => Err(Error::TaskNotFound(query.to_string())),
        }
    }

    /// Append a new in-progress task with no stages.
    pub fn add_task(&mut self, name: &str) -> &Task {
        self.tasks.push(Task::new(name));
        let last = self.tasks.len() - 1;
        &self.tasks[last]
    }

    /// Rename a task (and its root stage). `false` if the task is unknown.
    pub fn edit_task(&mut self, id: &TaskId, name: &str) -> bool {
        match self.get_mut(id) {
            Some(task) => {
                task.rename(name);
                true
            }
            None => false,
        }
    }

    /// Remove a task, returning it if it was present.
    pub fn delete_task(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn change_task_status(&mut self, id: &TaskId, status: Status) -> bool {
        match self.get_mut(id) {
            Some(task) => {
                task.set_status(status);
                true
            }
            None => false,
        }
    }

    /// Seed one example task with a root stage. Only acts on an empty
    /// collection; returns whether a task was added.
    pub fn create_demo_task(&mut self) -> bool {
        if !self.tasks.is_empty() {
            return false;
        }
        let mut task = Task::new(DEMO_TASK_NAME);
        task.ensure_root();
        self.tasks.push(task);
        true
    }
}

/// Name order for the task list: case-insensitive first, so "apple"
/// precedes "Banana"; names differing only in case fall back to code
/// point order, lowercase first.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Tasks ordered for the task list: by status rank, then by name.
///
/// The sort is stable, so tasks equal on both keys keep collection order.
pub fn sort_for_display(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| {
        a.status
            .display_rank()
            .cmp(&b.status.display_rank())
            .then_with(|| compare_names(&a.name, &b.name))
    });
    sorted
}
