//! Task data model.
//!
//! A task is a named unit of work that owns one [`StageTree`]. The task name
//! and the root stage's label are the same string: renaming the task
//! relabels the root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{StageId, TaskId};
use super::status::Status;
use super::tree::StageTree;
use crate::error::Result;

/// A single tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// Display name, mirrored into the root stage's label.
    pub name: String,
    /// Task status. Independent of every stage status.
    #[serde(default)]
    pub status: Status,
    /// Stage map; empty until the task is first opened.
    #[serde(default)]
    pub stages: StageTree,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task or any of its stages last changed.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create an in-progress task with no stages.
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            name: name.to_string(),
            status: Status::InProgress,
            stages: StageTree::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the root stage, labelled with the task name, if missing.
    pub fn ensure_root(&mut self) -> bool {
        let name = self.name.clone();
        self.stages.ensure_root(&name)
    }

    /// Rename the task and its root stage together.
    pub fn rename(&mut self, name: &str) {
        let now = Utc::now();
        self.name = name.to_string();
        self.updated_at = now;
        if let Some(root) = self.stages.root_mut() {
            root.label = name.to_string();
            root.touch(now);
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Add a child stage under `parent`. See [`StageTree::add_stage`].
    pub fn add_stage(&mut self, parent: &StageId, label: &str) -> Option<StageId> {
        let now = Utc::now();
        let id = self.stages.add_stage(parent, label, now)?;
        self.updated_at = now;
        Some(id)
    }

    /// Relabel a stage. Relabelling root also renames the task.
    pub fn rename_stage(&mut self, id: &StageId, label: &str) -> bool {
        let now = Utc::now();
        if !self.stages.rename_stage(id, label, now) {
            return false;
        }
        if id.is_root() {
            self.name = label.trim().to_string();
        }
        self.updated_at = now;
        true
    }

    pub fn change_stage_status(&mut self, id: &StageId, status: Status) -> bool {
        let now = Utc::now();
        if !self.stages.change_stage_status(id, status, now) {
            return false;
        }
        self.updated_at = now;
        true
    }

    /// Delete a stage subtree. See [`StageTree::delete_stage`].
    pub fn delete_stage(&mut self, id: &StageId) -> Result<Vec<StageId>> {
        let now = Utc::now();
        let removed = self.stages.delete_stage(id, now)?;
        if !removed.is_empty() {
            self.updated_at = now;
        }
        Ok(removed)
    }

    /// Number of stages, as shown in the task list.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
