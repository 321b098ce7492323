//! A single node of a task's stage tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::StageId;
use super::status::Status;

/// One step of a task's progress tree.
///
/// Tree structure lives only in `children`: a stage does not know its
/// parent. Child order is display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub label: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StageId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stage {
    /// Create a leaf stage in the in-progress state.
    pub fn new(id: StageId, label: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            label: label.to_string(),
            status: Status::InProgress,
            children: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
