//! Stage tree for a single task.
//!
//! Stages live in a flat map keyed by ID; the tree shape is carried only by
//! each stage's ordered `children` list. A child→parent index is kept next to
//! the map so deletion can find a stage's parent without scanning. The index
//! is never persisted: it is rebuilt whenever a tree is constructed from a
//! plain map.
//!
//! Lookups of unknown IDs are not errors here. Mutations report whether they
//! did anything; only deleting the root stage is refused with an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use super::id::StageId;
use super::stage::Stage;
use super::status::Status;
use crate::error::{Error, Result};

/// Stages of one task, plus a derived child→parent index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HashMap<StageId, Stage>")]
pub struct StageTree {
    stages: HashMap<StageId, Stage>,
    parents: HashMap<StageId, StageId>,
}

impl StageTree {
    /// Create an empty tree. The root is created lazily by [`ensure_root`].
    ///
    /// [`ensure_root`]: StageTree::ensure_root
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a stage map, deriving the parent index.
    ///
    /// Stages reachable from root are indexed in pre-order first, so a
    /// corrupt map that lists a child under two parents keeps the parent
    /// reached first from root. Unreachable stages are indexed afterwards in
    /// ID order.
    pub fn from_stages(stages: HashMap<StageId, Stage>) -> Self {
        let mut tree = Self {
            stages,
            parents: HashMap::new(),
        };
        tree.rebuild_parents();
        tree
    }

    fn rebuild_parents(&mut self) {
        self.parents.clear();
        let mut order: Vec<StageId> = self.preorder().into_iter().map(|(id, _)| id).collect();
        let reachable: HashSet<StageId> = order.iter().cloned().collect();
        let mut rest: Vec<StageId> = self
            .stages
            .keys()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();
        rest.sort();
        order.extend(rest);

        for parent in order {
            let Some(stage) = self.stages.get(&parent) else {
                continue;
            };
            for child in &stage.children {
                if child.is_root() || child == &parent {
                    continue;
                }
                self.parents
                    .entry(child.clone())
                    .or_insert_with(|| parent.clone());
            }
        }
    }

    // ========== Queries ==========

    pub fn get(&self, id: &StageId) -> Option<&Stage> {
        self.stages.get(id)
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.stages.contains_key(id)
    }

    pub fn root(&self) -> Option<&Stage> {
        self.stages.get(&StageId::root())
    }

    /// Number of stages in the map, including unreachable ones.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Parent of a stage according to the index. `None` for root, orphans
    /// and unknown IDs.
    pub fn parent_of(&self, id: &StageId) -> Option<&StageId> {
        self.parents.get(id)
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    /// Pre-order walk from root as `(id, depth)` pairs.
    ///
    /// Children are visited in list order. A child ID with no map entry is
    /// skipped, and a stage already visited is not descended into again, so
    /// corrupt data cannot make the walk loop.
    pub fn preorder(&self) -> Vec<(StageId, usize)> {
        let mut out = Vec::new();
        let root = StageId::root();
        if !self.stages.contains_key(&root) {
            return out;
        }

        let mut seen: HashSet<&StageId> = HashSet::new();
        let mut stack: Vec<(&StageId, usize)> = vec![(&root, 0)];

        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(stage) = self.stages.get(id) else {
                continue;
            };
            out.push((id.clone(), depth));
            for child in stage.children.iter().rev() {
                if !seen.contains(child) {
                    stack.push((child, depth + 1));
                }
            }
        }
        out
    }

    /// IDs of every stage reachable from root.
    pub fn live_ids(&self) -> HashSet<StageId> {
        self.preorder().into_iter().map(|(id, _)| id).collect()
    }

    /// `(parent, child)` pairs along the tree edges reachable from root.
    pub fn edges(&self) -> HashSet<(StageId, StageId)> {
        let live = self.live_ids();
        let mut edges = HashSet::new();
        for id in &live {
            if let Some(stage) = self.stages.get(id) {
                for child in &stage.children {
                    if live.contains(child) && self.parents.get(child) == Some(id) {
                        edges.insert((id.clone(), child.clone()));
                    }
                }
            }
        }
        edges
    }

    /// All stages at the greatest depth from root, in pre-order.
    ///
    /// Root has depth 0, so a tree holding only root yields `[root]`, and a
    /// tree without a root yields nothing. Orphans never count.
    pub fn find_deepest(&self) -> Vec<StageId> {
        let mut max_depth = 0;
        let mut deepest = Vec::new();
        for (id, depth) in self.preorder() {
            if depth > max_depth {
                max_depth = depth;
                deepest.clear();
                deepest.push(id);
            } else if depth == max_depth {
                deepest.push(id);
            }
        }
        deepest
    }

    // ========== Mutations ==========

    /// Create the root stage if it is missing. Returns `true` if created.
    pub fn ensure_root(&mut self, label: &str) -> bool {
        let root = StageId::root();
        if self.stages.contains_key(&root) {
            return false;
        }
        self.stages.insert(root.clone(), Stage::new(root, label));
        true
    }

    /// Append a new in-progress child under `parent`.
    ///
    /// Returns the new stage's ID, or `None` if the parent does not exist.
    pub fn add_stage(
        &mut self,
        parent: &StageId,
        label: &str,
        now: DateTime<Utc>,
    ) -> Option<StageId> {
        let parent_stage = self.stages.get_mut(parent)?;
        let id = StageId::new();
        parent_stage.children.push(id.clone());
        parent_stage.touch(now);

        let mut stage = Stage::new(id.clone(), label);
        stage.created_at = now;
        stage.updated_at = now;
        self.stages.insert(id.clone(), stage);
        self.parents.insert(id.clone(), parent.clone());
        Some(id)
    }

    /// Replace a stage's label. Blank labels and unknown IDs are ignored.
    pub fn rename_stage(&mut self, id: &StageId, label: &str, now: DateTime<Utc>) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        let Some(stage) = self.stages.get_mut(id) else {
            return false;
        };
        stage.label = label.to_string();
        stage.touch(now);
        true
    }

    /// Set a stage's status without touching any other stage.
    pub fn change_stage_status(&mut self, id: &StageId, status: Status, now: DateTime<Utc>) -> bool {
        let Some(stage) = self.stages.get_mut(id) else {
            return false;
        };
        stage.status = status;
        stage.touch(now);
        true
    }

    /// Delete a stage and its whole subtree.
    ///
    /// Returns the removed IDs in pre-order (empty if `id` is unknown).
    /// Deleting the root stage is refused with [`Error::RootStageProtected`]
    /// and leaves the tree untouched.
    pub fn delete_stage(&mut self, id: &StageId, now: DateTime<Utc>) -> Result<Vec<StageId>> {
        if id.is_root() {
            return Err(Error::RootStageProtected);
        }
        if !self.stages.contains_key(id) {
            return Ok(Vec::new());
        }

        let doomed = self.subtree(id);

        if let Some(parent) = self.parents.get(id).cloned() {
            if let Some(parent_stage) = self.stages.get_mut(&parent) {
                parent_stage.children.retain(|c| c != id);
                parent_stage.touch(now);
            }
        } else {
            // Not indexed: fall back to scanning for any list that names it.
            for stage in self.stages.values_mut() {
                if let Some(pos) = stage.children.iter().position(|c| c == id) {
                    stage.children.remove(pos);
                    stage.touch(now);
                    break;
                }
            }
        }

        for removed in &doomed {
            self.stages.remove(removed);
            self.parents.remove(removed);
        }
        Ok(doomed)
    }

    /// `id` and all of its descendants, in pre-order.
    fn subtree(&self, id: &StageId) -> Vec<StageId> {
        let mut out = Vec::new();
        let mut seen: HashSet<StageId> = HashSet::new();
        let mut stack = vec![id.clone()];

        while let Some(current) = stack.pop() {
            if current.is_root() || !seen.insert(current.clone()) {
                continue;
            }
            let Some(stage) = self.stages.get(&current) else {
                continue;
            };
            for child in stage.children.iter().rev() {
                stack.push(child.clone());
            }
            out.push(current);
        }
        out
    }

    /// Mutable access for label synchronisation with the owning task.
    pub(crate) fn root_mut(&mut self) -> Option<&mut Stage> {
        self.stages.get_mut(&StageId::root())
    }
}

impl From<HashMap<StageId, Stage>> for StageTree {
    fn from(stages: HashMap<StageId, Stage>) -> Self {
        Self::from_stages(stages)
    }
}

impl Serialize for StageTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.stages.serialize(serializer)
    }
}

impl PartialEq for StageTree {
    fn eq(&self, other: &Self) -> bool {
        self.stages == other.stages
    }
}
