//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Building tasks with known stage shapes
//! - Checking the tree invariant
//! - Creating controllers backed by in-memory collaborators

use std::collections::HashSet;
use std::sync::Arc;

use grove::core::{StageId, Task};
use grove::license::ManualGate;
use grove::store::MemoryStore;
use grove::view::{GraphView, HeadlessLayout};
use grove::App;

pub type TestApp = App<MemoryStore, Arc<ManualGate>, HeadlessLayout>;

/// A task with a root and the stages added by `shape`.
///
/// Each entry is `(parent_index, label)`, where index 0 is root and index
/// `n` is the n-th stage added. Returns the task and every stage ID in
/// creation order, root first.
pub fn build_task(name: &str, shape: &[(usize, &str)]) -> (Task, Vec<StageId>) {
    let mut task = Task::new(name);
    task.ensure_root();
    let mut ids = vec![StageId::root()];
    for (parent, label) in shape {
        let id = task
            .add_stage(&ids[*parent], label)
            .expect("parent index refers to an existing stage");
        ids.push(id);
    }
    (task, ids)
}

/// root -> a -> (a1, a2 -> a2x), root -> b
///
/// Indices: 0 root, 1 a, 2 b, 3 a1, 4 a2, 5 a2x.
pub fn sample_task() -> (Task, Vec<StageId>) {
    build_task(
        "Sample",
        &[(0, "a"), (0, "b"), (1, "a1"), (1, "a2"), (4, "a2x")],
    )
}

/// Every stage except root is referenced by exactly one `children` list,
/// every referenced child exists, and every stage is reachable from root.
pub fn assert_tree_invariant(task: &Task) {
    let tree = &task.stages;
    let mut referenced: Vec<StageId> = Vec::new();
    for stage in tree.stages() {
        for child in &stage.children {
            assert!(tree.contains(child), "dangling child {}", child);
            referenced.push(child.clone());
        }
    }

    let unique: HashSet<_> = referenced.iter().cloned().collect();
    assert_eq!(unique.len(), referenced.len(), "a stage has two parents");
    assert!(!unique.contains(&StageId::root()), "root is someone's child");

    let reachable: HashSet<_> = tree.preorder().into_iter().map(|(id, _)| id).collect();
    let stored: HashSet<_> = tree.stages().map(|s| s.id.clone()).collect();
    assert_eq!(reachable, stored, "unreachable stages present");
}

/// A started controller with an open gate, holding only the example task.
pub async fn started_app() -> (TestApp, Arc<ManualGate>) {
    let gate = Arc::new(ManualGate::new(true));
    let mut app = App::new(
        MemoryStore::new(),
        Arc::clone(&gate),
        GraphView::new(HeadlessLayout::default),
    );
    app.start().await.expect("open gate starts the app");
    (app, gate)
}
