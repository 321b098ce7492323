//! Stage tree editing through the task model.

use std::collections::{HashMap, HashSet};

use grove::core::{Stage, StageId, StageTree, Status, Task};
use grove::Error;

use crate::fixtures::{assert_tree_invariant, build_task, sample_task};

#[test]
fn test_invariant_holds_through_edit_sequence() {
    let (mut task, ids) = sample_task();
    assert_tree_invariant(&task);

    task.rename_stage(&ids[3], "renamed");
    task.change_stage_status(&ids[2], Status::Frozen);
    let extra = task.add_stage(&ids[5], "deeper").unwrap();
    assert_tree_invariant(&task);

    task.delete_stage(&ids[4]).unwrap();
    assert_tree_invariant(&task);
    assert!(!task.stages.contains(&extra));

    task.add_stage(&ids[1], "again").unwrap();
    assert_tree_invariant(&task);
}

#[test]
fn test_deletion_cascades_to_descendants_only() {
    let (mut task, ids) = sample_task();
    let before = task.stages.clone();

    let removed = task.delete_stage(&ids[1]).unwrap();

    let removed: HashSet<_> = removed.into_iter().collect();
    let expected: HashSet<_> = [&ids[1], &ids[3], &ids[4], &ids[5]]
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(removed, expected);

    let remaining = task.stages.live_ids();
    assert_eq!(
        remaining,
        [ids[0].clone(), ids[2].clone()].into_iter().collect()
    );

    // The sibling subtree is untouched.
    assert_eq!(task.stages.get(&ids[2]), before.get(&ids[2]));
    assert_eq!(task.stages.root().unwrap().children, vec![ids[2].clone()]);
}

#[test]
fn test_delete_leaf_keeps_parent_and_siblings() {
    let (mut task, ids) = sample_task();
    let removed = task.delete_stage(&ids[3]).unwrap();
    assert_eq!(removed, vec![ids[3].clone()]);
    assert_eq!(task.stages.get(&ids[1]).unwrap().children, vec![ids[4].clone()]);
    assert_eq!(task.stage_count(), 5);
}

#[test]
fn test_root_cannot_be_deleted() {
    let (mut task, _) = sample_task();
    let before = task.clone();
    let result = task.delete_stage(&StageId::root());
    assert!(matches!(result, Err(Error::RootStageProtected)));
    assert_eq!(task, before);
}

#[test]
fn test_missing_ids_are_noops() {
    let (mut task, _) = sample_task();
    let before = task.clone();
    let ghost = StageId::from("stage_missing");

    assert!(task.add_stage(&ghost, "child").is_none());
    assert!(!task.rename_stage(&ghost, "label"));
    assert!(!task.change_stage_status(&ghost, Status::Failed));
    assert!(task.delete_stage(&ghost).unwrap().is_empty());

    assert_eq!(task, before);
}

#[test]
fn test_status_change_does_not_propagate() {
    let (mut task, ids) = sample_task();
    assert!(task.change_stage_status(&ids[1], Status::Completed));
    for id in &ids {
        let expected = if id == &ids[1] {
            Status::Completed
        } else {
            Status::InProgress
        };
        assert_eq!(task.stages.get(id).unwrap().status, expected);
    }
}

#[test]
fn test_new_stage_is_appended_in_progress() {
    let (mut task, ids) = build_task("Order", &[(0, "first")]);
    let second = task.add_stage(&ids[0], "second").unwrap();
    let root = task.stages.root().unwrap();
    assert_eq!(root.children, vec![ids[1].clone(), second.clone()]);
    let stage = task.stages.get(&second).unwrap();
    assert_eq!(stage.status, Status::InProgress);
    assert!(stage.children.is_empty());
}

#[test]
fn test_renaming_root_renames_task() {
    let mut task = Task::new("Before");
    task.ensure_root();
    assert!(task.rename_stage(&StageId::root(), "After"));
    assert_eq!(task.name, "After");
    assert_eq!(task.stages.root().unwrap().label, "After");
}

#[test]
#[should_panic(expected = "unreachable stages present")]
fn test_invariant_check_catches_orphans() {
    let mut task = Task::new("Orphans");
    let mut stages = HashMap::new();
    stages.insert(StageId::root(), Stage::new(StageId::root(), "Orphans"));
    stages.insert(StageId::from("orphan"), Stage::new(StageId::from("orphan"), "Lost"));
    task.stages = StageTree::from_stages(stages);
    assert_tree_invariant(&task);
}
