//! Depth search and task-list ordering.

use grove::core::{sort_for_display, StageId, Status, Task};

use crate::fixtures::{build_task, sample_task};

#[test]
fn test_deepest_of_sample_tree() {
    let (task, ids) = sample_task();
    assert_eq!(task.stages.find_deepest(), vec![ids[5].clone()]);
}

#[test]
fn test_deepest_ties_in_preorder() {
    // root -> a -> a1, root -> b -> b1
    let (task, ids) = build_task("Ties", &[(0, "a"), (0, "b"), (2, "b1"), (1, "a1")]);
    assert_eq!(
        task.stages.find_deepest(),
        vec![ids[4].clone(), ids[3].clone()]
    );
}

#[test]
fn test_deepest_of_root_only_tree() {
    let (task, _) = build_task("Solo", &[]);
    assert_eq!(task.stages.find_deepest(), vec![StageId::root()]);
}

#[test]
fn test_deepest_without_root_is_empty() {
    let task = Task::new("Empty");
    assert!(task.stages.find_deepest().is_empty());
}

fn task_with(name: &str, status: Status) -> Task {
    let mut task = Task::new(name);
    task.set_status(status);
    task
}

#[test]
fn test_display_order_by_status_then_name() {
    let tasks = vec![
        task_with("zeta", Status::Failed),
        task_with("beta", Status::Waiting),
        task_with("alpha", Status::Completed),
        task_with("gamma", Status::InProgress),
        task_with("delta", Status::Frozen),
        task_with("alpha", Status::InProgress),
    ];

    let names: Vec<(&str, &Status)> = sort_for_display(&tasks)
        .into_iter()
        .map(|t| (t.name.as_str(), &t.status))
        .collect();

    assert_eq!(
        names,
        vec![
            ("alpha", &Status::InProgress),
            ("gamma", &Status::InProgress),
            ("delta", &Status::Frozen),
            ("alpha", &Status::Completed),
            ("beta", &Status::Waiting),
            ("zeta", &Status::Failed),
        ]
    );
}

#[test]
fn test_display_order_is_deterministic() {
    let tasks = vec![
        task_with("same", Status::Waiting),
        task_with("same", Status::Waiting),
        task_with("other", Status::Unknown("paused".to_string())),
    ];
    let first: Vec<_> = sort_for_display(&tasks).iter().map(|t| t.id.clone()).collect();
    let second: Vec<_> = sort_for_display(&tasks).iter().map(|t| t.id.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(first[0], tasks[0].id);
    assert_eq!(first[2], tasks[2].id);
}

#[test]
fn test_display_order_small_mixed_list() {
    let tasks = vec![
        task_with("Z", Status::Failed),
        task_with("B", Status::InProgress),
        task_with("A", Status::Frozen),
        task_with("A", Status::InProgress),
    ];
    let order: Vec<_> = sort_for_display(&tasks).into_iter().map(|t| t.id.clone()).collect();
    assert_eq!(
        order,
        vec![
            tasks[3].id.clone(),
            tasks[1].id.clone(),
            tasks[2].id.clone(),
            tasks[0].id.clone(),
        ]
    );
}

#[test]
fn test_deepest_chain_and_siblings() {
    // root -> A -> B, root -> C
    let (task, ids) = build_task("Chain", &[(0, "A"), (1, "B"), (0, "C")]);
    assert_eq!(task.stages.find_deepest(), vec![ids[2].clone()]);

    // root -> A, root -> B
    let (task, ids) = build_task("Flat", &[(0, "A"), (0, "B")]);
    assert_eq!(task.stages.find_deepest(), vec![ids[1].clone(), ids[2].clone()]);
}

#[test]
fn test_display_order_mixed_case_names() {
    let tasks = vec![
        task_with("Banana", Status::InProgress),
        task_with("apple", Status::InProgress),
    ];
    let names: Vec<&str> = sort_for_display(&tasks)
        .into_iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["apple", "Banana"]);
}
