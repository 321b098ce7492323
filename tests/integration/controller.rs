//! `App` behavior around the license gate, storage and screens.

use std::sync::Arc;

use grove::core::{Snapshot, StageId, Status, TaskCollection, DEMO_TASK_NAME};
use grove::license::{GateEvent, ManualGate};
use grove::store::{MemoryStore, Store};
use grove::view::{GraphView, HeadlessLayout};
use grove::{App, Error, NotificationLevel, Screen};

use crate::fixtures::{build_task, started_app};

#[tokio::test]
async fn test_empty_store_gets_example_task() {
    let (app, _) = started_app().await;
    assert_eq!(app.tasks().len(), 1);
    let task = &app.tasks().tasks()[0];
    assert_eq!(task.name, DEMO_TASK_NAME);
    assert!(task.stages.root().is_some());

    let stored = app.store().load().await;
    assert_eq!(stored.tasks.len(), 1);
}

#[tokio::test]
async fn test_existing_data_is_loaded_not_seeded() {
    let (task, _) = build_task("Stored", &[(0, "child")]);
    let snapshot = Snapshot {
        tasks: vec![task.clone()],
        ..Snapshot::empty()
    };
    let store = MemoryStore::with_snapshot(&snapshot).unwrap();
    let mut app = App::new(
        store,
        Arc::new(ManualGate::new(true)),
        GraphView::new(HeadlessLayout::default),
    );
    app.start().await.unwrap();

    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks().get(&task.id), Some(&task));
    assert_eq!(app.store().save_count(), 0);
}

#[tokio::test]
async fn test_every_edit_is_persisted() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Persisted").await.unwrap();
    app.open_task(&id).await.unwrap();
    let stage = app.add_stage(&StageId::root(), "Step").await.unwrap().unwrap();
    app.change_stage_status(&stage, Status::Completed).await.unwrap();

    let stored = TaskCollection::from_snapshot(app.store().load().await);
    assert_eq!(&stored, app.tasks());
}

#[tokio::test]
async fn test_invalid_gate_blocks_every_intent() {
    let (mut app, gate) = started_app().await;
    let existing = app.tasks().tasks()[0].id.clone();
    let saves = app.store().save_count();

    gate.set_valid(false);
    assert!(matches!(app.add_task("x").await, Err(Error::LicenseInvalid)));
    assert!(matches!(
        app.open_task(&existing).await,
        Err(Error::LicenseInvalid)
    ));

    // Blocked even if the gate would now answer differently.
    gate.set_valid(true);
    assert!(matches!(
        app.change_task_status(&existing, Status::Failed).await,
        Err(Error::LicenseInvalid)
    ));
    assert_eq!(app.store().save_count(), saves);
    assert_eq!(app.tasks().tasks()[0].status, Status::InProgress);
}

#[tokio::test]
async fn test_gate_events_block_and_restore() {
    let (mut app, _) = started_app().await;
    app.handle_gate_event(GateEvent::Invalidated);
    assert!(app.is_blocked());
    assert_eq!(
        app.take_notification().map(|n| n.level),
        Some(NotificationLevel::Error)
    );

    app.handle_gate_event(GateEvent::Restored);
    assert!(!app.is_blocked());
    assert!(app.add_task("Back").await.is_ok());
}

#[tokio::test]
async fn test_save_failure_is_a_warning() {
    let (mut app, _) = started_app().await;
    app.store().set_fail_saves(true);

    let id = app.add_task("Memory only").await.unwrap();
    assert!(app.tasks().get(&id).is_some());
    let notification = app.take_notification().unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);

    app.store().set_fail_saves(false);
    app.edit_task(&id, "Saved now").await.unwrap();
    assert!(app.notification().is_none());
    let stored = TaskCollection::from_snapshot(app.store().load().await);
    assert_eq!(stored.get(&id).unwrap().name, "Saved now");
}

#[tokio::test]
async fn test_delete_open_task_leaves_graph() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Gone").await.unwrap();
    app.open_task(&id).await.unwrap();
    assert_eq!(app.screen(), &Screen::Graph(id.clone()));

    assert!(app.delete_task(&id).await.unwrap());
    assert_eq!(app.screen(), &Screen::List);
    assert!(!app.view().is_materialized());
    assert!(app.tasks().get(&id).is_none());
}

#[tokio::test]
async fn test_blank_input_rejected() {
    let (mut app, _) = started_app().await;
    let id = app.tasks().tasks()[0].id.clone();
    assert!(matches!(app.add_task("").await, Err(Error::Validation(_))));
    assert!(matches!(
        app.edit_task(&id, "  \t").await,
        Err(Error::Validation(_))
    ));

    app.open_task(&id).await.unwrap();
    assert!(matches!(
        app.add_stage(&StageId::root(), " ").await,
        Err(Error::Validation(_))
    ));
    assert_eq!(app.current_task().unwrap().stage_count(), 1);
}
