//! The graph view mirrors the open task through every stage edit.

use grove::core::{StageId, Status};
use grove::view::{LayoutEngine, Viewport};

use crate::fixtures::{started_app, TestApp};

fn assert_parity(app: &TestApp) {
    let task = app.current_task().expect("a task is open");
    assert_eq!(app.view().node_ids(), task.stages.live_ids());
    assert_eq!(app.view().edge_pairs(), task.stages.edges());
}

fn pan_away(app: &mut TestApp) -> Viewport {
    let custom = Viewport {
        x: -250.0,
        y: 75.5,
        scale: 0.6,
    };
    app.view_mut()
        .engine_mut()
        .expect("view is materialized")
        .set_viewport(custom);
    custom
}

#[tokio::test]
async fn test_parity_through_edit_sequence() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Parity").await.unwrap();
    app.open_task(&id).await.unwrap();
    assert_parity(&app);

    let root = StageId::root();
    let a = app.add_stage(&root, "A").await.unwrap().unwrap();
    let b = app.add_stage(&root, "B").await.unwrap().unwrap();
    let a1 = app.add_stage(&a, "A1").await.unwrap().unwrap();
    app.add_stage(&a1, "A1x").await.unwrap().unwrap();
    assert_parity(&app);

    app.rename_stage(&b, "Bee").await.unwrap();
    app.change_stage_status(&a1, Status::Waiting).await.unwrap();
    assert_parity(&app);

    let removed = app.delete_stage(&a).await.unwrap();
    assert_eq!(removed.len(), 3);
    assert_parity(&app);
    assert_eq!(app.view().node_ids().len(), 2);
}

#[tokio::test]
async fn test_structural_patches_keep_viewport() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Camera").await.unwrap();
    app.open_task(&id).await.unwrap();
    let a = app.add_stage(&StageId::root(), "A").await.unwrap().unwrap();

    let custom = pan_away(&mut app);
    let b = app.add_stage(&a, "B").await.unwrap().unwrap();
    assert_eq!(app.view().viewport(), Some(custom));

    app.rename_stage(&b, "Renamed").await.unwrap();
    app.change_stage_status(&b, Status::Completed).await.unwrap();
    assert_eq!(app.view().viewport(), Some(custom));

    app.delete_stage(&b).await.unwrap();
    assert_eq!(app.view().viewport(), Some(custom));
}

#[tokio::test]
async fn test_update_changes_visuals_only() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Visuals").await.unwrap();
    app.open_task(&id).await.unwrap();
    let a = app.add_stage(&StageId::root(), "A").await.unwrap().unwrap();
    let edges = app.view().edge_pairs();

    app.change_stage_status(&a, Status::Failed).await.unwrap();
    let node = app.view().node(&a).unwrap();
    assert_eq!(node.colors, Status::Failed.colors());
    assert_eq!(node.label, "A");
    assert_eq!(app.view().edge_pairs(), edges);
}

#[tokio::test]
async fn test_opening_focuses_deepest_stage() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Focus").await.unwrap();
    app.open_task(&id).await.unwrap();
    let a = app.add_stage(&StageId::root(), "A").await.unwrap().unwrap();
    let deep = app.add_stage(&a, "Deep").await.unwrap().unwrap();
    app.close_task();

    let focused = app.open_task(&id).await.unwrap();
    assert_eq!(focused, Some(deep));
    assert_parity(&app);
}

#[tokio::test]
async fn test_long_labels_are_wrapped() {
    let (mut app, _) = started_app().await;
    let id = app.add_task("Wrap").await.unwrap();
    app.open_task(&id).await.unwrap();
    let label = "prepare the release notes for review";
    let a = app.add_stage(&StageId::root(), label).await.unwrap().unwrap();

    let node_label = &app.view().node(&a).unwrap().label;
    assert!(node_label.contains('\n'));
    assert_eq!(node_label.replace('\n', " "), label);
    assert_eq!(app.current_task().unwrap().stages.get(&a).unwrap().label, label);
}
