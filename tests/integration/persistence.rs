//! Storage round-trips through the JSON file store.

use std::fs;

use tempfile::TempDir;

use grove::core::{Snapshot, Status, TaskCollection};
use grove::store::{JsonFileStore, Store};

use crate::fixtures::sample_task;

#[tokio::test]
async fn test_round_trip_preserves_collection() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("tasks.json"));

    let (mut task, ids) = sample_task();
    task.change_stage_status(&ids[2], Status::Failed);
    let mut collection = TaskCollection::from_snapshot(Snapshot {
        tasks: vec![task],
        ..Snapshot::empty()
    });
    collection.add_task("Second");

    assert!(store.save(&collection.snapshot()).await);
    let loaded = TaskCollection::from_snapshot(store.load().await);
    assert_eq!(loaded, collection);

    // The parent index is rebuilt on load.
    let task = &loaded.tasks()[0];
    assert_eq!(task.stages.parent_of(&ids[5]), Some(&ids[4]));
}

#[tokio::test]
async fn test_unknown_status_survives_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"{
  "tasks": [
    {
      "id": "task_1",
      "name": "Legacy",
      "status": "paused",
      "stages": {
        "root": {
          "id": "root",
          "label": "Legacy",
          "status": "in-progress",
          "children": [],
          "createdAt": "2024-01-01T00:00:00Z",
          "updatedAt": "2024-01-01T00:00:00Z"
        }
      },
      "createdAt": "2024-01-01T00:00:00Z",
      "updatedAt": "2024-01-01T00:00:00Z"
    }
  ],
  "updatedAt": "2024-01-01T00:00:00Z"
}"#,
    )
    .unwrap();

    let store = JsonFileStore::new(&path);
    let snapshot = store.load().await;
    assert_eq!(snapshot.tasks.len(), 1);
    assert_eq!(snapshot.tasks[0].status, Status::Unknown("paused".to_string()));

    assert!(store.save(&snapshot).await);
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"paused\""));
}

#[tokio::test]
async fn test_missing_stages_field_defaults_to_empty_tree() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"{"tasks":[{"id":"task_2","name":"Bare","status":"waiting","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}],"updatedAt":"2024-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let snapshot = JsonFileStore::new(&path).load().await;
    assert!(snapshot.tasks[0].stages.is_empty());
}

#[tokio::test]
async fn test_unreadable_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, "[1, 2, 3]").unwrap();
    let snapshot = JsonFileStore::new(&path).load().await;
    assert_eq!(snapshot.tasks.len(), Snapshot::empty().tasks.len());
}
