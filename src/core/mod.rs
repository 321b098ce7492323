//! Core domain models for grove.
//!
//! Tasks, their stage trees, the status registry and the task collection.
//! Nothing in here performs I/O.

pub mod collection;
pub mod id;
pub mod stage;
pub mod status;
pub mod task;
pub mod tree;

pub use collection::{sort_for_display, Snapshot, TaskCollection, DEMO_TASK_NAME};
pub use id::{generate_id, StageId, TaskId};
pub use stage::Stage;
pub use status::{Status, StatusColors};
pub use task::Task;
pub use tree::StageTree;
