//! Integration test suite for Grove.
//!
//! These tests drive the public API the way the application does: tasks
//! and stages are edited through the model or the `App` controller, stored
//! through a `Store`, and mirrored by a headless graph view.
//!
//! # Test Categories
//!
//! - `stage_tree`: tree invariant, deletion cascade, root protection
//! - `ordering`: depth search and task-list ordering
//! - `persistence`: JSON round-trips and tolerant loading
//! - `view_parity`: graph view stays in step with the model
//! - `controller`: gate, save-failure and screen behavior of `App`

mod fixtures;

mod controller;
mod ordering;
mod persistence;
mod stage_tree;
mod view_parity;
