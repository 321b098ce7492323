//! Grove: tasks broken down into trees of stages.
//!
//! The model lives in [`core`], the visual mirror of one task's tree in
//! [`view`], and [`app::App`] ties both to storage and the license gate.

pub mod config;
pub mod error;
pub mod log;

pub mod app;
pub mod core;
pub mod license;
pub mod store;
pub mod view;

pub use app::{App, Notification, NotificationLevel, Screen, StageAction};
pub use error::{Error, Result};
