//! Visual mirror of a task's stage tree.
//!
//! - `node`: per-stage visual attributes and label wrapping
//! - `layout`: the layout engine capability and a headless engine
//! - `graph`: the incrementally patched graph view

pub mod graph;
pub mod layout;
pub mod node;

pub use graph::GraphView;
pub use layout::{HeadlessLayout, LayoutEngine, LayoutTicket, Position, Viewport};
pub use node::{wrap_label, NodeData, NodePatch};
