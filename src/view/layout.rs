//! The layout/render engine capability consumed by the graph view.
//!
//! An engine keeps its own copy of nodes and edges, places them, and owns
//! the camera. Re-layout is asynchronous: [`LayoutEngine::relayout`] hands
//! back a [`LayoutTicket`] that resolves once placement is finished, and
//! engines are free to move the camera while they work.

use std::collections::{HashMap, HashSet};

use tokio::sync::oneshot;

use super::node::NodeData;
use crate::core::StageId;
use crate::error::{Error, Result};
use crate::glog_trace;

/// Vertical distance between tree levels.
pub const LEVEL_SEPARATION: f64 = 200.0;
/// Horizontal distance between neighbouring nodes on a level.
pub const NODE_SPACING: f64 = 180.0;
/// Padding added around the graph when fitting it to the canvas.
const FIT_MARGIN: f64 = 100.0;
const MAX_FIT_SCALE: f64 = 1.0;

/// Camera state: the graph coordinate at the canvas centre, plus zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

/// A node's placed position in graph coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Completion signal of one re-layout pass.
pub struct LayoutTicket {
    rx: oneshot::Receiver<()>,
}

impl LayoutTicket {
    /// Create a ticket and the sender that completes it.
    pub fn pair() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A ticket that is already complete.
    pub fn ready() -> Self {
        let (tx, ticket) = Self::pair();
        let _ = tx.send(());
        ticket
    }

    /// Wait for the engine to finish placing nodes.
    pub async fn wait(self) -> Result<()> {
        self.rx.await.map_err(|_| Error::LayoutCancelled)
    }
}

/// What the graph view needs from a rendering backend.
pub trait LayoutEngine {
    fn insert_node(&mut self, node: &NodeData);
    fn update_node(&mut self, node: &NodeData);
    fn remove_nodes(&mut self, ids: &[StageId]);
    /// Add a directed edge `from → to`.
    fn insert_edge(&mut self, from: &StageId, to: &StageId);
    fn remove_edges(&mut self, edges: &[(StageId, StageId)]);
    /// Start placing nodes; the ticket resolves when placement is done.
    fn relayout(&mut self) -> LayoutTicket;
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    /// Move the camera so every node is visible.
    fn fit(&mut self);
    /// Centre the camera on one node at the given zoom.
    fn focus(&mut self, id: &StageId, scale: f64);
    /// Release the engine's resources. The engine is unusable afterwards.
    fn destroy(&mut self);
}

/// In-process engine with top-down hierarchical placement.
///
/// Every re-layout refits the camera, the way a real renderer jumps the view
/// after its options change, and signals completion from a spawned task
/// when a tokio runtime is available.
#[derive(Debug)]
pub struct HeadlessLayout {
    nodes: HashMap<StageId, NodeData>,
    edges: Vec<(StageId, StageId)>,
    positions: HashMap<StageId, Position>,
    viewport: Viewport,
    canvas: (f64, f64),
    layouts: usize,
    destroyed: bool,
}

impl Default for HeadlessLayout {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

impl HeadlessLayout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            positions: HashMap::new(),
            viewport: Viewport::default(),
            canvas: (width, height),
            layouts: 0,
            destroyed: false,
        }
    }

    pub fn node(&self, id: &StageId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn position(&self, id: &StageId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// How many re-layout passes have run.
    pub fn layout_count(&self) -> usize {
        self.layouts
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Place nodes: leaves take consecutive slots left to right and every
    /// parent sits centred above its children.
    fn place(&mut self) {
        let mut children: HashMap<&StageId, Vec<&StageId>> = HashMap::new();
        let mut has_parent: HashSet<&StageId> = HashSet::new();
        for (from, to) in &self.edges {
            children.entry(from).or_default().push(to);
            has_parent.insert(to);
        }

        let mut roots: Vec<&StageId> = self
            .nodes
            .keys()
            .filter(|id| !has_parent.contains(id))
            .collect();
        roots.sort();

        let mut positions = HashMap::new();
        let mut seen: HashSet<&StageId> = HashSet::new();
        let mut next_slot = 0.0;

        for root in roots {
            // Iterative post-order: (node, depth, children already pushed).
            let mut stack: Vec<(&StageId, usize, bool)> = vec![(root, 0, false)];
            while let Some((id, depth, expanded)) = stack.pop() {
                if expanded {
                    let kids: Vec<f64> = children
                        .get(id)
                        .map(|k| {
                            k.iter()
                                .filter_map(|c| positions.get(*c).map(|p: &Position| p.x))
                                .collect()
                        })
                        .unwrap_or_default();
                    let x = if kids.is_empty() {
                        let x = next_slot * NODE_SPACING;
                        next_slot += 1.0;
                        x
                    } else {
                        let min = kids.iter().cloned().fold(f64::INFINITY, f64::min);
                        let max = kids.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                        (min + max) / 2.0
                    };
                    positions.insert(
                        id.clone(),
                        Position {
                            x,
                            y: depth as f64 * LEVEL_SEPARATION,
                        },
                    );
                    continue;
                }
                if !self.nodes.contains_key(id) || !seen.insert(id) {
                    continue;
                }
                stack.push((id, depth, true));
                if let Some(kids) = children.get(id) {
                    for kid in kids.iter().rev() {
                        if !seen.contains(kid) {
                            stack.push((kid, depth + 1, false));
                        }
                    }
                }
            }
        }
        self.positions = positions;
    }
}

impl LayoutEngine for HeadlessLayout {
    fn insert_node(&mut self, node: &NodeData) {
        self.nodes.insert(node.id.clone(), node.clone());
    }

    fn update_node(&mut self, node: &NodeData) {
        if let Some(existing) = self.nodes.get_mut(&node.id) {
            *existing = node.clone();
        }
    }

    fn remove_nodes(&mut self, ids: &[StageId]) {
        for id in ids {
            self.nodes.remove(id);
            self.positions.remove(id);
        }
    }

    fn insert_edge(&mut self, from: &StageId, to: &StageId) {
        self.edges.push((from.clone(), to.clone()));
    }

    fn remove_edges(&mut self, edges: &[(StageId, StageId)]) {
        self.edges.retain(|e| !edges.contains(e));
    }

    fn relayout(&mut self) -> LayoutTicket {
        self.place();
        self.fit();
        self.layouts += 1;
        glog_trace!("HeadlessLayout: pass {} placed {} nodes", self.layouts, self.positions.len());

        let (tx, ticket) = LayoutTicket::pair();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    let _ = tx.send(());
                });
            }
            Err(_) => {
                let _ = tx.send(());
            }
        }
        ticket
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn fit(&mut self) {
        if self.positions.is_empty() {
            self.viewport = Viewport::default();
            return;
        }
        let xs = self.positions.values().map(|p| p.x);
        let ys = self.positions.values().map(|p| p.y);
        let (min_x, max_x) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let (min_y, max_y) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let width = max_x - min_x + FIT_MARGIN;
        let height = max_y - min_y + FIT_MARGIN;
        let scale = (self.canvas.0 / width)
            .min(self.canvas.1 / height)
            .min(MAX_FIT_SCALE);
        self.viewport = Viewport {
            x: (min_x + max_x) / 2.0,
            y: (min_y + max_y) / 2.0,
            scale,
        };
    }

    fn focus(&mut self, id: &StageId, scale: f64) {
        if let Some(pos) = self.positions.get(id) {
            self.viewport = Viewport {
                x: pos.x,
                y: pos.y,
                scale,
            };
        }
    }

    fn destroy(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.positions.clear();
        self.destroyed = true;
    }
}
