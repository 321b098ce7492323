//! Graph view adapter.
//!
//! `GraphView` mirrors one task's stage tree as nodes and directed
//! parent→child edges and keeps a layout engine in step with it. After the
//! initial build every edit is applied as a targeted patch so the camera the
//! user has set survives: the viewport is captured before the patch and put
//! back once the engine reports that re-layout has finished.
//!
//! The mirror is a petgraph `StableDiGraph`, whose node indices stay valid
//! across removals, with an index from stage ID to node.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

use super::layout::{LayoutEngine, Viewport};
use super::node::{NodeData, NodePatch};
use crate::config::DEFAULT_LABEL_WIDTH;
use crate::core::{Stage, StageId, StageTree, Task, TaskId};
use crate::error::{Error, Result};
use crate::{glog_debug, glog_trace};

/// Zoom used when centring on the deepest stage.
pub const FOCUS_SCALE: f64 = 1.0;

/// The live mirror of one task, present only while materialized.
struct Mirror<L> {
    task_id: TaskId,
    engine: L,
    graph: StableDiGraph<NodeData, ()>,
    index: HashMap<StageId, NodeIndex>,
}

impl<L: LayoutEngine> Mirror<L> {
    fn add_node(&mut self, node: NodeData) -> NodeIndex {
        if let Some(&existing) = self.index.get(&node.id) {
            return existing;
        }
        self.engine.insert_node(&node);
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.index.insert(id, index);
        index
    }

    fn add_edge(&mut self, from: &StageId, to: &StageId) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if self.graph.find_edge(a, b).is_some() {
            return false;
        }
        self.graph.add_edge(a, b, ());
        self.engine.insert_edge(from, to);
        true
    }

    /// `start` and everything reachable from it along mirror edges.
    fn closure(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if !seen.contains(&next) {
                    stack.push(next);
                }
            }
        }
        out
    }

    fn stage_id(&self, index: NodeIndex) -> Option<StageId> {
        self.graph.node_weight(index).map(|n| n.id.clone())
    }
}

/// Adapter state: `Empty` until [`GraphView::materialize`], then
/// `Materialized` until [`GraphView::destroy`].
enum ViewState<L> {
    Empty,
    Materialized(Mirror<L>),
}

/// Incrementally updated node/edge view of one task's stages.
pub struct GraphView<L: LayoutEngine> {
    state: ViewState<L>,
    make_engine: Box<dyn Fn() -> L + Send>,
    label_width: usize,
}

impl<L: LayoutEngine> GraphView<L> {
    /// Create an empty view. `make_engine` is called on every materialize.
    pub fn new(make_engine: impl Fn() -> L + Send + 'static) -> Self {
        Self {
            state: ViewState::Empty,
            make_engine: Box::new(make_engine),
            label_width: DEFAULT_LABEL_WIDTH,
        }
    }

    pub fn with_label_width(mut self, width: usize) -> Self {
        self.label_width = width;
        self
    }

    pub fn label_width(&self) -> usize {
        self.label_width
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.state, ViewState::Materialized(_))
    }

    /// Task currently shown, if any.
    pub fn task_id(&self) -> Option<&TaskId> {
        match &self.state {
            ViewState::Materialized(m) => Some(&m.task_id),
            ViewState::Empty => None,
        }
    }

    pub fn engine(&self) -> Option<&L> {
        match &self.state {
            ViewState::Materialized(m) => Some(&m.engine),
            ViewState::Empty => None,
        }
    }

    pub fn engine_mut(&mut self) -> Option<&mut L> {
        match &mut self.state {
            ViewState::Materialized(m) => Some(&mut m.engine),
            ViewState::Empty => None,
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.engine().map(|e| e.viewport())
    }

    pub fn node(&self, id: &StageId) -> Option<&NodeData> {
        let ViewState::Materialized(m) = &self.state else {
            return None;
        };
        m.index.get(id).and_then(|&i| m.graph.node_weight(i))
    }

    pub fn node_ids(&self) -> HashSet<StageId> {
        match &self.state {
            ViewState::Materialized(m) => m.index.keys().cloned().collect(),
            ViewState::Empty => HashSet::new(),
        }
    }

    /// Every edge as a `(parent, child)` pair.
    pub fn edge_pairs(&self) -> HashSet<(StageId, StageId)> {
        let ViewState::Materialized(m) = &self.state else {
            return HashSet::new();
        };
        m.graph
            .edge_references()
            .filter_map(|e| Some((m.stage_id(e.source())?, m.stage_id(e.target())?)))
            .collect()
    }

    fn mirror_mut(&mut self, op: &'static str) -> Result<&mut Mirror<L>> {
        match &mut self.state {
            ViewState::Materialized(m) => Ok(m),
            ViewState::Empty => Err(Error::InvalidViewState { state: "empty", op }),
        }
    }

    /// Build the view of `task` from scratch.
    ///
    /// Any previous view is torn down first. The task gets a root stage if
    /// it has none. Nodes are created in pre-order from root; stages that
    /// root cannot reach are left out. Ends with the camera fitted to the
    /// whole graph.
    pub async fn materialize(&mut self, task: &mut Task) -> Result<()> {
        self.destroy();
        task.ensure_root();

        let mut mirror = Mirror {
            task_id: task.id.clone(),
            engine: (self.make_engine)(),
            graph: StableDiGraph::new(),
            index: HashMap::new(),
        };

        let order = task.stages.preorder();
        for (id, _) in &order {
            if let Some(stage) = task.stages.get(id) {
                mirror.add_node(NodeData::from_stage(stage, self.label_width));
            }
        }
        for (id, _) in &order {
            if let Some(parent) = task.stages.parent_of(id) {
                mirror.add_edge(parent, id);
            }
        }

        glog_debug!(
            "GraphView::materialize task={} nodes={} edges={}",
            task.id,
            mirror.graph.node_count(),
            mirror.graph.edge_count()
        );

        let ticket = mirror.engine.relayout();
        self.state = ViewState::Materialized(mirror);
        ticket.wait().await?;

        if let Ok(m) = self.mirror_mut("fit") {
            m.engine.fit();
        }
        Ok(())
    }

    /// Add one stage under `parent` and restore the camera afterwards.
    ///
    /// Fails with [`Error::StageNotFound`] if `parent` is not in the view,
    /// leaving the view unchanged.
    pub async fn patch_add(&mut self, stage: &Stage, parent: &StageId) -> Result<()> {
        let width = self.label_width;
        let mirror = self.mirror_mut("add a node")?;
        if !mirror.index.contains_key(parent) {
            return Err(Error::StageNotFound(parent.to_string()));
        }
        let saved = mirror.engine.viewport();

        mirror.add_node(NodeData::from_stage(stage, width));
        mirror.add_edge(parent, &stage.id);

        let ticket = mirror.engine.relayout();
        ticket.wait().await?;

        let mirror = self.mirror_mut("restore the viewport")?;
        mirror.engine.set_viewport(saved);
        glog_trace!("GraphView::patch_add stage={} parent={}", stage.id, parent);
        Ok(())
    }

    /// Merge visual changes into one node. Returns `false` if the node is
    /// not in the view. No re-layout is needed.
    pub fn patch_update(&mut self, id: &StageId, patch: &NodePatch) -> Result<bool> {
        let mirror = self.mirror_mut("update a node")?;
        let Some(&index) = mirror.index.get(id) else {
            return Ok(false);
        };
        let saved = mirror.engine.viewport();

        if let Some(node) = mirror.graph.node_weight_mut(index) {
            if node.apply(patch) {
                mirror.engine.update_node(node);
            }
        }

        mirror.engine.set_viewport(saved);
        glog_trace!("GraphView::patch_update stage={}", id);
        Ok(true)
    }

    /// Remove a node together with everything reachable from it along view
    /// edges, and every edge touching a removed node.
    ///
    /// Returns the removed stage IDs; empty if `id` is not in the view.
    pub async fn patch_remove(&mut self, id: &StageId) -> Result<Vec<StageId>> {
        let mirror = self.mirror_mut("remove a node")?;
        let Some(&start) = mirror.index.get(id) else {
            return Ok(Vec::new());
        };
        let saved = mirror.engine.viewport();

        let doomed = mirror.closure(start);
        let doomed_set: HashSet<NodeIndex> = doomed.iter().copied().collect();

        let mut edges = Vec::new();
        for &n in &doomed {
            for dir in [Direction::Outgoing, Direction::Incoming] {
                for e in mirror.graph.edges_directed(n, dir) {
                    let pair = (e.source(), e.target());
                    if dir == Direction::Incoming && doomed_set.contains(&pair.0) {
                        continue;
                    }
                    if let (Some(a), Some(b)) = (mirror.stage_id(pair.0), mirror.stage_id(pair.1)) {
                        edges.push((a, b));
                    }
                }
            }
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for n in doomed {
            if let Some(node) = mirror.graph.remove_node(n) {
                mirror.index.remove(&node.id);
                removed.push(node.id);
            }
        }

        mirror.engine.remove_edges(&edges);
        mirror.engine.remove_nodes(&removed);

        let ticket = mirror.engine.relayout();
        ticket.wait().await?;

        let mirror = self.mirror_mut("restore the viewport")?;
        mirror.engine.set_viewport(saved);
        glog_trace!(
            "GraphView::patch_remove stage={} removed={} edges={}",
            id,
            removed.len(),
            edges.len()
        );
        Ok(removed)
    }

    /// Centre on the first of the deepest stages, or fit the whole graph if
    /// there is none in view. Returns the stage focused on.
    pub fn focus_deepest(&mut self, tree: &StageTree) -> Result<Option<StageId>> {
        let mirror = self.mirror_mut("focus")?;
        let target = tree
            .find_deepest()
            .into_iter()
            .find(|id| mirror.index.contains_key(id));
        match &target {
            Some(id) => mirror.engine.focus(id, FOCUS_SCALE),
            None => mirror.engine.fit(),
        }
        Ok(target)
    }

    /// Tear the view down and release the engine. Safe to call when empty.
    pub fn destroy(&mut self) {
        if let ViewState::Materialized(mut m) = std::mem::replace(&mut self.state, ViewState::Empty) {
            glog_debug!("GraphView::destroy task={}", m.task_id);
            m.engine.destroy();
        }
    }
}
