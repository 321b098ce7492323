//! Application controller.
//!
//! `App` is built once at startup and owns the task collection, the graph
//! view and the two collaborators (storage and the validity gate). Every
//! user intent is a method on it. Task intents work on the collection;
//! stage intents work on the task currently on screen and patch the view
//! in place.
//!
//! Validity is checked before anything is changed. A closed gate puts the
//! app into a blocked state in which every intent fails with
//! `Error::LicenseInvalid`. A failed save does not undo the in-memory
//! change; it leaves a warning notification instead.

use crate::core::{sort_for_display, Stage, StageId, Status, Task, TaskCollection, TaskId};
use crate::license::{GateEvent, ValidityGate};
use crate::store::Store;
use crate::view::{GraphView, LayoutEngine, NodePatch};
use crate::{glog, glog_debug, glog_error, glog_warn, Error, Result};

/// Which screen is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    List,
    /// The stage graph of one task.
    Graph(TaskId),
}

/// Level of a notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Error,
    Warning,
    Info,
}

/// A message the UI should show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Entries of a stage's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageAction {
    AddChild,
    ChangeStatus,
    Rename,
    Delete,
}

pub struct App<S, G, L: LayoutEngine> {
    tasks: TaskCollection,
    view: GraphView<L>,
    store: S,
    gate: G,
    screen: Screen,
    blocked: bool,
    notification: Option<Notification>,
}

/// Trimmed copy of `input`, or a validation error if nothing is left.
fn require_text(input: &str, what: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

impl<S: Store, G: ValidityGate, L: LayoutEngine> App<S, G, L> {
    pub fn new(store: S, gate: G, view: GraphView<L>) -> Self {
        Self {
            tasks: TaskCollection::new(),
            view,
            store,
            gate,
            screen: Screen::List,
            blocked: false,
            notification: None,
        }
    }

    // ========== Accessors ==========

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    /// Tasks in task-list order.
    pub fn task_list(&self) -> Vec<&Task> {
        sort_for_display(self.tasks.tasks())
    }

    pub fn view(&self) -> &GraphView<L> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut GraphView<L> {
        &mut self.view
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The task whose graph is on screen.
    pub fn current_task(&self) -> Option<&Task> {
        match &self.screen {
            Screen::Graph(id) => self.tasks.get(id),
            Screen::List => None,
        }
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        match level {
            NotificationLevel::Error => glog_error!("{}", message),
            NotificationLevel::Warning => glog_warn!("{}", message),
            NotificationLevel::Info => glog!("{}", message),
        }
        self.notification = Some(Notification { level, message });
    }

    // ========== Gate and persistence ==========

    /// Fail if blocked, then ask the gate. A closed gate blocks the app.
    async fn ensure_open(&mut self) -> Result<()> {
        if self.blocked {
            return Err(Error::LicenseInvalid);
        }
        if !self.gate.check_valid().await {
            self.block();
            return Err(Error::LicenseInvalid);
        }
        Ok(())
    }

    fn block(&mut self) {
        self.blocked = true;
        self.view.destroy();
        self.screen = Screen::List;
        self.notify(
            NotificationLevel::Error,
            "License not found or invalid; the application is locked".to_string(),
        );
    }

    /// React to the background license monitor.
    pub fn handle_gate_event(&mut self, event: GateEvent) {
        match event {
            GateEvent::Invalidated => self.block(),
            GateEvent::Restored => {
                self.blocked = false;
                self.notify(NotificationLevel::Info, "License is valid again".to_string());
            }
        }
    }

    /// Write the whole collection. Returns whether the write succeeded.
    async fn persist(&mut self) -> bool {
        let snapshot = self.tasks.snapshot();
        let saved = self.store.save(&snapshot).await;
        if !saved {
            self.notify(
                NotificationLevel::Warning,
                "Could not save data; changes are kept in memory only".to_string(),
            );
        }
        saved
    }

    /// Check the gate, load stored tasks and seed an example task into an
    /// empty collection.
    pub async fn start(&mut self) -> Result<()> {
        self.ensure_open().await?;
        let snapshot = self.store.load().await;
        self.tasks = TaskCollection::from_snapshot(snapshot);
        glog!("App::start loaded {} tasks", self.tasks.len());

        if self.tasks.create_demo_task() {
            glog_debug!("App::start seeded example task");
            self.persist().await;
        }
        Ok(())
    }

    // ========== Screens ==========

    /// Show a task's stage graph, focused on its deepest stage.
    pub async fn open_task(&mut self, id: &TaskId) -> Result<Option<StageId>> {
        self.ensure_open().await?;
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let created_root = task.stages.root().is_none();
        self.view.materialize(task).await?;
        let focused = self.view.focus_deepest(&task.stages)?;
        self.screen = Screen::Graph(id.clone());
        glog_debug!("App::open_task id={} focused={:?}", id, focused);

        if created_root {
            self.persist().await;
        }
        Ok(focused)
    }

    /// Return to the task list, releasing the graph view.
    pub fn close_task(&mut self) {
        self.view.destroy();
        self.screen = Screen::List;
    }

    // ========== Task intents ==========

    pub async fn add_task(&mut self, name: &str) -> Result<TaskId> {
        let name = require_text(name, "Task name")?;
        self.ensure_open().await?;
        let id = self.tasks.add_task(&name).id.clone();
        glog_debug!("App::add_task id={} name={}", id, name);
        self.persist().await;
        Ok(id)
    }

    pub async fn edit_task(&mut self, id: &TaskId, name: &str) -> Result<bool> {
        let name = require_text(name, "Task name")?;
        self.ensure_open().await?;
        if !self.tasks.edit_task(id, &name) {
            glog_debug!("App::edit_task unknown id={}", id);
            return Ok(false);
        }
        if self.screen == Screen::Graph(id.clone()) {
            let patch = NodePatch::label(&name, self.view.label_width());
            self.view.patch_update(&StageId::root(), &patch)?;
        }
        self.persist().await;
        Ok(true)
    }

    /// Delete a task, leaving its graph first if it is on screen.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<bool> {
        self.ensure_open().await?;
        if self.screen == Screen::Graph(id.clone()) {
            self.close_task();
        }
        match self.tasks.delete_task(id) {
            Some(task) => {
                glog_debug!("App::delete_task id={} name={}", id, task.name);
                self.persist().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn change_task_status(&mut self, id: &TaskId, status: Status) -> Result<bool> {
        self.ensure_open().await?;
        if !self.tasks.change_task_status(id, status.clone()) {
            return Ok(false);
        }
        glog_debug!("App::change_task_status id={} status={}", id, status);
        self.persist().await;
        Ok(true)
    }

    // ========== Stage intents (current task) ==========

    fn current_id(&self) -> Result<TaskId> {
        match &self.screen {
            Screen::Graph(id) => Ok(id.clone()),
            Screen::List => Err(Error::Validation("no task is open".to_string())),
        }
    }

    fn current_task_mut(&mut self) -> Result<&mut Task> {
        let id = self.current_id()?;
        self.tasks
            .get_mut(&id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Resolve `"root"`, a full stage ID, or a unique ID prefix within the
    /// current task. Only stages reachable from root are candidates.
    pub fn resolve_stage(&self, query: &str) -> Result<StageId> {
        let task = self
            .current_task()
            .ok_or_else(|| Error::Validation("no task is open".to_string()))?;
        let live = task.stages.live_ids();
        let exact = StageId::from(query);
        if live.contains(&exact) {
            return Ok(exact);
        }
        let mut matches = live
            .iter()
            .filter(|id| !query.is_empty() && id.as_str().starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id.clone()),
            (Some(_), Some(_)) => Err(Error::Validation(format!(
                "stage prefix '{}' is ambiguous",
                query
            ))),
            (None, _) => Err(Error::StageNotFound(query.to_string())),
        }
    }

    /// Menu entries for a stage; root cannot be deleted.
    pub fn stage_actions(&self, id: &StageId) -> Vec<StageAction> {
        let exists = self
            .current_task()
            .map(|t| t.stages.live_ids().contains(id))
            .unwrap_or(false);
        if !exists {
            return Vec::new();
        }
        let mut actions = vec![StageAction::AddChild, StageAction::ChangeStatus, StageAction::Rename];
        if !id.is_root() {
            actions.push(StageAction::Delete);
        }
        actions
    }

    /// Add a child stage and its node. `None` if `parent` is not a stage
    /// shown in the graph, which includes stages root cannot reach.
    pub async fn add_stage(&mut self, parent: &StageId, label: &str) -> Result<Option<StageId>> {
        let label = require_text(label, "Stage name")?;
        self.ensure_open().await?;
        if self.view.node(parent).is_none() {
            glog_debug!("App::add_stage parent not in view: {}", parent);
            return Ok(None);
        }
        let task = self.current_task_mut()?;
        let Some(id) = task.add_stage(parent, &label) else {
            glog_debug!("App::add_stage unknown parent={}", parent);
            return Ok(None);
        };
        let stage: Stage = match task.stages.get(&id) {
            Some(stage) => stage.clone(),
            None => return Ok(None),
        };

        // The model already changed, so it is saved even if the view fails.
        let patched = self.view.patch_add(&stage, parent).await;
        glog_debug!("App::add_stage id={} parent={}", id, parent);
        self.persist().await;
        patched?;
        Ok(Some(id))
    }

    pub async fn rename_stage(&mut self, id: &StageId, label: &str) -> Result<bool> {
        let label = require_text(label, "Stage name")?;
        self.ensure_open().await?;
        if !self.current_task_mut()?.rename_stage(id, &label) {
            return Ok(false);
        }
        let patch = NodePatch::label(&label, self.view.label_width());
        let patched = self.view.patch_update(id, &patch);
        glog_debug!("App::rename_stage id={}", id);
        self.persist().await;
        patched?;
        Ok(true)
    }

    pub async fn change_stage_status(&mut self, id: &StageId, status: Status) -> Result<bool> {
        self.ensure_open().await?;
        let patch = NodePatch::status(&status);
        if !self.current_task_mut()?.change_stage_status(id, status) {
            return Ok(false);
        }
        let patched = self.view.patch_update(id, &patch);
        glog_debug!("App::change_stage_status id={}", id);
        self.persist().await;
        patched?;
        Ok(true)
    }

    /// Delete a stage subtree. Deleting root fails with
    /// `Error::RootStageProtected` and leaves an error notification.
    pub async fn delete_stage(&mut self, id: &StageId) -> Result<Vec<StageId>> {
        if id.is_root() {
            self.notify(
                NotificationLevel::Error,
                "The root stage cannot be deleted".to_string(),
            );
            return Err(Error::RootStageProtected);
        }
        self.ensure_open().await?;
        let removed = self.current_task_mut()?.delete_stage(id)?;
        if removed.is_empty() {
            return Ok(removed);
        }
        let patched = self.view.patch_remove(id).await;
        glog_debug!("App::delete_stage id={} removed={}", id, removed.len());
        self.persist().await;
        patched?;
        Ok(removed)
    }
}
