use std::collections::HashSet;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use grove::config::Config;
use grove::core::{Status, Task, TaskId};
use grove::license::{GateEvent, LicenseFile, LicenseMonitor, ValidityGate};
use grove::store::{JsonFileStore, Store};
use grove::view::{GraphView, HeadlessLayout, LayoutEngine};
use grove::{glog, App, Error, Result};

type CliApp = App<JsonFileStore, Arc<LicenseFile>, HeadlessLayout>;

/// Grove - break tasks down into trees of stages
#[derive(Parser, Debug)]
#[command(name = "grove")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    GROVE_DEBUG=1     Enable debug logging (alternative to --debug)\n    GROVE_HOME        Data directory (default ~/.grove)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.grove/grove.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List tasks by status, then name
    List,

    /// Create a task
    Add {
        /// Task name
        name: String,
    },

    /// Rename a task (and its root stage)
    Rename {
        /// Task ID or unique ID prefix
        task: String,
        name: String,
    },

    /// Set a task's status
    Status {
        /// Task ID or unique ID prefix
        task: String,
        /// in-progress, waiting, completed, failed or frozen
        status: Status,
    },

    /// Delete a task
    Remove {
        /// Task ID or unique ID prefix
        task: String,
    },

    /// Print a task's stage tree; deepest stages are marked with '*'
    Show {
        /// Task ID or unique ID prefix
        task: String,
    },

    /// Edit the stages of a task
    #[command(subcommand)]
    Stage(StageCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum StageCommand {
    /// Add a child stage
    Add {
        task: String,
        /// Parent stage ID, ID prefix, or "root"
        parent: String,
        label: String,
    },

    /// Rename a stage
    Rename {
        task: String,
        stage: String,
        label: String,
    },

    /// Set a stage's status
    Status {
        task: String,
        stage: String,
        status: Status,
    },

    /// Delete a stage and everything below it
    Remove { task: String, stage: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    grove::log::init_with_debug(&Config::grove_dir()?, cli.debug, config.log_level);

    if cli.debug {
        glog!("Grove starting (debug mode enabled)");
    } else {
        glog!("Grove starting");
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(config, cli.command.unwrap_or(Command::List)));
    if let Err(e) = &result {
        glog!("Grove exiting with error: {}", e);
    }
    result
}

async fn run(config: Config, command: Command) -> Result<()> {
    let gate = Arc::new(LicenseFile::new(config.license_path()?));
    let store = JsonFileStore::new(config.data_path()?);
    let view = GraphView::new(HeadlessLayout::default)
        .with_label_width(config.effective_label_width());
    let mut app: CliApp = App::new(store, Arc::clone(&gate), view);

    app.start().await?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let monitor = LicenseMonitor::new(gate, events_tx, config.license_interval()).spawn();

    // Intents run to completion; each one asks the gate before it changes
    // anything, so a lost license is caught at the next intent.
    drain_gate_events(&mut app, &mut events);
    let outcome = execute(&mut app, command).await;
    drain_gate_events(&mut app, &mut events);
    monitor.shutdown();

    if let Some(notification) = app.take_notification() {
        eprintln!("{:?}: {}", notification.level, notification.message);
    }
    outcome
}

/// Hand every pending monitor event to the controller.
fn drain_gate_events<S, G, L>(app: &mut App<S, G, L>, events: &mut mpsc::UnboundedReceiver<GateEvent>)
where
    S: Store,
    G: ValidityGate,
    L: LayoutEngine,
{
    while let Ok(event) = events.try_recv() {
        app.handle_gate_event(event);
    }
}

async fn execute(app: &mut CliApp, command: Command) -> Result<()> {
    match command {
        Command::List => {
            print_tasks(&app.task_list());
            Ok(())
        }
        Command::Add { name } => {
            let id = app.add_task(&name).await?;
            println!("Created task {}", id);
            Ok(())
        }
        Command::Rename { task, name } => {
            let id = app.tasks().resolve(&task)?;
            app.edit_task(&id, &name).await?;
            Ok(())
        }
        Command::Status { task, status } => {
            let id = app.tasks().resolve(&task)?;
            app.change_task_status(&id, status).await?;
            Ok(())
        }
        Command::Remove { task } => {
            let id = app.tasks().resolve(&task)?;
            app.delete_task(&id).await?;
            println!("Deleted task {}", id);
            Ok(())
        }
        Command::Show { task } => {
            let id = open(app, &task).await?;
            if let Some(task) = app.tasks().get(&id) {
                print_tree(task);
            }
            Ok(())
        }
        Command::Stage(stage) => execute_stage(app, stage).await,
    }
}

async fn execute_stage(app: &mut CliApp, command: StageCommand) -> Result<()> {
    match command {
        StageCommand::Add {
            task,
            parent,
            label,
        } => {
            open(app, &task).await?;
            let parent = app.resolve_stage(&parent)?;
            let id = app
                .add_stage(&parent, &label)
                .await?
                .ok_or_else(|| Error::StageNotFound(parent.to_string()))?;
            println!("Created stage {}", id);
        }
        StageCommand::Rename { task, stage, label } => {
            open(app, &task).await?;
            let id = app.resolve_stage(&stage)?;
            app.rename_stage(&id, &label).await?;
        }
        StageCommand::Status {
            task,
            stage,
            status,
        } => {
            open(app, &task).await?;
            let id = app.resolve_stage(&stage)?;
            app.change_stage_status(&id, status).await?;
        }
        StageCommand::Remove { task, stage } => {
            open(app, &task).await?;
            let id = app.resolve_stage(&stage)?;
            let removed = app.delete_stage(&id).await?;
            println!("Deleted {} stage(s)", removed.len());
        }
    }
    Ok(())
}

async fn open(app: &mut CliApp, query: &str) -> Result<TaskId> {
    let id = app.tasks().resolve(query)?;
    app.open_task(&id).await?;
    Ok(id)
}

fn print_tasks(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks");
        return;
    }
    for task in tasks {
        println!(
            "{:<28} {:<12} {} ({} stages)",
            task.id,
            task.status.text(),
            task.name,
            task.stage_count()
        );
    }
}

fn print_tree(task: &Task) {
    println!("{} [{}]", task.name, task.status.text());
    let deepest: HashSet<_> = task.stages.find_deepest().into_iter().collect();
    for (id, depth) in task.stages.preorder() {
        let Some(stage) = task.stages.get(&id) else {
            continue;
        };
        let marker = if deepest.contains(&id) { "*" } else { " " };
        println!(
            "{}{} {} [{}] ({})",
            "  ".repeat(depth),
            marker,
            stage.label,
            stage.status.text(),
            stage.id
        );
    }
}
