//! Task CLI commands
//!
//! These edit the local hierarchy (`.subnav/tasks.jsonl`). Navigation picks
//! up the changes once cached children lists go stale, or straight away for
//! a task that is no longer where the cache last saw it.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{TaskId, TaskRecord};
use crate::storage::{Project, SourceKind, TaskStore};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task (root task, or a subtask with --parent)
    ///
    /// Examples:
    ///   subnav task add "Launch"              # Root task
    ///   subnav task add "Write docs" -p 1     # Subtask of task 1
    Add {
        /// Task name
        name: String,

        /// Parent task ID
        #[arg(long, short)]
        parent: Option<String>,

        /// Explicit task ID (defaults to the next free number)
        #[arg(long)]
        id: Option<String>,
    },

    /// List tasks (the whole tree, or one task's subtasks)
    List {
        /// Only list subtasks of this task
        #[arg(long, short)]
        parent: Option<String>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Move a task under a new parent, or to the root
    Move {
        /// Task ID
        id: String,

        /// New parent task ID
        #[arg(long, short, conflicts_with = "root", required_unless_present = "root")]
        parent: Option<String>,

        /// Make the task a root task
        #[arg(long)]
        root: bool,
    },

    /// Rename a task
    Rename {
        /// Task ID
        id: String,

        /// New name
        name: String,
    },

    /// Remove a task and all of its subtasks
    Rm {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    if project.config().project.source != SourceKind::Local {
        bail!(
            "Task commands edit the local hierarchy, but this project uses source = \"{}\"",
            project.config().project.source.as_str()
        );
    }
    let store = project.task_store();

    match cmd {
        TaskCommands::Add { name, parent, id } => {
            add_task(output, &store, &name, parent.as_deref(), id.as_deref())
        }
        TaskCommands::List { parent } => list_tasks(output, &store, parent.as_deref()),
        TaskCommands::Show { id } => show_task(output, &store, &id),
        TaskCommands::Move { id, parent, root: _ } => move_task(output, &store, &id, parent.as_deref()),
        TaskCommands::Rename { id, name } => rename_task(output, &store, &id, &name),
        TaskCommands::Rm { id } => remove_task(output, &store, &id),
    }
}

fn parse_id(s: &str) -> Result<TaskId> {
    s.parse().with_context(|| format!("Invalid task ID: '{}'", s))
}

fn add_task(
    output: &Output,
    store: &TaskStore,
    name: &str,
    parent: Option<&str>,
    id: Option<&str>,
) -> Result<()> {
    let id = match id {
        Some(id) => parse_id(id)?,
        None => store.next_id()?,
    };
    let task = match parent {
        Some(parent) => TaskRecord::child_of(id, name, parse_id(parent)?),
        None => TaskRecord::new(id, name),
    };

    output.verbose_ctx("task", &format!("Adding task {} under {:?}", task.id, task.parent));
    store.add(&task)?;

    if output.is_json() {
        output.data(&task);
    } else {
        match &task.parent {
            Some(parent) => output.success(&format!(
                "Created task: {} - {} (under {})",
                task.id, task.name, parent
            )),
            None => output.success(&format!("Created task: {} - {}", task.id, task.name)),
        }
    }

    Ok(())
}

fn list_tasks(output: &Output, store: &TaskStore, parent: Option<&str>) -> Result<()> {
    let tasks = match parent {
        Some(parent) => {
            let parent = parse_id(parent)?;
            if store.get(&parent)?.is_none() {
                bail!("Task not found: {}", parent);
            }
            store.children(&parent)?
        }
        None => store.read_all()?,
    };

    if output.is_json() {
        output.data(&tasks);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    if parent.is_some() {
        for (idx, task) in tasks.iter().enumerate() {
            println!("{:>3}. {:<8} {}", idx + 1, task.id, task.name);
        }
    } else {
        print_tree(&tasks);
    }

    Ok(())
}

/// Prints tasks as an indented tree, children in store order
fn print_tree(tasks: &[TaskRecord]) {
    let mut children: HashMap<Option<&TaskId>, Vec<&TaskRecord>> = HashMap::new();
    for task in tasks {
        children.entry(task.parent.as_ref()).or_default().push(task);
    }

    // Orphans (parent missing from the store) are shown as roots
    let known: HashSet<&TaskId> = tasks.iter().map(|t| &t.id).collect();
    let roots: Vec<&TaskRecord> = tasks
        .iter()
        .filter(|t| !matches!(&t.parent, Some(p) if known.contains(p)))
        .collect();

    let mut stack: Vec<(&TaskRecord, usize)> = roots.into_iter().rev().map(|t| (t, 0)).collect();
    while let Some((task, depth)) = stack.pop() {
        println!("{}{:<8} {}", "  ".repeat(depth), task.id, task.name);
        if let Some(kids) = children.get(&Some(&task.id)) {
            stack.extend(kids.iter().rev().map(|t| (*t, depth + 1)));
        }
    }
}

fn show_task(output: &Output, store: &TaskStore, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let task = store
        .get(&id)?
        .with_context(|| format!("Task not found: {}", id))?;
    let children = store.children(&id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "name": task.name,
            "parent": task.parent,
            "children": children.iter().map(|c| &c.id).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("Task: {}", task.id);
    println!("Name: {}", task.name);
    match &task.parent {
        Some(parent) => {
            let siblings = store.children(parent)?;
            let position = siblings.iter().position(|s| s.id == task.id);
            match position {
                Some(idx) => println!("Parent: {} ({} / {})", parent, idx + 1, siblings.len()),
                None => println!("Parent: {}", parent),
            }
        }
        None => println!("Parent: (root)"),
    }

    if !children.is_empty() {
        println!();
        println!("Subtasks:");
        for child in &children {
            println!("  {:<8} {}", child.id, child.name);
        }
    }

    Ok(())
}

fn move_task(output: &Output, store: &TaskStore, id: &str, parent: Option<&str>) -> Result<()> {
    let id = parse_id(id)?;
    let parent = parent.map(parse_id).transpose()?;

    let task = store.reparent(&id, parent.as_ref())?;

    if output.is_json() {
        output.data(&task);
    } else {
        match &task.parent {
            Some(parent) => output.success(&format!("Moved task {} under {}", task.id, parent)),
            None => output.success(&format!("Moved task {} to the root", task.id)),
        }
    }

    Ok(())
}

fn rename_task(output: &Output, store: &TaskStore, id: &str, name: &str) -> Result<()> {
    let id = parse_id(id)?;
    store.rename(&id, name)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id, "name": name }));
    } else {
        output.success(&format!("Renamed task {} to {}", id, name));
    }

    Ok(())
}

fn remove_task(output: &Output, store: &TaskStore, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let removed = store.remove(&id)?;
    if removed == 0 {
        bail!("Task not found: {}", id);
    }

    if output.is_json() {
        output.data(&serde_json::json!({ "id": id, "removed": removed }));
    } else if removed == 1 {
        output.success(&format!("Removed task {}", id));
    } else {
        output.success(&format!("Removed task {} and {} subtask(s)", id, removed - 1));
    }

    Ok(())
}
