//! Navigation commands
//!
//! `.subnav/state.json` is the current task. `goto` sets it, `where` reports
//! it, and the six movement commands read it, move through the dispatcher
//! and write the target back.

use anyhow::{anyhow, bail, Context, Result};

use super::output::{Output, OutputNotifier};
use crate::domain::{Command, TaskId};
use crate::hierarchy::{self, HierarchyClient, HierarchyError};
use crate::nav::{Collaborators, Dispatcher, Location, PageContext, Report, Resolver};
use crate::storage::{FileSession, Project};

/// The dispatcher a CLI process works with
pub type CliDispatcher = Dispatcher<Box<dyn HierarchyClient>, FileSession>;

/// Builds a dispatcher over the project's backend and session cache
pub fn open_dispatcher(project: &Project, session: Option<&str>) -> Result<CliDispatcher> {
    let name = FileSession::resolve_name(session);
    let session = project.session(&name)?;
    let cache = &project.config().project.cache;

    let client = hierarchy::open(project)?;
    let resolver = Resolver::new(client, cache.ttl());
    tracing::debug!(session = %name, path = %session.path().display(), "opening session");

    Ok(Dispatcher::load(resolver, session, cache.capacity))
}

/// Runs one of the six movement commands
pub fn navigate(output: &Output, session: Option<&str>, command: Command, at: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let dispatcher = open_dispatcher(&project, session)?;
    output.verbose_ctx(command.label(), &format!("at={:?}", at));

    let state = project.state();
    let location = at.map(Location::new);
    let page: &dyn PageContext = match &location {
        Some(location) => location,
        None => &state,
    };
    let notifier = OutputNotifier::new(output);
    let collab = Collaborators {
        page,
        router: &state,
        notifier: &notifier,
    };

    let report = dispatcher.dispatch(command, &collab);

    if output.is_json() {
        print_report(output, command, &report);
    }

    match report {
        Report::Moved { .. } | Report::Stayed { .. } => Ok(()),
        Report::NoTask => match at {
            Some(at) => bail!("Not a task location: {}", at),
            None => bail!("No current task. Run 'subnav goto <id>' or pass --at"),
        },
        Report::Dropped => bail!("Another navigation is in progress"),
        Report::Failed(err) => Err(anyhow!(err)),
    }
}

fn print_report(output: &Output, command: Command, report: &Report) {
    let (moved, target) = match report {
        Report::Moved { target, .. } => (true, Some(target)),
        _ => (false, None),
    };

    output.data(&serde_json::json!({
        "command": command.label(),
        "moved": moved,
        "target": target,
        "message": report.message(),
        "boundary": report.is_boundary(),
    }));
}

/// Sets the current task
pub fn goto(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let id: TaskId = id
        .parse()
        .with_context(|| format!("Invalid task ID: '{}'", id))?;

    let client = hierarchy::open(&project)?;
    match client.get_task(&id) {
        Ok(_) => {}
        Err(HierarchyError::NotFound(_)) => bail!("Task not found: {}", id),
        Err(e) => return Err(e).context("Failed to look up task"),
    }

    project.state().set_current(&id)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "current": id }));
    } else {
        output.success(&format!("Now at task {}", id));
    }
    Ok(())
}

/// Reports the current task and where it sits among its siblings
pub fn where_am_i(output: &Output, session: Option<&str>, at: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;

    let task = match at {
        Some(at) => Location::new(at)
            .current_task_id()
            .with_context(|| format!("Not a task location: {}", at))?,
        None => project
            .state()
            .current()?
            .context("No current task. Run 'subnav goto <id>' first")?,
    };

    let dispatcher = open_dispatcher(&project, session)?;
    let resolution = dispatcher.locate(&task).map_err(|e| anyhow!(e))?;

    let name = resolution.as_ref().and_then(|res| {
        res.siblings
            .iter()
            .find(|s| s.id == task)
            .map(|s| s.name.clone())
    });

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "name": name,
            "parent": resolution.as_ref().map(|r| &r.parent_id),
            "position": resolution.as_ref().and_then(|r| r.idx).map(|i| i + 1),
            "total": resolution.as_ref().map(|r| r.siblings.len()),
        }));
        return Ok(());
    }

    match name {
        Some(name) if !name.is_empty() => println!("Task:     {} - {}", task, name),
        _ => println!("Task:     {}", task),
    }
    match &resolution {
        None => println!("Parent:   (root)"),
        Some(res) => {
            println!("Parent:   {}", res.parent_id);
            match res.idx {
                Some(idx) => println!("Position: {} / {}", idx + 1, res.siblings.len()),
                None if res.at_page_limit() => println!("Position: unknown (100+ siblings)"),
                None => println!("Position: not found among siblings"),
            }
        }
    }

    Ok(())
}
