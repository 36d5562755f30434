//! Command dispatch
//!
//! The dispatcher is the single entry point for navigation. It runs at most
//! one command at a time: a command that arrives while another is in flight
//! is dropped, not queued. Each dispatch reads the current task from the
//! page, resolves context, computes the outcome, asks the router to move,
//! records the new position once the move happened, persists the cache and
//! reports the result to the notifier.
//!
//! ```text
//! Idle --dispatch--> Busy --(any exit, including errors)--> Idle
//! ```

use std::cell::{Cell, Ref, RefCell};

use crate::domain::navigation::{self, Move};
use crate::domain::{Command, Outcome, Resolution, Sibling, TaskId};
use crate::hierarchy::HierarchyClient;
use crate::storage::{NavCache, SessionBackend};

use super::clock::{Clock, SystemClock};
use super::collab::{Collaborators, Router};
use super::error::NavError;
use super::resolver::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Busy,
}

/// Holds the dispatcher busy; returns it to idle when dropped
pub struct BusyGuard<'a> {
    state: &'a Cell<DispatchState>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.set(DispatchState::Idle);
    }
}

/// What one dispatch did
#[derive(Debug)]
pub enum Report {
    /// Another command was in flight
    Dropped,
    /// The page is not showing a task
    NoTask,
    /// The router moved to `target`
    Moved { target: TaskId, message: String },
    /// Nothing to move to (boundary or no children)
    Stayed { message: String },
    Failed(NavError),
}

impl Report {
    /// Status line for the notifier, if any
    pub fn message(&self) -> Option<String> {
        match self {
            Report::Dropped | Report::NoTask => None,
            Report::Moved { message, .. } | Report::Stayed { message } => Some(message.clone()),
            Report::Failed(err) => Some(err.message().to_string()),
        }
    }

    /// Returns true for boundary and error reports
    pub fn is_boundary(&self) -> bool {
        matches!(self, Report::Stayed { .. } | Report::Failed(_))
    }
}

pub struct Dispatcher<H, S, C = SystemClock> {
    resolver: Resolver<H, C>,
    cache: RefCell<NavCache>,
    session: S,
    state: Cell<DispatchState>,
}

impl<H: HierarchyClient, S: SessionBackend, C: Clock> Dispatcher<H, S, C> {
    pub fn new(resolver: Resolver<H, C>, cache: NavCache, session: S) -> Self {
        Self {
            resolver,
            cache: RefCell::new(cache),
            session,
            state: Cell::new(DispatchState::Idle),
        }
    }

    /// Creates a dispatcher over the cache stored in `session`
    pub fn load(resolver: Resolver<H, C>, session: S, capacity: usize) -> Self {
        let cache = NavCache::load(&session, capacity);
        Self::new(resolver, cache, session)
    }

    pub fn state(&self) -> DispatchState {
        self.state.get()
    }

    /// Enters the busy state, or `None` if already busy
    pub fn try_begin(&self) -> Option<BusyGuard<'_>> {
        if self.state.get() == DispatchState::Busy {
            return None;
        }
        self.state.set(DispatchState::Busy);
        Some(BusyGuard { state: &self.state })
    }

    pub fn cache(&self) -> Ref<'_, NavCache> {
        self.cache.borrow()
    }

    pub fn resolver(&self) -> &Resolver<H, C> {
        &self.resolver
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Persists the cache; failures are logged and discarded
    pub fn persist(&self) {
        if let Err(e) = self.cache.borrow().persist(&self.session) {
            tracing::warn!(error = %e, "failed to persist navigation cache");
        }
    }

    /// Resolves where `task` sits without moving
    pub fn locate(&self, task: &TaskId) -> Result<Option<Resolution>, NavError> {
        let resolution = {
            let mut cache = self.cache.borrow_mut();
            self.resolver.resolve_parent_and_siblings(&mut cache, task)
        };
        self.persist();
        Ok(resolution?)
    }

    /// Children of `task`, served from cache while fresh
    pub fn children(&self, task: &TaskId) -> Result<Vec<Sibling>, NavError> {
        let children = {
            let mut cache = self.cache.borrow_mut();
            self.resolver.resolve_children(&mut cache, task)
        };
        self.persist();
        Ok(children?)
    }

    /// Runs one navigation command
    pub fn dispatch(&self, command: Command, collab: &Collaborators<'_>) -> Report {
        let Some(_busy) = self.try_begin() else {
            tracing::debug!(command = command.label(), "dropped, navigation in flight");
            return Report::Dropped;
        };

        let Some(task) = collab.page.current_task_id() else {
            tracing::debug!(command = command.label(), "no current task");
            return Report::NoTask;
        };

        tracing::debug!(command = command.label(), %task, "dispatching");
        let planned = self.plan(command, &task);
        self.persist();

        let report = match planned {
            Ok(Outcome::Move(mv)) => self.apply(mv, collab.router),
            Ok(outcome) => Report::Stayed {
                message: outcome.message(),
            },
            Err(err) => {
                log_failure(&task, &err);
                Report::Failed(err)
            }
        };

        if let Some(message) = report.message() {
            collab.notifier.show(&message, report.is_boundary());
        }
        report
    }

    fn plan(&self, command: Command, task: &TaskId) -> Result<Outcome, NavError> {
        let mut cache = self.cache.borrow_mut();

        let resolution = match command {
            Command::ToChild => {
                let children = self.resolver.resolve_children(&mut cache, task)?;
                return Ok(navigation::to_child(
                    task,
                    &children,
                    cache.get_last_visited(task),
                ));
            }
            _ => self
                .resolver
                .resolve_parent_and_siblings(&mut cache, task)?
                .ok_or_else(|| NavError::NoParent(task.clone()))?,
        };

        let located = || {
            resolution.located().ok_or_else(|| NavError::SiblingNotFound {
                task: task.clone(),
                truncated: resolution.at_page_limit(),
            })
        };

        Ok(match command {
            Command::Step(direction) => navigation::step(located()?, direction),
            Command::Edge(edge) => navigation::edge(located()?, edge),
            // ToChild returned above
            Command::ToParent | Command::ToChild => navigation::to_parent(&resolution, task),
        })
    }

    fn apply(&self, mv: Move, router: &dyn Router) -> Report {
        if !router.navigate_to(&mv.target) {
            tracing::warn!(task = %mv.target, "router rejected move");
            return Report::Failed(NavError::RouterRejected(mv.target));
        }

        if let Some(remember) = mv.remember {
            self.cache
                .borrow_mut()
                .set_last_visited(&remember.parent, remember.visit);
            self.persist();
        }

        tracing::info!(task = %mv.target, placement = %mv.placement, "moved");
        Report::Moved {
            message: mv.placement.to_string(),
            target: mv.target,
        }
    }
}

fn log_failure(task: &TaskId, err: &NavError) {
    match err {
        NavError::Transport(detail) => tracing::error!(%task, detail = %detail, "hierarchy request failed"),
        NavError::NoParent(_) => tracing::debug!(%task, "no parent"),
        _ => tracing::info!(%task, error = %err, "navigation failed"),
    }
}
