//! Navigation engine
//!
//! Pure computation over a resolved context: given where a task sits among
//! its siblings (or what its children are), decide where a command goes.
//! Nothing here touches the cache, the network or the router. The caller
//! applies the [`Remember`] record of a [`Move`] only after the move
//! actually happened.
//!
//! Sibling order is whatever the hierarchy returned; indices are never
//! computed against a re-sorted list.

use std::fmt;

use super::id::TaskId;
use super::task::{position_of, LastVisited, Sibling, PAGE_SIZE};

/// A navigation command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Previous or next sibling
    Step(Direction),
    /// First or last sibling
    Edge(Edge),
    /// The current task's parent
    ToParent,
    /// The remembered (or first) child of the current task
    ToChild,
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::Step(Direction::Prev) => "prev",
            Command::Step(Direction::Next) => "next",
            Command::Edge(Edge::First) => "first",
            Command::Edge(Edge::Last) => "last",
            Command::ToParent => "up",
            Command::ToChild => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    First,
    Last,
}

impl Edge {
    fn label(self) -> &'static str {
        match self {
            Edge::First => "First",
            Edge::Last => "Last",
        }
    }
}

/// A task's parent, its siblings, and where it sits among them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub parent_id: TaskId,
    pub siblings: Vec<Sibling>,
    /// `None` when the task could not be located among `siblings`
    pub idx: Option<usize>,
}

impl Resolution {
    /// Returns true if the sibling list filled a whole fetch page
    ///
    /// Such a list cannot be told apart from a truncated one.
    pub fn at_page_limit(&self) -> bool {
        self.siblings.len() >= PAGE_SIZE
    }

    /// Borrows the resolution with a known index
    pub fn located(&self) -> Option<Located<'_>> {
        self.idx.map(|idx| Located {
            parent_id: &self.parent_id,
            siblings: &self.siblings,
            idx,
        })
    }
}

/// A resolution whose task index is known
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub parent_id: &'a TaskId,
    pub siblings: &'a [Sibling],
    pub idx: usize,
}

/// Result of a navigation computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Go somewhere
    Move(Move),
    /// Already at the edge in the requested direction
    Boundary(Boundary),
    /// The task has no children to descend into
    Empty,
}

impl Outcome {
    /// Returns true for outcomes that did not move
    pub fn is_boundary(&self) -> bool {
        !matches!(self, Outcome::Move(_))
    }

    /// User-facing status line
    pub fn message(&self) -> String {
        match self {
            Outcome::Move(mv) => mv.placement.to_string(),
            Outcome::Boundary(b) => b.to_string(),
            Outcome::Empty => "No subtasks".to_string(),
        }
    }
}

/// A move to a target task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub target: TaskId,
    pub placement: Placement,
    /// Position to record once the move is applied
    pub remember: Option<Remember>,
}

/// `last_visited[parent] = visit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remember {
    pub parent: TaskId,
    pub visit: LastVisited,
}

/// Where the target of a move sits, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Sibling { idx: usize, total: usize },
    Parent,
    Child { idx: usize, total: usize },
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Sibling { idx, total } => write!(f, "{} / {}", idx + 1, total),
            Placement::Parent => write!(f, "\u{2190} Parent"),
            Placement::Child { idx, total } => write!(f, "\u{2192} {} / {}", idx + 1, total),
        }
    }
}

/// No movement: the current position and the edge that stopped it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub edge: Edge,
    pub idx: usize,
    pub total: usize,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} task \u{00b7} {} / {}",
            self.edge.label(),
            self.idx + 1,
            self.total
        )
    }
}

fn sibling_move(ctx: Located<'_>, target_idx: usize) -> Outcome {
    let target = ctx.siblings[target_idx].id.clone();
    Outcome::Move(Move {
        remember: Some(Remember {
            parent: ctx.parent_id.clone(),
            visit: LastVisited::new(target.clone(), target_idx),
        }),
        target,
        placement: Placement::Sibling {
            idx: target_idx,
            total: ctx.siblings.len(),
        },
    })
}

/// Previous/next sibling
pub fn step(ctx: Located<'_>, direction: Direction) -> Outcome {
    let total = ctx.siblings.len();
    let target = match direction {
        Direction::Prev => ctx.idx.checked_sub(1),
        Direction::Next => Some(ctx.idx + 1).filter(|&i| i < total),
    };

    match target {
        Some(target_idx) => sibling_move(ctx, target_idx),
        None => Outcome::Boundary(Boundary {
            edge: match direction {
                Direction::Prev => Edge::First,
                Direction::Next => Edge::Last,
            },
            idx: ctx.idx,
            total,
        }),
    }
}

/// First/last sibling
pub fn edge(ctx: Located<'_>, edge: Edge) -> Outcome {
    let total = ctx.siblings.len();
    let target_idx = match edge {
        Edge::First => 0,
        Edge::Last => total.saturating_sub(1),
    };

    if target_idx == ctx.idx {
        return Outcome::Boundary(Boundary {
            edge,
            idx: ctx.idx,
            total,
        });
    }
    sibling_move(ctx, target_idx)
}

/// Up to the parent, remembering the position being left when it is known
pub fn to_parent(resolution: &Resolution, task_id: &TaskId) -> Outcome {
    Outcome::Move(Move {
        target: resolution.parent_id.clone(),
        placement: Placement::Parent,
        remember: resolution.idx.map(|idx| Remember {
            parent: resolution.parent_id.clone(),
            visit: LastVisited::new(task_id.clone(), idx),
        }),
    })
}

/// Down into the current task's own children
///
/// Prefers the remembered child: at its recorded index if it is still
/// there, else wherever it moved to, else the first child.
pub fn to_child(task_id: &TaskId, children: &[Sibling], last: Option<&LastVisited>) -> Outcome {
    if children.is_empty() {
        return Outcome::Empty;
    }

    let target_idx = last
        .and_then(|lv| {
            if lv.still_matches(children) {
                Some(lv.idx)
            } else {
                position_of(children, &lv.id)
            }
        })
        .unwrap_or(0);

    let target = children[target_idx].id.clone();
    Outcome::Move(Move {
        remember: Some(Remember {
            parent: task_id.clone(),
            visit: LastVisited::new(target.clone(), target_idx),
        }),
        target,
        placement: Placement::Child {
            idx: target_idx,
            total: children.len(),
        },
    })
}
