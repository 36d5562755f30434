//! # Navigation Runtime
//!
//! Puts the pure engine in [`crate::domain::navigation`] to work against a
//! live hierarchy.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Resolver`] | parent, siblings and index of a task, cache first |
//! | [`Dispatcher`] | one command at a time: resolve, route, remember, persist, notify |
//! | [`PageContext`] / [`Router`] / [`Notifier`] | what the dispatcher needs from its host |
//! | [`Clock`] | time source for freshness checks |

mod clock;
mod collab;
mod dispatcher;
mod error;
mod resolver;

pub use clock::{Clock, SystemClock};
pub use collab::{Collaborators, Location, Notifier, PageContext, Router};
pub use dispatcher::{BusyGuard, DispatchState, Dispatcher, Report};
pub use error::NavError;
pub use resolver::Resolver;
