//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Edit the local hierarchy | `task add`, `task move`, `task rm` |
//! | Navigate | Move through the tree | `goto`, `where`, `next`, `up`, `down` |
//! | Cache | Inspect or end the session | `cache status`, `cache clear` |
//! | Interactive | Full-screen navigator | `tui` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default, or the global config's `default_format`) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Sessions
//!
//! The navigation cache lives per session: `--session NAME`, else
//! `$SUBNAV_SESSION`, else `default`.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and debug-level logs:
//! ```bash
//! subnav --verbose next
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod cache_cmd;
mod nav_cmd;
mod output;
mod task;
mod tui;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat, OutputNotifier};
