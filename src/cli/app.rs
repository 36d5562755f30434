//! Main CLI application structure

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{cache_cmd, nav_cmd, task, tui};
use crate::domain::{Command, Direction, Edge};
use crate::storage::{session::SESSION_ENV, Config, Project};

#[derive(Parser)]
#[command(name = "subnav")]
#[command(author, version, about = "Keyboard navigation through parent/subtask trees")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config's default_format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Navigation session (separate cache per session)
    #[arg(long, global = true, env = SESSION_ENV)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a navigation command starts
#[derive(Args)]
pub struct AtArgs {
    /// Start from this task URL, path or ID instead of the current task
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new subnav project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks in the local hierarchy
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Open a task
    Goto {
        /// Task ID
        id: String,
    },

    /// Show the current task and its position among its siblings
    Where(AtArgs),

    /// Previous sibling
    Prev(AtArgs),

    /// Next sibling
    Next(AtArgs),

    /// First sibling
    First(AtArgs),

    /// Last sibling
    Last(AtArgs),

    /// Parent task
    Up(AtArgs),

    /// Last visited (or first) subtask
    Down(AtArgs),

    /// Inspect or clear the session cache
    #[command(subcommand)]
    Cache(cache_cmd::CacheCommands),

    /// Interactive navigator
    Tui,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format,
    };
    let output = Output::new(format, cli.verbose);
    let session = cli.session.as_deref();

    output.verbose("subnav starting");

    let navigate = |command: Command, at: AtArgs| {
        nav_cmd::navigate(&output, session, command, at.at.as_deref())
    };

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Created .subnav directory at: {}", project.subnav_dir().display()),
            );
            output.success(&format!("Initialized subnav project at {}", project.root().display()));
        }

        Commands::Task(cmd) => task::run(cmd, &output)?,

        Commands::Goto { id } => nav_cmd::goto(&output, &id)?,
        Commands::Where(at) => nav_cmd::where_am_i(&output, session, at.at.as_deref())?,

        Commands::Prev(at) => navigate(Command::Step(Direction::Prev), at)?,
        Commands::Next(at) => navigate(Command::Step(Direction::Next), at)?,
        Commands::First(at) => navigate(Command::Edge(Edge::First), at)?,
        Commands::Last(at) => navigate(Command::Edge(Edge::Last), at)?,
        Commands::Up(at) => navigate(Command::ToParent, at)?,
        Commands::Down(at) => navigate(Command::ToChild, at)?,

        Commands::Cache(cmd) => cache_cmd::run(cmd, &output, session)?,

        Commands::Tui => tui::run(&output, session)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn navigation_flags_parse() {
        let cli = Cli::try_parse_from(["subnav", "--session", "s1", "next", "--at", "42"]).unwrap();
        assert_eq!(cli.session.as_deref(), Some("s1"));
        match cli.command {
            Commands::Next(at) => assert_eq!(at.at.as_deref(), Some("42")),
            _ => panic!("expected next"),
        }
    }

    #[test]
    fn move_requires_parent_or_root() {
        assert!(Cli::try_parse_from(["subnav", "task", "move", "3"]).is_err());
        assert!(Cli::try_parse_from(["subnav", "task", "move", "3", "--root"]).is_ok());
        assert!(Cli::try_parse_from(["subnav", "task", "move", "3", "--root", "-p", "1"]).is_err());
    }
}
