//! Cache CLI commands

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use super::output::Output;
use crate::storage::{FileSession, NavCache, Project};

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show what the session cache holds
    Status,

    /// End the session by deleting its cache
    Clear,
}

pub fn run(cmd: CacheCommands, output: &Output, session: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let name = FileSession::resolve_name(session);
    let session = project.session(&name)?;

    match cmd {
        CacheCommands::Status => status(output, &project, &name, &session),
        CacheCommands::Clear => clear(output, &name, &session),
    }
}

fn status(output: &Output, project: &Project, name: &str, session: &FileSession) -> Result<()> {
    let config = &project.config().project.cache;
    let cache = NavCache::load(session, config.capacity);
    let ttl = config.ttl();
    let now = Utc::now();

    if output.is_json() {
        let entries: Vec<_> = cache
            .children_entries()
            .map(|(parent, entry)| {
                serde_json::json!({
                    "parent": parent,
                    "children": entry.siblings.len(),
                    "age_ms": (now - entry.fetched_at).num_milliseconds(),
                    "fresh": entry.is_fresh(now, ttl),
                })
            })
            .collect();

        output.data(&serde_json::json!({
            "session": name,
            "path": session.path().display().to_string(),
            "exists": session.exists(),
            "capacity": cache.capacity(),
            "ttl_ms": config.ttl_ms,
            "entries": entries,
            "parents": cache.parent_len(),
            "last_visited": cache.last_visited_len(),
        }));
        return Ok(());
    }

    println!("Session Cache");
    println!("{}", "=".repeat(40));
    println!("Session: {}", name);
    println!("Path: {}", session.path().display());
    if !session.exists() {
        println!("Status: empty (no navigation yet)");
        return Ok(());
    }

    println!();
    println!(
        "Children lists: {} / {} (ttl {} ms)",
        cache.children_len(),
        cache.capacity(),
        config.ttl_ms
    );
    for (parent, entry) in cache.children_entries() {
        let age = (now - entry.fetched_at).num_milliseconds();
        println!(
            "  {:<10} {:>3} children  {:>8} ms  {}",
            parent.as_str(),
            entry.siblings.len(),
            age,
            if entry.is_fresh(now, ttl) { "fresh" } else { "stale" }
        );
    }
    println!("Known parents: {}", cache.parent_len());
    println!("Remembered positions: {}", cache.last_visited_len());

    Ok(())
}

fn clear(output: &Output, name: &str, session: &FileSession) -> Result<()> {
    let removed = session.clear()?;

    if output.is_json() {
        output.data(&serde_json::json!({ "session": name, "cleared": removed }));
    } else if removed {
        output.success(&format!("Cleared session cache '{}'", name));
    } else {
        output.success(&format!("Session cache '{}' was already empty", name));
    }

    Ok(())
}
