//! JSONL storage for the local task hierarchy
//!
//! Tasks are stored in `.subnav/tasks.jsonl` with one JSON object per line.
//! Line order is the sibling order the local hierarchy reports.
//! Uses file locking for concurrent access safety.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use fs2::FileExt;

use crate::domain::{TaskId, TaskRecord};

/// Store for task records in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    /// Creates a new task store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the default store for a project
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".subnav").join("tasks.jsonl"))
    }

    /// Returns the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all tasks in file order
    ///
    /// A task written more than once keeps its first position and its last
    /// contents.
    pub fn read_all(&self) -> Result<Vec<TaskRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on task store")?;

        let reader = BufReader::new(&file);
        let mut tasks: Vec<TaskRecord> = Vec::new();
        let mut positions: HashMap<TaskId, usize> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_num + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            let task: TaskRecord = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num + 1))?;

            match positions.get(&task.id) {
                Some(&pos) => tasks[pos] = task,
                None => {
                    positions.insert(task.id.clone(), tasks.len());
                    tasks.push(task);
                }
            }
        }

        Ok(tasks)
    }

    /// Looks up a single task
    pub fn get(&self, id: &TaskId) -> Result<Option<TaskRecord>> {
        Ok(self.read_all()?.into_iter().find(|t| &t.id == id))
    }

    /// Direct children of `parent`, in store order
    pub fn children(&self, parent: &TaskId) -> Result<Vec<TaskRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|t| t.parent.as_ref() == Some(parent))
            .collect())
    }

    /// Writes all tasks to the store (full rewrite)
    pub fn write_all(&self, tasks: &[TaskRecord]) -> Result<()> {
        self.ensure_dir()?;

        // Write to temp file first
        let temp_path = self.path.with_extension("jsonl.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on task store")?;

            let mut writer = BufWriter::new(&file);
            for task in tasks {
                write_record(&mut writer, task)?;
            }
            writer.flush().context("Failed to flush task store")?;
        }

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    /// Appends one record; a repeated id overrides the earlier line on read
    pub fn append(&self, task: &TaskRecord) -> Result<()> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open task store: {}", self.path.display()))?;

        // Acquire exclusive lock
        file.lock_exclusive()
            .context("Failed to acquire write lock on task store")?;

        let mut writer = BufWriter::new(&file);
        write_record(&mut writer, task)?;
        writer.flush().context("Failed to flush task store")
    }

    fn ensure_dir(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) => fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display())),
            None => Ok(()),
        }
    }

    /// Next free numeric id (one past the largest numeric id in use)
    pub fn next_id(&self) -> Result<TaskId> {
        let max = self
            .read_all()?
            .iter()
            .filter_map(|t| t.id.numeric())
            .max()
            .unwrap_or(0);
        Ok((max + 1).to_string().parse::<TaskId>()?)
    }

    /// Adds a new task; its parent (if any) must exist
    pub fn add(&self, task: &TaskRecord) -> Result<()> {
        let tasks = self.read_all()?;
        if tasks.iter().any(|t| t.id == task.id) {
            bail!("Task {} already exists", task.id);
        }
        if let Some(parent) = &task.parent {
            if !tasks.iter().any(|t| &t.id == parent) {
                bail!("Parent task not found: {}", parent);
            }
        }
        self.append(task)
    }

    /// Moves a task under a new parent (or to the root)
    ///
    /// The task becomes the last child of its new parent. Moving a task
    /// under itself or one of its descendants is rejected.
    pub fn reparent(&self, id: &TaskId, new_parent: Option<&TaskId>) -> Result<TaskRecord> {
        let mut tasks = self.read_all()?;
        let pos = tasks
            .iter()
            .position(|t| &t.id == id)
            .with_context(|| format!("Task not found: {}", id))?;

        if let Some(parent) = new_parent {
            if !tasks.iter().any(|t| &t.id == parent) {
                bail!("Parent task not found: {}", parent);
            }
            if subtree_ids(&tasks, id).contains(parent) {
                bail!("Cannot move task {} under its own subtree", id);
            }
        }

        let mut task = tasks.remove(pos);
        task.parent = new_parent.cloned();
        tasks.push(task.clone());
        self.write_all(&tasks)?;
        Ok(task)
    }

    /// Renames a task in place
    pub fn rename(&self, id: &TaskId, name: &str) -> Result<()> {
        let mut tasks = self.read_all()?;
        let task = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .with_context(|| format!("Task not found: {}", id))?;
        task.name = name.to_string();
        self.write_all(&tasks)
    }

    /// Removes a task and its whole subtree, returning how many were removed
    pub fn remove(&self, id: &TaskId) -> Result<usize> {
        let tasks = self.read_all()?;
        if !tasks.iter().any(|t| &t.id == id) {
            return Ok(0);
        }

        let doomed = subtree_ids(&tasks, id);
        let kept: Vec<TaskRecord> = tasks.into_iter().filter(|t| !doomed.contains(&t.id)).collect();
        self.write_all(&kept)?;
        Ok(doomed.len())
    }
}

fn write_record(writer: &mut impl Write, task: &TaskRecord) -> Result<()> {
    let line = serde_json::to_string(task).context("Failed to serialize task")?;
    writeln!(writer, "{}", line).context("Failed to write task")
}

/// `root` plus every task below it
fn subtree_ids(tasks: &[TaskRecord], root: &TaskId) -> HashSet<TaskId> {
    let mut found = HashSet::from([root.clone()]);
    let mut frontier = vec![root.clone()];

    while let Some(current) = frontier.pop() {
        for task in tasks {
            if task.parent.as_ref() == Some(&current) && found.insert(task.id.clone()) {
                frontier.push(task.id.clone());
            }
        }
    }
    found
}
