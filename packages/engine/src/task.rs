//! Planned filesystem operations and the ordered plan that holds them.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::VecDeque;
use std::path::PathBuf;

/// Kind of filesystem operation a [`Task`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Remove a stale file or directory from the destination.
    Delete,
    /// Copy a file from the source to the destination.
    Copy,
}

/// A single planned filesystem operation.
///
/// Created only during scanning, never mutated, and consumed exactly once by
/// the executor. Paths are recorded as they existed at scan time; the plan is
/// not re-validated against a changed filesystem during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// What to do.
    pub kind: TaskKind,
    /// Source path; empty for deletions.
    pub source: PathBuf,
    /// Destination path the operation acts on.
    pub destination: PathBuf,
    /// For deletions, whether the target is a file rather than a directory.
    /// Always true for copies.
    pub is_file: bool,
}

impl Task {
    /// Plan the deletion of a destination entry.
    #[must_use]
    pub fn delete(destination: PathBuf, is_file: bool) -> Self {
        Self {
            kind: TaskKind::Delete,
            source: PathBuf::new(),
            destination,
            is_file,
        }
    }

    /// Plan the copy of a source file to a destination path.
    #[must_use]
    pub fn copy(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            kind: TaskKind::Copy,
            source,
            destination,
            is_file: true,
        }
    }
}

/// The ordered operation queue produced by a scan, plus the total-work
/// estimate used as the progress denominator.
///
/// Insertion order is scan-traversal order and consumption is strictly FIFO.
/// `total_work` mixes units deliberately: deletions contribute 1 each,
/// copies contribute their byte size (see [`crate::WorkCounter`]).
#[derive(Debug, Default)]
pub struct SyncPlan {
    tasks: VecDeque<Task>,
    total_work: u64,
}

impl SyncPlan {
    /// Assemble a plan from an ordered task list and its work estimate.
    ///
    /// Normally produced by [`crate::diff_trees`]; public so callers can
    /// build plans directly when driving [`crate::SyncExecutor`] themselves.
    #[must_use]
    pub fn from_parts(tasks: Vec<Task>, total_work: u64) -> Self {
        Self {
            tasks: tasks.into(),
            total_work,
        }
    }

    /// Remove and return the next task in queue order.
    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn task_count(&self) -> u64 {
        self.tasks.len() as u64
    }

    /// The mixed-unit work estimate for the whole plan.
    #[must_use]
    pub const fn total_work(&self) -> u64 {
        self.total_work
    }

    /// Whether the plan contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate the queued tasks without consuming them.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Directories scheduled for deletion.
    #[must_use]
    pub fn directory_deletes(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Delete && !t.is_file)
            .count() as u64
    }

    /// Files scheduled for deletion.
    #[must_use]
    pub fn file_deletes(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Delete && t.is_file)
            .count() as u64
    }

    /// Files scheduled for copying.
    #[must_use]
    pub fn file_copies(&self) -> u64 {
        self.tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Copy && t.is_file)
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_task_has_empty_source() {
        let task = Task::delete(PathBuf::from("/dest/stale"), false);

        assert_eq!(task.kind, TaskKind::Delete);
        assert_eq!(task.source, PathBuf::new());
        assert!(!task.is_file);
    }

    #[test]
    fn test_copy_task_is_always_a_file() {
        let task = Task::copy(PathBuf::from("/src/a.txt"), PathBuf::from("/dest/a.txt"));

        assert_eq!(task.kind, TaskKind::Copy);
        assert!(task.is_file);
    }

    #[test]
    fn test_plan_pops_in_insertion_order() {
        let mut plan = SyncPlan::from_parts(
            vec![
                Task::delete(PathBuf::from("/dest/b.txt"), true),
                Task::copy(PathBuf::from("/src/a.txt"), PathBuf::from("/dest/a.txt")),
            ],
            6,
        );

        assert_eq!(plan.task_count(), 2);
        assert_eq!(plan.total_work(), 6);
        assert_eq!(plan.pop().unwrap().kind, TaskKind::Delete);
        assert_eq!(plan.pop().unwrap().kind, TaskKind::Copy);
        assert!(plan.pop().is_none());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_plan_operation_counts() {
        let plan = SyncPlan::from_parts(
            vec![
                Task::delete(PathBuf::from("/dest/old"), false),
                Task::delete(PathBuf::from("/dest/b.txt"), true),
                Task::delete(PathBuf::from("/dest/c.txt"), true),
                Task::copy(PathBuf::from("/src/a.txt"), PathBuf::from("/dest/a.txt")),
            ],
            0,
        );

        assert_eq!(plan.directory_deletes(), 1);
        assert_eq!(plan.file_deletes(), 2);
        assert_eq!(plan.file_copies(), 1);
    }
}
