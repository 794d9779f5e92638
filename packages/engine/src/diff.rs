//! Tree scanning - computes the ordered operations that make the destination
//! mirror the source.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use crate::error::SyncError;
use crate::progress::ProgressSink;
use crate::session::SyncSession;
use crate::task::{SyncPlan, Task};

/// Compute the plan that makes `destination` mirror `source`.
///
/// The scan runs to completion before any mutation happens, so the resulting
/// [`SyncPlan`] carries the full task sequence and the total-work estimate
/// used as the progress denominator. The only filesystem writes during
/// scanning are best-effort creations of missing destination directories.
///
/// Per directory level the task order is: stale subdirectory deletions,
/// then each source subdirectory's entire subtree (recursively), then stale
/// file deletions, then changed-file delete/copy pairs, then missing file
/// copies. Deep subtrees' file operations therefore precede their
/// ancestors' file operations.
///
/// Subtrees that fail to scan are recorded in the session and skipped; tasks
/// already produced for completed subtrees are retained.
pub fn diff_trees(
    source: &Path,
    destination: &Path,
    session: &mut SyncSession,
    sink: &mut dyn ProgressSink,
) -> SyncPlan {
    let mut differ = TreeDiffer { session, sink };
    let (tasks, total_work) = differ.diff_directory(source, destination);
    SyncPlan::from_parts(tasks, total_work)
}

/// Recursive tree differ.
///
/// Carries the per-run session for scan-failure recording and the sink for
/// transient "currently scanning" output.
struct TreeDiffer<'a> {
    session: &'a mut SyncSession,
    sink: &'a mut dyn ProgressSink,
}

impl TreeDiffer<'_> {
    /// Diff one (source, destination) directory pair, recursing into
    /// subdirectories. Returns the ordered tasks and accumulated work for
    /// the whole subtree.
    ///
    /// A failure mid-level keeps whatever the completed children already
    /// produced; the failing pair is recorded and its remaining steps are
    /// abandoned.
    fn diff_directory(&mut self, source: &Path, destination: &Path) -> (Vec<Task>, u64) {
        self.sink.rewrite_lines(&[source.display().to_string()]);

        let mut tasks = Vec::new();
        let mut work = 0u64;

        if let Err(e) = self.diff_level(source, destination, &mut tasks, &mut work) {
            let pair = format!(
                "(source: {}) (destination: {})",
                source.display(),
                destination.display()
            );
            log::warn!("Failed to scan directories: {pair}: {e}");
            self.session.failed_to_scan.push(pair);
        }

        (tasks, work)
    }

    fn diff_level(
        &mut self,
        source: &Path,
        destination: &Path,
        tasks: &mut Vec<Task>,
        work: &mut u64,
    ) -> Result<(), SyncError> {
        // Stale subdirectories are deleted before descending so their
        // removal precedes every task belonging to this level's children.
        for directory in list_directories(destination) {
            if !counterpart(source, &directory).exists() {
                tasks.push(Task::delete(directory, false));
                *work += 1;
            }
        }

        for directory in list_directories(source) {
            let dest_directory = counterpart(destination, &directory);
            if !dest_directory.exists() {
                // Best-effort: a directory that cannot be created surfaces
                // later as copy failures for its contents.
                if let Err(e) = fs::create_dir(&dest_directory) {
                    log::warn!(
                        "Failed to create directory {}: {e}",
                        dest_directory.display()
                    );
                }
            }

            let (child_tasks, child_work) = self.diff_directory(&directory, &dest_directory);
            tasks.extend(child_tasks);
            *work += child_work;
        }

        // Stale files are deleted before changed files are replaced; a
        // changed file is deleted and re-copied, never overwritten in place.
        let mut changed = Vec::new();
        for file in list_files(destination) {
            let source_file = counterpart(source, &file);
            if !source_file.exists() {
                tasks.push(Task::delete(file, true));
                *work += 1;
            } else if mtime_millis(&source_file)? != mtime_millis(&file)? {
                changed.push((source_file, file));
            }
        }
        for (source_file, file) in changed {
            tasks.push(Task::delete(file.clone(), true));
            *work += 1;
            *work += file_size(&source_file)?;
            tasks.push(Task::copy(source_file, file));
        }

        for file in list_files(source) {
            let dest_file = counterpart(destination, &file);
            if !dest_file.exists() {
                *work += file_size(&file)?;
                tasks.push(Task::copy(file, dest_file));
            }
        }

        Ok(())
    }
}

/// Same-named entry under `parent`.
fn counterpart(parent: &Path, entry: &Path) -> PathBuf {
    entry
        .file_name()
        .map_or_else(|| parent.to_path_buf(), |name| parent.join(name))
}

/// Immediate subdirectories of `path`, sorted by name.
fn list_directories(path: &Path) -> Vec<PathBuf> {
    list_entries(path, true)
}

/// Immediate non-directory entries of `path`, sorted by name.
fn list_files(path: &Path) -> Vec<PathBuf> {
    list_entries(path, false)
}

/// List one kind of immediate child of `path`.
///
/// A listing failure is treated as an empty directory: the error is logged
/// and the scan continues with no entries. Sorting keeps the task order
/// deterministic regardless of readdir order.
fn list_entries(path: &Path, directories: bool) -> Vec<PathBuf> {
    let reader = match fs::read_dir(path) {
        Ok(reader) => reader,
        Err(e) => {
            log::warn!("Failed to read directory {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut entries: Vec<PathBuf> = reader
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|entry| entry.is_dir() == directories)
        .collect();
    entries.sort();
    entries
}

/// Last-modified time in milliseconds since the epoch.
///
/// Millisecond truncation matches the resolution the executor preserves when
/// copying, so an unchanged file compares equal on the next run.
fn mtime_millis(path: &Path) -> Result<i64, SyncError> {
    let metadata = fs::metadata(path).map_err(|e| SyncError::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mtime = FileTime::from_last_modification_time(&metadata);

    Ok(mtime.unix_seconds() * 1000 + i64::from(mtime.nanoseconds()) / 1_000_000)
}

/// Byte size of a file.
fn file_size(path: &Path) -> Result<u64, SyncError> {
    fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|e| SyncError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use crate::task::TaskKind;
    use filetime::set_file_mtime;
    use tempfile::TempDir;

    fn scan(source: &Path, destination: &Path) -> SyncPlan {
        let mut session = SyncSession::default();
        diff_trees(source, destination, &mut session, &mut NullSink)
    }

    #[test]
    fn test_identical_trees_plan_nothing() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::create_dir_all(destination.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "same").unwrap();
        fs::write(destination.join("a.txt"), "same").unwrap();
        let mtime = FileTime::from_unix_time(1_700_000_000, 0);
        set_file_mtime(source.join("a.txt"), mtime).unwrap();
        set_file_mtime(destination.join("a.txt"), mtime).unwrap();

        let plan = scan(&source, &destination);

        assert!(plan.is_empty());
        assert_eq!(plan.total_work(), 0);
    }

    #[test]
    fn test_concrete_scenario_order_and_work() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("a.txt"), "12345").unwrap();
        fs::write(destination.join("a.txt"), "12345").unwrap();
        fs::write(destination.join("b.txt"), "stale").unwrap();
        set_file_mtime(source.join("a.txt"), FileTime::from_unix_time(1_700_000_100, 0)).unwrap();
        set_file_mtime(
            destination.join("a.txt"),
            FileTime::from_unix_time(1_700_000_000, 0),
        )
        .unwrap();

        let plan = scan(&source, &destination);

        let tasks: Vec<&Task> = plan.tasks().collect();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].kind, TaskKind::Delete);
        assert_eq!(tasks[0].destination, destination.join("b.txt"));
        assert_eq!(tasks[1].kind, TaskKind::Delete);
        assert_eq!(tasks[1].destination, destination.join("a.txt"));
        assert_eq!(tasks[2].kind, TaskKind::Copy);
        assert_eq!(tasks[2].source, source.join("a.txt"));
        // 1 (delete b) + 1 (delete a) + 5 (copy a)
        assert_eq!(plan.total_work(), 7);
    }

    #[test]
    fn test_changed_file_is_deleted_then_copied() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("a.txt"), "new").unwrap();
        fs::write(destination.join("a.txt"), "old").unwrap();
        set_file_mtime(source.join("a.txt"), FileTime::from_unix_time(1_700_000_100, 0)).unwrap();
        set_file_mtime(
            destination.join("a.txt"),
            FileTime::from_unix_time(1_700_000_000, 0),
        )
        .unwrap();

        let plan = scan(&source, &destination);

        let tasks: Vec<&Task> = plan.tasks().collect();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].kind, TaskKind::Delete);
        assert!(tasks[0].is_file);
        assert_eq!(tasks[1].kind, TaskKind::Copy);
    }

    #[test]
    fn test_sub_millisecond_mtime_difference_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("a.txt"), "same").unwrap();
        fs::write(destination.join("a.txt"), "same").unwrap();
        set_file_mtime(
            source.join("a.txt"),
            FileTime::from_unix_time(1_700_000_000, 100_000),
        )
        .unwrap();
        set_file_mtime(
            destination.join("a.txt"),
            FileTime::from_unix_time(1_700_000_000, 900_000),
        )
        .unwrap();

        let plan = scan(&source, &destination);

        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_source_schedules_all_deletions() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir(&source).unwrap();
        fs::create_dir_all(destination.join("old_dir")).unwrap();
        fs::write(destination.join("old_dir/inner.txt"), "x").unwrap();
        fs::write(destination.join("stale.txt"), "y").unwrap();

        let plan = scan(&source, &destination);

        assert_eq!(plan.directory_deletes(), 1);
        assert_eq!(plan.file_deletes(), 1);
        assert_eq!(plan.file_copies(), 0);
        // One unit per scheduled deletion, nothing byte-sized.
        assert_eq!(plan.total_work(), 2);
    }

    #[test]
    fn test_ordering_directory_deletes_before_children_files_after() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::create_dir(destination.join("gone")).unwrap();
        fs::write(source.join("sub/deep.txt"), "deep").unwrap();
        fs::write(source.join("top.txt"), "top").unwrap();

        let plan = scan(&source, &destination);

        let tasks: Vec<&Task> = plan.tasks().collect();
        assert_eq!(tasks.len(), 3);
        // Root's stale directory first, then the subtree's file operations,
        // then the root's own file operations.
        assert_eq!(tasks[0].destination, destination.join("gone"));
        assert!(!tasks[0].is_file);
        assert_eq!(tasks[1].destination, destination.join("sub/deep.txt"));
        assert_eq!(tasks[2].destination, destination.join("top.txt"));
    }

    #[test]
    fn test_scan_creates_missing_destination_directories() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir_all(source.join("fresh/nested")).unwrap();
        fs::create_dir(&destination).unwrap();

        let plan = scan(&source, &destination);

        assert!(plan.is_empty());
        assert!(destination.join("fresh/nested").is_dir());
    }

    #[test]
    fn test_missing_destination_counterpart_is_copied() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("only.txt"), "1234567890").unwrap();

        let plan = scan(&source, &destination);

        assert_eq!(plan.file_copies(), 1);
        assert_eq!(plan.total_work(), 10);
    }
}
