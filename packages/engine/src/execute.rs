//! Plan execution - applies queued operations with progress reporting and
//! failure isolation.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use filetime::FileTime;
use walkdir::WalkDir;

use crate::progress::{ProgressPhase, ProgressSink, WorkCounter};
use crate::session::SyncSession;
use crate::task::{SyncPlan, Task, TaskKind};

/// Copy stream chunk size.
const COPY_BUFFER_SIZE: usize = 4 * 1024;

/// Chunks between byte-level progress reports (one report per mebibyte).
const CHUNKS_PER_REPORT: u32 = 256;

/// Applies a [`SyncPlan`] task by task, in queue order.
///
/// Failures never stop the run: deletions get one force-delete retry, copy
/// failures may leave a partially written destination file, and every failed
/// path is recorded in the session for the final report.
pub struct SyncExecutor<'a> {
    session: &'a mut SyncSession,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> SyncExecutor<'a> {
    /// Create an executor reporting into the given session and sink.
    pub fn new(session: &'a mut SyncSession, sink: &'a mut dyn ProgressSink) -> Self {
        Self { session, sink }
    }

    /// Drain the plan, applying every task exactly once.
    ///
    /// Ends with an explicit 100% report, which also covers an empty plan.
    pub fn run(&mut self, mut plan: SyncPlan) {
        let mut counter = WorkCounter::new(plan.task_count(), plan.total_work());

        while let Some(task) = plan.pop() {
            match task.kind {
                TaskKind::Delete => {
                    self.report(&format!("delete {}", task.destination.display()), &counter);
                    self.delete(&task);
                    counter.add(1);
                }
                TaskKind::Copy => {
                    self.report(&format!("copy {}", task.source.display()), &counter);
                    if task.is_file {
                        if let Err(e) = self.copy(&task, &mut counter) {
                            log::warn!("Failed to copy {}: {e}", task.source.display());
                            self.session
                                .failed_to_copy
                                .push(task.source.display().to_string());
                        }
                    }
                }
            }
        }

        self.sink
            .rewrite_lines_with_progress(&[String::new(), "syncing complete".to_string()], 100);
    }

    /// Task-boundary report: action line, status line, task-count percentage.
    fn report(&mut self, action: &str, counter: &WorkCounter) {
        self.sink.rewrite_lines_with_progress(
            &[action.to_string(), counter.status_line()],
            counter.percentage(ProgressPhase::Tasks),
        );
    }

    /// Delete with a force-delete fallback for read-only targets.
    fn delete(&mut self, task: &Task) {
        let path = &task.destination;
        let removed = if task.is_file {
            remove_file_if_exists(path)
        } else {
            delete_directory(path)
        };

        if let Err(e) = removed {
            log::warn!("Failed to delete {}: {e}, retrying with attributes cleared", path.display());

            let forced = if task.is_file {
                force_delete_file(path)
            } else {
                force_delete_directory(path)
            };
            if let Err(e) = forced {
                log::warn!("Failed to force-delete {}: {e}", path.display());
                self.session
                    .failed_to_delete
                    .push(path.display().to_string());
            }
        }
    }

    /// Stream one file to its destination and carry the timestamps over.
    ///
    /// Bytes are counted as they are written, so a long copy advances the
    /// byte-level percentage between task boundaries and a mid-stream
    /// failure keeps the bytes already counted.
    fn copy(&mut self, task: &Task, counter: &mut WorkCounter) -> std::io::Result<()> {
        {
            let mut reader = fs::File::open(&task.source)?;
            let mut writer = fs::File::create(&task.destination)?;
            let mut buffer = [0u8; COPY_BUFFER_SIZE];
            let mut chunks = 0u32;

            loop {
                let read = reader.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                writer.write_all(&buffer[..read])?;
                counter.add(read as u64);

                chunks += 1;
                if chunks == CHUNKS_PER_REPORT {
                    chunks = 0;
                    self.sink.rewrite_lines_with_progress(
                        &[
                            format!("copy {}", task.source.display()),
                            counter.status_line(),
                        ],
                        counter.percentage(ProgressPhase::Bytes),
                    );
                }
            }
        }

        // Both handles are closed at this point. The destination mtime is
        // what change detection compares on the next run.
        let metadata = fs::metadata(&task.source)?;
        filetime::set_file_times(
            &task.destination,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
    }
}

/// Delete a file, treating an already-missing file as success.
fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Remove a directory tree bottom-up.
///
/// Failures on individual entries are logged and skipped; only a failure to
/// remove `path` itself is returned, which triggers the force-delete
/// fallback in the caller.
fn delete_directory(path: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(path).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Failed to walk {}: {e}", path.display());
                continue;
            }
        };
        if entry.path() == path {
            continue;
        }

        let removed = if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())
        } else {
            fs::remove_file(entry.path())
        };
        if let Err(e) = removed {
            log::warn!("Failed to delete {}: {e}", entry.path().display());
        }
    }

    fs::remove_dir(path)
}

/// Clear the read-only attribute, then delete.
fn force_delete_file(path: &Path) -> std::io::Result<()> {
    clear_readonly(path)?;
    fs::remove_file(path)
}

/// Clear read-only attributes on every contained file, then retry the
/// bottom-up removal.
fn force_delete_directory(path: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(path) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Failed to walk {}: {e}", path.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            clear_readonly(entry.path())?;
        }
    }

    delete_directory(path)
}

/// Drop the read-only attribute if it is set.
fn clear_readonly(path: &Path) -> std::io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    if permissions.readonly() {
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions)?;
    }
    Ok(())
}
