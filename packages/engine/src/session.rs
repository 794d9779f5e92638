//! Synchronization session - orchestration, failure tracking, and the final
//! report.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

use crate::diff::diff_trees;
use crate::error::SyncError;
use crate::execute::SyncExecutor;
use crate::progress::ProgressSink;

/// Per-run context holding the failure lists accumulated across scanning and
/// execution.
///
/// Passed explicitly through the differ and the executor; exists only for
/// the duration of one [`synchronize`] call, nothing survives across runs.
#[derive(Debug, Default)]
pub struct SyncSession {
    /// (source, destination) pairs that could not be scanned.
    pub failed_to_scan: Vec<String>,
    /// Destination paths that could not be deleted.
    pub failed_to_delete: Vec<String>,
    /// Source paths that could not be copied.
    pub failed_to_copy: Vec<String>,
}

impl SyncSession {
    /// Whether the run recorded no failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_to_scan.is_empty()
            && self.failed_to_delete.is_empty()
            && self.failed_to_copy.is_empty()
    }
}

/// Summary of a completed synchronization run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Directories that were scheduled for deletion.
    pub planned_directory_deletes: u64,
    /// Files that were scheduled for deletion.
    pub planned_file_deletes: u64,
    /// Files that were scheduled for copying.
    pub planned_file_copies: u64,
    /// (source, destination) pairs that could not be scanned.
    pub failed_to_scan: Vec<String>,
    /// Destination paths that could not be deleted.
    pub failed_to_delete: Vec<String>,
    /// Source paths that could not be copied.
    pub failed_to_copy: Vec<String>,
}

impl SyncReport {
    /// Whether the run completed without any recorded failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Total number of recorded per-item failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed_to_scan.len() + self.failed_to_delete.len() + self.failed_to_copy.len()
    }
}

/// Mirror `source` onto `destination`.
///
/// Runs in two phases: a full scan that produces the ordered plan and the
/// total-work estimate, then execution of exactly that plan in order. Status
/// and progress go through `sink`; per-item failures are collected into the
/// returned report and never surface as an `Err`.
///
/// # Errors
///
/// * If `source` or `destination` is not an existing directory
pub fn synchronize(
    source: &Path,
    destination: &Path,
    sink: &mut dyn ProgressSink,
) -> Result<SyncReport, SyncError> {
    if !source.is_dir() {
        return Err(SyncError::SourceNotADirectory {
            path: source.to_path_buf(),
        });
    }
    if !destination.is_dir() {
        return Err(SyncError::DestinationNotADirectory {
            path: destination.to_path_buf(),
        });
    }

    log::info!(
        "Synchronizing {} -> {}",
        source.display(),
        destination.display()
    );

    let mut session = SyncSession::default();

    sink.write_line("scanning...");
    let plan = diff_trees(source, destination, &mut session, sink);

    let planned_directory_deletes = plan.directory_deletes();
    let planned_file_deletes = plan.file_deletes();
    let planned_file_copies = plan.file_copies();

    sink.rewrite_lines(&[
        "scanning complete".to_string(),
        format!("{planned_directory_deletes} directories {planned_file_deletes} files to delete"),
    ]);
    sink.write_line(&format!("\n{planned_file_copies} files to copy"));

    sink.write_line("\nsyncing...");
    SyncExecutor::new(&mut session, sink).run(plan);

    report_failures(sink, "failed to scan:", &session.failed_to_scan);
    report_failures(sink, "failed to delete:", &session.failed_to_delete);
    report_failures(sink, "failed to copy:", &session.failed_to_copy);

    Ok(SyncReport {
        planned_directory_deletes,
        planned_file_deletes,
        planned_file_copies,
        failed_to_scan: session.failed_to_scan,
        failed_to_delete: session.failed_to_delete,
        failed_to_copy: session.failed_to_copy,
    })
}

/// Emit one failure section, only if it has entries.
fn report_failures(sink: &mut dyn ProgressSink, heading: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }

    sink.write_line(&format!("\n{heading}"));
    for path in paths {
        sink.write_line(path);
    }
}
