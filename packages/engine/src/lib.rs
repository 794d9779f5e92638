//! One-way directory tree mirroring.
//!
//! After a run, the destination contains exactly the files and directories
//! present in the source: stale entries are removed, changed and missing
//! files are copied, and file timestamps are preserved so the next run can
//! detect changes cheaply. The engine works in two phases:
//!
//! 1. **Scan**: [`diff_trees`] walks both trees and produces an ordered
//!    [`SyncPlan`] plus a total-work estimate, before any mutation.
//! 2. **Execute**: [`SyncExecutor`] applies the plan in queue order,
//!    streaming copies with byte-level progress and isolating per-item
//!    failures into the session's failure lists.
//!
//! [`synchronize`] wires both phases together and reports through a
//! [`ProgressSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tree_mirror_engine::{NullSink, synchronize};
//!
//! let report = synchronize(source, destination, &mut NullSink)?;
//! if !report.is_clean() {
//!     eprintln!("{} items failed", report.failure_count());
//! }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod diff;
mod error;
mod execute;
mod progress;
mod session;
mod task;

pub use diff::diff_trees;
pub use error::SyncError;
pub use execute::SyncExecutor;
pub use progress::{NullSink, ProgressPhase, ProgressSink, WorkCounter};
pub use session::{SyncReport, SyncSession, synchronize};
pub use task::{SyncPlan, Task, TaskKind};
