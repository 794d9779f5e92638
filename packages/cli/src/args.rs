//! CLI argument definitions.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use clap::Parser;

/// CLI arguments for tree-mirror.
#[derive(Debug, Parser)]
#[command(
    name = "tree-mirror",
    about = "Mirror a source directory tree onto a destination directory tree",
    version
)]
pub struct Args {
    /// Directory to mirror from.
    #[arg(index = 1)]
    pub source: PathBuf,

    /// Directory to mirror onto.
    #[arg(index = 2)]
    pub destination: PathBuf,

    /// Disable transient progress output (useful for CI environments).
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Enable verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Args {
    /// Determine if we should show transient progress rewrites.
    #[must_use]
    pub const fn should_show_progress(&self) -> bool {
        !self.no_progress
    }
}
