//! tree-mirror CLI entry point.
//!
//! Mirrors a source directory tree onto a destination directory tree.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod args;
mod output;
mod render;

use std::env;

use clap::Parser;

use args::Args;
use render::{ConsoleSink, PlainSink};
use tree_mirror_engine::{ProgressSink, synchronize};

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        // SAFETY: We're setting this before any other threads are spawned
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    pretty_env_logger::init();

    if let Err(e) = run(&args) {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Main application logic.
///
/// Per-item failures are part of the sync report and leave the exit status
/// untouched; only an invalid invocation is an error here.
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!(
        "source: {}, destination: {}",
        args.source.display(),
        args.destination.display()
    );

    let mut sink: Box<dyn ProgressSink> = if args.should_show_progress() {
        Box::new(ConsoleSink::new())
    } else {
        Box::new(PlainSink)
    };

    let report = synchronize(&args.source, &args.destination, sink.as_mut())?;

    if !report.is_clean() {
        output::print_warning(&format!(
            "completed with {} failed items",
            report.failure_count()
        ));
    }

    Ok(())
}
