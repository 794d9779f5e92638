//! Console rendering of synchronization progress.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use console::Term;

use tree_mirror_engine::ProgressSink;

/// Widest the progress bar is allowed to get, in columns.
const PROGRESS_BAR_MAX_WIDTH: usize = 100;

/// Terminal-backed [`ProgressSink`].
///
/// Keeps a transient block of status lines at the bottom of the output and
/// redraws it in place; permanent lines replace the block and push new
/// output below them. Terminal failures are ignored, rendering is
/// best-effort.
pub struct ConsoleSink {
    term: Term,
    /// Rows currently occupied by the transient block.
    rendered: usize,
}

impl ConsoleSink {
    /// Create a sink rendering to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            rendered: 0,
        }
    }

    fn width(&self) -> usize {
        usize::from(self.term.size().1)
    }

    /// Erase the transient block, leaving the cursor where it started.
    fn clear_block(&mut self) {
        if self.rendered > 0 {
            let _ = self.term.clear_last_lines(self.rendered);
            self.rendered = 0;
        }
    }

    /// Write one transient row, truncated so it never wraps.
    fn write_row(&self, text: &str) {
        let _ = self.term.write_line(&truncate_row(text, self.width()));
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleSink {
    fn write_line(&mut self, text: &str) {
        self.clear_block();
        let _ = self.term.write_line(text);
    }

    fn rewrite_lines(&mut self, lines: &[String]) {
        self.clear_block();
        for line in lines {
            self.write_row(line);
        }
        self.rendered = lines.len();
    }

    fn rewrite_lines_with_progress(&mut self, lines: &[String], percentage: u8) {
        self.clear_block();
        for line in lines {
            self.write_row(line);
        }
        self.write_row(&render_progress_bar(percentage, self.width()));
        self.rendered = lines.len() + 1;
    }
}

/// Sink for non-interactive output: permanent lines only, transient rewrites
/// are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainSink;

impl ProgressSink for PlainSink {
    fn write_line(&mut self, text: &str) {
        println!("{text}");
    }

    fn rewrite_lines(&mut self, _lines: &[String]) {}

    fn rewrite_lines_with_progress(&mut self, _lines: &[String], _percentage: u8) {}
}

/// Render a bounded-width `[━━──] 42%` bar.
fn render_progress_bar(percentage: u8, terminal_width: usize) -> String {
    let width = match terminal_width {
        0 => PROGRESS_BAR_MAX_WIDTH,
        w => w.min(PROGRESS_BAR_MAX_WIDTH),
    };
    let suffix = format!("] {percentage}%");
    let cells = width.saturating_sub(1 + suffix.len());
    let filled = cells * usize::from(percentage.min(100)) / 100;

    format!(
        "[{}{}{suffix}",
        "━".repeat(filled),
        "─".repeat(cells - filled)
    )
}

/// Truncate to the terminal width so rewritten rows never wrap.
fn truncate_row(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }

    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_is_bounded() {
        let bar = render_progress_bar(50, 200);

        assert!(bar.starts_with('['));
        assert!(bar.ends_with("] 50%"));
        assert_eq!(bar.chars().count(), PROGRESS_BAR_MAX_WIDTH);
    }

    #[test]
    fn test_progress_bar_fills_with_percentage() {
        let empty = render_progress_bar(0, 40);
        let full = render_progress_bar(100, 40);

        assert_eq!(empty.matches('━').count(), 0);
        assert_eq!(full.matches('─').count(), 0);
        assert_eq!(full.matches('━').count(), 40 - 1 - "] 100%".len());
    }

    #[test]
    fn test_progress_bar_shrinks_to_narrow_terminals() {
        let bar = render_progress_bar(50, 20);

        assert_eq!(bar.chars().count(), 20);
    }

    #[test]
    fn test_truncate_row_keeps_short_text() {
        assert_eq!(truncate_row("short", 80), "short");
    }

    #[test]
    fn test_truncate_row_marks_long_text() {
        let truncated = truncate_row("abcdefghij", 8);

        assert_eq!(truncated, "abcde...");
        assert_eq!(truncated.chars().count(), 8);
    }

    #[test]
    fn test_truncate_row_without_width_is_untouched() {
        assert_eq!(truncate_row("anything at all", 0), "anything at all");
    }
}
