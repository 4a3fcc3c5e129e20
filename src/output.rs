//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the user cares about (the day and its title, the
//! post with a problem) and shows paths and URLs as indented context lines.
//! Paths are shown relative to the project root.
//!
//! # Output Format
//!
//! ## Daily
//!
//! ```text
//! 2025-10-20 Lk 12:13-21
//!     Slug: lk-12_13-21
//!     Post: content/post/lk-12_13-21.md
//!     Cover: uploaded → https://res.cloudinary.com/.../lk-12_13-21.webp
//!     Site: built
//! ```
//!
//! ## Check
//!
//! ```text
//! broken.md
//!     missing date
//!     image is not an absolute http(s) URL: "images/cover.png"
//!
//! Checked 3 posts: 1 with issues (2 issues)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::UploadOutcome;
use crate::check::CheckReport;
use crate::daily::{DailyReport, Preview};
use crate::entry::FrontMatterError;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lives under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// daily
// ============================================================================

/// Format the summary of a daily run.
pub fn format_daily_report(report: &DailyReport, root: &Path) -> Vec<String> {
    let mut lines = vec![format!("{} {}", report.date.format("%Y-%m-%d"), report.title)];
    lines.push(format!("{}Slug: {}", indent(1), report.slug));
    lines.push(format!("{}Post: {}", indent(1), display_path(&report.path, root)));

    let cover = match (&report.upload, &report.image_url) {
        (UploadOutcome::Skipped, _) | (_, None) => format!("{}Cover: skipped", indent(1)),
        (outcome, Some(url)) => format!("{}Cover: {} \u{2192} {}", indent(1), outcome, url),
    };
    lines.push(cover);

    let site = if report.site_built { "built" } else { "skipped" };
    lines.push(format!("{}Site: {}", indent(1), site));
    lines
}

/// Print daily summary to stdout.
pub fn print_daily_report(report: &DailyReport, root: &Path) {
    for line in format_daily_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// show
// ============================================================================

/// Format a preview: a header line, then the post exactly as it would be
/// written.
pub fn format_preview(preview: &Preview, root: &Path) -> Result<Vec<String>, FrontMatterError> {
    let mut lines = vec![format!(
        "==> {} \u{2192} {}",
        preview.date.format("%Y-%m-%d"),
        display_path(&preview.path, root)
    )];
    lines.extend(preview.entry.to_markdown()?.lines().map(String::from));
    Ok(lines)
}

/// Print preview to stdout.
pub fn print_preview(preview: &Preview, root: &Path) -> Result<(), FrontMatterError> {
    for line in format_preview(preview, root)? {
        println!("{}", line);
    }
    Ok(())
}

// ============================================================================
// check
// ============================================================================

/// Format a check report: issues grouped under their file, then a summary.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&Path> = None;

    for issue in &report.issues {
        if current != Some(issue.path.as_path()) {
            current = Some(issue.path.as_path());
            lines.push(issue.path.display().to_string());
        }
        lines.push(format!("{}{}", indent(1), issue.kind));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    if report.links_checked > 0 {
        lines.push(format!("Checked {}", plural(report.links_checked, "image link")));
    }
    if report.is_clean() {
        lines.push(format!("Checked {}: all valid", plural(report.checked, "post")));
    } else {
        lines.push(format!(
            "Checked {}: {} with issues ({})",
            plural(report.checked, "post"),
            report.failing_files(),
            plural(report.issues.len(), "issue")
        ));
    }
    lines
}

/// Print check report to stdout.
pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
