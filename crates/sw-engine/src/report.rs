//! Per-run summary and its Telegram rendering.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

/// Telegram's hard limit for one message, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 4096;

const MAX_NAME_CHARS: usize = 80;
const TRUNCATION_MARKER: &str = "\n…(truncated)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportAction {
    Deleted,
    Retired,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    WithFiles,
    TaskOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub name: String,
    pub task_id: String,
    pub action: ReportAction,
    pub files: FileAction,
    pub reason: String,
    /// Dry-run: the delete was logged, not sent.
    pub simulated: bool,
}

/// A run-level failure shown in place of silence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemError {
    pub context: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub deleted: usize,
    pub retired: usize,
    pub newly_monitored: usize,
    pub rechecked: usize,
    pub removed_from_monitor: usize,
    pub skipped: usize,
    pub items: Vec<ReportItem>,
    pub system_errors: Vec<SystemError>,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Summary of a run that could not reach the client at all.
    pub fn failure(dry_run: bool, context: &str, message: impl Into<String>) -> Self {
        let mut summary = Self::new(dry_run);
        summary.system_errors.push(SystemError {
            context: context.to_string(),
            message: message.into(),
        });
        summary
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.action == ReportAction::Failed)
            .count()
    }

    /// Whether the run changed or broke anything worth telling a human about.
    pub fn is_noteworthy(&self) -> bool {
        self.deleted > 0
            || self.retired > 0
            || self.newly_monitored > 0
            || self.removed_from_monitor > 0
            || self.failed() > 0
            || !self.system_errors.is_empty()
    }

    pub fn log(&self) {
        info!(
            deleted = self.deleted,
            retired = self.retired,
            newly_monitored = self.newly_monitored,
            rechecked = self.rechecked,
            removed_from_monitor = self.removed_from_monitor,
            skipped = self.skipped,
            failed = self.failed(),
            system_errors = self.system_errors.len(),
            dry_run = self.dry_run,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "cleanup run finished"
        );
    }
}

/// Render `summary` as Telegram HTML, listing at most `max_items` items.
pub fn render_html(summary: &RunSummary, max_items: usize) -> String {
    let mut out = String::new();

    out.push_str("<b>🧹 Torrent cleanup report</b>");
    if summary.dry_run {
        out.push_str(" <i>(dry run)</i>");
    }
    out.push('\n');

    let _ = writeln!(out, "Deleted: {}", summary.deleted);
    let _ = writeln!(out, "Retired: {}", summary.retired);
    let _ = writeln!(out, "Newly monitored: {}", summary.newly_monitored);
    let _ = writeln!(out, "Re-checked: {}", summary.rechecked);
    let _ = writeln!(out, "Removed from monitor: {}", summary.removed_from_monitor);
    if summary.skipped > 0 {
        let _ = writeln!(out, "Skipped: {}", summary.skipped);
    }

    if !summary.items.is_empty() {
        out.push('\n');
        for item in summary.items.iter().take(max_items) {
            let icon = match item.action {
                ReportAction::Deleted => "🗑",
                ReportAction::Retired => "🏁",
                ReportAction::Failed => "⚠️",
            };
            let files = match item.files {
                FileAction::WithFiles => "with files",
                FileAction::TaskOnly => "task only",
            };
            let sim = if item.simulated { " [simulated]" } else { "" };
            let _ = writeln!(
                out,
                "{icon} <code>{}</code> ({files}){sim}\n    {}",
                escape(&shorten(&item.name, MAX_NAME_CHARS)),
                escape(&item.reason)
            );
        }
        if summary.items.len() > max_items {
            let _ = writeln!(out, "...and {} more", summary.items.len() - max_items);
        }
    }

    if !summary.system_errors.is_empty() {
        out.push_str("\n<b>System errors</b>\n");
        for err in &summary.system_errors {
            let _ = writeln!(
                out,
                "❌ {}: {}",
                escape(&err.context),
                escape(&err.message)
            );
        }
    }

    let _ = write!(out, "\n<i>took {:.1}s</i>", summary.elapsed.as_secs_f64());
    cap_message(out)
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

fn shorten(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut cut: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Cut to [`MAX_MESSAGE_BYTES`] on a char boundary, marking the cut.
fn cap_message(mut text: String) -> String {
    if text.len() <= MAX_MESSAGE_BYTES {
        return text;
    }
    let mut end = MAX_MESSAGE_BYTES - TRUNCATION_MARKER.len();
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text.push_str(TRUNCATION_MARKER);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, action: ReportAction) -> ReportItem {
        ReportItem {
            name: name.to_string(),
            task_id: "abc".to_string(),
            action,
            files: FileAction::WithFiles,
            reason: "stalledUP for 46m".to_string(),
            simulated: false,
        }
    }

    #[test]
    fn idle_run_is_not_noteworthy() {
        let mut s = RunSummary::new(false);
        s.rechecked = 3;
        s.skipped = 10;
        assert!(!s.is_noteworthy());
        s.newly_monitored = 1;
        assert!(s.is_noteworthy());
    }

    #[test]
    fn failures_are_noteworthy() {
        let mut s = RunSummary::new(false);
        s.items.push(item("x", ReportAction::Failed));
        assert_eq!(s.failed(), 1);
        assert!(s.is_noteworthy());
        assert!(RunSummary::failure(false, "connection failed", "refused").is_noteworthy());
    }

    #[test]
    fn renders_counts_and_items() {
        let mut s = RunSummary::new(true);
        s.deleted = 1;
        s.items.push(item("Movie.2024", ReportAction::Deleted));
        let html = render_html(&s, 20);
        assert!(html.contains("(dry run)"));
        assert!(html.contains("Deleted: 1"));
        assert!(html.contains("<code>Movie.2024</code> (with files)"));
    }

    #[test]
    fn escapes_html() {
        let mut s = RunSummary::new(false);
        s.items.push(item("<b>&evil</b>", ReportAction::Retired));
        let html = render_html(&s, 20);
        assert!(html.contains("&lt;b&gt;&amp;evil&lt;/b&gt;"));
        assert!(!html.contains("<b>&evil"));
    }

    #[test]
    fn limits_items() {
        let mut s = RunSummary::new(false);
        for i in 0..5 {
            s.items.push(item(&format!("t{i}"), ReportAction::Deleted));
        }
        let html = render_html(&s, 2);
        assert!(html.contains("t1"));
        assert!(!html.contains("t2"));
        assert!(html.contains("...and 3 more"));
    }

    #[test]
    fn shortens_long_names() {
        let long = "種".repeat(100);
        let short = shorten(&long, 80);
        assert_eq!(short.chars().count(), 80);
        assert!(short.ends_with('…'));
        assert_eq!(shorten("abc", 80), "abc");
    }

    #[test]
    fn caps_message_size_on_char_boundary() {
        let mut s = RunSummary::new(false);
        for i in 0..200 {
            let mut it = item(&format!("{i}{}", "種".repeat(70)), ReportAction::Deleted);
            it.reason = "é".repeat(50);
            s.items.push(it);
        }
        let html = render_html(&s, 200);
        assert!(html.len() <= MAX_MESSAGE_BYTES);
        assert!(html.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn system_errors_rendered() {
        let s = RunSummary::failure(false, "connection failed", "refused <host>");
        let html = render_html(&s, 20);
        assert!(html.contains("System errors"));
        assert!(html.contains("connection failed: refused &lt;host&gt;"));
    }
}
