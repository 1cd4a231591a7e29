//! Table output formatting for CLI commands
//!
//! Renders annotated tasks with comfy-table. Labels are color-coded when
//! the terminal supports it and prefixed with an icon otherwise.

use crate::domain::models::{AnnotatedTask, PriorityLabel, ProgressLabel};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a list of tasks as a table
    pub fn format_tasks(&self, tasks: &[AnnotatedTask]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Progress").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
        ]);

        for annotated in tasks {
            let task = &annotated.task;

            let priority_text = format!("{} ({})", annotated.priority_label, task.priority);
            let priority_cell = if self.use_colors {
                Cell::new(priority_text).fg(priority_color(annotated.priority_label))
            } else {
                Cell::new(format!("{} {}", priority_icon(annotated.priority_label), priority_text))
            };

            let progress_text = format!("{} {}%", annotated.progress_label, task.percent_complete);
            let progress_cell = if self.use_colors {
                Cell::new(progress_text).fg(progress_color(annotated.progress_label))
            } else {
                Cell::new(format!("{} {}", progress_icon(annotated.progress_label), progress_text))
            };

            let due = task
                .due_date_time
                .map_or_else(|| "-".to_string(), |due| due.format("%Y-%m-%d").to_string());

            table.add_row(vec![
                Cell::new(truncate_text(&task.id, 12)),
                Cell::new(truncate_text(&task.title, 40)),
                priority_cell,
                progress_cell,
                Cell::new(due),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if terminal supports colors (respects NO_COLOR env var)
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

const fn priority_color(label: PriorityLabel) -> Color {
    match label {
        PriorityLabel::Urgent => Color::Red,
        PriorityLabel::Important => Color::Yellow,
        PriorityLabel::Medium => Color::Blue,
        PriorityLabel::Low | PriorityLabel::Unknown => Color::DarkGrey,
    }
}

const fn priority_icon(label: PriorityLabel) -> &'static str {
    match label {
        PriorityLabel::Urgent => "!!",
        PriorityLabel::Important => "!",
        PriorityLabel::Medium => "-",
        PriorityLabel::Low => ".",
        PriorityLabel::Unknown => "?",
    }
}

const fn progress_color(label: ProgressLabel) -> Color {
    match label {
        ProgressLabel::NotStarted => Color::White,
        ProgressLabel::InProgress => Color::Cyan,
        ProgressLabel::Completed => Color::Green,
    }
}

const fn progress_icon(label: ProgressLabel) -> &'static str {
    match label {
        ProgressLabel::NotStarted => "○",
        ProgressLabel::InProgress => "⟳",
        ProgressLabel::Completed => "✓",
    }
}

/// Truncate text to max length, adding "..." if truncated
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskRecord;
    use chrono::{TimeZone, Utc};

    fn task(id: &str, title: &str, priority: i32, percent: i32) -> AnnotatedTask {
        AnnotatedTask::from(
            TaskRecord::new(id, "plan-1", "bucket-1", title)
                .with_priority(priority)
                .with_percent_complete(percent),
        )
    }

    #[test]
    fn test_format_tasks_plain() {
        let formatter = TableFormatter::with_config(false, None);
        let due = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let tasks = vec![
            task("t1", "Draft spec", 1, 0),
            AnnotatedTask::from(
                TaskRecord::new("t2", "plan-1", "bucket-1", "Review")
                    .with_priority(5)
                    .with_percent_complete(50)
                    .with_due_date_time(due),
            ),
        ];

        let output = formatter.format_tasks(&tasks);
        assert!(output.contains("Draft spec"));
        assert!(output.contains("!! Urgent (1)"));
        assert!(output.contains("○ Not started 0%"));
        assert!(output.contains("⟳ In Progress 50%"));
        assert!(output.contains("2026-03-01"));
    }

    #[test]
    fn test_format_empty_has_header() {
        let formatter = TableFormatter::with_config(false, None);
        let output = formatter.format_tasks(&[]);
        assert!(output.contains("Title"));
        assert!(output.contains("Progress"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("this is a long title", 10), "this is...");
        assert_eq!(truncate_text("ééééééé", 5), "éé...");
    }
}
