//! Canonical task model and the derived views computed from it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata attached to a single assignee of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Directory id of the user who made the assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<String>,
    /// When the assignment was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date_time: Option<DateTime<Utc>>,
    /// Ordering hint used by the remote board.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_hint: Option<String>,
}

/// A task normalized from the remote planner.
///
/// Records are rebuilt on every fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub plan_id: String,
    pub bucket_id: String,
    pub title: String,
    /// 0-100.
    pub percent_complete: i32,
    /// 0-10, lower is more urgent.
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Assignee directory id to assignment metadata.
    #[serde(default)]
    pub assignments: BTreeMap<String, Assignment>,
}

impl TaskRecord {
    /// Create a record with the required identity fields and defaults elsewhere.
    pub fn new(
        id: impl Into<String>,
        plan_id: impl Into<String>,
        bucket_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            plan_id: plan_id.into(),
            bucket_id: bucket_id.into(),
            title: title.into(),
            percent_complete: 0,
            priority: 0,
            start_date_time: None,
            due_date_time: None,
            created_date_time: None,
            description: None,
            assignments: BTreeMap::new(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_percent_complete(mut self, percent_complete: i32) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    pub fn with_due_date_time(mut self, due: DateTime<Utc>) -> Self {
        self.due_date_time = Some(due);
        self
    }

    pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
        self.assignments.insert(user_id.into(), Assignment::default());
        self
    }

    pub fn priority_label(&self) -> PriorityLabel {
        PriorityLabel::from_priority(self.priority)
    }

    pub fn progress_label(&self) -> ProgressLabel {
        ProgressLabel::from_percent_complete(self.percent_complete)
    }

    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 100
    }

    /// Whether the assignment map has an entry keyed by this directory id.
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignments.contains_key(user_id)
    }

    /// Due strictly before `now` and not yet complete.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.due_date_time.is_some_and(|due| due < now) && !self.is_complete()
    }
}

/// Priority bucket derived from the raw 0-10 priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityLabel {
    Urgent,
    Important,
    Medium,
    Low,
    Unknown,
}

impl PriorityLabel {
    pub const fn from_priority(priority: i32) -> Self {
        match priority {
            0 | 1 => Self::Urgent,
            2..=4 => Self::Important,
            5..=7 => Self::Medium,
            8..=10 => Self::Low,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "Urgent",
            Self::Important => "Important",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PriorityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress bucket derived from `percent_complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressLabel {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl ProgressLabel {
    pub const fn from_percent_complete(percent_complete: i32) -> Self {
        if percent_complete >= 100 {
            Self::Completed
        } else if percent_complete > 0 {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProgressLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress filter requested by name, e.g. "in-progress" or "Not Started".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressFilter {
    NotStarted,
    InProgress,
    Completed,
    /// Anything below 100%.
    Incomplete,
}

impl ProgressFilter {
    /// Parse a status name ignoring case, spaces, hyphens and underscores.
    ///
    /// Returns `None` for names that match no filter.
    pub fn parse(status: &str) -> Option<Self> {
        let normalized: String = status
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "notstarted" => Some(Self::NotStarted),
            "inprogress" => Some(Self::InProgress),
            "completed" | "done" => Some(Self::Completed),
            "incomplete" | "open" => Some(Self::Incomplete),
            _ => None,
        }
    }

    pub fn matches(self, task: &TaskRecord) -> bool {
        let pct = task.percent_complete;
        match self {
            Self::NotStarted => pct == 0,
            Self::InProgress => pct > 0 && pct < 100,
            Self::Completed => pct >= 100,
            Self::Incomplete => pct < 100,
        }
    }
}

/// Whose tasks a query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    /// The user the access token belongs to.
    CurrentUser,
    /// Tasks assigned to the user with this email.
    User(String),
}

impl TaskScope {
    /// Build a scope from an optional email; blank means the current user.
    pub fn from_email(email: Option<&str>) -> Self {
        match email.map(str::trim) {
            Some(email) if !email.is_empty() => Self::User(email.to_string()),
            _ => Self::CurrentUser,
        }
    }
}

impl fmt::Display for TaskScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentUser => f.write_str("me"),
            Self::User(email) => f.write_str(email),
        }
    }
}

/// A task with its derived labels, as handed to the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTask {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub priority_label: PriorityLabel,
    pub progress_label: ProgressLabel,
}

impl From<TaskRecord> for AnnotatedTask {
    fn from(task: TaskRecord) -> Self {
        Self {
            priority_label: task.priority_label(),
            progress_label: task.progress_label(),
            task,
        }
    }
}

/// A plan that tasks can be created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A bucket (column) inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub plan_id: String,
}

/// Payload for creating a task in a resolved plan and bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub plan_id: String,
    pub bucket_id: String,
    pub title: String,
}
