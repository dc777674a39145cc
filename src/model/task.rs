use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

impl TaskStatus {
    /// All statuses in rank order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::OnHold,
        TaskStatus::Completed,
    ];

    /// Position in the fixed status sequence, used for status sorting
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::NotStarted => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::OnHold => 2,
            TaskStatus::Completed => 3,
        }
    }

    /// The kebab-case label used on the command line and in storage
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::OnHold => "on-hold",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parse a label. Accepts the kebab-case label and a few short aliases.
    pub fn from_label(s: &str) -> Option<TaskStatus> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-started" | "todo" | "new" => Some(TaskStatus::NotStarted),
            "in-progress" | "active" | "doing" => Some(TaskStatus::InProgress),
            "on-hold" | "hold" | "paused" => Some(TaskStatus::OnHold),
            "completed" | "done" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A task as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque identifier assigned by the store
    pub id: String,
    /// Free-form text; source of extracted tags and mentions
    pub text: String,
    pub status: TaskStatus,
    /// Status held before the task was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<TaskStatus>,
    /// Creation date, serialized as `YYYY-MM-DD`
    pub date_created: NaiveDate,
    #[serde(default)]
    pub comment: String,
    /// Manual rank, dense and zero-based per owner
    pub order: usize,
    /// Tags without the `#` prefix
    #[serde(default)]
    pub tags: IndexSet<String>,
    /// Mentions without the `@` prefix
    #[serde(default)]
    pub mentions: IndexSet<String>,
    pub owner_id: String,
}

impl Task {
    /// The creation date as the `YYYY-MM-DD` string the date sort compares
    pub fn date_key(&self) -> String {
        self.date_created.format("%Y-%m-%d").to_string()
    }
}

/// A task that has not been stored yet (no id)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub status: TaskStatus,
    pub date_created: NaiveDate,
    pub comment: String,
    pub order: usize,
    pub tags: IndexSet<String>,
    pub mentions: IndexSet<String>,
    pub owner_id: String,
}

impl NewTask {
    /// Attach the store-assigned id
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            text: self.text,
            status: self.status,
            previous_status: None,
            date_created: self.date_created,
            comment: self.comment,
            order: self.order,
            tags: self.tags,
            mentions: self.mentions,
            owner_id: self.owner_id,
        }
    }
}

/// Partial update of a stored task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// `Some(None)` clears the previous status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<Option<TaskStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<IndexSet<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Apply every present field to `task`
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text = text.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(prev) = self.previous_status {
            task.previous_status = prev;
        }
        if let Some(comment) = &self.comment {
            task.comment = comment.clone();
        }
        if let Some(order) = self.order {
            task.order = order;
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
        if let Some(mentions) = &self.mentions {
            task.mentions = mentions.clone();
        }
    }
}
