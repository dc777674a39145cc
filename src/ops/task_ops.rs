use chrono::{Local, NaiveDate};

use crate::model::task::{NewTask, Task, TaskPatch, TaskStatus};
use crate::ops::annotation_ops::{self, Marker};
use crate::parse::{extract_mentions, extract_tags};

/// Error type for task operations
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id prefix {prefix} is ambiguous ({count} matches)")]
    Ambiguous { prefix: String, count: usize },
    #[error("task text cannot be empty")]
    EmptyText,
}

// ---------------------------------------------------------------------------
// Create / edit
// ---------------------------------------------------------------------------

/// Build a new task for `owner_id`. It goes to the end of the manual order
/// (`order` = number of tasks the owner already has) and starts not-started,
/// with tags and mentions extracted from the text. Stores recompute `order`
/// when they write, since `existing_count` may be stale by then.
pub fn new_task(
    text: &str,
    owner_id: &str,
    existing_count: usize,
    today: NaiveDate,
) -> Result<NewTask, TaskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    Ok(NewTask {
        text: text.to_string(),
        status: TaskStatus::NotStarted,
        date_created: today,
        comment: String::new(),
        order: existing_count,
        tags: extract_tags(text),
        mentions: extract_mentions(text),
        owner_id: owner_id.to_string(),
    })
}

/// Replace the text and re-extract tags and mentions from it. Tags added by
/// hand that no longer appear in the text are dropped.
pub fn edit_text(task: &mut Task, new_text: &str) -> Result<TaskPatch, TaskError> {
    let new_text = new_text.trim();
    if new_text.is_empty() {
        return Err(TaskError::EmptyText);
    }
    task.text = new_text.to_string();
    task.tags = extract_tags(new_text);
    task.mentions = extract_mentions(new_text);
    Ok(TaskPatch {
        text: Some(task.text.clone()),
        tags: Some(task.tags.clone()),
        mentions: Some(task.mentions.clone()),
        ..Default::default()
    })
}

pub fn set_comment(task: &mut Task, comment: &str) -> TaskPatch {
    task.comment = comment.to_string();
    TaskPatch {
        comment: Some(task.comment.clone()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Tags and mentions
// ---------------------------------------------------------------------------

/// Add a tag or mention to the stored set. Returns an empty patch when the
/// set did not change.
pub fn add_annotation(task: &mut Task, raw: &str, marker: Marker) -> TaskPatch {
    let set = annotation_set(task, marker);
    let updated = annotation_ops::add_annotation(set, raw, marker);
    if updated == *set {
        return TaskPatch::default();
    }
    store_annotation_set(task, updated, marker)
}

/// Remove a tag or mention and de-prefix its occurrences in the text.
pub fn remove_annotation(task: &mut Task, raw: &str, marker: Marker) -> TaskPatch {
    let value = annotation_ops::clean_input(raw, marker);
    let (updated, text) =
        annotation_ops::remove_annotation(annotation_set(task, marker), &value, &task.text, marker);
    let mut patch = if updated != *annotation_set(task, marker) {
        store_annotation_set(task, updated, marker)
    } else {
        TaskPatch::default()
    };
    if text != task.text {
        task.text = text;
        patch.text = Some(task.text.clone());
    }
    patch
}

fn annotation_set(task: &Task, marker: Marker) -> &indexmap::IndexSet<String> {
    match marker {
        Marker::Tag => &task.tags,
        Marker::Mention => &task.mentions,
    }
}

fn store_annotation_set(
    task: &mut Task,
    updated: indexmap::IndexSet<String>,
    marker: Marker,
) -> TaskPatch {
    match marker {
        Marker::Tag => {
            task.tags = updated;
            TaskPatch {
                tags: Some(task.tags.clone()),
                ..Default::default()
            }
        }
        Marker::Mention => {
            task.mentions = updated;
            TaskPatch {
                mentions: Some(task.mentions.clone()),
                ..Default::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find a task by full id or by a unique id prefix.
pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task, TaskError> {
    if let Some(task) = tasks.iter().find(|t| t.id == id) {
        return Ok(task);
    }
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| !id.is_empty() && t.id.starts_with(id))
        .collect();
    match matches.as_slice() {
        [task] => Ok(*task),
        [] => Err(TaskError::NotFound(id.to_string())),
        _ => Err(TaskError::Ambiguous {
            prefix: id.to_string(),
            count: matches.len(),
        }),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
