use crate::model::task::{Task, TaskPatch, TaskStatus};

/// Toggle completion: any → completed (remembering the prior status),
/// completed → the remembered status, or not-started if none was kept.
pub fn toggle_complete(task: &mut Task) -> TaskPatch {
    if task.status == TaskStatus::Completed {
        let restored = task.previous_status.unwrap_or(TaskStatus::NotStarted);
        set_status(task, restored)
    } else {
        set_status(task, TaskStatus::Completed)
    }
}

/// Direct status set. Handles the previous-status bookkeeping and returns the
/// patch that carries the change to the store (empty when nothing changed).
pub fn set_status(task: &mut Task, new_status: TaskStatus) -> TaskPatch {
    if task.status == new_status {
        return TaskPatch::default();
    }
    let mut patch = TaskPatch {
        status: Some(new_status),
        ..Default::default()
    };

    if new_status == TaskStatus::Completed {
        task.previous_status = Some(task.status);
        patch.previous_status = Some(task.previous_status);
    } else if task.status == TaskStatus::Completed {
        // Leaving completed
        task.previous_status = None;
        patch.previous_status = Some(None);
    }
    task.status = new_status;

    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexSet;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: "t1".into(),
            text: "ship it #release @ann".into(),
            status,
            previous_status: None,
            date_created: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            comment: String::new(),
            order: 0,
            tags: ["release".to_string()].into_iter().collect(),
            mentions: ["ann".to_string()].into_iter().collect::<IndexSet<_>>(),
            owner_id: "u1".into(),
        }
    }

    #[test]
    fn test_toggle_round_trip_restores_status() {
        let mut t = task(TaskStatus::InProgress);
        let before = t.clone();

        toggle_complete(&mut t);
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.previous_status, Some(TaskStatus::InProgress));

        toggle_complete(&mut t);
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.previous_status, None);
        assert_eq!(t.tags, before.tags);
        assert_eq!(t.mentions, before.mentions);
        assert_eq!(t.text, before.text);
    }

    #[test]
    fn test_uncomplete_without_previous_defaults_to_not_started() {
        let mut t = task(TaskStatus::Completed);
        toggle_complete(&mut t);
        assert_eq!(t.status, TaskStatus::NotStarted);
    }

    #[test]
    fn test_toggle_patch_contents() {
        let mut t = task(TaskStatus::OnHold);
        let patch = toggle_complete(&mut t);
        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert_eq!(patch.previous_status, Some(Some(TaskStatus::OnHold)));

        let patch = toggle_complete(&mut t);
        assert_eq!(patch.status, Some(TaskStatus::OnHold));
        assert_eq!(patch.previous_status, Some(None));
    }

    #[test]
    fn test_direct_transitions_leave_previous_untouched() {
        let mut t = task(TaskStatus::NotStarted);
        let patch = set_status(&mut t, TaskStatus::OnHold);
        assert_eq!(t.status, TaskStatus::OnHold);
        assert_eq!(t.previous_status, None);
        assert_eq!(patch.previous_status, None);
    }

    #[test]
    fn test_set_status_completed_records_previous() {
        let mut t = task(TaskStatus::OnHold);
        set_status(&mut t, TaskStatus::Completed);
        assert_eq!(t.previous_status, Some(TaskStatus::OnHold));

        // Leaving completed directly to another status clears it
        set_status(&mut t, TaskStatus::InProgress);
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.previous_status, None);
    }

    #[test]
    fn test_set_status_same_is_noop() {
        let mut t = task(TaskStatus::InProgress);
        let patch = set_status(&mut t, TaskStatus::InProgress);
        assert!(patch.is_empty());
    }
}
