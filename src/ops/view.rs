use std::cmp::Ordering;

use crate::model::query::{SortDirection, SortKey, ViewQuery};
use crate::model::task::{Task, TaskPatch, TaskStatus};

/// Error type for manual reordering
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("position {index} is out of range (list has {len} tasks)")]
    IndexOutOfRange { index: usize, len: usize },
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Keep the tasks that pass every active criterion, in input order.
///
/// Each empty filter set passes everything. Tag and mention filters pass a
/// task carrying at least one of the listed values. The search query matches
/// case-insensitively against the text, tags and mentions.
pub fn filter<'a>(
    tasks: &'a [Task],
    statuses: &[TaskStatus],
    tags: &[String],
    mentions: &[String],
    search: &str,
) -> Vec<&'a Task> {
    let needle = search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| statuses.is_empty() || statuses.contains(&t.status))
        .filter(|t| tags.is_empty() || tags.iter().any(|tag| t.tags.contains(tag)))
        .filter(|t| mentions.is_empty() || mentions.iter().any(|m| t.mentions.contains(m)))
        .filter(|t| needle.is_empty() || matches_search(t, &needle))
        .collect()
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.text.to_lowercase().contains(needle)
        || task.tags.iter().any(|t| t.to_lowercase().contains(needle))
        || task.mentions.iter().any(|m| m.to_lowercase().contains(needle))
}

/// Stable sort of a filtered sequence. `SortKey::None` yields manual order
/// and ignores the direction.
pub fn sort<'a>(mut tasks: Vec<&'a Task>, key: SortKey, direction: SortDirection) -> Vec<&'a Task> {
    let compare: fn(&Task, &Task) -> Ordering = match key {
        SortKey::None => {
            tasks.sort_by_key(|t| t.order);
            return tasks;
        }
        SortKey::Date => |a, b| a.date_key().cmp(&b.date_key()),
        SortKey::Status => |a, b| a.status.rank().cmp(&b.status.rank()),
    };
    match direction {
        SortDirection::Ascending => tasks.sort_by(|a, b| compare(a, b)),
        SortDirection::Descending => tasks.sort_by(|a, b| compare(b, a)),
    }
    tasks
}

/// Filter then sort, the full recompute run after every change.
pub fn project<'a>(tasks: &'a [Task], query: &ViewQuery) -> Vec<&'a Task> {
    let filtered = filter(
        tasks,
        &query.statuses,
        &query.tags,
        &query.mentions,
        &query.search,
    );
    sort(filtered, query.sort_key, query.sort_direction)
}

// ---------------------------------------------------------------------------
// Manual reorder
// ---------------------------------------------------------------------------

/// Move the task at `from` to `to` within the full manual-order sequence and
/// resequence every `order` densely from zero.
///
/// Returns the tasks in their new order together with the per-task patches,
/// which must be applied to the store as one batch.
pub fn reorder(
    tasks: &[Task],
    from: usize,
    to: usize,
) -> Result<(Vec<Task>, Vec<(String, TaskPatch)>), ViewError> {
    let len = tasks.len();
    for index in [from, to] {
        if index >= len {
            return Err(ViewError::IndexOutOfRange { index, len });
        }
    }

    let mut sequence: Vec<Task> = tasks.to_vec();
    sequence.sort_by_key(|t| t.order);
    let moved = sequence.remove(from);
    sequence.insert(to, moved);

    let mut patches = Vec::with_capacity(len);
    for (rank, task) in sequence.iter_mut().enumerate() {
        task.order = rank;
        patches.push((
            task.id.clone(),
            TaskPatch {
                order: Some(rank),
                ..Default::default()
            },
        ));
    }
    Ok((sequence, patches))
}

/// Patches that close gaps in the manual order left by deletions. Only tasks
/// whose position actually changes get a patch.
pub fn resequence(tasks: &[Task]) -> Vec<(String, TaskPatch)> {
    let mut sequence: Vec<&Task> = tasks.iter().collect();
    sequence.sort_by_key(|t| t.order);
    sequence
        .into_iter()
        .enumerate()
        .filter(|(rank, task)| task.order != *rank)
        .map(|(rank, task)| {
            (
                task.id.clone(),
                TaskPatch {
                    order: Some(rank),
                    ..Default::default()
                },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn task(id: &str, text: &str, status: TaskStatus, date: &str, order: usize) -> Task {
        Task {
            id: id.into(),
            text: text.into(),
            status,
            previous_status: None,
            date_created: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            comment: String::new(),
            order,
            tags: crate::parse::extract_tags(text),
            mentions: crate::parse::extract_mentions(text),
            owner_id: "u1".into(),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", "Buy #milk", TaskStatus::NotStarted, "2025-02-01", 0),
            task("b", "Ship release #work @ann", TaskStatus::Completed, "2025-01-15", 1),
            task("c", "Review PR @Bob #work", TaskStatus::InProgress, "2025-03-10", 2),
        ]
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.clone()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // --- Filter ---

    #[test]
    fn test_empty_filters_show_all() {
        let tasks = sample();
        assert_eq!(ids(&filter(&tasks, &[], &[], &[], "")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_status_filter() {
        let tasks = sample();
        let out = filter(&tasks, &[TaskStatus::Completed], &[], &[], "");
        assert_eq!(ids(&out), vec!["b"]);

        let out = filter(
            &tasks,
            &[TaskStatus::NotStarted, TaskStatus::InProgress],
            &[],
            &[],
            "",
        );
        assert_eq!(ids(&out), vec!["a", "c"]);
    }

    #[test]
    fn test_tag_filter_is_or() {
        let tasks = sample();
        let out = filter(&tasks, &[], &strings(&["milk", "work"]), &[], "");
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
        let out = filter(&tasks, &[], &strings(&["work"]), &[], "");
        assert_eq!(ids(&out), vec!["b", "c"]);
    }

    #[test]
    fn test_mention_filter_exact_match() {
        let tasks = sample();
        assert_eq!(ids(&filter(&tasks, &[], &[], &strings(&["ann"]), "")), vec!["b"]);
        // Filter values are compared as stored, case-sensitively
        assert!(filter(&tasks, &[], &[], &strings(&["bob"]), "").is_empty());
    }

    #[test]
    fn test_search_text_tags_mentions_case_insensitive() {
        let tasks = sample();
        assert_eq!(ids(&filter(&tasks, &[], &[], &[], "SHIP")), vec!["b"]);
        assert_eq!(ids(&filter(&tasks, &[], &[], &[], "bob")), vec!["c"]);
        assert_eq!(ids(&filter(&tasks, &[], &[], &[], "  ")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_search_matches_added_tag_not_in_text() {
        let mut tasks = sample();
        tasks[0].tags.insert("groceries".into());
        assert_eq!(ids(&filter(&tasks, &[], &[], &[], "grocer")), vec!["a"]);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let tasks = sample();
        let out = filter(
            &tasks,
            &[TaskStatus::InProgress],
            &strings(&["work"]),
            &[],
            "review",
        );
        assert_eq!(ids(&out), vec!["c"]);
        let out = filter(&tasks, &[TaskStatus::Completed], &strings(&["milk"]), &[], "");
        assert!(out.is_empty());
    }

    // --- Sort ---

    #[test]
    fn test_sort_none_uses_manual_order() {
        let mut tasks = sample();
        tasks[0].order = 2;
        tasks[2].order = 0;
        let out = sort(tasks.iter().collect(), SortKey::None, SortDirection::Descending);
        assert_eq!(ids(&out), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_by_date() {
        let tasks = sample();
        let asc = sort(tasks.iter().collect(), SortKey::Date, SortDirection::Ascending);
        assert_eq!(ids(&asc), vec!["b", "a", "c"]);
        let desc = sort(tasks.iter().collect(), SortKey::Date, SortDirection::Descending);
        assert_eq!(ids(&desc), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sort_by_status_rank_not_alphabetical() {
        let tasks = sample();
        let asc = sort(tasks.iter().collect(), SortKey::Status, SortDirection::Ascending);
        assert_eq!(ids(&asc), vec!["a", "c", "b"]);
        let desc = sort(tasks.iter().collect(), SortKey::Status, SortDirection::Descending);
        assert_eq!(ids(&desc), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let tasks = vec![
            task("x", "one", TaskStatus::OnHold, "2025-01-01", 0),
            task("y", "two", TaskStatus::OnHold, "2025-01-01", 1),
            task("z", "three", TaskStatus::OnHold, "2025-01-01", 2),
        ];
        let out = sort(tasks.iter().collect(), SortKey::Status, SortDirection::Descending);
        assert_eq!(ids(&out), vec!["x", "y", "z"]);
        let out = sort(tasks.iter().rev().collect(), SortKey::Date, SortDirection::Ascending);
        assert_eq!(ids(&out), vec!["z", "y", "x"]);
    }

    #[test]
    fn test_project_filters_then_sorts() {
        let tasks = sample();
        let query = ViewQuery {
            tags: strings(&["work"]),
            sort_key: SortKey::Date,
            sort_direction: SortDirection::Descending,
            ..Default::default()
        };
        assert_eq!(ids(&project(&tasks, &query)), vec!["c", "b"]);
    }

    // --- Reorder ---

    #[test]
    fn test_reorder_first_to_last() {
        let tasks = sample();
        let (reordered, patches) = reorder(&tasks, 0, 2).unwrap();
        let orders: Vec<(String, usize)> =
            reordered.iter().map(|t| (t.id.clone(), t.order)).collect();
        assert_eq!(
            orders,
            vec![("b".into(), 0), ("c".into(), 1), ("a".into(), 2)]
        );
        assert_eq!(patches.len(), 3);
        assert_eq!(patches[2].0, "a");
        assert_eq!(patches[2].1.order, Some(2));
    }

    #[test]
    fn test_reorder_repairs_gaps() {
        let mut tasks = sample();
        tasks[0].order = 3;
        tasks[1].order = 7;
        tasks[2].order = 12;
        let (reordered, _) = reorder(&tasks, 2, 0).unwrap();
        let orders: Vec<usize> = reordered.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(reordered[0].id, "c");
    }

    #[test]
    fn test_reorder_uses_manual_order_not_slice_order() {
        let mut tasks = sample();
        tasks.reverse(); // c, b, a in the slice; a, b, c by order
        let (reordered, _) = reorder(&tasks, 0, 1).unwrap();
        let ids: Vec<&str> = reordered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reorder_same_index_resequences() {
        let tasks = sample();
        let (reordered, patches) = reorder(&tasks, 1, 1).unwrap();
        assert_eq!(reordered, tasks);
        assert_eq!(patches.len(), 3);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let tasks = sample();
        assert_eq!(
            reorder(&tasks, 0, 3),
            Err(ViewError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(reorder(&[], 0, 0).is_err());
    }

    #[test]
    fn test_resequence_closes_gaps() {
        let mut tasks = sample();
        tasks.remove(0); // b=1, c=2
        let patches = resequence(&tasks);
        let orders: Vec<(String, Option<usize>)> =
            patches.iter().map(|(id, p)| (id.clone(), p.order)).collect();
        assert_eq!(
            orders,
            vec![("b".into(), Some(0)), ("c".into(), Some(1))]
        );
        assert!(resequence(&sample()).is_empty());
    }
}
