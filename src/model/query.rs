use serde::{Deserialize, Serialize};

use super::task::TaskStatus;

/// Key a projection is sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Manual order
    #[default]
    None,
    Date,
    Status,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::None => "none",
            SortKey::Date => "date",
            SortKey::Status => "status",
        }
    }

    pub fn from_label(s: &str) -> Option<SortKey> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "manual" => Some(SortKey::None),
            "date" => Some(SortKey::Date),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    pub fn from_label(s: &str) -> Option<SortDirection> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// The filter, search and sort criteria a projection is computed from.
///
/// Empty filter sets place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub statuses: Vec<TaskStatus>,
    pub tags: Vec<String>,
    pub mentions: Vec<String>,
    pub search: String,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

impl ViewQuery {
    /// Whether a sort key overrides manual order
    pub fn is_sorted(&self) -> bool {
        self.sort_key != SortKey::None
    }

    /// Drop back to manual order. Required before a manual reorder.
    pub fn clear_sort(&mut self) {
        self.sort_key = SortKey::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_manual_and_unfiltered() {
        let q = ViewQuery::default();
        assert!(!q.is_sorted());
        assert!(q.statuses.is_empty());
        assert_eq!(q.sort_direction, SortDirection::Ascending);
    }

    #[test]
    fn clear_sort_returns_to_manual() {
        let mut q = ViewQuery {
            sort_key: SortKey::Status,
            sort_direction: SortDirection::Descending,
            ..Default::default()
        };
        assert!(q.is_sorted());
        q.clear_sort();
        assert!(!q.is_sorted());
        assert_eq!(q.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn labels() {
        assert_eq!(SortKey::from_label("Date"), Some(SortKey::Date));
        assert_eq!(SortKey::from_label("manual"), Some(SortKey::None));
        assert_eq!(SortKey::from_label("priority"), None);
        assert_eq!(
            SortDirection::from_label("desc"),
            Some(SortDirection::Descending)
        );
        for key in [SortKey::None, SortKey::Date, SortKey::Status] {
            assert_eq!(SortKey::from_label(key.label()), Some(key));
        }
        assert_eq!(SortDirection::Descending.label(), "desc");
    }
}
