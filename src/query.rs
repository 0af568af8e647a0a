//! Filtering, sorting, and deadline classification for one user's todos.
//!
//! Everything here is pure: rows go in, a deterministically ordered subset
//! comes out. The current time is a parameter, never read from the clock, so
//! every classification and window is reproducible. Callers scope rows to a
//! single user before handing them over.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Todo;

/// Todo priority, ordered `low < medium < high` (ordinal, not lexicographic).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Case-insensitive parse of the closed `high|medium|low` set.
    pub fn parse(value: &str) -> Option<Priority> {
        match value.to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Reads a stored priority column. An unrecognized value falls back to
    /// the `medium` default instead of failing the row.
    pub fn from_stored(value: &str) -> Priority {
        Priority::parse(value).unwrap_or(Priority::Medium)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Derived urgency bucket. Never persisted; recomputed on every read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    Normal,
    Overdue,
    DueToday,
    DueSoon,
}

impl DeadlineStatus {
    /// Classifies a deadline relative to `now`. Completed todos and todos
    /// without a deadline are always `normal`; the checks below run in
    /// order, so a deadline earlier today is `overdue`, not `due_today`.
    pub fn classify(
        deadline: Option<NaiveDateTime>,
        completed: bool,
        now: NaiveDateTime,
    ) -> DeadlineStatus {
        let deadline = match deadline {
            Some(deadline) if !completed => deadline,
            _ => return DeadlineStatus::Normal,
        };
        if deadline < now {
            return DeadlineStatus::Overdue;
        }
        if deadline.date() == now.date() {
            return DeadlineStatus::DueToday;
        }
        if deadline - now <= Duration::days(3) {
            return DeadlineStatus::DueSoon;
        }
        DeadlineStatus::Normal
    }
}

/// Deadline window filter. An input value, distinct from [`DeadlineStatus`]:
/// `due_this_week` has no derived counterpart, and `due_today` spans the
/// whole calendar date including hours already past.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeadlineWindow {
    Overdue,
    DueToday,
    DueThisWeek,
}

impl DeadlineWindow {
    pub fn parse(value: &str) -> Option<DeadlineWindow> {
        match value {
            "overdue" => Some(DeadlineWindow::Overdue),
            "due_today" => Some(DeadlineWindow::DueToday),
            "due_this_week" => Some(DeadlineWindow::DueThisWeek),
            _ => None,
        }
    }

    /// Window membership. Only open todos can be due, and a todo without a
    /// deadline is in no window.
    fn contains(&self, todo: &Todo, now: NaiveDateTime) -> bool {
        if todo.completed {
            return false;
        }
        let deadline = match todo.deadline {
            Some(deadline) => deadline,
            None => return false,
        };
        match self {
            DeadlineWindow::Overdue => deadline < now,
            DeadlineWindow::DueToday => deadline.date() == now.date(),
            DeadlineWindow::DueThisWeek => now <= deadline && deadline <= now + Duration::days(7),
        }
    }
}

/// Optional, independently toggleable constraints over one user's todos.
/// Supplied filters AND together; an absent filter matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoFilters {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub category_id: Option<Uuid>,
    pub deadline_status: Option<DeadlineWindow>,
}

impl TodoFilters {
    /// Builds filters from raw query parameters. Unrecognized values are
    /// dropped rather than rejected, so a bad filter widens the result set
    /// instead of erroring.
    pub fn from_params(
        completed: Option<bool>,
        priority: Option<&str>,
        category_id: Option<&str>,
        deadline_status: Option<&str>,
    ) -> TodoFilters {
        TodoFilters {
            completed,
            priority: priority.and_then(Priority::parse),
            category_id: category_id.and_then(|raw| Uuid::parse_str(raw).ok()),
            deadline_status: deadline_status.and_then(DeadlineWindow::parse),
        }
    }

    pub fn matches(&self, todo: &Todo, now: NaiveDateTime) -> bool {
        if let Some(completed) = self.completed {
            if todo.completed != completed {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if Priority::from_stored(&todo.priority) != priority {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if todo.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(window) = self.deadline_status {
            if !window.contains(todo, now) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Priority,
    Deadline,
    CreatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Sort key and direction. Out-of-set inputs silently fall back to
/// `created_at desc`; clients depend on that leniency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOptions {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl SortOptions {
    pub fn from_params(sort_by: Option<&str>, sort_direction: Option<&str>) -> SortOptions {
        let field = match sort_by {
            Some("priority") => SortField::Priority,
            Some("deadline") => SortField::Deadline,
            _ => SortField::CreatedAt,
        };
        let direction = match sort_direction {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        SortOptions { field, direction }
    }
}

/// Orders todos by the primary key, with `created_at desc` as the tie-break
/// whenever the primary key is not `created_at` itself. The sort is stable,
/// so remaining ties keep their incoming order.
pub fn sort_todos(todos: &mut [Todo], sort: &SortOptions) {
    todos.sort_by(|a, b| {
        let primary = match sort.field {
            SortField::Priority => sort.direction.apply(
                Priority::from_stored(&a.priority).cmp(&Priority::from_stored(&b.priority)),
            ),
            SortField::Deadline => compare_deadlines(a.deadline, b.deadline, sort.direction),
            SortField::CreatedAt => sort.direction.apply(a.created_at.cmp(&b.created_at)),
        };
        match sort.field {
            SortField::CreatedAt => primary,
            _ => primary.then_with(|| b.created_at.cmp(&a.created_at)),
        }
    });
}

// Chronological compare where a missing deadline sorts last in both
// directions; null is never "smallest".
fn compare_deadlines(
    a: Option<NaiveDateTime>,
    b: Option<NaiveDateTime>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The todos query pipeline: narrow `todos` by `filters`, then impose the
/// deterministic order described by `sort`. Pure; identical inputs with an
/// identical `now` always produce the identical list.
pub fn filter_and_sort(
    mut todos: Vec<Todo>,
    filters: &TodoFilters,
    sort: &SortOptions,
    now: NaiveDateTime,
) -> Vec<Todo> {
    todos.retain(|todo| filters.matches(todo, now));
    sort_todos(&mut todos, sort);
    todos
}
