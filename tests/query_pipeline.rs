use chrono::{NaiveDate, NaiveDateTime};
use todo_api::models::Todo;
use todo_api::query::{
    filter_and_sort, sort_todos, DeadlineStatus, DeadlineWindow, Priority, SortDirection,
    SortField, SortOptions, TodoFilters,
};
use uuid::Uuid;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

// Reference instant for every classification test: 2024-01-15 12:00 UTC.
fn noon() -> NaiveDateTime {
    at(2024, 1, 15, 12, 0)
}

fn make_todo(
    title: &str,
    priority: &str,
    deadline: Option<NaiveDateTime>,
    completed: bool,
    created_at: NaiveDateTime,
) -> Todo {
    Todo {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        completed,
        deadline,
        priority: priority.to_string(),
        category_id: None,
        created_at,
        updated_at: created_at,
    }
}

fn titles(todos: &[Todo]) -> Vec<&str> {
    todos.iter().map(|todo| todo.title.as_str()).collect()
}

// --- Deadline classification ---

#[test]
fn completed_todos_classify_normal_regardless_of_deadline() {
    let deadlines = [
        None,
        Some(at(2020, 6, 1, 0, 0)),
        Some(at(2024, 1, 15, 18, 0)),
        Some(at(2030, 1, 1, 0, 0)),
    ];
    for deadline in deadlines {
        assert_eq!(
            DeadlineStatus::classify(deadline, true, noon()),
            DeadlineStatus::Normal
        );
    }
}

#[test]
fn open_todo_with_past_deadline_is_overdue() {
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 14, 0, 0)), false, noon()),
        DeadlineStatus::Overdue
    );
    assert_eq!(
        DeadlineStatus::classify(Some(at(2019, 12, 31, 23, 59)), false, noon()),
        DeadlineStatus::Overdue
    );
}

#[test]
fn classification_windows_at_a_fixed_now() {
    // Yesterday, open: overdue.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 14, 0, 0)), false, noon()),
        DeadlineStatus::Overdue
    );
    // Later today: due_today.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 15, 18, 0)), false, noon()),
        DeadlineStatus::DueToday
    );
    // Day after tomorrow: due_soon.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 17, 0, 0)), false, noon()),
        DeadlineStatus::DueSoon
    );
    // Yesterday but completed: normal.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 14, 0, 0)), true, noon()),
        DeadlineStatus::Normal
    );
}

#[test]
fn due_soon_boundary_is_exactly_three_days() {
    // Exactly 3 days out is still due_soon.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 18, 12, 0)), false, noon()),
        DeadlineStatus::DueSoon
    );
    // A minute past three days is normal.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 18, 12, 1)), false, noon()),
        DeadlineStatus::Normal
    );
}

#[test]
fn missing_deadline_is_normal() {
    assert_eq!(
        DeadlineStatus::classify(None, false, noon()),
        DeadlineStatus::Normal
    );
}

#[test]
fn deadline_earlier_the_same_day_counts_as_overdue() {
    // The overdue check runs before the calendar-date check.
    assert_eq!(
        DeadlineStatus::classify(Some(at(2024, 1, 15, 8, 0)), false, noon()),
        DeadlineStatus::Overdue
    );
}

// --- Sorting ---

#[test]
fn priority_sort_orders_by_ordinal_not_name() {
    let todos = vec![
        make_todo("A", "low", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("B", "high", None, false, at(2024, 1, 10, 10, 0)),
        make_todo("C", "medium", None, false, at(2024, 1, 10, 11, 0)),
    ];

    let mut desc = todos.clone();
    sort_todos(
        &mut desc,
        &SortOptions {
            field: SortField::Priority,
            direction: SortDirection::Desc,
        },
    );
    assert_eq!(titles(&desc), vec!["B", "C", "A"]);

    let mut asc = todos.clone();
    sort_todos(
        &mut asc,
        &SortOptions {
            field: SortField::Priority,
            direction: SortDirection::Asc,
        },
    );
    assert_eq!(titles(&asc), vec!["A", "C", "B"]);
}

#[test]
fn no_low_or_medium_ever_precedes_high_in_priority_desc() {
    let todos = vec![
        make_todo("m1", "medium", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("h1", "high", None, true, at(2024, 1, 10, 10, 0)),
        make_todo("l1", "low", None, false, at(2024, 1, 10, 11, 0)),
        make_todo("h2", "high", None, false, at(2024, 1, 10, 12, 0)),
        make_todo("l2", "low", None, false, at(2024, 1, 10, 13, 0)),
    ];

    let sorted = filter_and_sort(
        todos,
        &TodoFilters::default(),
        &SortOptions {
            field: SortField::Priority,
            direction: SortDirection::Desc,
        },
        noon(),
    );

    let last_high = sorted
        .iter()
        .rposition(|todo| todo.priority == "high")
        .unwrap();
    let first_other = sorted
        .iter()
        .position(|todo| todo.priority != "high")
        .unwrap();
    assert!(last_high < first_other);
}

#[test]
fn equal_priorities_tie_break_on_newest_created() {
    let todos = vec![
        make_todo("older", "high", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("newer", "high", None, false, at(2024, 1, 10, 11, 0)),
        make_todo("low", "low", None, false, at(2024, 1, 10, 10, 0)),
    ];

    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let mut sorted = todos.clone();
        sort_todos(
            &mut sorted,
            &SortOptions {
                field: SortField::Priority,
                direction,
            },
        );
        let older_pos = sorted.iter().position(|t| t.title == "older").unwrap();
        let newer_pos = sorted.iter().position(|t| t.title == "newer").unwrap();
        // created_at desc between equal priorities, whatever the direction.
        assert!(newer_pos < older_pos);
    }
}

#[test]
fn deadline_sort_places_missing_deadlines_last_in_both_directions() {
    let todos = vec![
        make_todo("none1", "medium", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("jan20", "medium", Some(at(2024, 1, 20, 0, 0)), false, at(2024, 1, 10, 10, 0)),
        make_todo("none2", "medium", None, false, at(2024, 1, 10, 11, 0)),
        make_todo("jan16", "medium", Some(at(2024, 1, 16, 0, 0)), false, at(2024, 1, 10, 12, 0)),
    ];

    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let mut sorted = todos.clone();
        sort_todos(
            &mut sorted,
            &SortOptions {
                field: SortField::Deadline,
                direction,
            },
        );
        assert!(sorted[0].deadline.is_some());
        assert!(sorted[1].deadline.is_some());
        assert!(sorted[2].deadline.is_none());
        assert!(sorted[3].deadline.is_none());
    }
}

#[test]
fn deadline_sort_is_chronological() {
    let todos = vec![
        make_todo("jan20", "medium", Some(at(2024, 1, 20, 0, 0)), false, at(2024, 1, 10, 9, 0)),
        make_todo("jan16", "medium", Some(at(2024, 1, 16, 0, 0)), false, at(2024, 1, 10, 10, 0)),
        make_todo("jan18", "medium", Some(at(2024, 1, 18, 0, 0)), false, at(2024, 1, 10, 11, 0)),
    ];

    let mut asc = todos.clone();
    sort_todos(
        &mut asc,
        &SortOptions {
            field: SortField::Deadline,
            direction: SortDirection::Asc,
        },
    );
    assert_eq!(titles(&asc), vec!["jan16", "jan18", "jan20"]);

    let mut desc = todos.clone();
    sort_todos(
        &mut desc,
        &SortOptions {
            field: SortField::Deadline,
            direction: SortDirection::Desc,
        },
    );
    assert_eq!(titles(&desc), vec!["jan20", "jan18", "jan16"]);
}

#[test]
fn created_at_sort_defaults_to_descending() {
    let todos = vec![
        make_todo("first", "medium", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("second", "medium", None, false, at(2024, 1, 10, 10, 0)),
        make_todo("third", "medium", None, false, at(2024, 1, 10, 11, 0)),
    ];

    let sorted = filter_and_sort(
        todos,
        &TodoFilters::default(),
        &SortOptions::from_params(None, None),
        noon(),
    );
    assert_eq!(titles(&sorted), vec!["third", "second", "first"]);
}

#[test]
fn unknown_sort_inputs_fall_back_to_created_at_desc() {
    assert_eq!(
        SortOptions::from_params(Some("bogus_field"), Some("sideways")),
        SortOptions::default()
    );
    // Direction is normalized independently of the field.
    assert_eq!(
        SortOptions::from_params(Some("deadline"), Some("upside_down")),
        SortOptions {
            field: SortField::Deadline,
            direction: SortDirection::Desc,
        }
    );

    let todos = vec![
        make_todo("first", "low", None, false, at(2024, 1, 10, 9, 0)),
        make_todo("second", "high", None, false, at(2024, 1, 10, 10, 0)),
    ];
    let sorted = filter_and_sort(
        todos,
        &TodoFilters::default(),
        &SortOptions::from_params(Some("bogus_field"), None),
        noon(),
    );
    assert_eq!(titles(&sorted), vec!["second", "first"]);
}

// --- Filtering ---

#[test]
fn overdue_filter_never_returns_completed_rows() {
    let todos = vec![
        make_todo("open_late", "medium", Some(at(2024, 1, 10, 0, 0)), false, at(2024, 1, 9, 9, 0)),
        make_todo("done_late", "medium", Some(at(2024, 1, 10, 0, 0)), true, at(2024, 1, 9, 10, 0)),
        make_todo("open_future", "medium", Some(at(2024, 1, 20, 0, 0)), false, at(2024, 1, 9, 11, 0)),
    ];

    let filters = TodoFilters {
        deadline_status: Some(DeadlineWindow::Overdue),
        ..TodoFilters::default()
    };
    let result = filter_and_sort(todos, &filters, &SortOptions::default(), noon());

    assert_eq!(titles(&result), vec!["open_late"]);
    assert!(result.iter().all(|todo| !todo.completed));
}

#[test]
fn due_today_window_spans_the_whole_calendar_date() {
    let todos = vec![
        make_todo("this_morning", "medium", Some(at(2024, 1, 15, 8, 0)), false, at(2024, 1, 9, 9, 0)),
        make_todo("tonight", "medium", Some(at(2024, 1, 15, 23, 0)), false, at(2024, 1, 9, 10, 0)),
        make_todo("tomorrow", "medium", Some(at(2024, 1, 16, 9, 0)), false, at(2024, 1, 9, 11, 0)),
    ];

    let filters = TodoFilters {
        deadline_status: Some(DeadlineWindow::DueToday),
        ..TodoFilters::default()
    };
    let result = filter_and_sort(todos, &filters, &SortOptions::default(), noon());

    // The window covers hours already past, unlike the derived status.
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|todo| todo.title != "tomorrow"));
}

#[test]
fn due_this_week_window_is_inclusive_of_day_seven() {
    let todos = vec![
        make_todo("yesterday", "medium", Some(at(2024, 1, 14, 12, 0)), false, at(2024, 1, 9, 9, 0)),
        make_todo("day_seven", "medium", Some(at(2024, 1, 22, 12, 0)), false, at(2024, 1, 9, 10, 0)),
        make_todo("day_eight", "medium", Some(at(2024, 1, 22, 12, 1)), false, at(2024, 1, 9, 11, 0)),
        make_todo("midweek", "medium", Some(at(2024, 1, 18, 0, 0)), false, at(2024, 1, 9, 12, 0)),
    ];

    let filters = TodoFilters {
        deadline_status: Some(DeadlineWindow::DueThisWeek),
        ..TodoFilters::default()
    };
    let mut result = filter_and_sort(todos, &filters, &SortOptions::default(), noon());
    result.sort_by(|a, b| a.title.cmp(&b.title));

    assert_eq!(titles(&result), vec!["day_seven", "midweek"]);
}

#[test]
fn rows_without_deadline_match_no_window() {
    let todos = vec![make_todo("undated", "medium", None, false, at(2024, 1, 9, 9, 0))];

    for window in [
        DeadlineWindow::Overdue,
        DeadlineWindow::DueToday,
        DeadlineWindow::DueThisWeek,
    ] {
        let filters = TodoFilters {
            deadline_status: Some(window),
            ..TodoFilters::default()
        };
        let result = filter_and_sort(todos.clone(), &filters, &SortOptions::default(), noon());
        assert!(result.is_empty());
    }
}

#[test]
fn filters_combine_with_and() {
    let category = Uuid::new_v4();
    let mut wanted = make_todo("wanted", "high", None, false, at(2024, 1, 9, 9, 0));
    wanted.category_id = Some(category);
    let mut wrong_priority = make_todo("wrong_priority", "low", None, false, at(2024, 1, 9, 10, 0));
    wrong_priority.category_id = Some(category);
    let mut done = make_todo("done", "high", None, true, at(2024, 1, 9, 11, 0));
    done.category_id = Some(category);
    let uncategorized = make_todo("uncategorized", "high", None, false, at(2024, 1, 9, 12, 0));

    let filters = TodoFilters {
        completed: Some(false),
        priority: Some(Priority::High),
        category_id: Some(category),
        deadline_status: None,
    };
    let result = filter_and_sort(
        vec![wanted, wrong_priority, done, uncategorized],
        &filters,
        &SortOptions::default(),
        noon(),
    );

    assert_eq!(titles(&result), vec!["wanted"]);
}

#[test]
fn unrecognized_filter_values_impose_no_constraint() {
    assert_eq!(
        TodoFilters::from_params(None, Some("URGENT"), Some("not-a-uuid"), Some("someday")),
        TodoFilters::default()
    );

    let todos = vec![
        make_todo("a", "high", None, false, at(2024, 1, 9, 9, 0)),
        make_todo("b", "low", None, true, at(2024, 1, 9, 10, 0)),
    ];
    let filters = TodoFilters::from_params(None, Some("URGENT"), None, Some("someday"));
    let result = filter_and_sort(todos, &filters, &SortOptions::default(), noon());
    assert_eq!(result.len(), 2);
}

#[test]
fn priority_filter_accepts_any_case() {
    let filters = TodoFilters::from_params(None, Some("HIGH"), None, None);
    assert_eq!(filters.priority, Some(Priority::High));

    let filters = TodoFilters::from_params(None, Some("Medium"), None, None);
    assert_eq!(filters.priority, Some(Priority::Medium));
}

#[test]
fn category_filter_matches_exactly() {
    let category = Uuid::new_v4();
    let mut categorized = make_todo("categorized", "medium", None, false, at(2024, 1, 9, 9, 0));
    categorized.category_id = Some(category);
    let mut other = make_todo("other", "medium", None, false, at(2024, 1, 9, 10, 0));
    other.category_id = Some(Uuid::new_v4());
    let bare = make_todo("bare", "medium", None, false, at(2024, 1, 9, 11, 0));

    let filters = TodoFilters {
        category_id: Some(category),
        ..TodoFilters::default()
    };
    let result = filter_and_sort(
        vec![categorized, other, bare],
        &filters,
        &SortOptions::default(),
        noon(),
    );
    assert_eq!(titles(&result), vec!["categorized"]);
}

// --- Pipeline ---

#[test]
fn pipeline_is_deterministic_for_identical_inputs() {
    let todos = vec![
        make_todo("a", "high", Some(at(2024, 1, 16, 0, 0)), false, at(2024, 1, 9, 9, 0)),
        make_todo("b", "low", None, false, at(2024, 1, 9, 10, 0)),
        make_todo("c", "medium", Some(at(2024, 1, 10, 0, 0)), true, at(2024, 1, 9, 11, 0)),
        make_todo("d", "high", Some(at(2024, 1, 14, 0, 0)), false, at(2024, 1, 9, 12, 0)),
    ];
    let filters = TodoFilters {
        completed: Some(false),
        ..TodoFilters::default()
    };
    let sort = SortOptions {
        field: SortField::Deadline,
        direction: SortDirection::Asc,
    };

    let first: Vec<Uuid> = filter_and_sort(todos.clone(), &filters, &sort, noon())
        .iter()
        .map(|todo| todo.id)
        .collect();
    let second: Vec<Uuid> = filter_and_sort(todos, &filters, &sort, noon())
        .iter()
        .map(|todo| todo.id)
        .collect();

    assert_eq!(first, second);
}

#[test]
fn stored_priority_outside_the_enum_reads_as_medium() {
    assert_eq!(Priority::from_stored("critical"), Priority::Medium);
    assert_eq!(Priority::from_stored("HIGH"), Priority::High);
    assert_eq!(Priority::from_stored("low"), Priority::Low);
}
