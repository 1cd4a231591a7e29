use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use project_assist::domain::models::{PriorityLabel, ProgressFilter, ProgressLabel, TaskRecord};
use project_assist::services::task_store::{filter_by_priority, filter_by_progress, filter_overdue};

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

/// Records with priority 0-10, progress 0-100 and a due date within a
/// month either side of [`reference_now`], or none.
fn task_strategy() -> impl Strategy<Value = TaskRecord> {
    (
        "[a-z0-9]{6}",
        0i32..=10,
        0i32..=100,
        proptest::option::of(-720i64..720),
    )
        .prop_map(|(id, priority, percent, due_offset_hours)| {
            let task = TaskRecord::new(id.clone(), "plan", "bucket", format!("Task {id}"))
                .with_priority(priority)
                .with_percent_complete(percent);
            match due_offset_hours {
                Some(hours) => task.with_due_date_time(reference_now() + Duration::hours(hours)),
                None => task,
            }
        })
}

proptest! {
    /// Property: priority labels follow the 0-1 / 2-4 / 5-7 / 8-10 bands
    #[test]
    fn prop_priority_label_bands(priority in -50i32..50) {
        let expected = match priority {
            0..=1 => PriorityLabel::Urgent,
            2..=4 => PriorityLabel::Important,
            5..=7 => PriorityLabel::Medium,
            8..=10 => PriorityLabel::Low,
            _ => PriorityLabel::Unknown,
        };
        prop_assert_eq!(PriorityLabel::from_priority(priority), expected);
    }

    /// Property: progress labels split at 0 and 100
    #[test]
    fn prop_progress_label_bands(percent in -10i32..=150) {
        let label = ProgressLabel::from_percent_complete(percent);
        if percent >= 100 {
            prop_assert_eq!(label, ProgressLabel::Completed);
        } else if percent > 0 {
            prop_assert_eq!(label, ProgressLabel::InProgress);
        } else {
            prop_assert_eq!(label, ProgressLabel::NotStarted);
        }
    }

    /// Property: priority filtering keeps exactly the matching records, in order
    #[test]
    fn prop_priority_filter_is_exact(
        tasks in proptest::collection::vec(task_strategy(), 0..30),
        priority in 0i32..=10,
    ) {
        let expected: Vec<TaskRecord> =
            tasks.iter().filter(|t| t.priority == priority).cloned().collect();
        prop_assert_eq!(filter_by_priority(tasks, priority), expected);
    }

    /// Property: every overdue record has a past due date and is incomplete,
    /// and every excluded record fails one of those conditions
    #[test]
    fn prop_overdue_partition(tasks in proptest::collection::vec(task_strategy(), 0..30)) {
        let now = reference_now();
        let overdue = filter_overdue(tasks.clone(), now);

        for task in &overdue {
            prop_assert!(task.due_date_time.is_some_and(|due| due < now));
            prop_assert!(task.percent_complete < 100);
        }
        for task in &tasks {
            let past_due = task.due_date_time.is_some_and(|due| due < now);
            prop_assert_eq!(overdue.contains(task), past_due && task.percent_complete < 100);
        }
    }

    /// Property: the progress filters agree with the derived labels
    #[test]
    fn prop_progress_filters_match_labels(tasks in proptest::collection::vec(task_strategy(), 0..30)) {
        let count = |filter: &str| filter_by_progress(tasks.clone(), ProgressFilter::parse(filter)).len();
        let labelled = |label: ProgressLabel| tasks.iter().filter(|t| t.progress_label() == label).count();

        prop_assert_eq!(count("Not Started"), labelled(ProgressLabel::NotStarted));
        prop_assert_eq!(count("in-progress"), labelled(ProgressLabel::InProgress));
        prop_assert_eq!(count("COMPLETED"), labelled(ProgressLabel::Completed));
        prop_assert_eq!(count("incomplete"), tasks.len() - labelled(ProgressLabel::Completed));
        // Unrecognized names leave the set unfiltered
        prop_assert_eq!(count("someday"), tasks.len());
    }
}

#[test]
fn test_three_record_scenario() {
    let tasks = vec![
        TaskRecord::new("1", "plan", "bucket", "A").with_priority(1).with_percent_complete(0),
        TaskRecord::new("2", "plan", "bucket", "B").with_priority(5).with_percent_complete(50),
        TaskRecord::new("3", "plan", "bucket", "C").with_priority(9).with_percent_complete(100),
    ];
    let ids = |tasks: Vec<TaskRecord>| -> Vec<String> { tasks.into_iter().map(|t| t.id).collect() };

    assert_eq!(ids(filter_by_priority(tasks.clone(), 5)), ["2"]);

    let completed = filter_by_progress(tasks, ProgressFilter::parse("completed"));
    assert_eq!(completed[0].priority_label(), PriorityLabel::Low);
    assert_eq!(ids(completed), ["3"]);
}
