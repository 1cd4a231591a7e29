//! Task store: fetches raw planner records, normalizes them and applies the
//! derived views (priority, progress, overdue).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AccessToken, Assignment, Bucket, NewTask, Plan, ProgressFilter, RawAssignment, RawPlannerTask,
    TaskRecord, TaskScope,
};
use crate::domain::ports::PlannerApi;

/// Map a raw record into a [`TaskRecord`].
///
/// Returns `None` for records without an id. Missing priority and percent
/// complete default to 0. The description is kept only when the record
/// flags `hasDescription`.
pub fn normalize_task(raw: RawPlannerTask) -> Option<TaskRecord> {
    let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
        warn!(title = ?raw.title, "dropping planner record without an id");
        return None;
    };

    let has_description = raw.has_description.unwrap_or(false);
    let description = raw
        .details
        .filter(|_| has_description)
        .and_then(|details| details.description)
        .filter(|d| !d.trim().is_empty());

    Some(TaskRecord {
        id,
        plan_id: raw.plan_id.unwrap_or_default(),
        bucket_id: raw.bucket_id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        percent_complete: raw.percent_complete.unwrap_or(0),
        priority: raw.priority.unwrap_or(0),
        start_date_time: raw.start_date_time,
        due_date_time: raw.due_date_time,
        created_date_time: raw.created_date_time,
        description,
        assignments: decode_assignments(raw.assignments.unwrap_or_default()),
    })
}

/// Decode the assignment side-table, keeping only object-valued entries.
fn decode_assignments(table: serde_json::Map<String, Value>) -> BTreeMap<String, Assignment> {
    table
        .into_iter()
        .filter_map(|(user_id, value)| {
            if !value.is_object() {
                debug!(%user_id, "skipping non-object assignment entry");
                return None;
            }
            match serde_json::from_value::<RawAssignment>(value) {
                Ok(raw) => Some((
                    user_id,
                    Assignment {
                        assigned_by: raw.assigned_by.and_then(|by| by.user).and_then(|u| u.id),
                        assigned_date_time: raw.assigned_date_time,
                        order_hint: raw.order_hint,
                    },
                )),
                Err(e) => {
                    debug!(%user_id, error = %e, "skipping undecodable assignment entry");
                    None
                }
            }
        })
        .collect()
}

/// Tasks whose raw priority equals `priority`.
pub fn filter_by_priority(tasks: Vec<TaskRecord>, priority: i32) -> Vec<TaskRecord> {
    tasks.into_iter().filter(|t| t.priority == priority).collect()
}

/// Tasks matching the progress filter; `None` keeps everything.
pub fn filter_by_progress(tasks: Vec<TaskRecord>, filter: Option<ProgressFilter>) -> Vec<TaskRecord> {
    match filter {
        Some(filter) => tasks.into_iter().filter(|t| filter.matches(t)).collect(),
        None => tasks,
    }
}

/// Incomplete tasks due strictly before `now`.
pub fn filter_overdue(tasks: Vec<TaskRecord>, now: DateTime<Utc>) -> Vec<TaskRecord> {
    tasks.into_iter().filter(|t| t.is_overdue_at(now)).collect()
}

/// Read and write access to planner tasks for one caller.
pub struct TaskStore<P: PlannerApi> {
    planner: Arc<P>,
}

impl<P: PlannerApi> TaskStore<P> {
    pub fn new(planner: Arc<P>) -> Self {
        Self { planner }
    }

    /// Fetch and normalize the tasks of a scope.
    ///
    /// For an explicit user the email is resolved to a directory id first
    /// and only tasks assigned to that id are kept.
    #[instrument(skip(self, token), fields(scope = %scope))]
    pub async fn fetch(&self, token: &AccessToken, scope: &TaskScope) -> DomainResult<Vec<TaskRecord>> {
        let tasks = match scope {
            TaskScope::CurrentUser => normalize_all(self.planner.my_tasks(token).await?),
            TaskScope::User(email) => {
                let user = self
                    .planner
                    .find_user(token, email)
                    .await?
                    .ok_or_else(|| DomainError::NotFound(format!("user '{email}'")))?;
                let raw = self.planner.user_tasks(token, email).await?;
                normalize_all(raw)
                    .into_iter()
                    .filter(|t| t.is_assigned_to(&user.id))
                    .collect()
            }
        };
        debug!(count = tasks.len(), "tasks fetched");
        Ok(tasks)
    }

    pub async fn by_priority(
        &self,
        token: &AccessToken,
        scope: &TaskScope,
        priority: i32,
    ) -> DomainResult<Vec<TaskRecord>> {
        Ok(filter_by_priority(self.fetch(token, scope).await?, priority))
    }

    /// Filter by a status name; an unrecognized name returns everything.
    pub async fn by_progress(
        &self,
        token: &AccessToken,
        scope: &TaskScope,
        status: &str,
    ) -> DomainResult<Vec<TaskRecord>> {
        let filter = ProgressFilter::parse(status);
        if filter.is_none() {
            warn!(%status, "unrecognized progress status, returning unfiltered tasks");
        }
        Ok(filter_by_progress(self.fetch(token, scope).await?, filter))
    }

    pub async fn overdue(
        &self,
        token: &AccessToken,
        scope: &TaskScope,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<TaskRecord>> {
        Ok(filter_overdue(self.fetch(token, scope).await?, now))
    }

    /// First plan whose title contains `plan_name`, ignoring case.
    ///
    /// A blank name selects the first plan.
    #[instrument(skip(self, token))]
    pub async fn resolve_plan(&self, token: &AccessToken, plan_name: &str) -> DomainResult<Plan> {
        let needle = plan_name.trim().to_lowercase();
        let plans = self.planner.my_plans(token).await?;

        let plan = plans
            .into_iter()
            .find(|p| {
                p.title
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(&needle)
            })
            .ok_or_else(|| DomainError::NotFound(format!("no plan matching '{}'", plan_name.trim())))?;

        Ok(Plan {
            id: plan.id,
            title: plan.title.unwrap_or_default(),
            owner: plan.owner,
        })
    }

    /// First bucket of a plan.
    #[instrument(skip(self, token))]
    pub async fn resolve_bucket(&self, token: &AccessToken, plan_id: &str) -> DomainResult<Bucket> {
        let bucket = self
            .planner
            .plan_buckets(token, plan_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound(format!("plan '{plan_id}' has no buckets")))?;

        Ok(Bucket {
            plan_id: bucket.plan_id.unwrap_or_else(|| plan_id.to_string()),
            id: bucket.id,
            name: bucket.name.unwrap_or_default(),
        })
    }

    /// Tasks of a scope that belong to the plan matching `plan_name`.
    pub async fn in_plan(
        &self,
        token: &AccessToken,
        scope: &TaskScope,
        plan_name: &str,
    ) -> DomainResult<Vec<TaskRecord>> {
        let plan = self.resolve_plan(token, plan_name).await?;
        let tasks = self.fetch(token, scope).await?;
        Ok(tasks.into_iter().filter(|t| t.plan_id == plan.id).collect())
    }

    /// Create a task in the first bucket of the plan matching `plan_name`.
    pub async fn create(
        &self,
        token: &AccessToken,
        plan_name: &str,
        title: &str,
    ) -> DomainResult<TaskRecord> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidArgument(
                "task title must not be blank".to_string(),
            ));
        }

        let plan = self.resolve_plan(token, plan_name).await?;
        let bucket = self.resolve_bucket(token, &plan.id).await?;

        let new_task = NewTask {
            plan_id: plan.id,
            bucket_id: bucket.id,
            title: title.to_string(),
        };
        let created = self.planner.create_task(token, &new_task).await?;
        let record = normalize_task(created).ok_or_else(|| {
            DomainError::SerializationError("created task came back without an id".to_string())
        })?;

        info!(task_id = %record.id, plan = %plan.title, bucket = %bucket.name, "task created");
        Ok(record)
    }
}

fn normalize_all(raw: Vec<RawPlannerTask>) -> Vec<TaskRecord> {
    raw.into_iter().filter_map(normalize_task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanner;
    use crate::domain::models::{DirectoryUser, RawBucket, RawPlan};
    use serde_json::json;

    fn raw(value: Value) -> RawPlannerTask {
        serde_json::from_value(value).unwrap()
    }

    fn token() -> AccessToken {
        AccessToken::new("token")
    }

    #[test]
    fn test_normalize_defaults_and_details() {
        let task = normalize_task(raw(json!({
            "id": "t1",
            "planId": "p1",
            "title": "Draft budget",
            "dueDateTime": "2024-03-01T00:00:00Z",
            "hasDescription": true,
            "details": { "description": "numbers for Q2" }
        })))
        .unwrap();

        assert_eq!(task.priority, 0);
        assert_eq!(task.percent_complete, 0);
        assert_eq!(task.bucket_id, "");
        assert_eq!(task.description.as_deref(), Some("numbers for Q2"));
        assert!(task.due_date_time.is_some());
    }

    #[test]
    fn test_description_hidden_without_flag() {
        let details = json!({ "description": "stale text" });
        let unflagged = normalize_task(raw(json!({ "id": "t1", "details": details.clone() }))).unwrap();
        let flagged_off = normalize_task(raw(json!({
            "id": "t2",
            "hasDescription": false,
            "details": details
        })))
        .unwrap();

        assert!(unflagged.description.is_none());
        assert!(flagged_off.description.is_none());
    }

    #[test]
    fn test_normalize_drops_record_without_id() {
        assert!(normalize_task(raw(json!({ "title": "orphan" }))).is_none());
        assert!(normalize_task(raw(json!({ "id": "", "title": "blank id" }))).is_none());
    }

    #[test]
    fn test_assignment_table_keeps_object_entries_only() {
        let task = normalize_task(raw(json!({
            "id": "t1",
            "assignments": {
                "user-a": {
                    "@odata.type": "#microsoft.graph.plannerAssignment",
                    "assignedBy": { "user": { "id": "boss" } },
                    "assignedDateTime": "2024-01-02T03:04:05Z",
                    "orderHint": "8585"
                },
                "user-b": null,
                "user-c": "garbage"
            }
        })))
        .unwrap();

        assert_eq!(task.assignments.len(), 1);
        let assignment = &task.assignments["user-a"];
        assert_eq!(assignment.assigned_by.as_deref(), Some("boss"));
        assert_eq!(assignment.order_hint.as_deref(), Some("8585"));
        assert!(task.is_assigned_to("user-a"));
        assert!(!task.is_assigned_to("user-b"));
    }

    #[test]
    fn test_three_record_priority_and_progress_scenario() {
        let tasks = vec![
            TaskRecord::new("a", "p", "b", "A").with_priority(1).with_percent_complete(0),
            TaskRecord::new("b", "p", "b", "B").with_priority(5).with_percent_complete(50),
            TaskRecord::new("c", "p", "b", "C").with_priority(1).with_percent_complete(100),
        ];

        let urgent: Vec<_> = filter_by_priority(tasks.clone(), 1)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(urgent, ["a", "c"]);

        let in_progress: Vec<_> =
            filter_by_progress(tasks.clone(), ProgressFilter::parse("In Progress"))
                .into_iter()
                .map(|t| t.id)
                .collect();
        assert_eq!(in_progress, ["b"]);

        assert_eq!(filter_by_progress(tasks, ProgressFilter::parse("blocked")).len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_for_user_filters_by_assignment() {
        let user = DirectoryUser {
            id: "uid-ann".to_string(),
            mail: Some("ann@contoso.com".to_string()),
            ..DirectoryUser::default()
        };
        let planner = InMemoryPlanner::new().with_user(
            user,
            vec![
                raw(json!({ "id": "mine", "assignments": { "uid-ann": {} } })),
                raw(json!({ "id": "theirs", "assignments": { "uid-bob": {} } })),
            ],
        );
        let store = TaskStore::new(Arc::new(planner));

        let tasks = store
            .fetch(&token(), &TaskScope::User("ANN@contoso.com".to_string()))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "mine");
    }

    #[tokio::test]
    async fn test_fetch_for_unknown_user_is_not_found() {
        let store = TaskStore::new(Arc::new(InMemoryPlanner::new()));
        let err = store
            .fetch(&token(), &TaskScope::User("ghost@contoso.com".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    fn plan(id: &str, title: &str) -> RawPlan {
        RawPlan {
            id: id.to_string(),
            title: Some(title.to_string()),
            owner: None,
        }
    }

    fn bucket(id: &str, plan_id: &str) -> RawBucket {
        RawBucket {
            id: id.to_string(),
            name: Some(format!("Bucket {id}")),
            plan_id: Some(plan_id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_resolve_plan_substring_and_blank() {
        let planner = InMemoryPlanner::new()
            .with_plan(plan("p0", "Ops Backlog"), vec![])
            .with_plan(plan("p1", "Q1 Launch Plan"), vec![]);
        let store = TaskStore::new(Arc::new(planner));

        assert_eq!(store.resolve_plan(&token(), "q1 launch").await.unwrap().id, "p1");
        assert_eq!(store.resolve_plan(&token(), "  ").await.unwrap().id, "p0");
        assert!(matches!(
            store.resolve_plan(&token(), "Q9").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_uses_first_bucket() {
        let planner = Arc::new(InMemoryPlanner::new().with_plan(
            plan("p1", "Q1 Launch Plan"),
            vec![bucket("b1", "p1"), bucket("b2", "p1")],
        ));
        let store = TaskStore::new(Arc::clone(&planner));

        let task = store.create(&token(), "Q1 Launch", "Draft spec").await.unwrap();
        assert_eq!(task.plan_id, "p1");
        assert_eq!(task.bucket_id, "b1");

        let created = planner.created_tasks().await;
        assert_eq!(
            created,
            vec![NewTask {
                plan_id: "p1".to_string(),
                bucket_id: "b1".to_string(),
                title: "Draft spec".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_blank_title_makes_no_remote_call() {
        let planner = Arc::new(InMemoryPlanner::new().with_plan(plan("p1", "Plan"), vec![]));
        let store = TaskStore::new(Arc::clone(&planner));

        let err = store.create(&token(), "Plan", "   ").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert_eq!(planner.remote_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_in_plan_without_buckets_is_not_found() {
        let planner = InMemoryPlanner::new().with_plan(plan("p1", "Empty Plan"), vec![]);
        let store = TaskStore::new(Arc::new(planner));

        let err = store.create(&token(), "Empty", "Task").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_in_plan_keeps_tasks_of_matched_plan() {
        let planner = InMemoryPlanner::new()
            .with_plan(plan("p1", "Q1 Launch Plan"), vec![])
            .with_plan(plan("p2", "Operations"), vec![])
            .with_my_tasks(vec![
                raw(json!({ "id": "a", "planId": "p1", "title": "Draft spec" })),
                raw(json!({ "id": "b", "planId": "p2", "title": "Rotate keys" })),
                raw(json!({ "id": "c", "planId": "p1", "title": "Review" })),
            ]);
        let store = TaskStore::new(Arc::new(planner));

        let tasks = store.in_plan(&token(), &TaskScope::CurrentUser, "launch").await.unwrap();
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_progress_aliases() {
        assert_eq!(ProgressFilter::parse("done"), Some(ProgressFilter::Completed));
        assert_eq!(ProgressFilter::parse("Open"), Some(ProgressFilter::Incomplete));
        assert_eq!(ProgressFilter::parse("not_started"), Some(ProgressFilter::NotStarted));
        assert_eq!(ProgressFilter::parse("someday"), None);
    }
}
