//! Named operations exposed to the generation backend.
//!
//! Every operation receives the turn's access token explicitly and returns
//! JSON. Failures are reported as `DomainError::OperationFailed` so the
//! backend can relay them to the model without ending the turn.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AnnotatedTask, Bucket, OutgoingMail, Plan, TaskRecord, TaskScope, TurnContext,
};
use crate::domain::ports::{MailApi, OperationInvoker, OperationSpec, PlannerApi};
use crate::services::task_store::TaskStore;

pub const LIST_TASKS: &str = "list_tasks";
pub const FILTER_TASKS_BY_PRIORITY: &str = "filter_tasks_by_priority";
pub const FILTER_TASKS_BY_PROGRESS: &str = "filter_tasks_by_progress";
pub const FILTER_OVERDUE_TASKS: &str = "filter_overdue_tasks";
pub const CREATE_TASK: &str = "create_task";
pub const SEND_NOTIFICATION: &str = "send_notification";
pub const GET_PLAN: &str = "get_plan";
pub const GET_BUCKET: &str = "get_bucket";
pub const LIST_TASKS_IN_PLAN: &str = "list_tasks_in_plan";

#[derive(Debug, Default, Deserialize)]
struct ScopeArgs {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriorityArgs {
    #[serde(default)]
    email: Option<String>,
    priority: i32,
}

#[derive(Debug, Deserialize)]
struct ProgressArgs {
    #[serde(default)]
    email: Option<String>,
    status: String,
}

/// Arguments of `create_task`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskArgs {
    #[serde(default)]
    pub plan_name: String,
    pub title: String,
    #[serde(default)]
    pub assignee_email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date_time: Option<String>,
}

/// Arguments of `send_notification`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationArgs {
    pub to_address: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanArgs {
    #[serde(default)]
    plan_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketArgs {
    plan_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanTasksArgs {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    plan_name: String,
}

fn decode<T: DeserializeOwned>(arguments: Value) -> DomainResult<T> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| DomainError::InvalidArgument(format!("invalid arguments: {e}")))
}

fn annotate(tasks: Vec<TaskRecord>) -> Vec<AnnotatedTask> {
    tasks.into_iter().map(AnnotatedTask::from).collect()
}

fn at_boundary<T>(operation: &str, result: DomainResult<T>) -> DomainResult<T> {
    result.map_err(|e| DomainError::operation_failed(operation, e))
}

/// Serialize an operation result, failing with the operation's name.
fn payload<T: Serialize>(operation: &str, value: &T) -> DomainResult<Value> {
    at_boundary(operation, serde_json::to_value(value).map_err(DomainError::from))
}

/// Operation catalog in a stable order.
pub fn catalog() -> Vec<OperationSpec> {
    let email = json!({
        "type": "string",
        "description": "Email of the user whose tasks to read; omit for the signed-in user"
    });

    vec![
        OperationSpec {
            name: LIST_TASKS,
            description: "List planner tasks with priority and progress labels.",
            parameters: json!({
                "type": "object",
                "properties": { "email": email },
            }),
        },
        OperationSpec {
            name: FILTER_TASKS_BY_PRIORITY,
            description: "List tasks whose priority equals the given value (0-10, lower is more urgent: 1 Urgent, 3 Important, 5 Medium, 9 Low).",
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": email,
                    "priority": { "type": "integer", "minimum": 0, "maximum": 10 }
                },
                "required": ["priority"],
            }),
        },
        OperationSpec {
            name: FILTER_TASKS_BY_PROGRESS,
            description: "List tasks by progress status: not started, in progress, completed or incomplete.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": email,
                    "status": { "type": "string" }
                },
                "required": ["status"],
            }),
        },
        OperationSpec {
            name: FILTER_OVERDUE_TASKS,
            description: "List incomplete tasks whose due date has passed.",
            parameters: json!({
                "type": "object",
                "properties": { "email": email },
            }),
        },
        OperationSpec {
            name: CREATE_TASK,
            description: "Create a task in the first bucket of the plan whose title contains planName.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "planName": { "type": "string" },
                    "title": { "type": "string" },
                    "assigneeEmail": { "type": "string" },
                    "description": { "type": "string" },
                    "dueDateTime": { "type": "string", "description": "ISO 8601" }
                },
                "required": ["planName", "title"],
            }),
        },
        OperationSpec {
            name: SEND_NOTIFICATION,
            description: "Send an HTML email. Returns true when the mail was accepted.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "toAddress": { "type": "string" },
                    "subject": { "type": "string" },
                    "body": { "type": "string" }
                },
                "required": ["toAddress", "subject", "body"],
            }),
        },
        OperationSpec {
            name: GET_PLAN,
            description: "Find the plan whose title contains planName.",
            parameters: json!({
                "type": "object",
                "properties": { "planName": { "type": "string" } },
                "required": ["planName"],
            }),
        },
        OperationSpec {
            name: GET_BUCKET,
            description: "Get the first bucket of a plan.",
            parameters: json!({
                "type": "object",
                "properties": { "planId": { "type": "string" } },
                "required": ["planId"],
            }),
        },
        OperationSpec {
            name: LIST_TASKS_IN_PLAN,
            description: "List a user's tasks that belong to the plan whose title contains planName.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "email": email,
                    "planName": { "type": "string" }
                },
                "required": ["planName"],
            }),
        },
    ]
}

/// Executes planner and mail operations on behalf of the caller.
pub struct ActionDispatcher<P: PlannerApi, M: MailApi> {
    store: TaskStore<P>,
    mail: Arc<M>,
}

impl<P: PlannerApi, M: MailApi> ActionDispatcher<P, M> {
    pub fn new(planner: Arc<P>, mail: Arc<M>) -> Self {
        Self {
            store: TaskStore::new(planner),
            mail,
        }
    }

    /// Bind the dispatcher to one turn.
    pub fn for_turn(&self, ctx: TurnContext) -> TurnOperations<'_, P, M> {
        TurnOperations {
            dispatcher: self,
            ctx,
        }
    }

    pub async fn list_tasks(
        &self,
        ctx: &TurnContext,
        email: Option<&str>,
    ) -> DomainResult<Vec<AnnotatedTask>> {
        let scope = TaskScope::from_email(email);
        at_boundary(LIST_TASKS, self.store.fetch(&ctx.token, &scope).await.map(annotate))
    }

    pub async fn filter_tasks_by_priority(
        &self,
        ctx: &TurnContext,
        email: Option<&str>,
        priority: i32,
    ) -> DomainResult<Vec<AnnotatedTask>> {
        let scope = TaskScope::from_email(email);
        at_boundary(
            FILTER_TASKS_BY_PRIORITY,
            self.store
                .by_priority(&ctx.token, &scope, priority)
                .await
                .map(annotate),
        )
    }

    pub async fn filter_tasks_by_progress(
        &self,
        ctx: &TurnContext,
        email: Option<&str>,
        status: &str,
    ) -> DomainResult<Vec<AnnotatedTask>> {
        let scope = TaskScope::from_email(email);
        at_boundary(
            FILTER_TASKS_BY_PROGRESS,
            self.store
                .by_progress(&ctx.token, &scope, status)
                .await
                .map(annotate),
        )
    }

    pub async fn filter_overdue_tasks(
        &self,
        ctx: &TurnContext,
        email: Option<&str>,
    ) -> DomainResult<Vec<AnnotatedTask>> {
        let scope = TaskScope::from_email(email);
        at_boundary(
            FILTER_OVERDUE_TASKS,
            self.store
                .overdue(&ctx.token, &scope, ctx.now)
                .await
                .map(annotate),
        )
    }

    /// Create a task from plan name and title.
    ///
    /// Assignee, description and due date are accepted but not applied to
    /// the created task.
    pub async fn create_task(
        &self,
        ctx: &TurnContext,
        args: &CreateTaskArgs,
    ) -> DomainResult<AnnotatedTask> {
        if args.assignee_email.is_some() || args.description.is_some() || args.due_date_time.is_some()
        {
            info!(
                assignee = ?args.assignee_email,
                has_description = args.description.is_some(),
                due = ?args.due_date_time,
                "optional task fields are not applied on create"
            );
        }

        at_boundary(
            CREATE_TASK,
            self.store
                .create(&ctx.token, &args.plan_name, &args.title)
                .await
                .map(AnnotatedTask::from),
        )
    }

    /// Send an HTML mail; returns `false` when the mail system rejects it.
    pub async fn send_notification(
        &self,
        ctx: &TurnContext,
        args: &NotificationArgs,
    ) -> DomainResult<bool> {
        for (field, value) in [
            ("toAddress", &args.to_address),
            ("subject", &args.subject),
            ("body", &args.body),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::operation_failed(
                    SEND_NOTIFICATION,
                    DomainError::InvalidArgument(format!("{field} must not be blank")),
                ));
            }
        }

        let mail = OutgoingMail {
            to: args.to_address.trim().to_string(),
            subject: args.subject.clone(),
            body: args.body.clone(),
        };
        match self.mail.send_mail(&ctx.token, &mail).await {
            Ok(()) => {
                info!(to = %mail.to, "notification sent");
                Ok(true)
            }
            Err(e) => {
                warn!(to = %mail.to, error = %e, "notification failed");
                Ok(false)
            }
        }
    }

    pub async fn get_plan(&self, ctx: &TurnContext, plan_name: &str) -> DomainResult<Plan> {
        at_boundary(GET_PLAN, self.store.resolve_plan(&ctx.token, plan_name).await)
    }

    pub async fn get_bucket(&self, ctx: &TurnContext, plan_id: &str) -> DomainResult<Bucket> {
        at_boundary(GET_BUCKET, self.store.resolve_bucket(&ctx.token, plan_id).await)
    }

    pub async fn list_tasks_in_plan(
        &self,
        ctx: &TurnContext,
        email: Option<&str>,
        plan_name: &str,
    ) -> DomainResult<Vec<AnnotatedTask>> {
        let scope = TaskScope::from_email(email);
        at_boundary(
            LIST_TASKS_IN_PLAN,
            self.store
                .in_plan(&ctx.token, &scope, plan_name)
                .await
                .map(annotate),
        )
    }

    /// Invoke an operation by name with JSON arguments.
    #[instrument(skip(self, ctx, arguments), fields(conversation_id = %ctx.conversation_id))]
    pub async fn dispatch(&self, ctx: &TurnContext, name: &str, arguments: Value) -> DomainResult<Value> {
        let result = self.dispatch_inner(ctx, name, arguments).await;
        match &result {
            Ok(_) => info!(operation = name, "operation completed"),
            Err(e) => warn!(operation = name, error = %e, "operation failed"),
        }
        result
    }

    async fn dispatch_inner(&self, ctx: &TurnContext, name: &str, arguments: Value) -> DomainResult<Value> {
        match name {
            LIST_TASKS => {
                let args: ScopeArgs = at_boundary(name, decode(arguments))?;
                payload(name, &self.list_tasks(ctx, args.email.as_deref()).await?)
            }
            FILTER_TASKS_BY_PRIORITY => {
                let args: PriorityArgs = at_boundary(name, decode(arguments))?;
                let tasks = self
                    .filter_tasks_by_priority(ctx, args.email.as_deref(), args.priority)
                    .await?;
                payload(name, &tasks)
            }
            FILTER_TASKS_BY_PROGRESS => {
                let args: ProgressArgs = at_boundary(name, decode(arguments))?;
                let tasks = self
                    .filter_tasks_by_progress(ctx, args.email.as_deref(), &args.status)
                    .await?;
                payload(name, &tasks)
            }
            FILTER_OVERDUE_TASKS => {
                let args: ScopeArgs = at_boundary(name, decode(arguments))?;
                payload(name, &self.filter_overdue_tasks(ctx, args.email.as_deref()).await?)
            }
            CREATE_TASK => {
                let args: CreateTaskArgs = at_boundary(name, decode(arguments))?;
                payload(name, &self.create_task(ctx, &args).await?)
            }
            SEND_NOTIFICATION => {
                let args: NotificationArgs = at_boundary(name, decode(arguments))?;
                Ok(Value::Bool(self.send_notification(ctx, &args).await?))
            }
            GET_PLAN => {
                let args: PlanArgs = at_boundary(name, decode(arguments))?;
                payload(name, &self.get_plan(ctx, &args.plan_name).await?)
            }
            GET_BUCKET => {
                let args: BucketArgs = at_boundary(name, decode(arguments))?;
                payload(name, &self.get_bucket(ctx, &args.plan_id).await?)
            }
            LIST_TASKS_IN_PLAN => {
                let args: PlanTasksArgs = at_boundary(name, decode(arguments))?;
                let tasks = self
                    .list_tasks_in_plan(ctx, args.email.as_deref(), &args.plan_name)
                    .await?;
                payload(name, &tasks)
            }
            unknown => Err(DomainError::operation_failed(
                unknown,
                DomainError::InvalidArgument(format!("unknown operation '{unknown}'")),
            )),
        }
    }
}

/// A dispatcher bound to one turn's context.
pub struct TurnOperations<'a, P: PlannerApi, M: MailApi> {
    dispatcher: &'a ActionDispatcher<P, M>,
    ctx: TurnContext,
}

impl<P: PlannerApi, M: MailApi> TurnOperations<'_, P, M> {
    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }
}

#[async_trait]
impl<P: PlannerApi, M: MailApi> OperationInvoker for TurnOperations<'_, P, M> {
    fn operations(&self) -> Vec<OperationSpec> {
        catalog()
    }

    async fn invoke(&self, name: &str, arguments: Value) -> DomainResult<Value> {
        self.dispatcher.dispatch(&self.ctx, name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanner;
    use crate::domain::models::{AccessToken, PriorityLabel, RawBucket, RawPlan, RawPlannerTask};
    use chrono::{Duration, Utc};

    fn ctx() -> TurnContext {
        TurnContext::new(AccessToken::new("token"), Utc::now())
    }

    fn dispatcher(planner: InMemoryPlanner) -> (Arc<InMemoryPlanner>, ActionDispatcher<InMemoryPlanner, InMemoryPlanner>) {
        let planner = Arc::new(planner);
        let dispatcher = ActionDispatcher::new(Arc::clone(&planner), Arc::clone(&planner));
        (planner, dispatcher)
    }

    fn raw_task(id: &str, priority: i32, percent: i32) -> RawPlannerTask {
        RawPlannerTask {
            id: Some(id.to_string()),
            title: Some(format!("Task {id}")),
            priority: Some(priority),
            percent_complete: Some(percent),
            ..RawPlannerTask::default()
        }
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let names: Vec<_> = catalog().into_iter().map(|spec| spec.name).collect();
        let mut deduped = names.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert_eq!(names.len(), 9);
        assert_eq!(names[0], LIST_TASKS);
    }

    #[tokio::test]
    async fn test_list_tasks_carries_labels() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new().with_my_tasks(vec![raw_task("t1", 1, 100)]));

        let value = dispatcher.dispatch(&ctx(), LIST_TASKS, json!({})).await.unwrap();
        assert_eq!(value[0]["id"], "t1");
        assert_eq!(value[0]["priorityLabel"], "Urgent");
        assert_eq!(value[0]["progressLabel"], "Completed");
    }

    #[tokio::test]
    async fn test_null_arguments_mean_current_user() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new().with_my_tasks(vec![raw_task("t1", 5, 0)]));
        let value = dispatcher.dispatch(&ctx(), LIST_TASKS, Value::Null).await.unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_overdue_uses_turn_clock() {
        let now = Utc::now();
        let mut late = raw_task("late", 5, 20);
        late.due_date_time = Some(now - Duration::hours(1));
        let mut future = raw_task("future", 5, 20);
        future.due_date_time = Some(now + Duration::hours(1));

        let (_, dispatcher) = dispatcher(InMemoryPlanner::new().with_my_tasks(vec![late, future]));
        let ctx = TurnContext::new(AccessToken::new("token"), now);

        let tasks = dispatcher.filter_overdue_tasks(&ctx, None).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task.id, "late");
    }

    #[tokio::test]
    async fn test_unknown_operation_is_invalid_argument() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new());
        let err = dispatcher.dispatch(&ctx(), "delete_everything", json!({})).await.unwrap_err();

        match err {
            DomainError::OperationFailed { operation, cause } => {
                assert_eq!(operation, "delete_everything");
                assert!(matches!(*cause, DomainError::InvalidArgument(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bad_argument_types_are_invalid_argument() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new());
        let err = dispatcher
            .dispatch(&ctx(), FILTER_TASKS_BY_PRIORITY, json!({ "priority": "high" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::OperationFailed { ref cause, .. } if matches!(**cause, DomainError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_create_task_in_missing_plan_is_not_found() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new().with_plan(
            RawPlan {
                id: "p1".to_string(),
                title: Some("Ops".to_string()),
                owner: None,
            },
            vec![RawBucket {
                id: "b1".to_string(),
                ..RawBucket::default()
            }],
        ));

        let err = dispatcher
            .dispatch(&ctx(), CREATE_TASK, json!({ "planName": "Q9", "title": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::OperationFailed { ref cause, .. } if matches!(**cause, DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_send_notification_blank_field_is_rejected_without_remote_call() {
        let (planner, dispatcher) = dispatcher(InMemoryPlanner::new());
        let err = dispatcher
            .dispatch(
                &ctx(),
                SEND_NOTIFICATION,
                json!({ "toAddress": "ann@contoso.com", "subject": " ", "body": "hi" }),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subject"));
        assert_eq!(planner.remote_calls(), 0);
    }

    #[tokio::test]
    async fn test_send_notification_reports_outcome() {
        let args = json!({ "toAddress": "ann@contoso.com", "subject": "Status", "body": "<p>done</p>" });

        let (planner, ok) = dispatcher(InMemoryPlanner::new());
        assert_eq!(ok.dispatch(&ctx(), SEND_NOTIFICATION, args.clone()).await.unwrap(), json!(true));
        assert_eq!(planner.sent_mail().await.len(), 1);

        let (_, failing) = dispatcher(InMemoryPlanner::new().with_failing_mail());
        assert_eq!(failing.dispatch(&ctx(), SEND_NOTIFICATION, args).await.unwrap(), json!(false));
    }

    #[tokio::test]
    async fn test_priority_and_progress_over_three_records() {
        let (_, dispatcher) = dispatcher(InMemoryPlanner::new().with_my_tasks(vec![
            raw_task("1", 1, 0),
            raw_task("2", 5, 50),
            raw_task("3", 9, 100),
        ]));
        let ids = |tasks: Vec<AnnotatedTask>| -> Vec<String> { tasks.into_iter().map(|t| t.task.id).collect() };

        let medium = dispatcher.filter_tasks_by_priority(&ctx(), None, 5).await.unwrap();
        assert_eq!(ids(medium), ["2"]);

        let completed = dispatcher
            .filter_tasks_by_progress(&ctx(), None, "completed")
            .await
            .unwrap();
        assert_eq!(completed[0].priority_label, PriorityLabel::Low);
        assert_eq!(ids(completed), ["3"]);
    }

    #[test]
    fn test_unserializable_result_is_operation_failure() {
        let mut keyed = std::collections::BTreeMap::new();
        keyed.insert((1, 2), "tuple keys have no JSON form");

        let err = payload(GET_PLAN, &keyed).unwrap_err();
        let DomainError::OperationFailed { operation, cause } = err else {
            panic!("expected OperationFailed, got {err:?}");
        };
        assert_eq!(operation, GET_PLAN);
        assert!(matches!(*cause, DomainError::SerializationError(_)));
    }
}
