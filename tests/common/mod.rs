//! Common test utilities for integration tests
//!
//! Provides shared fixtures for planner data, turn contexts and a wired
//! orchestrator over the in-memory adapters.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use project_assist::adapters::memory::InMemoryPlanner;
use project_assist::adapters::substrates::ScriptedBackend;
use project_assist::domain::models::{
    AccessToken, ConversationConfig, DirectoryUser, RawBucket, RawPlan, RawPlannerTask,
    TurnContext,
};
use project_assist::services::{ActionDispatcher, ConversationOrchestrator};

pub type TestOrchestrator = ConversationOrchestrator<ScriptedBackend, InMemoryPlanner, InMemoryPlanner>;

/// Fixed reference time for overdue checks.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

/// Turn context carrying a dummy token and [`now`].
pub fn ctx() -> TurnContext {
    TurnContext::new(AccessToken::new("test-token"), now())
}

/// Raw task in the remote wire shape.
pub fn raw_task(id: &str, title: &str, priority: i32, percent_complete: i32) -> RawPlannerTask {
    serde_json::from_value(json!({
        "id": id,
        "planId": "plan-1",
        "bucketId": "bucket-1",
        "title": title,
        "priority": priority,
        "percentComplete": percent_complete,
    }))
    .unwrap()
}

/// Raw task with a due date and a single assignee.
#[allow(dead_code)]
pub fn raw_task_due(id: &str, due: DateTime<Utc>, percent_complete: i32, assignee: &str) -> RawPlannerTask {
    let mut value: Value = serde_json::to_value(raw_task(id, id, 5, percent_complete)).unwrap();
    value["dueDateTime"] = json!(due);
    let mut assignments = serde_json::Map::new();
    assignments.insert(
        assignee.to_string(),
        json!({ "orderHint": "8585 !", "assignedDateTime": "2026-01-01T00:00:00Z" }),
    );
    value["assignments"] = Value::Object(assignments);
    serde_json::from_value(value).unwrap()
}

#[allow(dead_code)]
pub fn directory_user(id: &str, mail: &str) -> DirectoryUser {
    DirectoryUser {
        id: id.to_string(),
        mail: Some(mail.to_string()),
        ..DirectoryUser::default()
    }
}

#[allow(dead_code)]
pub fn plan(id: &str, title: &str) -> RawPlan {
    RawPlan {
        id: id.to_string(),
        title: Some(title.to_string()),
        owner: None,
    }
}

#[allow(dead_code)]
pub fn bucket(id: &str, name: &str, plan_id: &str) -> RawBucket {
    RawBucket {
        id: id.to_string(),
        name: Some(name.to_string()),
        plan_id: Some(plan_id.to_string()),
    }
}

/// Planner with the "Q1 Launch Plan" and one bucket.
#[allow(dead_code)]
pub fn launch_planner() -> InMemoryPlanner {
    InMemoryPlanner::new()
        .with_plan(plan("plan-q1", "Q1 Launch Plan"), vec![bucket("bucket-todo", "To do", "plan-q1")])
        .with_plan(plan("plan-ops", "Operations"), vec![bucket("bucket-ops", "Backlog", "plan-ops")])
}

/// Orchestrator over `planner` for both ports.
#[allow(dead_code)]
pub fn orchestrator(
    backend: ScriptedBackend,
    planner: InMemoryPlanner,
    max_contract_retries: u32,
) -> (Arc<ScriptedBackend>, Arc<InMemoryPlanner>, TestOrchestrator) {
    let backend = Arc::new(backend);
    let planner = Arc::new(planner);
    let dispatcher = Arc::new(ActionDispatcher::new(Arc::clone(&planner), Arc::clone(&planner)));
    let orchestrator = ConversationOrchestrator::new(
        Arc::clone(&backend),
        dispatcher,
        &ConversationConfig { max_contract_retries },
    );
    (backend, planner, orchestrator)
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
