//! In-memory planner and mail adapter.
//!
//! Backs the ports with plain collections; used by tests and for dry runs
//! without a Graph tenant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AccessToken, DirectoryUser, NewTask, OutgoingMail, RawBucket, RawPlan, RawPlannerTask,
};
use crate::domain::ports::{MailApi, PlannerApi};

#[derive(Debug, Default)]
struct MemoryState {
    my_tasks: Vec<RawPlannerTask>,
    user_tasks: HashMap<String, Vec<RawPlannerTask>>,
    users: Vec<DirectoryUser>,
    plans: Vec<RawPlan>,
    buckets: HashMap<String, Vec<RawBucket>>,
    created: Vec<NewTask>,
    sent: Vec<OutgoingMail>,
    fail_mail: bool,
}

/// Planner and mailbox held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlanner {
    state: RwLock<MemoryState>,
    remote_calls: AtomicUsize,
}

impl InMemoryPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_my_tasks(mut self, tasks: Vec<RawPlannerTask>) -> Self {
        self.state.get_mut().my_tasks = tasks;
        self
    }

    /// Register a directory user together with the tasks visible under them.
    pub fn with_user(mut self, user: DirectoryUser, tasks: Vec<RawPlannerTask>) -> Self {
        let state = self.state.get_mut();
        for key in [user.mail.as_deref(), user.user_principal_name.as_deref()]
            .into_iter()
            .flatten()
        {
            state.user_tasks.insert(key.to_lowercase(), tasks.clone());
        }
        state.users.push(user);
        self
    }

    pub fn with_plan(mut self, plan: RawPlan, buckets: Vec<RawBucket>) -> Self {
        let state = self.state.get_mut();
        state.buckets.insert(plan.id.clone(), buckets);
        state.plans.push(plan);
        self
    }

    /// Make every `send_mail` call fail with a transport error.
    pub fn with_failing_mail(mut self) -> Self {
        self.state.get_mut().fail_mail = true;
        self
    }

    pub async fn created_tasks(&self) -> Vec<NewTask> {
        self.state.read().await.created.clone()
    }

    pub async fn sent_mail(&self) -> Vec<OutgoingMail> {
        self.state.read().await.sent.clone()
    }

    /// Number of port calls served so far.
    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn count_call(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn matches_email(user: &DirectoryUser, email: &str) -> bool {
    [user.mail.as_deref(), user.user_principal_name.as_deref()]
        .into_iter()
        .flatten()
        .any(|candidate| candidate.eq_ignore_ascii_case(email))
}

#[async_trait]
impl PlannerApi for InMemoryPlanner {
    async fn my_tasks(&self, _token: &AccessToken) -> DomainResult<Vec<RawPlannerTask>> {
        self.count_call();
        Ok(self.state.read().await.my_tasks.clone())
    }

    async fn user_tasks(
        &self,
        _token: &AccessToken,
        email: &str,
    ) -> DomainResult<Vec<RawPlannerTask>> {
        self.count_call();
        let state = self.state.read().await;
        Ok(state
            .user_tasks
            .get(&email.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn find_user(
        &self,
        _token: &AccessToken,
        email: &str,
    ) -> DomainResult<Option<DirectoryUser>> {
        self.count_call();
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| matches_email(u, email)).cloned())
    }

    async fn my_plans(&self, _token: &AccessToken) -> DomainResult<Vec<RawPlan>> {
        self.count_call();
        Ok(self.state.read().await.plans.clone())
    }

    async fn plan_buckets(&self, _token: &AccessToken, plan_id: &str) -> DomainResult<Vec<RawBucket>> {
        self.count_call();
        let state = self.state.read().await;
        state
            .buckets
            .get(plan_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("plan '{plan_id}'")))
    }

    async fn create_task(&self, _token: &AccessToken, task: &NewTask) -> DomainResult<RawPlannerTask> {
        self.count_call();
        let mut state = self.state.write().await;
        state.created.push(task.clone());
        Ok(RawPlannerTask {
            id: Some(format!("task-{}", state.created.len())),
            plan_id: Some(task.plan_id.clone()),
            bucket_id: Some(task.bucket_id.clone()),
            title: Some(task.title.clone()),
            percent_complete: Some(0),
            priority: Some(5),
            created_date_time: Some(chrono::Utc::now()),
            ..RawPlannerTask::default()
        })
    }
}

#[async_trait]
impl MailApi for InMemoryPlanner {
    async fn send_mail(&self, _token: &AccessToken, mail: &OutgoingMail) -> DomainResult<()> {
        self.count_call();
        let mut state = self.state.write().await;
        if state.fail_mail {
            return Err(DomainError::Transport("mailbox unavailable".to_string()));
        }
        state.sent.push(mail.clone());
        Ok(())
    }
}
