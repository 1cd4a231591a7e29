use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AccessToken, DirectoryUser, NewTask, OutgoingMail, RawBucket, RawPlan, RawPlannerTask,
};

/// Port for the remote planner system
///
/// Every call carries the caller's token explicitly; adapters hold no
/// per-user state.
#[async_trait]
pub trait PlannerApi: Send + Sync {
    /// Tasks visible to the signed-in user, with details expanded
    async fn my_tasks(&self, token: &AccessToken) -> DomainResult<Vec<RawPlannerTask>>;

    /// Tasks of another user, with details expanded
    async fn user_tasks(
        &self,
        token: &AccessToken,
        email: &str,
    ) -> DomainResult<Vec<RawPlannerTask>>;

    /// Look up a directory user by mail or principal name
    async fn find_user(&self, token: &AccessToken, email: &str)
    -> DomainResult<Option<DirectoryUser>>;

    /// Plans the signed-in user belongs to, in provider order
    async fn my_plans(&self, token: &AccessToken) -> DomainResult<Vec<RawPlan>>;

    /// Buckets of a plan, in provider order
    async fn plan_buckets(&self, token: &AccessToken, plan_id: &str) -> DomainResult<Vec<RawBucket>>;

    /// Create a task and return the created record
    async fn create_task(&self, token: &AccessToken, task: &NewTask) -> DomainResult<RawPlannerTask>;
}

/// Port for sending mail on behalf of a user
#[async_trait]
pub trait MailApi: Send + Sync {
    async fn send_mail(&self, token: &AccessToken, mail: &OutgoingMail) -> DomainResult<()>;
}
