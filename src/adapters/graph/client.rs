//! HTTP client for the Microsoft Graph planner and mail endpoints.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AccessToken, DirectoryUser, GraphConfig, MailConfig, NewTask, OutgoingMail, RawBucket, RawPlan,
    RawPlannerTask,
};
use crate::domain::ports::{MailApi, PlannerApi};
use crate::infrastructure::logging::scrub_secrets;

/// Envelope of every collection response.
#[derive(Debug, Deserialize)]
struct ODataCollection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Graph client shared by the planner and mail ports.
///
/// Clones share the connection pool and the request budget.
#[derive(Clone)]
pub struct GraphClient {
    http_client: ReqwestClient,
    base_url: Url,
    mail_sender: Option<String>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl GraphClient {
    pub fn new(config: &GraphConfig, mail: &MailConfig) -> Result<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid graph base_url '{}'", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("graph base_url '{}' cannot be used as a base", config.base_url);
        }

        let per_minute = NonZeroU32::new(config.requests_per_minute)
            .context("graph.requests_per_minute must be at least 1")?;

        Ok(Self {
            http_client,
            base_url,
            mail_sender: mail
                .sender
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    /// Join path segments onto the versioned base URL.
    fn endpoint(&self, segments: &[&str]) -> DomainResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DomainError::Transport("graph base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, token: &AccessToken) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Wait for budget, send, and map non-success statuses.
    async fn send(&self, request: RequestBuilder) -> DomainResult<reqwest::Response> {
        self.rate_limiter.until_ready().await;

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Transport(scrub_secrets(&e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        let body = scrub_secrets(&body);
        warn!(status = status.as_u16(), "graph request failed");

        Err(match status {
            StatusCode::NOT_FOUND => DomainError::NotFound(format!("graph resource: {body}")),
            _ => DomainError::Transport(format!("graph returned {status}: {body}")),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &AccessToken, url: Url) -> DomainResult<T> {
        debug!(path = url.path(), "GET");
        let response = self.send(self.request(Method::GET, url, token)).await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        url: Url,
        body: &B,
    ) -> DomainResult<T> {
        debug!(path = url.path(), "POST");
        let response = self
            .send(self.request(Method::POST, url, token).json(body))
            .await?;
        read_json(response).await
    }

    async fn tasks_at(&self, token: &AccessToken, mut url: Url) -> DomainResult<Vec<RawPlannerTask>> {
        url.query_pairs_mut().append_pair("$expand", "details");
        let page: ODataCollection<RawPlannerTask> = self.get_json(token, url).await?;
        Ok(page.value)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> DomainResult<T> {
    let text = response
        .text()
        .await
        .map_err(|e| DomainError::Transport(scrub_secrets(&e.to_string())))?;
    Ok(serde_json::from_str(&text)?)
}

/// OData string literal with embedded quotes doubled.
fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[async_trait]
impl PlannerApi for GraphClient {
    #[instrument(skip(self, token))]
    async fn my_tasks(&self, token: &AccessToken) -> DomainResult<Vec<RawPlannerTask>> {
        let url = self.endpoint(&["me", "planner", "tasks"])?;
        self.tasks_at(token, url).await
    }

    #[instrument(skip(self, token))]
    async fn user_tasks(
        &self,
        token: &AccessToken,
        email: &str,
    ) -> DomainResult<Vec<RawPlannerTask>> {
        let url = self.endpoint(&["users", email, "planner", "tasks"])?;
        self.tasks_at(token, url).await
    }

    #[instrument(skip(self, token))]
    async fn find_user(
        &self,
        token: &AccessToken,
        email: &str,
    ) -> DomainResult<Option<DirectoryUser>> {
        let literal = odata_literal(email);
        let mut url = self.endpoint(&["users"])?;
        url.query_pairs_mut()
            .append_pair(
                "$filter",
                &format!("mail eq {literal} or userPrincipalName eq {literal}"),
            )
            .append_pair("$top", "1");

        let page: ODataCollection<DirectoryUser> = self.get_json(token, url).await?;
        Ok(page.value.into_iter().next())
    }

    #[instrument(skip(self, token))]
    async fn my_plans(&self, token: &AccessToken) -> DomainResult<Vec<RawPlan>> {
        let url = self.endpoint(&["me", "planner", "plans"])?;
        let page: ODataCollection<RawPlan> = self.get_json(token, url).await?;
        Ok(page.value)
    }

    #[instrument(skip(self, token))]
    async fn plan_buckets(&self, token: &AccessToken, plan_id: &str) -> DomainResult<Vec<RawBucket>> {
        let url = self.endpoint(&["planner", "plans", plan_id, "buckets"])?;
        let page: ODataCollection<RawBucket> = self.get_json(token, url).await?;
        Ok(page.value)
    }

    #[instrument(skip(self, token, task), fields(plan_id = %task.plan_id))]
    async fn create_task(&self, token: &AccessToken, task: &NewTask) -> DomainResult<RawPlannerTask> {
        let url = self.endpoint(&["planner", "tasks"])?;
        self.post_json(token, url, task).await
    }
}

#[async_trait]
impl MailApi for GraphClient {
    #[instrument(skip(self, token, mail), fields(to = %mail.to))]
    async fn send_mail(&self, token: &AccessToken, mail: &OutgoingMail) -> DomainResult<()> {
        let url = match self.mail_sender {
            Some(ref sender) => self.endpoint(&["users", sender, "sendMail"])?,
            None => self.endpoint(&["me", "sendMail"])?,
        };

        let body = json!({
            "message": {
                "subject": mail.subject,
                "body": { "contentType": "HTML", "content": mail.body },
                "toRecipients": [ { "emailAddress": { "address": mail.to } } ],
            },
            "saveToSentItems": true,
        });

        debug!(path = url.path(), "POST");
        // 202 Accepted with an empty body
        self.send(self.request(Method::POST, url, token).json(&body))
            .await?;
        Ok(())
    }
}
