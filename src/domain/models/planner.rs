//! Payloads exchanged with the remote planner and mail system.
//!
//! These mirror the remote JSON loosely: most fields are optional and the
//! assignment side-table stays an untyped JSON object. The task store
//! validates and normalizes them into [`TaskRecord`](super::task::TaskRecord).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A planner task as returned by the remote API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlannerTask {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub bucket_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub percent_complete: Option<i32>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_description: Option<bool>,
    /// Present when the request expanded `details`.
    #[serde(default)]
    pub details: Option<RawTaskDetails>,
    /// Keyed by assignee id; values are assignment objects or `null`.
    #[serde(default)]
    pub assignments: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Expanded task details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTaskDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preview_type: Option<String>,
}

/// One value of the assignment side-table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssignment {
    #[serde(default)]
    pub assigned_by: Option<RawIdentitySet>,
    #[serde(default)]
    pub assigned_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_hint: Option<String>,
}

/// Identity set as used in `assignedBy` / `createdBy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIdentitySet {
    #[serde(default)]
    pub user: Option<RawIdentity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIdentity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A plan as returned by the remote API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlan {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// A bucket as returned by the remote API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBucket {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// A directory user found by email lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

/// A mail message to send on behalf of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}
