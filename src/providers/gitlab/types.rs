//! UI-ready domain objects produced by the transforms.
//!
//! Every value here is built once from a raw payload and never mutated after.
//! Field names serialize in camelCase so JSON consumers see the same shape
//! GitLab uses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitLab account enriched with operator identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    pub username: String,
    /// Whether this account is the locally configured operator
    pub is_me: bool,
    /// `"me"` for the operator, otherwise the first name
    pub display_name: String,
}

/// Issue-tracker reference extracted from a merge request title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Jira {
    /// Issue key (e.g., "ABC-123")
    pub key: String,
    /// Browse URL for the issue
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiJob {
    pub stage: String,
    pub name: String,
    pub web_url: Option<String>,
}

/// CI/CD pipeline status.
///
/// GitLab may add statuses at any time, so unknown tokens are kept verbatim
/// in `Other` instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    WaitingForResponse,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    Other(String),
}

impl PipelineStatus {
    /// Parses the remote's upper-case status token (e.g., `FAILED`).
    pub fn from_remote(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "created" => Self::Created,
            "waiting_for_resource" => Self::WaitingForResource,
            "waiting_for_response" => Self::WaitingForResponse,
            "preparing" => Self::Preparing,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "skipped" => Self::Skipped,
            "manual" => Self::Manual,
            "scheduled" => Self::Scheduled,
            _ => Self::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::WaitingForResource => "waiting_for_resource",
            Self::WaitingForResponse => "waiting_for_response",
            Self::Preparing => "preparing",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::Other(token) => token,
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PipelineStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineCommit {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Full path of the owning project, when the query asked for it
    pub project_path: Option<String>,
    pub branch_name: Option<String>,
    pub status: PipelineStatus,
    pub updated_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub commit: Option<PipelineCommit>,
    pub running_jobs: Vec<CiJob>,
    pub failed_jobs: Vec<CiJob>,
    pub web_url: Option<String>,
}

impl Pipeline {
    pub fn has_running_jobs(&self) -> bool {
        !self.running_jobs.is_empty()
    }

    pub fn has_failed_jobs(&self) -> bool {
        !self.failed_jobs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: Option<Account>,
    pub resolvable: bool,
    pub resolved: bool,
    /// `resolvable && !resolved`
    pub is_unresolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Locked,
    Merged,
}

impl MergeRequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Locked => "locked",
            Self::Merged => "merged",
        }
    }
}

impl fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub full_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// GraphQL Global ID (e.g., <gid://gitlab/MergeRequest/42>), also the last-seen key
    pub id: String,
    /// Project-scoped number shown as `!iid`
    pub iid: String,
    pub project: ProjectRef,
    pub title: String,
    pub state: MergeRequestState,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_branch: String,
    pub diff_head_sha: Option<String>,
    pub squash_on_merge: bool,
    pub web_url: Option<String>,
    pub jira: Option<Jira>,
    pub has_conflicts: bool,
    pub has_all_approvals: bool,
    pub approved_by: Vec<Account>,
    pub author: Option<Account>,
    pub merged_by: Option<Account>,
    pub head_pipeline: Option<Pipeline>,
    /// Human comments only; system notes never appear here
    pub comments: Vec<Comment>,
    pub unresolved_comments_count: usize,
    /// Updated since the operator last looked at it
    pub has_updates: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub full_path: String,
    pub default_branch: Option<String>,
}
