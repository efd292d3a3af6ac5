//! Raw GraphQL payload shapes, exactly as GitLab returns them.
//!
//! These types are only ever deserialized and then consumed by the transforms
//! in `identity`, `pipelines`, `merge_requests` and `projects`. Nothing in the
//! UI layer sees them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::MergeRequestState;

/// A GraphQL connection. GitLab types `nodes` as `[T]` with nullable entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Option<Vec<Option<T>>>,
    pub page_info: Option<PageInfo>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            nodes: None,
            page_info: None,
        }
    }
}

impl<T> Connection<T> {
    /// Drops null entries and a null node list.
    pub fn into_nodes(self) -> Vec<T> {
        self.nodes.into_iter().flatten().flatten().collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAccount {
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectRef {
    pub full_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStage {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJob {
    pub stage: Option<RawStage>,
    pub name: Option<String>,
    pub web_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCommit {
    pub full_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPipeline {
    pub project: Option<RawProjectRef>,
    #[serde(rename = "ref")]
    pub ref_: Option<String>,
    /// Upper-case status token (e.g., `FAILED`)
    pub status: String,
    pub path: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub commit: Option<RawCommit>,
    /// Jobs filtered server-side with `statuses: [RUNNING]`
    pub running_jobs: Option<Connection<RawJob>>,
    /// Jobs filtered server-side with `statuses: [FAILED]`
    pub failed_jobs: Option<Connection<RawJob>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNote {
    pub id: String,
    pub author: Option<RawAccount>,
    pub system: bool,
    pub resolvable: bool,
    pub resolved: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMergeRequest {
    pub id: String,
    pub iid: String,
    pub title: String,
    pub diff_head_sha: Option<String>,
    pub state: MergeRequestState,
    pub draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub conflicts: bool,
    pub web_url: Option<String>,
    pub source_branch: String,
    pub squash_on_merge: bool,
    pub author: Option<RawAccount>,
    pub notes: Option<Connection<RawNote>>,
    pub project: RawProjectRef,
    pub approvals_left: Option<i64>,
    pub approved_by: Option<Connection<RawAccount>>,
    pub merge_user: Option<RawAccount>,
    pub head_pipeline: Option<RawPipeline>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRepository {
    pub root_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProject {
    pub id: String,
    pub name: String,
    pub full_path: String,
    pub repository: Option<RawRepository>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_skips_null_nodes() {
        let conn: Connection<RawAccount> = serde_json::from_value(json!({
            "nodes": [
                {"name": "Ada Lovelace", "username": "ada"},
                null,
                {"name": "Alan Turing", "username": "alan"}
            ]
        }))
        .unwrap();

        let names: Vec<_> = conn.into_nodes().into_iter().map(|a| a.username).collect();
        assert_eq!(names, vec!["ada", "alan"]);
    }

    #[test]
    fn test_connection_null_nodes_is_empty() {
        let conn: Connection<RawAccount> = serde_json::from_value(json!({"nodes": null})).unwrap();
        assert!(conn.into_nodes().is_empty());
    }

    #[test]
    fn test_pipeline_ref_field_rename() {
        let pipeline: RawPipeline = serde_json::from_value(json!({
            "ref": "main",
            "status": "RUNNING",
            "path": "/g/p/-/pipelines/1",
            "updatedAt": "2024-05-01T10:00:00Z",
            "failureReason": null,
            "commit": {"fullTitle": "Initial commit"}
        }))
        .unwrap();

        assert_eq!(pipeline.ref_.as_deref(), Some("main"));
        assert!(pipeline.running_jobs.is_none());
        assert!(pipeline.project.is_none());
    }
}
