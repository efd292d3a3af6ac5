use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transport::GitLabClient;
use crate::error::{GlmrError, Result};
use crate::providers::gitlab::raw::{Connection, RawMergeRequest};
use crate::providers::gitlab::types::MergeRequestState;

const LIST_MERGE_REQUESTS: &str = concat!(
    user_fragment!(),
    pipeline_fragment!(),
    r#"
fragment Comment on Note {
    id
    author {
        ...User
    }
    system
    resolvable
    resolved
}

fragment MergeRequest on MergeRequest {
    id
    iid
    title
    diffHeadSha
    state
    draft
    createdAt
    updatedAt
    conflicts
    webUrl
    sourceBranch
    squashOnMerge
    author {
        name
        username
    }
    notes {
        nodes {
            ...Comment
        }
    }
    project {
        fullPath
    }
    approvalsLeft
    approvedBy {
        nodes {
            ...User
        }
    }
    mergeUser {
        ...User
    }
    headPipeline {
        ...Pipeline
    }
}

query ListMergeRequests($project: ID!, $state: MergeRequestState = opened, $mergedAfter: Time) {
    project(fullPath: $project) {
        mergeRequests(state: $state, mergedAfter: $mergedAfter) {
            nodes {
                ...MergeRequest
            }
        }
    }
}
"#
);

const SET_DRAFT: &str = r#"
mutation MergeRequestSetDraft($project: ID!, $mrId: String!, $draft: Boolean!) {
    mergeRequestSetDraft(input: { projectPath: $project, iid: $mrId, draft: $draft }) {
        errors
    }
}
"#;

const ACCEPT: &str = r#"
mutation MergeRequestAccept($project: ID!, $mrId: String!, $sha: String!, $squash: Boolean) {
    mergeRequestAccept(input: { projectPath: $project, iid: $mrId, sha: $sha, squash: $squash }) {
        errors
    }
}
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListMergeRequestsVariables<'a> {
    project: &'a str,
    state: MergeRequestState,
    merged_after: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ListMergeRequestsData {
    project: Option<ProjectMergeRequests>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectMergeRequests {
    merge_requests: Option<Connection<RawMergeRequest>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetDraftVariables<'a> {
    project: &'a str,
    mr_id: &'a str,
    draft: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptVariables<'a> {
    project: &'a str,
    mr_id: &'a str,
    sha: &'a str,
    squash: bool,
}

/// Payload shared by GitLab mutations: a list of human-readable failures.
#[derive(Deserialize)]
struct MutationPayload {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetDraftData {
    merge_request_set_draft: Option<MutationPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcceptData {
    merge_request_accept: Option<MutationPayload>,
}

impl GitLabClient {
    /// Fetches merge requests of a project in the given state.
    ///
    /// # Arguments
    /// * `project_path` - The full path of the project (e.g., "group/project")
    /// * `state` - Merge request state filter
    /// * `merged_after` - Only merge requests merged after this instant
    ///
    /// # Errors
    /// Returns `ProjectNotFound` if the project does not exist or is not visible.
    pub async fn fetch_merge_requests(
        &self,
        project_path: &str,
        state: MergeRequestState,
        merged_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<RawMergeRequest>> {
        let data: ListMergeRequestsData = self
            .execute_graphql_request(
                "ListMergeRequests",
                LIST_MERGE_REQUESTS,
                ListMergeRequestsVariables {
                    project: project_path,
                    state,
                    merged_after,
                },
            )
            .await?;

        let project = data
            .project
            .ok_or_else(|| GlmrError::ProjectNotFound(project_path.to_string()))?;

        Ok(project.merge_requests.unwrap_or_default().into_nodes())
    }

    /// Marks a merge request as draft (`true`) or ready (`false`).
    ///
    /// Mutation-level errors are returned as `Validation` with the first message.
    pub async fn set_draft(&self, project_path: &str, iid: &str, draft: bool) -> Result<()> {
        let data: SetDraftData = self
            .execute_graphql_request(
                "MergeRequestSetDraft",
                SET_DRAFT,
                SetDraftVariables {
                    project: project_path,
                    mr_id: iid,
                    draft,
                },
            )
            .await?;

        let errors = data
            .merge_request_set_draft
            .map(|p| p.errors)
            .unwrap_or_default();

        match GlmrError::from_messages(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Merges a merge request at `sha`.
    ///
    /// # Errors
    /// Returns `MergeRequestCannotBeMerged` with the first mutation error when
    /// GitLab refuses the merge (pipeline pending, conflicts, SHA moved, ...).
    pub async fn accept_merge_request(
        &self,
        project_path: &str,
        iid: &str,
        sha: &str,
        squash: bool,
    ) -> Result<()> {
        let data: AcceptData = self
            .execute_graphql_request(
                "MergeRequestAccept",
                ACCEPT,
                AcceptVariables {
                    project: project_path,
                    mr_id: iid,
                    sha,
                    squash,
                },
            )
            .await?;

        let errors = data
            .merge_request_accept
            .map(|p| p.errors)
            .unwrap_or_default();

        match errors.into_iter().next() {
            Some(first) => Err(GlmrError::MergeRequestCannotBeMerged(first)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    async fn respond(
        server: &mut mockito::ServerGuard,
        matcher: serde_json::Value,
        body: serde_json::Value,
    ) -> mockito::Mock {
        server
            .mock("POST", "/api/graphql")
            .match_body(Matcher::PartialJson(matcher))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_fetch_merged_sends_state_and_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = respond(
            &mut server,
            json!({
                "operationName": "ListMergeRequests",
                "variables": {
                    "project": "shop/payments",
                    "state": "merged",
                    "mergedAfter": "2024-05-02T00:00:00Z"
                }
            }),
            json!({"data": {"project": {"mergeRequests": {"nodes": []}}}}),
        )
        .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let mrs = client
            .fetch_merge_requests(
                "shop/payments",
                MergeRequestState::Merged,
                Some("2024-05-02T00:00:00Z".parse().unwrap()),
            )
            .await
            .unwrap();

        assert!(mrs.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({}), json!({"data": {"project": null}})).await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let err = client
            .fetch_merge_requests("nope/nope", MergeRequestState::Opened, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GlmrError::ProjectNotFound(ref p) if p == "nope/nope"));
    }

    #[tokio::test]
    async fn test_set_draft_sends_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = respond(
            &mut server,
            json!({"variables": {"project": "shop/payments", "mrId": "17", "draft": true}}),
            json!({"data": {"mergeRequestSetDraft": {"errors": []}}}),
        )
        .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        client.set_draft("shop/payments", "17", true).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_draft_mutation_errors() {
        let mut server = mockito::Server::new_async().await;
        respond(
            &mut server,
            json!({}),
            json!({"data": {"mergeRequestSetDraft": {"errors": ["You cannot update this merge request"]}}}),
        )
        .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let err = client
            .set_draft("shop/payments", "17", false)
            .await
            .unwrap_err();

        assert!(matches!(err, GlmrError::Validation(ref m) if m == "You cannot update this merge request"));
    }

    #[tokio::test]
    async fn test_accept_rejected_carries_first_error() {
        let mut server = mockito::Server::new_async().await;
        respond(
            &mut server,
            json!({"variables": {"sha": "3f2a9c1", "squash": true}}),
            json!({"data": {"mergeRequestAccept": {"errors": [
                "Branch cannot be merged",
                "Pipeline must succeed"
            ]}}}),
        )
        .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let err = client
            .accept_merge_request("shop/payments", "17", "3f2a9c1", true)
            .await
            .unwrap_err();

        assert!(
            matches!(err, GlmrError::MergeRequestCannotBeMerged(ref m) if m == "Branch cannot be merged")
        );
    }

    #[tokio::test]
    async fn test_accept_succeeds() {
        let mut server = mockito::Server::new_async().await;
        respond(
            &mut server,
            json!({"operationName": "MergeRequestAccept"}),
            json!({"data": {"mergeRequestAccept": {"errors": []}}}),
        )
        .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        client
            .accept_merge_request("shop/payments", "17", "3f2a9c1", false)
            .await
            .unwrap();
    }
}
