use serde::{Deserialize, Serialize};

use super::transport::GitLabClient;
use crate::error::{GlmrError, Result};
use crate::providers::gitlab::raw::{Connection, RawPipeline};

const LATEST_PIPELINE: &str = concat!(
    pipeline_fragment!(),
    r#"
query BranchLatestPipeline($project: ID!, $branch: String!) {
    project(fullPath: $project) {
        name
        pipelines(ref: $branch, first: 1) {
            nodes {
                project {
                    fullPath
                }
                ...Pipeline
            }
        }
    }
}
"#
);

#[derive(Serialize)]
struct LatestPipelineVariables<'a> {
    project: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct LatestPipelineData {
    project: Option<ProjectPipelines>,
}

#[derive(Deserialize)]
struct ProjectPipelines {
    pipelines: Option<Connection<RawPipeline>>,
}

impl GitLabClient {
    /// Fetches the most recent pipeline for `branch`, or `None` if it never ran.
    ///
    /// # Errors
    /// Returns `ProjectNotFound` if the project does not exist or is not visible.
    pub async fn fetch_latest_pipeline(
        &self,
        project_path: &str,
        branch: &str,
    ) -> Result<Option<RawPipeline>> {
        let data: LatestPipelineData = self
            .execute_graphql_request(
                "BranchLatestPipeline",
                LATEST_PIPELINE,
                LatestPipelineVariables {
                    project: project_path,
                    branch,
                },
            )
            .await?;

        let project = data
            .project
            .ok_or_else(|| GlmrError::ProjectNotFound(project_path.to_string()))?;

        Ok(project
            .pipelines
            .unwrap_or_default()
            .into_nodes()
            .into_iter()
            .next())
    }
}
