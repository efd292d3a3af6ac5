use std::sync::Arc;

use log::{debug, info, warn};

use crate::auth::Token;
use crate::error::Result;
use crate::providers::gitlab::client::GitLabClient;
use crate::storage::StateStore;

use super::links::Links;
use super::pipelines::transform_pipeline;
use super::projects::transform_projects;
use super::types::{Pipeline, Project};

mod merge_requests;

pub use merge_requests::MergeRequestFilter;

/// GitLab merge request provider.
///
/// Issues GraphQL operations through [`GitLabClient`], enriches the raw nodes
/// with operator identity, last-seen state and absolute links, and hands back
/// immutable domain values.
pub struct GitLabProvider {
    client: GitLabClient,
    links: Links,
    store: Arc<dyn StateStore>,
}

impl GitLabProvider {
    /// Creates a provider for one GitLab instance.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitLab instance base URL (e.g., <https://gitlab.com>)
    /// * `token` - Optional personal access token
    /// * `jira_url` - Optional Jira base URL used for title references
    /// * `store` - Local username and last-seen state
    ///
    /// # Errors
    ///
    /// Returns an error if the GraphQL endpoint URL cannot be constructed.
    pub fn new(
        base_url: &str,
        token: Option<Token>,
        jira_url: Option<&str>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self> {
        let client = GitLabClient::new(base_url, token)?;
        debug!("GraphQL endpoint: {}", client.graphql_url());

        Ok(Self {
            client,
            links: Links::new(base_url, jira_url),
            store,
        })
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    /// Lists every project the operator is a member of, in server order.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        info!("Fetching projects...");

        let projects = transform_projects(self.client.fetch_my_projects().await?);

        info!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    /// Latest pipeline that ran for `branch`, if any.
    pub async fn latest_pipeline_for_branch(
        &self,
        project_path: &str,
        branch: &str,
    ) -> Result<Option<Pipeline>> {
        info!("Fetching latest pipeline for {project_path}@{branch}");

        let pipeline = self
            .client
            .fetch_latest_pipeline(project_path, branch)
            .await?
            .map(|raw| transform_pipeline(raw, &self.links));

        if pipeline.is_none() {
            warn!("No pipeline found for {project_path}@{branch}");
        }

        Ok(pipeline)
    }

    /// Username of the token's owner as GitLab reports it.
    pub async fn current_username(&self) -> Result<Option<String>> {
        self.client.fetch_current_username().await
    }

    /// Looks up the token's owner and remembers it as the operator.
    ///
    /// Returns the stored username, or `None` when the token is anonymous
    /// (in which case nothing is stored).
    pub async fn login(&self) -> Result<Option<String>> {
        let username = self.current_username().await?;

        match &username {
            Some(username) => self.store.set_my_username(username).await?,
            None => warn!("GitLab did not report a current user; nothing stored"),
        }

        Ok(username)
    }
}
