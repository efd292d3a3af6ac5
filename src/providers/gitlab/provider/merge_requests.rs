use chrono::{DateTime, NaiveTime, Utc};
use futures::future::try_join_all;
use log::{debug, info};

use super::GitLabProvider;
use crate::error::{GlmrError, Result};
use crate::providers::gitlab::merge_requests::transform_merge_requests;
use crate::providers::gitlab::types::{MergeRequest, MergeRequestState};
use crate::storage::LastSeenTimes;

/// Which merge requests a listing asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRequestFilter {
    Open,
    /// Merged since 00:00 UTC today
    MergedToday,
}

impl MergeRequestFilter {
    fn query_args(self, now: DateTime<Utc>) -> (MergeRequestState, Option<DateTime<Utc>>) {
        match self {
            Self::Open => (MergeRequestState::Opened, None),
            Self::MergedToday => (
                MergeRequestState::Merged,
                Some(now.date_naive().and_time(NaiveTime::MIN).and_utc()),
            ),
        }
    }
}

/// Operator identity and last-seen state, read once per listing.
struct ListingContext {
    my_username: Option<String>,
    last_seen: LastSeenTimes,
}

impl GitLabProvider {
    async fn listing_context(&self) -> Result<ListingContext> {
        let (my_username, last_seen) =
            tokio::try_join!(self.store.my_username(), self.store.last_seen_times())?;

        debug!(
            "Listing as {:?} with {} last-seen entries",
            my_username,
            last_seen.len()
        );

        Ok(ListingContext {
            my_username,
            last_seen,
        })
    }

    /// Lists merge requests of one project.
    pub async fn list_merge_requests(
        &self,
        project_path: &str,
        filter: MergeRequestFilter,
    ) -> Result<Vec<MergeRequest>> {
        self.list_merge_requests_for_projects(&[project_path.to_string()], filter)
            .await
    }

    pub async fn list_open_merge_requests(&self, project_path: &str) -> Result<Vec<MergeRequest>> {
        self.list_merge_requests(project_path, MergeRequestFilter::Open)
            .await
    }

    pub async fn list_merged_today(&self, project_path: &str) -> Result<Vec<MergeRequest>> {
        self.list_merge_requests(project_path, MergeRequestFilter::MergedToday)
            .await
    }

    /// Lists merge requests across several projects.
    ///
    /// The operator username and last-seen times are read once and shared by
    /// every project; the per-project queries run concurrently. Results keep
    /// project order, then server order. Any failure aborts the whole listing.
    pub async fn list_merge_requests_for_projects(
        &self,
        project_paths: &[String],
        filter: MergeRequestFilter,
    ) -> Result<Vec<MergeRequest>> {
        let (state, merged_after) = filter.query_args(Utc::now());

        info!(
            "Fetching {state} merge requests for {} project(s)...",
            project_paths.len()
        );

        let (context, per_project) = tokio::try_join!(
            self.listing_context(),
            try_join_all(
                project_paths
                    .iter()
                    .map(|path| self.client.fetch_merge_requests(path, state, merged_after)),
            ),
        )?;

        let merge_requests: Vec<MergeRequest> = per_project
            .into_iter()
            .flat_map(|raw| {
                transform_merge_requests(
                    raw,
                    context.my_username.as_deref(),
                    &context.last_seen,
                    &self.links,
                )
            })
            .collect();

        info!("Fetched {} merge requests", merge_requests.len());
        Ok(merge_requests)
    }

    /// Records that the operator has seen `mrs` as of their current `updated_at`.
    pub async fn mark_seen(&self, mrs: &[MergeRequest]) -> Result<()> {
        for mr in mrs {
            self.store.mark_seen(&mr.id, mr.updated_at).await?;
        }
        Ok(())
    }

    pub async fn mark_as_ready(&self, mr: &MergeRequest) -> Result<()> {
        info!("Marking !{} in {} as ready", mr.iid, mr.project.full_path);
        self.client
            .set_draft(&mr.project.full_path, &mr.iid, false)
            .await
    }

    pub async fn mark_as_draft(&self, mr: &MergeRequest) -> Result<()> {
        info!("Marking !{} in {} as draft", mr.iid, mr.project.full_path);
        self.client
            .set_draft(&mr.project.full_path, &mr.iid, true)
            .await
    }

    /// Merges at the head SHA the listing saw, squashing if the MR asks for it.
    ///
    /// # Errors
    /// Returns `MergeRequestCannotBeMerged` without contacting GitLab when the
    /// merge request has no head commit, or with GitLab's first reason when
    /// the merge is refused.
    pub async fn merge(&self, mr: &MergeRequest) -> Result<()> {
        let sha = mr.diff_head_sha.as_deref().ok_or_else(|| {
            GlmrError::MergeRequestCannotBeMerged("merge request has no head commit".to_string())
        })?;

        info!("Merging !{} in {} at {sha}", mr.iid, mr.project.full_path);
        self.client
            .accept_merge_request(&mr.project.full_path, &mr.iid, sha, mr.squash_on_merge)
            .await
    }
}
