use super::links::Links;
use super::raw::{Connection, RawJob, RawPipeline};
use super::types::{CiJob, Pipeline, PipelineCommit, PipelineStatus};

/// Converts a raw pipeline payload into the UI view model.
///
/// Jobs arrive already split into running and failed subsets by the query's
/// `statuses` filters; this function never filters them itself.
pub fn transform_pipeline(raw: RawPipeline, links: &Links) -> Pipeline {
    Pipeline {
        project_path: raw.project.map(|p| p.full_path),
        branch_name: raw.ref_,
        status: PipelineStatus::from_remote(&raw.status),
        updated_at: raw.updated_at,
        failure_reason: raw.failure_reason,
        commit: raw.commit.map(|c| PipelineCommit {
            title: c.full_title.unwrap_or_default(),
        }),
        running_jobs: transform_jobs(raw.running_jobs, links),
        failed_jobs: transform_jobs(raw.failed_jobs, links),
        web_url: links.path_to_url(raw.path.as_deref()),
    }
}

fn transform_jobs(jobs: Option<Connection<RawJob>>, links: &Links) -> Vec<CiJob> {
    jobs.unwrap_or_default()
        .into_nodes()
        .into_iter()
        .map(|job| CiJob {
            stage: job.stage.and_then(|s| s.name).unwrap_or_default(),
            name: job.name.unwrap_or_default(),
            web_url: links.path_to_url(job.web_path.as_deref()),
        })
        .collect()
}
