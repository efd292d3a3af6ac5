//! Short, display-ready summaries derived from merge requests and pipelines.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::providers::gitlab::types::{
    Account, Comment, MergeRequest, MergeRequestState, Pipeline, PipelineStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentsSummary {
    pub count: usize,
    pub tooltip: String,
    /// The operator is among the commenters
    pub by_me: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Aging,
    Stale,
}

/// What the head pipeline is doing, for failed and running pipelines only.
pub fn pipeline_summary(pipeline: &Pipeline) -> Option<String> {
    match pipeline.status {
        PipelineStatus::Failed => Some(match pipeline.failed_jobs.first() {
            Some(job) => format!("Pipeline failed at {}:{}", job.stage, job.name),
            None => pipeline
                .failure_reason
                .clone()
                .unwrap_or_else(|| "Pipeline failed".to_string()),
        }),
        PipelineStatus::Running if pipeline.has_running_jobs() => {
            let job = &pipeline.running_jobs[0];
            Some(format!("Pipeline is running {}:{}", job.stage, job.name))
        }
        PipelineStatus::Running => Some("Pipeline is running".to_string()),
        _ => None,
    }
}

/// Best link for the head pipeline: the first failed job of a failed
/// pipeline, otherwise the pipeline itself.
pub fn pipeline_target_url(pipeline: &Pipeline) -> Option<&str> {
    if pipeline.status == PipelineStatus::Failed && pipeline.has_failed_jobs() {
        return pipeline.failed_jobs[0].web_url.as_deref();
    }
    pipeline.web_url.as_deref()
}

pub fn comments_summary(mr: &MergeRequest) -> Option<CommentsSummary> {
    if mr.state == MergeRequestState::Merged || mr.comments.is_empty() {
        return None;
    }

    let (label, comments): (&str, Vec<&Comment>) = if mr.unresolved_comments_count > 0 {
        (
            "Unresolved comments",
            mr.comments.iter().filter(|c| c.is_unresolved).collect(),
        )
    } else {
        ("Comments", mr.comments.iter().collect())
    };

    let commenters = unique_commenters(&comments);

    Some(CommentsSummary {
        count: comments.len(),
        tooltip: format!("{label} by {}", display_names(&commenters)),
        by_me: commenters.iter().any(|a| a.is_me),
    })
}

pub fn approvers_summary(mr: &MergeRequest) -> Option<String> {
    if mr.state == MergeRequestState::Merged || mr.approved_by.is_empty() {
        return None;
    }
    let approvers: Vec<&Account> = mr.approved_by.iter().collect();
    Some(format!("Approved by {}", display_names(&approvers)))
}

/// Shown only when someone other than the author merged.
pub fn merged_by_summary(mr: &MergeRequest) -> Option<String> {
    let merged_by = mr.merged_by.as_ref()?;
    let same_as_author = mr
        .author
        .as_ref()
        .is_some_and(|author| author.username == merged_by.username);

    (!same_as_author).then(|| format!("Merged by {}", merged_by.display_name))
}

/// Relative age like "3h" or "12d", plus how stale it is.
pub fn relative_age(at: DateTime<Utc>, now: DateTime<Utc>) -> (String, Freshness) {
    let age = now.signed_duration_since(at);

    let text = if age.num_days() > 0 {
        format!("{}d", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{}h", age.num_hours())
    } else {
        format!("{}m", age.num_minutes().max(0))
    };

    let freshness = match age.num_days() {
        d if d < 1 => Freshness::Fresh,
        d if d < 7 => Freshness::Aging,
        _ => Freshness::Stale,
    };

    (text, freshness)
}

/// Unique by username, in first-seen order; deleted authors are skipped.
fn unique_commenters<'a>(comments: &[&'a Comment]) -> Vec<&'a Account> {
    let mut by_username: IndexMap<&str, &Account> = IndexMap::new();
    for author in comments.iter().filter_map(|c| c.author.as_ref()) {
        by_username.entry(author.username.as_str()).or_insert(author);
    }
    by_username.into_values().collect()
}

fn display_names(accounts: &[&Account]) -> String {
    accounts
        .iter()
        .map(|a| a.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::gitlab::types::{CiJob, ProjectRef};

    fn account(username: &str, display_name: &str, is_me: bool) -> Account {
        Account {
            name: format!("{display_name} Doe"),
            username: username.to_string(),
            is_me,
            display_name: display_name.to_string(),
        }
    }

    fn comment(id: &str, author: Option<Account>, unresolved: bool) -> Comment {
        Comment {
            id: id.to_string(),
            author,
            resolvable: true,
            resolved: !unresolved,
            is_unresolved: unresolved,
        }
    }

    fn pipeline(status: PipelineStatus) -> Pipeline {
        Pipeline {
            project_path: None,
            branch_name: Some("main".to_string()),
            status,
            updated_at: "2024-05-01T10:00:00Z".parse().unwrap(),
            failure_reason: Some("Job failed".to_string()),
            commit: None,
            running_jobs: vec![],
            failed_jobs: vec![],
            web_url: Some("https://gitlab.example.com/g/a/-/pipelines/1".to_string()),
        }
    }

    fn job(stage: &str, name: &str) -> CiJob {
        CiJob {
            stage: stage.to_string(),
            name: name.to_string(),
            web_url: Some(format!("https://gitlab.example.com/g/a/-/jobs/{name}")),
        }
    }

    fn mr(comments: Vec<Comment>) -> MergeRequest {
        let unresolved_comments_count = comments.iter().filter(|c| c.is_unresolved).count();
        MergeRequest {
            id: "gid://gitlab/MergeRequest/1".to_string(),
            iid: "1".to_string(),
            project: ProjectRef {
                full_path: "g/a".to_string(),
            },
            title: "Change".to_string(),
            state: MergeRequestState::Opened,
            draft: false,
            created_at: "2024-05-01T08:00:00Z".parse().unwrap(),
            updated_at: "2024-05-01T09:00:00Z".parse().unwrap(),
            source_branch: "change".to_string(),
            diff_head_sha: Some("abc".to_string()),
            squash_on_merge: false,
            web_url: None,
            jira: None,
            has_conflicts: false,
            has_all_approvals: false,
            approved_by: vec![],
            author: Some(account("ada", "me", true)),
            merged_by: None,
            head_pipeline: None,
            comments,
            unresolved_comments_count,
            has_updates: false,
        }
    }

    #[test]
    fn test_failed_pipeline_names_first_failed_job() {
        let mut failed = pipeline(PipelineStatus::Failed);
        failed.failed_jobs = vec![job("test", "unit"), job("lint", "rubocop")];

        assert_eq!(
            pipeline_summary(&failed).as_deref(),
            Some("Pipeline failed at test:unit")
        );
        assert_eq!(
            pipeline_target_url(&failed),
            Some("https://gitlab.example.com/g/a/-/jobs/unit")
        );
    }

    #[test]
    fn test_failed_pipeline_without_jobs_uses_failure_reason() {
        let failed = pipeline(PipelineStatus::Failed);
        assert_eq!(pipeline_summary(&failed).as_deref(), Some("Job failed"));
        assert_eq!(
            pipeline_target_url(&failed),
            Some("https://gitlab.example.com/g/a/-/pipelines/1")
        );
    }

    #[test]
    fn test_running_pipeline() {
        let mut running = pipeline(PipelineStatus::Running);
        assert_eq!(
            pipeline_summary(&running).as_deref(),
            Some("Pipeline is running")
        );

        running.running_jobs = vec![job("build", "docker")];
        assert_eq!(
            pipeline_summary(&running).as_deref(),
            Some("Pipeline is running build:docker")
        );
    }

    #[test]
    fn test_successful_pipeline_has_no_summary() {
        assert_eq!(pipeline_summary(&pipeline(PipelineStatus::Success)), None);
    }

    #[test]
    fn test_unresolved_comments_take_priority() {
        let summary = comments_summary(&mr(vec![
            comment("1", Some(account("alan", "Alan", false)), true),
            comment("2", Some(account("ada", "me", true)), false),
            comment("3", Some(account("alan", "Alan", false)), true),
            comment("4", None, true),
        ]))
        .unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.tooltip, "Unresolved comments by Alan");
        assert!(!summary.by_me);
    }

    #[test]
    fn test_all_comments_when_everything_is_resolved() {
        let summary = comments_summary(&mr(vec![
            comment("1", Some(account("grace", "Grace", false)), false),
            comment("2", Some(account("ada", "me", true)), false),
            comment("3", Some(account("grace", "Grace", false)), false),
        ]))
        .unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.tooltip, "Comments by Grace, me");
        assert!(summary.by_me);
    }

    #[test]
    fn test_no_comments_or_merged_has_no_summary() {
        assert_eq!(comments_summary(&mr(vec![])), None);

        let mut merged = mr(vec![comment("1", None, true)]);
        merged.state = MergeRequestState::Merged;
        assert_eq!(comments_summary(&merged), None);
    }

    #[test]
    fn test_approvers_and_merged_by() {
        let mut change = mr(vec![]);
        assert_eq!(approvers_summary(&change), None);

        change.approved_by = vec![account("alan", "Alan", false), account("grace", "Grace", false)];
        assert_eq!(
            approvers_summary(&change).as_deref(),
            Some("Approved by Alan, Grace")
        );

        change.merged_by = Some(account("ada", "me", true));
        assert_eq!(merged_by_summary(&change), None);

        change.merged_by = Some(account("grace", "Grace", false));
        assert_eq!(merged_by_summary(&change).as_deref(), Some("Merged by Grace"));
    }

    #[test]
    fn test_relative_age() {
        let now: DateTime<Utc> = "2024-05-10T12:00:00Z".parse().unwrap();

        let (text, freshness) = relative_age("2024-05-10T11:15:00Z".parse().unwrap(), now);
        assert_eq!((text.as_str(), freshness), ("45m", Freshness::Fresh));

        let (text, freshness) = relative_age("2024-05-08T12:00:00Z".parse().unwrap(), now);
        assert_eq!((text.as_str(), freshness), ("2d", Freshness::Aging));

        let (text, freshness) = relative_age("2024-04-10T12:00:00Z".parse().unwrap(), now);
        assert_eq!((text.as_str(), freshness), ("30d", Freshness::Stale));
    }
}
