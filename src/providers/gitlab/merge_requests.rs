use chrono::{DateTime, Utc};

use super::identity::resolve_identity;
use super::jira::extract_jira_reference;
use super::links::Links;
use super::pipelines::transform_pipeline;
use super::raw::{RawMergeRequest, RawNote};
use super::types::{Comment, MergeRequest, ProjectRef};
use crate::storage::LastSeenTimes;

/// Enriches raw merge requests into UI-ready values.
///
/// Output order matches input order and no merge request is dropped. Missing
/// nested data (author, pipeline, approvals) only blanks the matching field.
///
/// # Arguments
///
/// * `raw` - Merge request nodes as returned by GitLab
/// * `my_username` - Operator username, read once for the whole batch
/// * `last_seen` - Last-seen timestamps keyed by merge request GID
/// * `links` - Instance and Jira base URLs
pub fn transform_merge_requests(
    raw: Vec<RawMergeRequest>,
    my_username: Option<&str>,
    last_seen: &LastSeenTimes,
    links: &Links,
) -> Vec<MergeRequest> {
    raw.into_iter()
        .map(|mr| transform_merge_request(mr, my_username, last_seen, links))
        .collect()
}

fn transform_merge_request(
    mr: RawMergeRequest,
    my_username: Option<&str>,
    last_seen: &LastSeenTimes,
    links: &Links,
) -> MergeRequest {
    let comments: Vec<Comment> = mr
        .notes
        .unwrap_or_default()
        .into_nodes()
        .into_iter()
        .filter(|note| !note.system)
        .map(|note| transform_comment(note, my_username))
        .collect();

    let unresolved_comments_count = comments.iter().filter(|c| c.is_unresolved).count();

    let approved_by = mr
        .approved_by
        .unwrap_or_default()
        .into_nodes()
        .into_iter()
        .map(|account| resolve_identity(account, my_username))
        .collect();

    let has_updates = has_updates(last_seen.get(&mr.id), mr.updated_at);

    MergeRequest {
        jira: extract_jira_reference(&mr.title, links.jira()),
        has_conflicts: mr.conflicts,
        has_all_approvals: mr.approvals_left == Some(0),
        approved_by,
        author: mr.author.map(|a| resolve_identity(a, my_username)),
        merged_by: mr.merge_user.map(|a| resolve_identity(a, my_username)),
        head_pipeline: mr.head_pipeline.map(|p| transform_pipeline(p, links)),
        comments,
        unresolved_comments_count,
        has_updates,
        id: mr.id,
        iid: mr.iid,
        project: ProjectRef {
            full_path: mr.project.full_path,
        },
        title: mr.title,
        state: mr.state,
        draft: mr.draft,
        created_at: mr.created_at,
        updated_at: mr.updated_at,
        source_branch: mr.source_branch,
        diff_head_sha: mr.diff_head_sha,
        squash_on_merge: mr.squash_on_merge,
        web_url: mr.web_url,
    }
}

fn transform_comment(note: RawNote, my_username: Option<&str>) -> Comment {
    Comment {
        is_unresolved: note.resolvable && !note.resolved,
        author: note.author.map(|a| resolve_identity(a, my_username)),
        id: note.id,
        resolvable: note.resolvable,
        resolved: note.resolved,
    }
}

/// Seen strictly before `updated_at`, compared at whole-second precision.
/// A merge request that was never seen is not "updated".
fn has_updates(last_seen: Option<&DateTime<Utc>>, updated_at: DateTime<Utc>) -> bool {
    last_seen.is_some_and(|seen| seen.timestamp() < updated_at.timestamp())
}
