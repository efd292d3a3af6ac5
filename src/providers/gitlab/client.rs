//! GraphQL operations against GitLab.
//!
//! Each submodule owns the documents and response envelopes for one entity and
//! returns raw nodes; enrichment happens in the provider.

macro_rules! user_fragment {
    () => {
        r#"
fragment User on UserCore {
    name
    username
}
"#
    };
}

macro_rules! pipeline_fragment {
    () => {
        r#"
fragment Job on CiJob {
    stage {
        name
    }
    name
    webPath
}

fragment Pipeline on Pipeline {
    ref
    status
    path
    updatedAt
    failureReason
    commit {
        fullTitle
    }
    runningJobs: jobs(statuses: [RUNNING]) {
        nodes {
            ...Job
        }
    }
    failedJobs: jobs(statuses: [FAILED]) {
        nodes {
            ...Job
        }
    }
}
"#
    };
}

pub mod merge_requests;
pub mod pipelines;
pub mod projects;
mod transport;
pub mod users;

pub use transport::GitLabClient;
