mod client;
mod identity;
mod jira;
mod links;
mod merge_requests;
mod pipelines;
mod projects;
mod provider;
mod raw;
pub mod types;

pub use provider::{GitLabProvider, MergeRequestFilter};
