use super::raw::RawProject;
use super::types::Project;

/// `defaultBranch` comes from the nested `repository.rootRef`; projects without
/// a repository (or an empty one) have no default branch.
pub fn transform_projects(raw: Vec<RawProject>) -> Vec<Project> {
    raw.into_iter()
        .map(|project| Project {
            default_branch: project.repository.and_then(|r| r.root_ref),
            id: project.id,
            name: project.name,
            full_path: project.full_path,
        })
        .collect()
}
