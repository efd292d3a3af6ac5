/// Base URLs used to turn instance-relative paths into clickable links.
///
/// Built once from configuration and passed into every transform, so no
/// transformer reads configuration on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    instance: String,
    jira: Option<String>,
}

impl Links {
    /// # Arguments
    ///
    /// * `instance` - GitLab instance base URL (e.g., <https://gitlab.com>)
    /// * `jira` - Optional Jira instance base URL; empty strings count as unset
    pub fn new(instance: &str, jira: Option<&str>) -> Self {
        Self {
            instance: instance.trim_end_matches('/').to_string(),
            jira: jira
                .map(|j| j.trim().trim_end_matches('/'))
                .filter(|j| !j.is_empty())
                .map(ToString::to_string),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn jira(&self) -> Option<&str> {
        self.jira.as_deref()
    }

    /// Converts an instance-relative web path (e.g., `/group/project/-/pipelines/12`)
    /// into an absolute URL.
    ///
    /// Returns `None` when the path is absent, never an empty or half-built URL.
    pub fn path_to_url(&self, path: Option<&str>) -> Option<String> {
        path.map(|p| format!("{}{p}", self.instance))
    }
}
