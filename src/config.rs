use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::Token;

/// Configuration file structure for glmr.
///
/// Holds the instance to talk to, the optional Jira base URL, display
/// preferences and the projects `glmr mrs` lists when none are given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub jira: JiraConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// GitLab instance base URL
    #[serde(default = "default_gitlab_instance")]
    pub instance: String,

    /// GitLab personal access token
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JiraConfig {
    /// Jira base URL; issue keys in titles link to `<instance>/browse/<KEY>`
    pub instance: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayConfig {
    #[serde(default)]
    pub colorized_dates: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Project full paths (e.g., 'group/project')
    #[serde(default)]
    pub projects: Vec<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            instance: default_gitlab_instance(),
            token: None,
        }
    }
}

fn default_gitlab_instance() -> String {
    "https://gitlab.com".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./glmr.toml, ./glmr.json, ./glmr.yaml, ./glmr.yml
    /// 3. `<config_dir>/glmr/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = ["glmr.toml", "glmr.json", "glmr.yaml", "glmr.yml"]
            .iter()
            .map(PathBuf::from)
            .collect();

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("glmr").join("config.toml"));
        }

        candidates
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instance: Option<String>,
    pub token: Option<String>,
    pub jira_instance: Option<String>,
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub instance: String,
    pub token: Option<Token>,
    pub jira_instance: Option<String>,
    pub colorized_dates: bool,
}

impl Settings {
    pub fn resolve(config: &Config, overrides: Overrides) -> Self {
        let instance = non_empty(overrides.instance)
            .unwrap_or_else(|| config.gitlab.instance.clone());

        let token = non_empty(overrides.token)
            .or_else(|| non_empty(config.gitlab.token.clone()))
            .map(Token::from);

        // An empty Jira URL means "no Jira", not "link to /browse/KEY".
        let jira_instance = non_empty(overrides.jira_instance)
            .or_else(|| non_empty(config.jira.instance.clone()))
            .map(|url| url.trim_end_matches('/').to_string());

        Self {
            instance,
            token,
            jira_instance,
            colorized_dates: config.display.colorized_dates,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
