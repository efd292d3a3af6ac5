use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use log::{debug, info};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, Overrides, Settings};
use crate::output::{merge_requests_table, pipeline_table, projects_table, FetchProgress};
use crate::providers::gitlab::types::MergeRequest;
use crate::providers::gitlab::{GitLabProvider, MergeRequestFilter};
use crate::storage::{FileStateStore, MemoryStateStore, StateStore};

#[derive(Parser)]
#[command(name = "glmr")]
#[command(author, version, about = "GitLab merge requests from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./glmr.toml or the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Pretty-print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// GitLab instance URL
    #[arg(long, global = true, env = "GITLAB_URL")]
    url: Option<String>,

    #[arg(short, long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Jira base URL for issue keys in titles
    #[arg(long, global = true, env = "JIRA_URL")]
    jira_url: Option<String>,

    /// Keep username and last-seen state in memory for this run only
    #[arg(long, global = true, default_value_t = false)]
    no_state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects you are a member of
    Projects,

    /// List merge requests
    Mrs {
        /// Project full path; repeat for several (defaults to `defaults.projects`)
        #[arg(short = 'P', long = "project")]
        projects: Vec<String>,

        /// Merge requests merged since midnight UTC instead of open ones
        #[arg(long, default_value_t = false)]
        merged_today: bool,

        /// Remember the listed merge requests as seen
        #[arg(long, default_value_t = false)]
        mark_seen: bool,
    },

    /// Show the latest pipeline of a branch
    Pipeline {
        #[arg(short = 'P', long)]
        project: String,

        #[arg(short, long)]
        branch: String,
    },

    /// Merge an open merge request
    Merge(MergeRequestArgs),

    /// Mark an open merge request as draft
    Draft(MergeRequestArgs),

    /// Mark an open merge request as ready
    Ready(MergeRequestArgs),

    /// Remember the token's owner as "me"
    Login,
}

#[derive(clap::Args)]
struct MergeRequestArgs {
    #[arg(short = 'P', long)]
    project: String,

    /// Project-scoped merge request number
    #[arg(short, long)]
    iid: String,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let settings = Settings::resolve(
            &config,
            Overrides {
                instance: self.url.clone(),
                token: self.token.clone(),
                jira_instance: self.jira_url.clone(),
            },
        );
        let provider = self.provider(&settings)?;

        match &self.command {
            Commands::Projects => {
                let projects = with_progress("Fetching projects", provider.list_projects()).await?;
                self.emit(&projects, || projects_table(&projects))
            }
            Commands::Mrs {
                projects,
                merged_today,
                mark_seen,
            } => {
                let projects = if projects.is_empty() {
                    &config.defaults.projects
                } else {
                    projects
                };
                if projects.is_empty() {
                    bail!("No projects given; pass --project or set `projects` under [defaults]");
                }

                let mrs = with_progress(
                    "Fetching merge requests",
                    list_merge_requests(&provider, projects, *merged_today),
                )
                .await?;

                self.emit(&mrs, || {
                    merge_requests_table(&mrs, settings.colorized_dates, Utc::now())
                })?;

                if *mark_seen {
                    provider.mark_seen(&mrs).await?;
                    info!("Marked {} merge requests as seen", mrs.len());
                }
                Ok(())
            }
            Commands::Pipeline { project, branch } => {
                let pipeline = with_progress(
                    "Fetching pipeline",
                    provider.latest_pipeline_for_branch(project, branch),
                )
                .await?;

                match (&pipeline, self.format) {
                    (None, Format::Table) => {
                        self.write_output(format!("No pipeline found for {project}@{branch}"))
                    }
                    (Some(found), _) => self.emit(&pipeline, || pipeline_table(found)),
                    (None, Format::Json) => self.emit(&pipeline, Table::new),
                }
            }
            Commands::Merge(args) => {
                let mr = find_open_merge_request(&provider, args).await?;
                provider.merge(&mr).await?;
                self.write_output(format!("Merged {} !{}", mr.project.full_path, mr.iid))
            }
            Commands::Draft(args) => {
                let mr = find_open_merge_request(&provider, args).await?;
                provider.mark_as_draft(&mr).await?;
                self.write_output(format!("Marked {} !{} as draft", mr.project.full_path, mr.iid))
            }
            Commands::Ready(args) => {
                let mr = find_open_merge_request(&provider, args).await?;
                provider.mark_as_ready(&mr).await?;
                self.write_output(format!("Marked {} !{} as ready", mr.project.full_path, mr.iid))
            }
            Commands::Login => match provider.login().await? {
                Some(username) => self.write_output(format!(
                    "Logged in to {} as {username}",
                    provider.links().instance()
                )),
                None => bail!("GitLab did not report a current user for this token"),
            },
        }
    }

    fn provider(&self, settings: &Settings) -> Result<GitLabProvider> {
        let store: Arc<dyn StateStore> = if self.no_state {
            Arc::new(MemoryStateStore::default())
        } else {
            let store = FileStateStore::open_default()?;
            debug!("State file: {}", store.path().display());
            Arc::new(store)
        };

        GitLabProvider::new(
            &settings.instance,
            settings.token.clone(),
            settings.jira_instance.as_deref(),
            store,
        )
        .with_context(|| format!("Failed to set up client for {}", settings.instance))
    }

    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce() -> Table) -> Result<()> {
        let rendered = match self.format {
            Format::Table => table().to_string(),
            Format::Json if self.pretty => serde_json::to_string_pretty(value)?,
            Format::Json => serde_json::to_string(value)?,
        };
        self.write_output(rendered)
    }

    fn write_output(&self, content: String) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, content)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{content}");
        }
        Ok(())
    }
}

async fn with_progress<T>(
    message: &str,
    fut: impl Future<Output = crate::error::Result<T>>,
) -> Result<T> {
    let progress = FetchProgress::start(message);
    match fut.await {
        Ok(value) => {
            progress.finish(message);
            Ok(value)
        }
        Err(e) => {
            progress.fail(message);
            Err(e.into())
        }
    }
}

async fn list_merge_requests(
    provider: &GitLabProvider,
    projects: &[String],
    merged_today: bool,
) -> crate::error::Result<Vec<MergeRequest>> {
    match (projects, merged_today) {
        ([project], true) => provider.list_merged_today(project).await,
        ([project], false) => provider.list_open_merge_requests(project).await,
        (_, true) => {
            provider
                .list_merge_requests_for_projects(projects, MergeRequestFilter::MergedToday)
                .await
        }
        (_, false) => {
            provider
                .list_merge_requests_for_projects(projects, MergeRequestFilter::Open)
                .await
        }
    }
}

/// Mutations need the head SHA and squash preference, so the merge request is
/// looked up in the open listing first.
async fn find_open_merge_request(
    provider: &GitLabProvider,
    args: &MergeRequestArgs,
) -> Result<MergeRequest> {
    let iid = args.iid.trim_start_matches('!');

    provider
        .list_open_merge_requests(&args.project)
        .await?
        .into_iter()
        .find(|mr| mr.iid == iid)
        .with_context(|| format!("No open merge request !{iid} in {}", args.project))
}
