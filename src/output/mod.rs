mod accessories;
mod progress;
mod styling;
mod tables;

pub use progress::FetchProgress;
use styling::{brand, muted};
pub use tables::{merge_requests_table, pipeline_table, projects_table};

/// Prints the `glmr` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        brand("glmr"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("GitLab merge requests from the terminal")
    );
}
