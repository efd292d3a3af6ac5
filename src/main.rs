mod auth;
mod cli;
mod config;
mod error;
mod output;
mod providers;
mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use error::GlmrError;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting glmr");

    if let Err(e) = cli.execute().await {
        if e.downcast_ref::<GlmrError>().is_some_and(GlmrError::is_authorization) {
            eprintln!("Hint: check --token or GITLAB_TOKEN for this instance");
        }
        return Err(e);
    }

    Ok(())
}
