use clap::Parser;
use colored::Colorize;
use log::debug;
use thiserror::Error;

use recipe_admin::commands::{self, Cli};
use recipe_admin::config::AdminConfig;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Could not load {0}: {1}")]
    EnvFile(String, dotenv::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[tokio::main]
async fn main() {
    colored::control::set_override(true);

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "❌".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.env_file {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| AppError::EnvFile(path.display().to_string(), e))?;
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
    env_logger::init();

    let config = AdminConfig::from_env().map_err(AppError::Config)?;
    debug!("Admin data in {}, site in {}", config.admin_dir.display(), config.site_root.display());

    commands::run(cli.command, config).await
}
