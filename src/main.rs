use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use fridge_watch::check::{self, Outcome};
use fridge_watch::config::{self, Scope};
use fridge_watch::notify;
use fridge_watch::notion::NotionClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Query the leftovers database and push a fridge summary"
)]
struct Args {
    /// Path to YAML config file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the message instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref(), Scope::Full)
        .context("configuration is incomplete")?;

    let notion_client = NotionClient::from_config(&cfg);

    if args.dry_run {
        let outcome = check::collect(&notion_client, &cfg.notion.database_id).await;
        let notification = outcome.notification(&cfg.notify.title, cfg.notify.priority);
        println!("{}\n\n{}", notification.title, notification.body);
        if let Outcome::Failure(reason) = outcome {
            anyhow::bail!("{}: {}", check::ERROR_PREFIX, reason);
        }
        return Ok(());
    }

    let notifier = notify::from_config(&cfg.notify)?;
    info!(backend = ?cfg.notify.backend, "starting fridge check");
    check::run(&cfg, &notion_client, notifier.as_ref()).await?;
    Ok(())
}
