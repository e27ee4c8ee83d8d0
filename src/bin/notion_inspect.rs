use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fridge_watch::config::{self, Scope};
use fridge_watch::notion::NotionClient;
use fridge_watch::schema;

#[derive(Parser, Debug)]
#[command(about = "Print the property schema of the leftovers database")]
struct Args {
    /// Path to YAML config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database ID to inspect (defaults to the configured one)
    #[arg(long)]
    db_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load(args.config.as_deref(), Scope::NotionOnly)?;
    let client = NotionClient::from_config(&cfg);
    let db_id = args.db_id.unwrap_or_else(|| cfg.notion.database_id.clone());

    let db = client.retrieve_database(&db_id).await?;
    println!("Database ID: {}", db.id);
    println!("Properties:");
    for (name, prop) in &db.properties {
        println!("  {} -> {{ id: {}, type: {} }}", name, prop.id, prop.typ);
    }

    let problems = schema::mismatches(&db);
    for problem in &problems {
        println!("! {}", problem);
    }
    if !problems.is_empty() {
        anyhow::bail!("{} schema problem(s) in database {}", problems.len(), db.id);
    }
    println!("Schema matches.");
    Ok(())
}
