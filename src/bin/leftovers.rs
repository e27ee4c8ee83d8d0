use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fridge_watch::config::{self, Scope};
use fridge_watch::leftovers::{self, NewLeftover, Photo, Verdict};
use fridge_watch::notion::NotionClient;
use fridge_watch::report;

#[derive(Debug, Parser)]
#[command(author, version, about = "Manage the fridge leftovers database")]
struct Args {
    /// Path to YAML config file (defaults to ./config.yaml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Put a new leftover in the fridge
    Add {
        /// What food is it?
        food: String,
        /// Expiration date (YYYY-MM-DD); defaults to three days from today
        #[arg(long)]
        expires: Option<NaiveDate>,
        #[arg(long, default_value = "Top shelf")]
        location: String,
        /// Who added it
        #[arg(long, default_value = "You")]
        added_by: String,
        /// Estimated meal cost in dollars
        #[arg(long, default_value_t = 5.0)]
        cost: f64,
        #[arg(long, default_value = "")]
        notes: String,
        /// Local image to upload to Notion
        #[arg(long, conflicts_with = "photo_url")]
        photo: Option<PathBuf>,
        /// URL of an already hosted image
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// Show the current inventory
    List,
    /// Mark a leftover as eaten and archive it
    Eaten { page_id: String },
    /// Mark a leftover as tossed and archive it
    Tossed { page_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref(), Scope::NotionOnly)
        .context("configuration is incomplete")?;
    let client = NotionClient::from_config(&cfg);
    let database_id = cfg.notion.database_id.as_str();

    match args.command {
        Command::Add {
            food,
            expires,
            location,
            added_by,
            cost,
            notes,
            photo,
            photo_url,
        } => {
            let today = Local::now().date_naive();
            let mut item = NewLeftover {
                food,
                expires: expires.unwrap_or(today + Duration::days(3)),
                location,
                added_by,
                meal_cost: cost,
                notes,
                photo: photo_url.map(Photo::External),
            };
            // Fail on bad input before spending an upload.
            item.validate(today)?;
            if let Some(path) = photo {
                let upload_id = client.upload_file(&path).await?;
                item.photo = Some(Photo::Uploaded(upload_id));
            }
            let page_id = leftovers::add(&client, database_id, &item, today).await?;
            println!("Added to the fridge! ({})", page_id);
        }
        Command::List => {
            let entries = leftovers::inventory(&client, database_id).await?;
            if entries.is_empty() {
                println!("{}", report::EMPTY_MESSAGE);
            }
            for entry in entries {
                println!("{}\n", entry);
            }
        }
        Command::Eaten { page_id } => {
            leftovers::settle(&client, &page_id, Verdict::Eaten).await?;
            println!("{} -> {}", page_id, Verdict::Eaten);
        }
        Command::Tossed { page_id } => {
            leftovers::settle(&client, &page_id, Verdict::Tossed).await?;
            println!("{} -> {}", page_id, Verdict::Tossed);
        }
    }
    Ok(())
}
