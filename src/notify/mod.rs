use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Backend, Notify};

pub mod ntfy;
pub mod pushover;

pub use ntfy::NtfyNotifier;
pub use pushover::PushoverNotifier;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub priority: Priority,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Build the notifier selected by `notify.backend`.
pub fn from_config(cfg: &Notify) -> Result<Box<dyn Notifier>> {
    let notifier: Box<dyn Notifier> = match cfg.backend {
        Backend::Ntfy => Box::new(NtfyNotifier::from_config(&cfg.ntfy)?),
        Backend::Pushover => Box::new(PushoverNotifier::from_config(&cfg.pushover)?),
    };
    Ok(notifier)
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("fridge-watch/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Turn a non-success response into an error carrying status and body.
async fn check_status(service: &str, res: reqwest::Response) -> Result<()> {
    if res.status().is_success() {
        return Ok(());
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(anyhow::anyhow!("{} error {}: {}", service, status, body))
}
