//! The daily fridge check: query, render, notify.

use anyhow::{anyhow, Result};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::notify::{Notification, Notifier, Priority};
use crate::notion::NotionService;
use crate::report;

pub const ERROR_PREFIX: &str = "Error checking fridge";
pub const ERROR_TITLE_SUFFIX: &str = " (error)";

/// Result of collecting the report, kept apart from the transport step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Report(String),
    Failure(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn notification(&self, title: &str, priority: Priority) -> Notification {
        match self {
            Outcome::Report(body) => Notification {
                title: title.to_string(),
                priority,
                body: body.clone(),
            },
            Outcome::Failure(reason) => Notification {
                title: format!("{title}{ERROR_TITLE_SUFFIX}"),
                priority,
                body: format!("{ERROR_PREFIX}: {reason}"),
            },
        }
    }
}

/// Query the unarchived items and render them. Upstream errors become
/// [`Outcome::Failure`].
#[instrument(skip(notion))]
pub async fn collect(notion: &dyn NotionService, database_id: &str) -> Outcome {
    let pages = match notion.query_unarchived(database_id).await {
        Ok(pages) => pages,
        Err(err) => {
            error!(?err, "failed to query leftovers");
            return Outcome::Failure(format!("{err:#}"));
        }
    };
    let items: Vec<Value> = pages
        .into_iter()
        .map(|page| Value::Object(page.properties))
        .collect();
    match report::build_report(&items) {
        Ok(text) => {
            info!(items = items.len(), "rendered fridge report");
            Outcome::Report(text)
        }
        Err(err) => Outcome::Failure(err.to_string()),
    }
}

/// Run one check end to end and return what was sent.
///
/// With `app.notify_on_error` unset a failed query aborts the run before
/// anything is sent. A failed send always aborts.
pub async fn run(
    cfg: &Config,
    notion: &dyn NotionService,
    notifier: &dyn Notifier,
) -> Result<Outcome> {
    let outcome = collect(notion, &cfg.notion.database_id).await;
    if let Outcome::Failure(reason) = &outcome {
        if !cfg.app.notify_on_error {
            return Err(anyhow!("{ERROR_PREFIX}: {reason}"));
        }
    }
    let notification = outcome.notification(&cfg.notify.title, cfg.notify.priority);
    notifier.send(&notification).await?;
    info!(failure = outcome.is_failure(), "fridge check delivered");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_notification_uses_body_verbatim() {
        let n = Outcome::Report("Fridge Update:\n- Pasta: 2 days".into())
            .notification("Fridge Alert", Priority::High);
        assert_eq!(n.title, "Fridge Alert");
        assert_eq!(n.priority, Priority::High);
        assert_eq!(n.body, "Fridge Update:\n- Pasta: 2 days");
    }

    #[test]
    fn failure_notification_is_marked() {
        let n = Outcome::Failure("notion error 401".into()).notification("Fridge Alert", Priority::Default);
        assert_eq!(n.title, "Fridge Alert (error)");
        assert_eq!(n.body, "Error checking fridge: notion error 401");
    }
}
