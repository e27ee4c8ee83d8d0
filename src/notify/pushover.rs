use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use tracing::{debug, info};

use super::{check_status, http_client, Notification, Notifier, Priority};
use crate::config::Pushover;

const PUSHOVER_MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Clone)]
pub struct PushoverNotifier {
    http: Client,
    endpoint: Url,
    token: String,
    user: String,
}

impl fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushoverNotifier")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PushoverNotifier {
    pub fn new(token: String, user: String) -> Result<Self> {
        let endpoint = Url::parse(PUSHOVER_MESSAGES_URL).context("invalid Pushover URL")?;
        Self::with_endpoint(token, user, endpoint)
    }

    pub fn with_endpoint(token: String, user: String, endpoint: Url) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            endpoint,
            token,
            user,
        })
    }

    pub fn from_config(cfg: &Pushover) -> Result<Self> {
        Self::new(cfg.token.clone(), cfg.user.clone())
    }

    pub fn build_request(&self, notification: &Notification) -> Result<reqwest::Request> {
        let priority = pushover_priority(notification.priority).to_string();
        let form = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", notification.title.as_str()),
            ("message", notification.body.as_str()),
            ("priority", priority.as_str()),
        ];
        self.http
            .post(self.endpoint.clone())
            .form(&form)
            .build()
            .context("failed to build Pushover request")
    }
}

/// Emergency priority (2) needs `retry`/`expire` acknowledgement settings, so
/// `urgent` is capped at high.
fn pushover_priority(priority: Priority) -> i8 {
    match priority {
        Priority::Min => -2,
        Priority::Low => -1,
        Priority::Default => 0,
        Priority::High | Priority::Urgent => 1,
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let request = self.build_request(notification)?;
        debug!(url=%request.url(), "sending pushover notification");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach Pushover")?;
        check_status("pushover", res).await?;
        info!("pushover notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_encodes_form() {
        let n = PushoverNotifier::new("app-token".into(), "user-key".into()).unwrap();
        let request = n
            .build_request(&Notification {
                title: "Fridge Alert".into(),
                priority: Priority::Low,
                body: "Fridge is empty! No leftovers today.".into(),
            })
            .unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), PUSHOVER_MESSAGES_URL);
        assert_eq!(
            request
                .headers()
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = std::str::from_utf8(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert!(body.contains("token=app-token"));
        assert!(body.contains("user=user-key"));
        assert!(body.contains("title=Fridge+Alert"));
        assert!(body.contains("priority=-1"));
        assert!(body.contains("message=Fridge+is+empty%21+No+leftovers+today."));
    }

    #[test]
    fn urgent_is_capped() {
        assert_eq!(pushover_priority(Priority::Urgent), 1);
        assert_eq!(pushover_priority(Priority::Min), -2);
        assert_eq!(pushover_priority(Priority::Default), 0);
    }
}
