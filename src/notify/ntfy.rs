use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use tracing::{debug, info};

use super::{check_status, http_client, Notification, Notifier};
use crate::config::Ntfy;

/// Publishes to `{server}/{topic}` with the message as the request body.
#[derive(Clone)]
pub struct NtfyNotifier {
    http: Client,
    endpoint: Url,
}

impl fmt::Debug for NtfyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtfyNotifier")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// ntfy topics are 1 to 64 characters of `[-_A-Za-z0-9]`.
pub fn is_valid_topic(topic: &str) -> bool {
    (1..=64).contains(&topic.len())
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl NtfyNotifier {
    pub fn new(server: &str, topic: &str) -> Result<Self> {
        let topic = topic.trim();
        ensure!(is_valid_topic(topic), "invalid ntfy topic '{}'", topic);
        let mut server = server.trim().to_string();
        if !server.ends_with('/') {
            server.push('/');
        }
        let endpoint = Url::parse(&server)
            .and_then(|base| base.join(topic))
            .with_context(|| format!("invalid ntfy endpoint {}{}", server, topic))?;
        Ok(Self {
            http: http_client()?,
            endpoint,
        })
    }

    pub fn from_config(cfg: &Ntfy) -> Result<Self> {
        Self::new(&cfg.server, &cfg.topic)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, notification: &Notification) -> Result<reqwest::Request> {
        self.http
            .post(self.endpoint.clone())
            .header("Title", header_safe(&notification.title))
            .header("Priority", notification.priority.as_str())
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(notification.body.clone().into_bytes())
            .build()
            .context("failed to build ntfy request")
    }
}

/// HTTP header values must be visible ASCII; ntfy accepts RFC 2047 encoded
/// titles but a plain fallback keeps the request valid.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let request = self.build_request(notification)?;
        debug!(url=%request.url(), "sending ntfy notification");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach ntfy")?;
        check_status("ntfy", res).await?;
        info!(endpoint=%self.endpoint, "ntfy notification sent");
        Ok(())
    }
}
