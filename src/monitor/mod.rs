use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::monitor::audit::AuditLog;

pub mod audit;

/// One-way alert delivery. No response is consumed; a failed delivery is
/// logged and dropped.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, guid: Uuid) -> Result<()>;
}

/// Posts security alerts as JSON to a configured webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("creating HTTP client")?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, guid: Uuid) -> Result<()> {
        let payload = json!({
            "event": "origin_mismatch",
            "guid": guid,
            "at": Utc::now().to_rfc3339(),
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("sending security alert")?;
        if !response.status().is_success() {
            bail!("alert webhook returned status {}", response.status());
        }
        Ok(())
    }
}

/// Detects refresh attempts arriving from a different address than the one
/// recorded at mint time.
///
/// The check is advisory: it reports the mismatch to the caller and fires
/// the notifier, but whether the refresh proceeds is the rotation
/// protocol's policy decision. Delivery is dispatch-and-forget — the
/// request path never waits on the alert channel, and a channel failure
/// costs an alert, not availability.
#[derive(Clone)]
pub struct SecurityMonitor {
    notifier: Option<Arc<dyn AlertNotifier>>,
    audit: AuditLog,
}

impl SecurityMonitor {
    pub fn new(notifier: Option<Arc<dyn AlertNotifier>>) -> Self {
        Self {
            notifier,
            audit: AuditLog::new(),
        }
    }

    /// Compare the minted origin against the current one. Returns whether
    /// they differ; on mismatch, dispatches one notification for the guid.
    pub fn origin_changed(&self, minted_ip: &str, current_ip: &str, guid: Uuid) -> bool {
        if minted_ip == current_ip {
            return false;
        }
        self.audit.origin_mismatch(guid, minted_ip, current_ip);
        if let Some(notifier) = &self.notifier {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                if let Err(err) = notifier.notify(guid).await {
                    warn!(error = %err, %guid, "security alert delivery failed");
                }
            });
        }
        true
    }
}
