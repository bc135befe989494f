//! HTTP push-gateway notifier

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Notifier backed by an HTTP push gateway.
///
/// A hung gateway must never block a dispatch operation, so every send
/// carries its own request timeout.
pub struct HttpNotifier {
    client: reqwest::Client,
    gateway_url: String,
    timeout_ms: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
    channel: &'a str,
    title: &'a str,
    body: &'a str,
    data: &'a super::OrderPushData,
}

impl HttpNotifier {
    pub fn new(gateway_url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            gateway_url: gateway_url.into(),
            timeout_ms,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, channel: &str, notification: &Notification) -> Result<(), NotifyError> {
        let request = PushRequest {
            channel,
            title: &notification.title,
            body: &notification.body,
            data: &notification.data,
        };

        let response = self
            .client
            .post(&self.gateway_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(self.timeout_ms)
                } else {
                    NotifyError::Send(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::Send(format!(
                "gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
