//! In-process notifier for tests
//!
//! Records every send and can be scripted to fail specific channels,
//! which is how per-recipient failure isolation and retry get tested.

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
    failing: Mutex<HashSet<String>>,
    failing_times: Mutex<HashMap<String, usize>>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to this channel fail from now on
    pub fn fail_channel(&self, channel: impl Into<String>) {
        self.failing.lock().unwrap().insert(channel.into());
    }

    /// Make the next `times` sends to this channel fail, then recover
    pub fn fail_channel_times(&self, channel: impl Into<String>, times: usize) {
        self.failing_times
            .lock()
            .unwrap()
            .insert(channel.into(), times);
    }

    /// Channels that received a send, in completion order
    pub fn sent_channels(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// All recorded sends
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Delivery attempts per channel, failures included
    pub fn attempts_for(&self, channel: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(channel)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, channel: &str, notification: &Notification) -> Result<(), NotifyError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_insert(0) += 1;

        if self.failing.lock().unwrap().contains(channel) {
            return Err(NotifyError::Send(format!("channel {channel} unreachable")));
        }
        if let Some(remaining) = self.failing_times.lock().unwrap().get_mut(channel)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(NotifyError::Send(format!("channel {channel} flaked")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), notification.clone()));
        Ok(())
    }
}
