//! Notification collaborator.
//!
//! The engine resolves every notice to a deduplicated list of channels; this
//! module hands them to the chat transport. Delivery happens after state is
//! committed and is best-effort: a failed channel is logged and skipped.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use arena_core::{ChannelId, Notice};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{0} is unreachable")]
    Unreachable(ChannelId),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, channel: ChannelId, text: &str) -> Result<(), DeliveryError>;
}

/// Delivers every notice to each of its channels.
///
/// Returns the number of failed deliveries.
pub async fn dispatch(notifier: &dyn Notifier, notices: &[Notice]) -> usize {
    let mut failed = 0;
    for notice in notices {
        for &channel in &notice.channels {
            if let Err(err) = notifier.deliver(channel, &notice.text).await {
                tracing::warn!("Failed to deliver notice to {}: {}", channel, err);
                failed += 1;
            }
        }
    }
    failed
}

/// Drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn deliver(&self, _channel: ChannelId, _text: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Keeps every delivered message in memory. Channels marked with
/// [`RecordingNotifier::fail_on`] reject deliveries.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(ChannelId, String)>>,
    unreachable: Mutex<HashSet<ChannelId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, channel: ChannelId) {
        self.unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel);
    }

    /// Every delivery so far, in order.
    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn texts_for(&self, channel: ChannelId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == channel)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, channel: ChannelId, text: &str) -> Result<(), DeliveryError> {
        if self
            .unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&channel)
        {
            return Err(DeliveryError::Unreachable(channel));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel, text.to_string()));
        Ok(())
    }
}
