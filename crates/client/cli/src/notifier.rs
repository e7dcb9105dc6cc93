use arena_core::ChannelId;
use arena_runtime::{DeliveryError, Notifier};
use async_trait::async_trait;

/// Prints every notice. All local players share the terminal, so the
/// channel is ignored.
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn deliver(&self, _channel: ChannelId, text: &str) -> Result<(), DeliveryError> {
        println!("{text}\n");
        Ok(())
    }
}
