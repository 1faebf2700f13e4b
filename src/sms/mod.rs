//! Message delivery.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// Trait for SMS delivery backends.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver `message` to `phone_number`.
    async fn send(&self, phone_number: &str, message: &str) -> Result<()>;
}

/// Simulated delivery that records the message in the log and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSmsSender;

#[async_trait]
impl SmsSender for LoggingSmsSender {
    async fn send(&self, phone_number: &str, message: &str) -> Result<()> {
        info!(
            phone_number = %phone_number,
            length = message.chars().count(),
            "Sending SMS"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sender_succeeds() {
        let sender = LoggingSmsSender;
        assert!(sender.send("+1234567890", "Hello").await.is_ok());
    }
}
