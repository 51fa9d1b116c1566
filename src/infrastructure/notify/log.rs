use crate::domain::models::Notification;
use crate::domain::ports::errors::ChannelError;
use crate::domain::ports::notifier::NotificationChannel;
use async_trait::async_trait;
use tracing::info;

/// Channel that writes notifications to the structured log.
///
/// Useful headless: operators tail the log instead of an inbox.
#[derive(Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError> {
        info!(
            recipient_id = %notification.recipient_id,
            instance_id = %notification.instance_id,
            kind = %notification.kind,
            message = %notification.message,
            "workflow notification"
        );
        Ok(())
    }
}
