use crate::domain::models::Notification;
use crate::domain::ports::errors::ChannelError;
use async_trait::async_trait;

/// A delivery channel notifications fan out to (in-app inbox, log, or an
/// external transport supplied by the embedding application).
///
/// Delivery is best-effort: the dispatcher logs failures and the engine
/// never sees them.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel name for log output
    fn name(&self) -> &'static str;

    /// Deliver one notification
    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError>;
}
