//! Notification fan-out.
//!
//! The engine commits a transition first and hands notifications here
//! afterwards. Delivery is fire-and-forget: every registered channel gets
//! every notification, failures are logged per channel, and nothing
//! propagates back to the caller. A transition therefore never fails or
//! rolls back because a channel was down.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{Notification, NotificationKind, WorkflowInstance};
use crate::domain::ports::notifier::NotificationChannel;

/// How `dispatch` runs deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Spawn delivery onto the runtime and return immediately (production)
    Detached,
    /// Await delivery before returning (deterministic tests)
    Inline,
}

/// Fans notifications out to the configured channels.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
    mode: DispatchMode,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            channels,
            mode: DispatchMode::Detached,
        }
    }

    /// Override the dispatch mode.
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Notify every resolved actor that an instance waits at their stage.
    pub async fn notify_action_required(
        &self,
        instance: &WorkflowInstance,
        stage_name: &str,
        recipients: &HashSet<Uuid>,
    ) {
        let message = format!(
            "{} requires your action at stage '{}'",
            instance.subject_ref, stage_name
        );
        let batch = recipients
            .iter()
            .map(|recipient| {
                Notification::new(*recipient, instance.id, NotificationKind::ActionRequired, &message)
            })
            .collect();
        self.dispatch(batch).await;
    }

    /// Tell the initiator their instance reached a terminal status.
    pub async fn notify_terminal(&self, instance: &WorkflowInstance) {
        let notification = Notification::new(
            instance.initiator_id,
            instance.id,
            NotificationKind::TerminalResolution,
            format!("{} was {}", instance.subject_ref, instance.status),
        );
        self.dispatch(vec![notification]).await;
    }

    /// Alert administrators that a stage resolved to no eligible actors.
    pub async fn notify_stalled(
        &self,
        instance: &WorkflowInstance,
        stage_name: &str,
        rule: &str,
        administrators: &HashSet<Uuid>,
    ) {
        let message = format!(
            "{} is stalled: stage '{}' ({}) resolves to no eligible actors",
            instance.subject_ref, stage_name, rule
        );
        let batch = administrators
            .iter()
            .map(|admin| {
                Notification::new(*admin, instance.id, NotificationKind::StalledStage, &message)
            })
            .collect();
        self.dispatch(batch).await;
    }

    /// Send a prepared batch through every channel.
    pub async fn dispatch(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() || self.channels.is_empty() {
            return;
        }

        match self.mode {
            DispatchMode::Detached => {
                let channels = self.channels.clone();
                tokio::spawn(async move {
                    Self::deliver_all(&channels, &notifications).await;
                });
            }
            DispatchMode::Inline => {
                Self::deliver_all(&self.channels, &notifications).await;
            }
        }
    }

    async fn deliver_all(channels: &[Arc<dyn NotificationChannel>], notifications: &[Notification]) {
        for notification in notifications {
            let deliveries = channels.iter().map(|channel| {
                let channel = channel.clone();
                async move { (channel.name(), channel.deliver(notification).await) }
            });

            for (channel_name, result) in join_all(deliveries).await {
                match result {
                    Ok(()) => debug!(
                        channel = channel_name,
                        recipient_id = %notification.recipient_id,
                        kind = %notification.kind,
                        "notification delivered"
                    ),
                    Err(e) => warn!(
                        channel = channel_name,
                        recipient_id = %notification.recipient_id,
                        kind = %notification.kind,
                        error = %e,
                        "notification delivery failed"
                    ),
                }
            }
        }
    }
}
