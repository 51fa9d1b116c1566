use crate::domain::models::{Notification, NotificationKind};
use crate::domain::ports::errors::{ChannelError, StoreError};
use crate::domain::ports::notifier::NotificationChannel;
use crate::infrastructure::database::utils::parse_datetime;
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Delivery channel backed by the `notifications` table.
///
/// Besides the `NotificationChannel` impl it carries the read side: the
/// inbox query the CLI renders and the mark-read flip.
pub struct InAppChannel {
    pool: SqlitePool,
}

impl InAppChannel {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Helper to convert a database row to a notification
    fn row_to_notification(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Notification, StoreError> {
        use sqlx::Row;

        let kind_raw = row.get::<String, _>("kind");
        let kind = NotificationKind::from_str(&kind_raw)
            .ok_or_else(|| StoreError::InvalidField(format!("unknown notification kind '{kind_raw}'")))?;

        Ok(Notification {
            id: Uuid::parse_str(row.get::<String, _>("id").as_str())?,
            recipient_id: Uuid::parse_str(row.get::<String, _>("recipient_id").as_str())?,
            instance_id: Uuid::parse_str(row.get::<String, _>("instance_id").as_str())?,
            kind,
            message: row.get("message"),
            read: row.get::<i64, _>("read") != 0,
            created_at: parse_datetime(row.get::<String, _>("created_at").as_str())?,
        })
    }

    /// Notifications for one recipient, oldest first. Unread only unless
    /// `include_read` is set.
    pub async fn inbox(
        &self,
        recipient_id: Uuid,
        include_read: bool,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut query = String::from("SELECT * FROM notifications WHERE recipient_id = ?");
        if !include_read {
            query.push_str(" AND read = 0");
        }
        query.push_str(" ORDER BY created_at ASC");

        let rows = sqlx::query(&query)
            .bind(recipient_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(|row| self.row_to_notification(row)).collect()
    }

    /// Flip one notification to read.
    pub async fn mark_read(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Flip everything in one recipient's inbox to read. Returns how many
    /// rows changed.
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE recipient_id = ? AND read = 0")
            .bind(recipient_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationChannel for InAppChannel {
    fn name(&self) -> &'static str {
        "in_app"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), ChannelError> {
        sqlx::query(
            r"
            INSERT INTO notifications (
                id, recipient_id, instance_id, kind, message, read, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(notification.id.to_string())
        .bind(notification.recipient_id.to_string())
        .bind(notification.instance_id.to_string())
        .bind(notification.kind.as_str())
        .bind(&notification.message)
        .bind(notification.read as i64)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }
}
