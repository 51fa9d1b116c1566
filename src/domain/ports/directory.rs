use crate::domain::ports::errors::DirectoryError;
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

/// External user/role directory collaborator.
///
/// Actor resolution and administrator checks go through this port; the
/// engine never owns user data. The shipped implementation is the
/// config-backed `StaticDirectory`.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All current holders of a role. An unknown role is an empty set
    async fn users_with_role(&self, role: &str) -> Result<HashSet<Uuid>, DirectoryError>;

    /// The user standing in `relation` to the given subject, if bound
    async fn related_user(
        &self,
        subject_ref: &str,
        relation: &str,
    ) -> Result<Option<Uuid>, DirectoryError>;

    /// The administrator set (cancel override, template management,
    /// stalled-stage alerts)
    async fn administrators(&self) -> Result<HashSet<Uuid>, DirectoryError>;

    /// Whether the user is an administrator
    async fn is_administrator(&self, user_id: Uuid) -> Result<bool, DirectoryError> {
        Ok(self.administrators().await?.contains(&user_id))
    }
}
