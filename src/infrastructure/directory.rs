//! Config-backed implementation of the user directory port.

use crate::domain::models::{DirectoryConfig, RelationBinding};
use crate::domain::ports::directory::UserDirectory;
use crate::domain::ports::errors::DirectoryError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// In-memory directory built from `[directory]` config.
///
/// Lookups never fail; an unknown role or relation just resolves to nothing,
/// which the engine reports as a stalled stage.
pub struct StaticDirectory {
    roles: HashMap<String, HashSet<Uuid>>,
    relations: HashMap<(String, String), Uuid>,
    administrators: HashSet<Uuid>,
}

impl StaticDirectory {
    pub fn new(config: &DirectoryConfig) -> Self {
        let roles = config
            .roles
            .iter()
            .map(|(role, users)| (role.clone(), users.iter().copied().collect()))
            .collect();

        let relations = config
            .relations
            .iter()
            .map(|RelationBinding { subject_ref, relation, user_id }| {
                ((subject_ref.clone(), relation.clone()), *user_id)
            })
            .collect();

        Self {
            roles,
            relations,
            administrators: config.administrators.iter().copied().collect(),
        }
    }

    /// Empty directory; handy as a test starting point.
    pub fn empty() -> Self {
        Self::new(&DirectoryConfig::default())
    }

    /// Add holders to a role.
    pub fn with_role(mut self, role: impl Into<String>, users: impl IntoIterator<Item = Uuid>) -> Self {
        self.roles.entry(role.into()).or_default().extend(users);
        self
    }

    /// Bind a (subject, relation) pair to a user.
    pub fn with_relation(
        mut self,
        subject_ref: impl Into<String>,
        relation: impl Into<String>,
        user_id: Uuid,
    ) -> Self {
        self.relations
            .insert((subject_ref.into(), relation.into()), user_id);
        self
    }

    /// Add an administrator.
    pub fn with_administrator(mut self, user_id: Uuid) -> Self {
        self.administrators.insert(user_id);
        self
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn users_with_role(&self, role: &str) -> Result<HashSet<Uuid>, DirectoryError> {
        Ok(self.roles.get(role).cloned().unwrap_or_default())
    }

    async fn related_user(
        &self,
        subject_ref: &str,
        relation: &str,
    ) -> Result<Option<Uuid>, DirectoryError> {
        Ok(self
            .relations
            .get(&(subject_ref.to_string(), relation.to_string()))
            .copied())
    }

    async fn administrators(&self) -> Result<HashSet<Uuid>, DirectoryError> {
        Ok(self.administrators.clone())
    }
}
