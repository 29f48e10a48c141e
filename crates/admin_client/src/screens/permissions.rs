use std::sync::Arc;

use shared::{domain::UserId, protocol::Permission};
use tracing::info;

use super::{action_failed, matches_query};
use crate::{error::Notice, services::PermissionsService, transport::HttpTransport};

/// Checkbox list of a user's permissions, saved as a whole.
pub struct PermissionEditor {
    service: PermissionsService,
    user_id: UserId,
    permissions: Vec<Permission>,
    /// Granted keys as last loaded or saved.
    committed: Vec<String>,
}

impl PermissionEditor {
    pub fn new(transport: Arc<dyn HttpTransport>, user_id: UserId) -> Self {
        Self {
            service: PermissionsService::new(transport),
            user_id,
            permissions: Vec::new(),
            committed: Vec::new(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Toggling a key twice leaves the editor clean again.
    pub fn is_dirty(&self) -> bool {
        self.granted_keys() != self.committed
    }

    /// On failure the previously loaded list is kept.
    pub async fn load(&mut self) -> Result<(), Notice> {
        let permissions = self.service.list(self.user_id).await.map_err(|e| {
            action_failed("load_permissions", "Could not load permissions.", e)
        })?;
        self.permissions = permissions;
        self.committed = self.granted_keys();
        Ok(())
    }

    /// Returns the new state, or `None` for an unknown key.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        let permission = self.permissions.iter_mut().find(|p| p.key == key)?;
        permission.granted = !permission.granted;
        Some(permission.granted)
    }

    pub fn visible(&self, query: &str) -> Vec<&Permission> {
        self.permissions
            .iter()
            .filter(|p| matches_query(query, &[p.key.as_str(), p.label.as_str()]))
            .collect()
    }

    pub fn granted_keys(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|p| p.granted)
            .map(|p| p.key.clone())
            .collect()
    }

    pub async fn save(&mut self) -> Result<(), Notice> {
        let granted = self.granted_keys();
        let count = granted.len();
        self.service
            .save(self.user_id, granted.clone())
            .await
            .map_err(|e| action_failed("save_permissions", "Could not save permissions.", e))?;
        self.committed = granted;
        info!(user_id = self.user_id.0, granted = count, "permissions saved");
        Ok(())
    }
}
