use std::sync::Arc;

use shared::{
    domain::{AccountStatus, UserId, UserRole},
    protocol::UserSummary,
};
use tracing::info;

use super::{action_failed, ActionResult};
use crate::{
    controller::PagedListController,
    services::{AdminUsersService, USERS_PAGE_SIZE},
    transport::HttpTransport,
};

pub struct UserManagement {
    service: AdminUsersService,
    users: PagedListController<UserSummary>,
}

impl UserManagement {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let service = AdminUsersService::new(transport);
        let users = PagedListController::new(
            "admin_users",
            Arc::new(service.list_source()),
            USERS_PAGE_SIZE,
        );
        Self { service, users }
    }

    pub fn users(&self) -> &PagedListController<UserSummary> {
        &self.users
    }

    /// One DELETE, then a single page-1 refetch if it succeeded.
    pub async fn delete_user(&self, id: UserId) -> ActionResult {
        self.service
            .delete(id)
            .await
            .map_err(|e| action_failed("delete_user", "Could not delete the user.", e))?;
        info!(user_id = id.0, "user deleted");
        Ok(self.users.refresh().await)
    }

    pub async fn update_role(&self, id: UserId, role: UserRole) -> ActionResult {
        self.service
            .update_role(id, role)
            .await
            .map_err(|e| action_failed("update_role", "Could not update the user's role.", e))?;
        info!(user_id = id.0, role = %role, "user role updated");
        Ok(self.users.refresh().await)
    }

    pub async fn update_status(&self, id: UserId, status: AccountStatus) -> ActionResult {
        self.service.update_status(id, status).await.map_err(|e| {
            action_failed("update_user_status", "Could not update the account status.", e)
        })?;
        info!(user_id = id.0, status = %status, "user status updated");
        Ok(self.users.refresh().await)
    }
}
