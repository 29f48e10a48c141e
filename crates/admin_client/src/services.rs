//! Thin wrappers over [`HttpTransport`], one per API area, each bound to a
//! fixed base path.

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{
        AccountStatus, AgentId, DealId, DealStatus, ListingStatus, PropertyId, UserId, UserRole,
    },
    protocol::{
        AgentSummary, ContainerLimits, DealSummary, Permission, PermissionsResponse,
        PropertySummary, UpdateAccountStatusRequest, UpdateDealStatusRequest,
        UpdateListingStatusRequest, UpdatePermissionsRequest, UpdateRoleRequest, UserSummary,
    },
};

use crate::{
    controller::ListSource,
    error::RemoteError,
    paging::{Keyed, Page},
    transport::HttpTransport,
};

pub const USERS_PAGE_SIZE: u32 = 10;
pub const PROPERTIES_PAGE_SIZE: u32 = 15;
pub const AGENTS_PAGE_SIZE: u32 = 10;
pub const DEALS_PAGE_SIZE: u32 = 12;

/// Where a paginated collection lives and which body key holds its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEndpoint {
    pub path: &'static str,
    pub items_key: &'static str,
    pub page_size: u32,
}

pub const USERS_ENDPOINT: ListEndpoint = ListEndpoint {
    path: "/admin/users",
    items_key: "users",
    page_size: USERS_PAGE_SIZE,
};

pub const PROPERTIES_ENDPOINT: ListEndpoint = ListEndpoint {
    path: "/properties",
    items_key: "properties",
    page_size: PROPERTIES_PAGE_SIZE,
};

pub const AGENTS_ENDPOINT: ListEndpoint = ListEndpoint {
    path: "/agents",
    items_key: "agents",
    page_size: AGENTS_PAGE_SIZE,
};

pub const DEALS_ENDPOINT: ListEndpoint = ListEndpoint {
    path: "/deals",
    items_key: "deals",
    page_size: DEALS_PAGE_SIZE,
};

/// Decodes `{ <items_key>: [...], pages: n }`. A missing or null `pages`
/// means a single page; any other non-integer is rejected.
pub fn decode_page<T: DeserializeOwned>(
    data: &Value,
    items_key: &str,
) -> Result<Page<T>, RemoteError> {
    let raw_items = data
        .get(items_key)
        .ok_or_else(|| RemoteError::Decode(format!("response has no `{items_key}` field")))?;
    let items: Vec<T> = serde_json::from_value(raw_items.clone())
        .map_err(|e| RemoteError::Decode(format!("invalid `{items_key}` entries: {e}")))?;
    let pages = match data.get("pages") {
        None | Some(Value::Null) => 1,
        Some(raw) => raw
            .as_u64()
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
            .ok_or_else(|| RemoteError::Decode(format!("`pages` is not a page count: {raw}")))?,
    };
    Ok(Page { items, pages })
}

pub struct RemoteListSource<T> {
    transport: Arc<dyn HttpTransport>,
    endpoint: ListEndpoint,
    _item: PhantomData<fn() -> T>,
}

impl<T> RemoteListSource<T> {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: ListEndpoint) -> Self {
        Self {
            transport,
            endpoint,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> ListSource<T> for RemoteListSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, query: &[(String, String)]) -> Result<Page<T>, RemoteError> {
        let response = self.transport.get(self.endpoint.path, query).await?;
        decode_page(&response.data, self.endpoint.items_key)
    }
}

impl Keyed for UserSummary {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id
    }
}

impl Keyed for PropertySummary {
    type Key = PropertyId;

    fn key(&self) -> PropertyId {
        self.id
    }
}

impl Keyed for AgentSummary {
    type Key = AgentId;

    fn key(&self) -> AgentId {
        self.id
    }
}

impl Keyed for DealSummary {
    type Key = DealId;

    fn key(&self) -> DealId {
        self.id
    }
}

/// Shared plumbing: joins sub-paths onto the base and (de)serializes bodies.
#[derive(Clone)]
struct ServiceClient {
    transport: Arc<dyn HttpTransport>,
    base_path: &'static str,
}

impl ServiceClient {
    fn new(transport: Arc<dyn HttpTransport>, base_path: &'static str) -> Self {
        Self {
            transport,
            base_path,
        }
    }

    fn path(&self, sub: &str) -> String {
        if sub.is_empty() {
            self.base_path.to_string()
        } else {
            format!("{}/{}", self.base_path, sub.trim_start_matches('/'))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, sub: &str) -> Result<T, RemoteError> {
        let response = self.transport.get(&self.path(sub), &[]).await?;
        serde_json::from_value(response.data).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn put_json<B: Serialize>(&self, sub: &str, body: &B) -> Result<(), RemoteError> {
        let body = serde_json::to_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.transport.put(&self.path(sub), Some(body)).await?;
        Ok(())
    }

    async fn delete(&self, sub: &str) -> Result<(), RemoteError> {
        self.transport.delete(&self.path(sub)).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AdminUsersService {
    client: ServiceClient,
}

impl AdminUsersService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, USERS_ENDPOINT.path),
        }
    }

    pub fn list_source(&self) -> RemoteListSource<UserSummary> {
        RemoteListSource::new(Arc::clone(&self.client.transport), USERS_ENDPOINT)
    }

    pub async fn update_role(&self, id: UserId, role: UserRole) -> Result<(), RemoteError> {
        self.client
            .put_json(&format!("{id}/role"), &UpdateRoleRequest { role })
            .await
    }

    pub async fn update_status(
        &self,
        id: UserId,
        status: AccountStatus,
    ) -> Result<(), RemoteError> {
        self.client
            .put_json(&format!("{id}/status"), &UpdateAccountStatusRequest { status })
            .await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), RemoteError> {
        self.client.delete(&id.to_string()).await
    }
}

#[derive(Clone)]
pub struct PropertiesService {
    client: ServiceClient,
}

impl PropertiesService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, PROPERTIES_ENDPOINT.path),
        }
    }

    pub fn list_source(&self) -> RemoteListSource<PropertySummary> {
        RemoteListSource::new(Arc::clone(&self.client.transport), PROPERTIES_ENDPOINT)
    }

    pub async fn get(&self, id: PropertyId) -> Result<PropertySummary, RemoteError> {
        self.client.get_json(&id.to_string()).await
    }

    pub async fn update_status(
        &self,
        id: PropertyId,
        status: ListingStatus,
    ) -> Result<(), RemoteError> {
        self.client
            .put_json(&format!("{id}/status"), &UpdateListingStatusRequest { status })
            .await
    }

    pub async fn delete(&self, id: PropertyId) -> Result<(), RemoteError> {
        self.client.delete(&id.to_string()).await
    }
}

#[derive(Clone)]
pub struct AgentsService {
    client: ServiceClient,
}

impl AgentsService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, AGENTS_ENDPOINT.path),
        }
    }

    pub fn list_source(&self) -> RemoteListSource<AgentSummary> {
        RemoteListSource::new(Arc::clone(&self.client.transport), AGENTS_ENDPOINT)
    }

    pub async fn get(&self, id: AgentId) -> Result<AgentSummary, RemoteError> {
        self.client.get_json(&id.to_string()).await
    }
}

#[derive(Clone)]
pub struct DealsService {
    client: ServiceClient,
}

impl DealsService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, DEALS_ENDPOINT.path),
        }
    }

    pub fn list_source(&self) -> RemoteListSource<DealSummary> {
        RemoteListSource::new(Arc::clone(&self.client.transport), DEALS_ENDPOINT)
    }

    pub async fn update_status(&self, id: DealId, status: DealStatus) -> Result<(), RemoteError> {
        self.client
            .put_json(&format!("{id}/status"), &UpdateDealStatusRequest { status })
            .await
    }
}

#[derive(Clone)]
pub struct PermissionsService {
    client: ServiceClient,
}

impl PermissionsService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, "/admin/users"),
        }
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Permission>, RemoteError> {
        let response: PermissionsResponse = self
            .client
            .get_json(&format!("{user_id}/permissions"))
            .await?;
        Ok(response.permissions)
    }

    pub async fn save(&self, user_id: UserId, granted: Vec<String>) -> Result<(), RemoteError> {
        self.client
            .put_json(
                &format!("{user_id}/permissions"),
                &UpdatePermissionsRequest {
                    permissions: granted,
                },
            )
            .await
    }
}

#[derive(Clone)]
pub struct LimitsService {
    client: ServiceClient,
}

impl LimitsService {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            client: ServiceClient::new(transport, "/admin/agents"),
        }
    }

    pub async fn get(&self, agent_id: AgentId) -> Result<ContainerLimits, RemoteError> {
        self.client.get_json(&format!("{agent_id}/limits")).await
    }

    pub async fn save(
        &self,
        agent_id: AgentId,
        limits: &ContainerLimits,
    ) -> Result<(), RemoteError> {
        self.client
            .put_json(&format!("{agent_id}/limits"), limits)
            .await
    }
}

#[cfg(test)]
#[path = "tests/services_tests.rs"]
mod tests;
