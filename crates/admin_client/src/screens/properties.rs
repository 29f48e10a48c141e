use std::sync::Arc;

use shared::{
    domain::{ListingStatus, PropertyId},
    protocol::PropertySummary,
};
use tracing::info;

use super::{action_failed, ActionResult};
use crate::{
    controller::PagedListController,
    services::{PropertiesService, PROPERTIES_PAGE_SIZE},
    transport::HttpTransport,
};

pub struct PropertyManagement {
    service: PropertiesService,
    properties: PagedListController<PropertySummary>,
}

impl PropertyManagement {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let service = PropertiesService::new(transport);
        let properties = PagedListController::new(
            "properties",
            Arc::new(service.list_source()),
            PROPERTIES_PAGE_SIZE,
        );
        Self {
            service,
            properties,
        }
    }

    pub fn properties(&self) -> &PagedListController<PropertySummary> {
        &self.properties
    }

    pub async fn delete_property(&self, id: PropertyId) -> ActionResult {
        self.service
            .delete(id)
            .await
            .map_err(|e| action_failed("delete_property", "Could not delete the listing.", e))?;
        info!(property_id = id.0, "property deleted");
        Ok(self.properties.refresh().await)
    }

    pub async fn update_status(&self, id: PropertyId, status: ListingStatus) -> ActionResult {
        self.service.update_status(id, status).await.map_err(|e| {
            action_failed("update_listing_status", "Could not update the listing.", e)
        })?;
        info!(property_id = id.0, status = %status, "listing status updated");
        Ok(self.properties.refresh().await)
    }
}
