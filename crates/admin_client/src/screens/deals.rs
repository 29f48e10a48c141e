use std::sync::Arc;

use shared::{
    domain::{AgentId, DealId, DealStatus},
    protocol::DealSummary,
};
use tracing::info;

use super::{action_failed, ActionResult};
use crate::{
    controller::PagedListController,
    paging::{Completion, FilterCriteria},
    services::{DealsService, DEALS_PAGE_SIZE},
    transport::HttpTransport,
};

pub struct DealBoard {
    service: DealsService,
    deals: PagedListController<DealSummary>,
}

impl DealBoard {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let service = DealsService::new(transport);
        let deals =
            PagedListController::new("deals", Arc::new(service.list_source()), DEALS_PAGE_SIZE);
        Self { service, deals }
    }

    pub fn deals(&self) -> &PagedListController<DealSummary> {
        &self.deals
    }

    /// Scopes the board to one agent and/or status; `None` clears that part
    /// of the filter. Other criteria are kept.
    pub async fn show(&self, agent_id: Option<AgentId>, status: Option<DealStatus>) -> Completion {
        let mut criteria: FilterCriteria = self.deals.filter().await;
        match agent_id {
            Some(id) => criteria.set("agent_id", id),
            None => {
                criteria.remove("agent_id");
            }
        }
        match status {
            Some(status) => criteria.set("status", status),
            None => {
                criteria.remove("status");
            }
        }
        self.deals.set_filter(criteria).await
    }

    pub async fn update_status(&self, id: DealId, status: DealStatus) -> ActionResult {
        self.service
            .update_status(id, status)
            .await
            .map_err(|e| action_failed("update_deal_status", "Could not update the deal.", e))?;
        info!(deal_id = id.0, status = %status, "deal status updated");
        Ok(self.deals.refresh().await)
    }
}
