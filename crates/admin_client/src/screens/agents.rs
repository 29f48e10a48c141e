use std::sync::Arc;

use shared::protocol::AgentSummary;

use super::matches_query;
use crate::{
    controller::PagedListController,
    services::{AgentsService, AGENTS_PAGE_SIZE},
    transport::HttpTransport,
};

pub struct AgentDirectory {
    agents: PagedListController<AgentSummary>,
}

impl AgentDirectory {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let service = AgentsService::new(transport);
        Self {
            agents: PagedListController::new(
                "agents",
                Arc::new(service.list_source()),
                AGENTS_PAGE_SIZE,
            ),
        }
    }

    pub fn agents(&self) -> &PagedListController<AgentSummary> {
        &self.agents
    }

    /// Filters what is already loaded without another request.
    pub async fn search_loaded(&self, query: &str) -> Vec<AgentSummary> {
        self.agents
            .items()
            .await
            .into_iter()
            .filter(|agent| matches_query(query, &[agent.name.as_str(), agent.email.as_str()]))
            .collect()
    }
}
