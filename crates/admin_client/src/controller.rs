//! Async driver around [`PagedList`]: invokes the remote-fetch collaborator
//! and feeds the result back through the state transitions.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::RemoteError,
    paging::{Completion, FetchRequest, FilterCriteria, Keyed, Page, PageCursor, PagedList},
};

#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch_page(&self, query: &[(String, String)]) -> Result<Page<T>, RemoteError>;
}

/// UI events a list screen forwards to its controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Mounted,
    FilterChanged(FilterCriteria),
    ScrolledNearEnd,
    PulledToRefresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub filter: FilterCriteria,
    pub cursor: PageCursor,
    pub loading: bool,
    pub loading_more: bool,
}

pub struct PagedListController<T> {
    name: &'static str,
    source: Arc<dyn ListSource<T>>,
    state: Mutex<PagedList<T>>,
}

impl<T> PagedListController<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, source: Arc<dyn ListSource<T>>, page_size: u32) -> Self {
        Self {
            name,
            source,
            state: Mutex::new(PagedList::new(page_size)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn mount(&self) -> Completion {
        self.refresh().await
    }

    pub async fn set_filter(&self, criteria: FilterCriteria) -> Completion {
        let request = self.state.lock().await.set_filter(criteria);
        self.run(request).await
    }

    /// Changes one filter field, keeping the others.
    pub async fn set_filter_field(&self, name: &str, value: impl ToString) -> Completion {
        let request = {
            let mut state = self.state.lock().await;
            let mut criteria = state.filter().clone();
            criteria.set(name, value);
            state.set_filter(criteria)
        };
        self.run(request).await
    }

    /// `None` when there was nothing to do (last page reached or a fetch is
    /// already running).
    pub async fn load_next_page(&self) -> Option<Completion> {
        let request = self.state.lock().await.begin_next_page();
        match request {
            Some(request) => Some(self.run(request).await),
            None => {
                debug!(list = self.name, "skipping next page request");
                None
            }
        }
    }

    pub async fn refresh(&self) -> Completion {
        let request = self.state.lock().await.begin_refresh();
        self.run(request).await
    }

    pub async fn handle(&self, event: ListEvent) -> Option<Completion> {
        match event {
            ListEvent::Mounted => Some(self.mount().await),
            ListEvent::FilterChanged(criteria) => Some(self.set_filter(criteria).await),
            ListEvent::ScrolledNearEnd => self.load_next_page().await,
            ListEvent::PulledToRefresh => Some(self.refresh().await),
        }
    }

    pub async fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.state.lock().await;
        ListSnapshot {
            items: state.items().to_vec(),
            filter: state.filter().clone(),
            cursor: state.cursor(),
            loading: state.is_loading(),
            loading_more: state.is_loading_more(),
        }
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.items().to_vec()
    }

    pub async fn filter(&self) -> FilterCriteria {
        self.state.lock().await.filter().clone()
    }

    pub async fn cursor(&self) -> PageCursor {
        self.state.lock().await.cursor()
    }

    async fn run(&self, request: FetchRequest) -> Completion {
        let ticket = request.ticket;
        debug!(
            list = self.name,
            page = ticket.page,
            generation = ticket.generation,
            "fetching page"
        );

        // The lock is released while the request is outstanding.
        let result = self.source.fetch_page(&request.query).await;
        if let Err(err) = &result {
            warn!(list = self.name, page = ticket.page, error = %err, "list fetch failed");
        }

        let completion = self.state.lock().await.complete(ticket, result);
        match &completion {
            Completion::Stale => info!(
                list = self.name,
                generation = ticket.generation,
                "discarding stale page response"
            ),
            Completion::Applied { duplicates, .. } if *duplicates > 0 => warn!(
                list = self.name,
                page = ticket.page,
                duplicates = *duplicates,
                "page overlaps items already loaded"
            ),
            _ => {}
        }
        completion
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
