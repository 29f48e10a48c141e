//! State of a paginated remote collection, kept as plain data with explicit
//! transitions. Nothing here performs I/O; [`crate::controller`] drives it.
//!
//! Every dispatched fetch carries a [`FetchTicket`] stamped with a generation
//! number. Only the completion whose generation matches the latest one issued
//! is applied, so a slow response for an old filter can never overwrite the
//! result of a newer one.

use std::{
    collections::{BTreeMap, HashSet},
    fmt::Debug,
    hash::Hash,
};

use crate::error::RemoteError;

/// Items with a server-assigned identifier.
pub trait Keyed {
    type Key: Eq + Hash + Debug;

    fn key(&self) -> Self::Key;
}

/// Filter name to scalar value. Blank values are kept in the map (so an input
/// can be cleared and retyped) but never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria(BTreeMap<String, String>);

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.insert(name.into(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Non-blank filters in name order, values trimmed.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub total_pages: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }
}

impl PageCursor {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    FirstPage,
    NextPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
    pub kind: FetchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied { received: usize, duplicates: usize },
    Failed(RemoteError),
    /// A newer fetch was issued after this one; the result was dropped.
    Stale,
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PagedList<T> {
    page_size: u32,
    filter: FilterCriteria,
    /// Criteria the current `items` were fetched with.
    loaded_filter: FilterCriteria,
    cursor: PageCursor,
    items: Vec<T>,
    loading: bool,
    loading_more: bool,
    generation: u64,
}

impl<T: Keyed> PagedList<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            filter: FilterCriteria::default(),
            loaded_filter: FilterCriteria::default(),
            cursor: PageCursor::default(),
            items: Vec::new(),
            loading: false,
            loading_more: false,
            generation: 0,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn in_flight(&self) -> bool {
        self.loading || self.loading_more
    }

    /// True while the displayed items belong to different criteria than the
    /// requested ones, e.g. after a filter change whose first page failed.
    pub fn filter_pending(&self) -> bool {
        !self.filter.active().eq(self.loaded_filter.active())
    }

    /// Replaces the criteria and requests page 1. Always issues a request,
    /// superseding whatever is in flight. Items and cursor change only once
    /// that page arrives.
    pub fn set_filter(&mut self, criteria: FilterCriteria) -> FetchRequest {
        self.filter = criteria;
        self.begin(FetchKind::FirstPage, 1)
    }

    /// Page-1 fetch with the current criteria (mount, pull-to-refresh, or
    /// after a mutation).
    pub fn begin_refresh(&mut self) -> FetchRequest {
        self.begin(FetchKind::FirstPage, 1)
    }

    /// `None` when the last page is already loaded, a fetch is in flight, or
    /// the first page for the current criteria has not loaded yet.
    pub fn begin_next_page(&mut self) -> Option<FetchRequest> {
        if self.in_flight() || self.filter_pending() || !self.cursor.has_more() {
            return None;
        }
        let page = self.cursor.page + 1;
        Some(self.begin(FetchKind::NextPage, page))
    }

    fn begin(&mut self, kind: FetchKind, page: u32) -> FetchRequest {
        self.generation += 1;
        self.loading = kind == FetchKind::FirstPage;
        self.loading_more = kind == FetchKind::NextPage;
        FetchRequest {
            ticket: FetchTicket {
                generation: self.generation,
                page,
                kind,
            },
            query: self.query_for(page),
        }
    }

    fn query_for(&self, page: u32) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), page.to_string()),
            ("limit".to_string(), self.page_size.to_string()),
        ];
        query.extend(
            self.filter
                .active()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        query
    }

    /// Applies the outcome of `ticket`. Flags are cleared whenever the ticket
    /// is current, success or not; a failure leaves items and cursor alone.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Page<T>, RemoteError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            return Completion::Stale;
        }
        self.loading = false;
        self.loading_more = false;

        let page = match result {
            Ok(page) => page,
            Err(err) => return Completion::Failed(err),
        };

        let received = page.items.len();
        self.cursor = PageCursor {
            page: ticket.page,
            total_pages: page.pages.max(1),
        };
        let duplicates = match ticket.kind {
            FetchKind::FirstPage => {
                self.items = page.items;
                self.loaded_filter = self.filter.clone();
                0
            }
            FetchKind::NextPage => {
                let existing: HashSet<T::Key> = self.items.iter().map(|item| item.key()).collect();
                let duplicates = page
                    .items
                    .iter()
                    .filter(|item| existing.contains(&item.key()))
                    .count();
                self.items.extend(page.items);
                duplicates
            }
        };

        Completion::Applied {
            received,
            duplicates,
        }
    }
}

#[cfg(test)]
#[path = "tests/paging_tests.rs"]
mod tests;
