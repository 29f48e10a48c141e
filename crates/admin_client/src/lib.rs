//! Client side of the marketplace admin API: an HTTP transport, service
//! wrappers per API area, and the paged-list controllers the management
//! screens are built on.

pub mod config;
pub mod controller;
pub mod error;
pub mod paging;
pub mod screens;
pub mod services;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use controller::{ListEvent, ListSnapshot, ListSource, PagedListController};
pub use error::{ErrorCategory, Notice, RemoteError};
pub use paging::{Completion, FilterCriteria, Keyed, Page, PageCursor, PagedList};
pub use screens::{
    AgentDirectory, ContainerLimitsForm, DealBoard, PermissionEditor, PropertyManagement,
    UserManagement,
};
pub use transport::{ApiResponse, HttpTransport, ReqwestTransport};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
