//! Screen-level orchestration: one list controller per management screen plus
//! the mutating actions that screen offers.

mod agents;
mod deals;
mod limits;
mod permissions;
mod properties;
mod users;

pub use agents::AgentDirectory;
pub use deals::DealBoard;
pub use limits::{
    parse_limit, ContainerLimitsForm, FormError, LimitError, LimitInputs, MAX_CONTAINER_LIMIT,
};
pub use permissions::PermissionEditor;
pub use properties::PropertyManagement;
pub use users::UserManagement;

use tracing::warn;

use crate::{
    error::{Notice, RemoteError},
    paging::Completion,
};

/// Case-insensitive substring match used by the client-side search boxes.
pub fn matches_query(query: &str, fields: &[&str]) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&query))
}

/// Outcome of a mutating action: on success the list was refetched and this
/// is how that went; on failure the alert to show.
pub type ActionResult = Result<Completion, Notice>;

fn action_failed(action: &'static str, fallback: &str, err: RemoteError) -> Notice {
    warn!(action, error = %err, "action failed");
    Notice::from_error(fallback, &err)
}

#[cfg(test)]
#[path = "../tests/screens_tests.rs"]
mod tests;
