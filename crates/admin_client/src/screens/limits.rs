use std::sync::Arc;

use shared::{domain::AgentId, protocol::ContainerLimits};
use thiserror::Error;
use tracing::info;

use super::action_failed;
use crate::{error::Notice, services::LimitsService, transport::HttpTransport};

pub const MAX_CONTAINER_LIMIT: u32 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("{field} must be a whole number")]
    NotANumber { field: &'static str, input: String },
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
    #[error("{field} cannot exceed {max}")]
    TooLarge { field: &'static str, max: u32 },
}

/// Blank means unlimited.
pub fn parse_limit(field: &'static str, input: &str) -> Result<Option<u32>, LimitError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with('-') {
        return Err(LimitError::Negative { field });
    }
    let value: u64 = trimmed.parse().map_err(|_| LimitError::NotANumber {
        field,
        input: input.to_string(),
    })?;
    if value > u64::from(MAX_CONTAINER_LIMIT) {
        return Err(LimitError::TooLarge {
            field,
            max: MAX_CONTAINER_LIMIT,
        });
    }
    Ok(Some(value as u32))
}

/// Raw text as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitInputs {
    pub max_listings: String,
    pub max_active_deals: String,
    pub max_images_per_listing: String,
}

impl LimitInputs {
    pub fn from_limits(limits: &ContainerLimits) -> Self {
        let show = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
        Self {
            max_listings: show(limits.max_listings),
            max_active_deals: show(limits.max_active_deals),
            max_images_per_listing: show(limits.max_images_per_listing),
        }
    }

    pub fn parse(&self) -> Result<ContainerLimits, LimitError> {
        Ok(ContainerLimits {
            max_listings: parse_limit("max_listings", &self.max_listings)?,
            max_active_deals: parse_limit("max_active_deals", &self.max_active_deals)?,
            max_images_per_listing: parse_limit(
                "max_images_per_listing",
                &self.max_images_per_listing,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] LimitError),
    #[error("{0}")]
    Rejected(Notice),
}

pub struct ContainerLimitsForm {
    service: LimitsService,
    agent_id: AgentId,
    pub inputs: LimitInputs,
}

impl ContainerLimitsForm {
    pub fn new(transport: Arc<dyn HttpTransport>, agent_id: AgentId) -> Self {
        Self {
            service: LimitsService::new(transport),
            agent_id,
            inputs: LimitInputs::default(),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub async fn load(&mut self) -> Result<ContainerLimits, Notice> {
        let limits = self
            .service
            .get(self.agent_id)
            .await
            .map_err(|e| action_failed("load_limits", "Could not load the agent's limits.", e))?;
        self.inputs = LimitInputs::from_limits(&limits);
        Ok(limits)
    }

    /// Nothing is sent unless every field validates.
    pub async fn save(&self) -> Result<ContainerLimits, FormError> {
        let limits = self.inputs.parse()?;
        self.service
            .save(self.agent_id, &limits)
            .await
            .map_err(|e| {
                FormError::Rejected(action_failed(
                    "save_limits",
                    "Could not save the agent's limits.",
                    e,
                ))
            })?;
        info!(agent_id = self.agent_id.0, "container limits saved");
        Ok(limits)
    }
}
