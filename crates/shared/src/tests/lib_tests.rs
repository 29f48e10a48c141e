use crate::{
    domain::{DealStatus, ListingStatus, UserId, UserRole},
    error::ApiErrorBody,
    protocol::{ContainerLimits, PropertySummary, UserSummary},
};

#[test]
fn user_summary_tolerates_missing_status_and_unknown_role() {
    let user: UserSummary = serde_json::from_value(serde_json::json!({
        "id": 4,
        "name": "Alice",
        "email": "alice@example.com",
        "role": "broker"
    }))
    .expect("decode user");

    assert_eq!(user.id, UserId(4));
    assert_eq!(user.role, UserRole::Other);
    assert_eq!(user.status.as_str(), "active");
    assert!(user.created_at.is_none());
}

#[test]
fn wire_enums_parse_case_insensitively() {
    assert_eq!(" Agent ".parse::<UserRole>(), Ok(UserRole::Agent));
    assert_eq!(
        "under_contract".parse::<DealStatus>(),
        Ok(DealStatus::UnderContract)
    );
    let err = "rented".parse::<ListingStatus>().expect_err("unknown status");
    assert_eq!(err.to_string(), "unknown listing status `rented`");
}

#[test]
fn property_serializes_status_in_snake_case() {
    let property = PropertySummary {
        id: crate::domain::PropertyId(12),
        title: "Loft".to_string(),
        city: "Austin".to_string(),
        price: 450_000,
        status: ListingStatus::Pending,
        agent_id: None,
    };
    let value = serde_json::to_value(&property).expect("encode");
    assert_eq!(value["status"], "pending");
    assert!(value.get("agent_id").is_none());
}

#[test]
fn container_limits_missing_fields_mean_unlimited() {
    let limits: ContainerLimits =
        serde_json::from_str(r#"{"max_listings": 20}"#).expect("decode limits");
    assert_eq!(limits.max_listings, Some(20));
    assert_eq!(limits.max_active_deals, None);
    assert_eq!(limits.max_images_per_listing, None);
}

#[test]
fn error_body_prefers_message_then_error_field() {
    let body: ApiErrorBody =
        serde_json::from_str(r#"{"error": "  user not found "}"#).expect("decode");
    assert_eq!(body.into_message().as_deref(), Some("user not found"));

    let body: ApiErrorBody =
        serde_json::from_str(r#"{"message": "", "error": ""}"#).expect("decode");
    assert_eq!(body.into_message(), None);
}
