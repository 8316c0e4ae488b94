use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::{ErrorMessage, HttpError},
    models::deliverablemodels::{DeliverableStatus, TransitionError},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Deliverable {0} not found")]
    DeliverableNotFound(Uuid),

    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Subscription plan not found: {0}")]
    PlanNotFound(String),

    #[error("Subscription {0} not found")]
    SubscriptionNotFound(Uuid),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Cannot {action} a deliverable in status {from:?}")]
    InvalidDeliverableStatus {
        from: DeliverableStatus,
        action: &'static str,
    },

    #[error("User {0} is not allowed to act on {1}")]
    Forbidden(Uuid, String),

    #[error("{0} was modified by another request; reload and try again")]
    ConcurrentModification(String),

    #[error("Your {plan} plan limit for {action} has been reached ({used}/{limit}). Upgrade your plan to continue.")]
    PlanLimitReached {
        action: &'static str,
        plan: String,
        limit: i32,
        used: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<TransitionError> for ServiceError {
    fn from(error: TransitionError) -> Self {
        match error {
            TransitionError::InvalidTransition { from, action } => {
                ServiceError::InvalidDeliverableStatus { from, action }
            }
            TransitionError::Validation(message) => ServiceError::Validation(message),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::DeliverableNotFound(_)
            | ServiceError::CampaignNotFound(_)
            | ServiceError::PlanNotFound(_)
            | ServiceError::SubscriptionNotFound(_)
            | ServiceError::NotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidDeliverableStatus { .. }
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Forbidden(_, _)
            | ServiceError::PlanLimitReached { .. } => StatusCode::FORBIDDEN,

            ServiceError::ConcurrentModification(_) => StatusCode::CONFLICT,

            ServiceError::Database(_)
            | ServiceError::Storage(_)
            | ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", error);
            return HttpError::new(ErrorMessage::ServerError.to_string(), status);
        }

        match &error {
            ServiceError::PlanLimitReached { action, plan, limit, used } => {
                let details = serde_json::json!({
                    "upgrade_required": true,
                    "data": {
                        "action": action,
                        "plan": plan,
                        "limit": limit,
                        "used": used,
                    }
                });
                HttpError::new(error.to_string(), status).with_details(details)
            }
            _ => HttpError::new(error.to_string(), status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_map_to_bad_request() {
        let err: ServiceError = TransitionError::InvalidTransition {
            from: DeliverableStatus::Pending,
            action: "publish",
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ServiceError = TransitionError::Validation("A rejection reason is required".into()).into();
        let http: HttpError = err.into();
        assert_eq!(http.status, StatusCode::BAD_REQUEST);
        assert!(http.message.contains("rejection reason"));
    }

    #[test]
    fn plan_limit_carries_upgrade_prompt() {
        let http: HttpError = ServiceError::PlanLimitReached {
            action: "create_campaign",
            plan: "free".to_string(),
            limit: 1,
            used: 1,
        }
        .into();

        assert_eq!(http.status, StatusCode::FORBIDDEN);
        let details = http.details.expect("details");
        assert_eq!(details["upgrade_required"], true);
        assert_eq!(details["data"]["limit"], 1);
    }

    #[test]
    fn conflicts_and_ownership_failures() {
        assert_eq!(
            ServiceError::ConcurrentModification("Deliverable".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Forbidden(Uuid::nil(), "deliverable".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_failures_hide_their_details() {
        let http: HttpError = ServiceError::Database(sqlx::Error::Protocol(
            "relation \"deliverables\" does not exist".to_string(),
        ))
        .into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http.message, ErrorMessage::ServerError.to_string());
        assert!(http.details.is_none());

        let http: HttpError = ServiceError::Storage(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/var/uploads is read-only",
        ))
        .into();
        assert!(!http.message.contains("/var/uploads"));
    }
}
