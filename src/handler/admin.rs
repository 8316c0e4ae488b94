use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::admindtos::*,
    error::HttpError,
    handler::service_error,
    middleware::{role_check, JWTAuthMiddeware},
    models::{campaignmodels::CollaborationStatus, usermodel::UserType},
    service::{moderation_service::ModerationService, subscription_service::SubscriptionService},
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/payments/pending", get(get_pending_payments))
        .route("/payments/:subscription_id/approve", post(approve_payment))
        .route("/payments/:subscription_id/reject", post(reject_payment))
        .route("/collaborations/:collaboration_id/approve", post(approve_collaboration))
        .route("/collaborations/:collaboration_id/reject", post(reject_collaboration))
        .route("/collaborations/:collaboration_id", delete(delete_collaboration))
        .route("/feedback", get(get_feedback))
        .route("/feedback/:feedback_id/resolve", post(resolve_feedback))
        .route("/feedback/:feedback_id", delete(delete_feedback))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserType::Admin])
        }))
}

pub async fn get_pending_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let pending = SubscriptionService::new(app_state.db_client.clone())
        .pending_payments()
        .await
        .map_err(service_error("admin/payments/pending", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": pending.len(),
        "data": pending
    })))
}

pub async fn approve_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(subscription_id): Path<Uuid>,
    body: Option<Json<ApprovePaymentDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let note = match body {
        Some(Json(body)) => {
            body.validate()
                .map_err(|e| HttpError::bad_request(e.to_string()))?;
            body.note
        }
        None => None,
    };

    let outcome = SubscriptionService::new(app_state.db_client.clone())
        .approve_payment(&auth.user, subscription_id, note)
        .await
        .map_err(service_error("admin/payments/approve", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Payment approved and subscription activated",
        "data": outcome
    })))
}

pub async fn reject_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(subscription_id): Path<Uuid>,
    Json(body): Json<RejectPaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = SubscriptionService::new(app_state.db_client.clone())
        .reject_payment(&auth.user, subscription_id, body.reason)
        .await
        .map_err(service_error("admin/payments/reject", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Payment rejected",
        "data": outcome
    })))
}

async fn moderate_collaboration(
    app_state: Arc<AppState>,
    auth: JWTAuthMiddeware,
    collaboration_id: Uuid,
    status: CollaborationStatus,
) -> Result<impl IntoResponse, HttpError> {
    let collaboration = ModerationService::new(app_state.db_client.clone())
        .set_collaboration_status(&auth.user, collaboration_id, status)
        .await
        .map_err(service_error("admin/collaborations", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": collaboration
    })))
}

pub async fn approve_collaboration(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(collaboration_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    moderate_collaboration(app_state, auth, collaboration_id, CollaborationStatus::Approved).await
}

pub async fn reject_collaboration(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(collaboration_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    moderate_collaboration(app_state, auth, collaboration_id, CollaborationStatus::Rejected).await
}

pub async fn delete_collaboration(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(collaboration_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    ModerationService::new(app_state.db_client.clone())
        .delete_collaboration(&auth.user, collaboration_id)
        .await
        .map_err(service_error("admin/collaborations/delete", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Collaboration deleted"
    })))
}

pub async fn get_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<FeedbackQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = ModerationService::new(app_state.db_client.clone())
        .list_feedback(params.status, params.page, params.limit)
        .await
        .map_err(service_error("admin/feedback", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": feedback.len(),
        "data": feedback
    })))
}

pub async fn resolve_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(feedback_id): Path<Uuid>,
    Json(body): Json<ResolveFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let feedback = ModerationService::new(app_state.db_client.clone())
        .resolve_feedback(&auth.user, feedback_id, body.note)
        .await
        .map_err(service_error("admin/feedback/resolve", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": feedback
    })))
}

pub async fn delete_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(feedback_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    ModerationService::new(app_state.db_client.clone())
        .delete_feedback(&auth.user, feedback_id)
        .await
        .map_err(service_error("admin/feedback/delete", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Feedback deleted"
    })))
}
