use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::subscriptiondtos::*,
    error::HttpError,
    handler::service_error,
    middleware::JWTAuthMiddeware,
    service::subscription_service::SubscriptionService,
    AppState,
};

pub fn subscription_handler() -> Router {
    Router::new()
        .route("/plans", get(get_plans))
        .route("/status", get(get_subscription_status))
        .route("/checkout", post(checkout))
        .route("/cancel", post(cancel_subscription))
        .route("/auto-renew", put(update_auto_renew))
        .route("/payments", get(get_payment_history))
}

pub async fn get_plans(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<PlanQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let user_type = params.user_type.or_else(|| auth.user.user_type.plan_user_type());

    let plans = SubscriptionService::new(app_state.db_client.clone())
        .list_plans(user_type)
        .await
        .map_err(service_error("subscriptions/plans", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": plans.len(),
        "data": plans
    })))
}

pub async fn get_subscription_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let overview = SubscriptionService::new(app_state.db_client.clone())
        .overview(&auth.user)
        .await
        .map_err(service_error("subscriptions/status", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": overview
    })))
}

pub async fn checkout(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CheckoutDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let outcome = SubscriptionService::new(app_state.db_client.clone())
        .checkout(
            &auth.user,
            body.plan_id,
            body.billing_cycle,
            body.payment_method,
            body.payment_reference,
        )
        .await
        .map_err(service_error("subscriptions/checkout", auth.user.id))?;

    let message = if outcome.payment.is_some() {
        "Subscription created. Your payment is awaiting confirmation."
    } else {
        "Subscription activated"
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": message,
        "data": outcome
    })))
}

pub async fn cancel_subscription(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let subscription = SubscriptionService::new(app_state.db_client.clone())
        .cancel(&auth.user)
        .await
        .map_err(service_error("subscriptions/cancel", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Subscription cancelled",
        "data": subscription
    })))
}

pub async fn update_auto_renew(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<AutoRenewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let subscription = SubscriptionService::new(app_state.db_client.clone())
        .set_auto_renew(&auth.user, body.auto_renew)
        .await
        .map_err(service_error("subscriptions/auto-renew", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": subscription
    })))
}

pub async fn get_payment_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = SubscriptionService::new(app_state.db_client.clone())
        .payments(&auth.user)
        .await
        .map_err(service_error("subscriptions/payments", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": payments.len(),
        "data": payments
    })))
}
