use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Extension, Json, Router};
use validator::Validate;

use crate::{
    dtos::admindtos::CreateFeedbackDto,
    error::HttpError,
    handler::service_error,
    middleware::JWTAuthMiddeware,
    service::moderation_service::ModerationService,
    AppState,
};

pub fn feedback_handler() -> Router {
    Router::new().route("/", post(submit_feedback))
}

pub async fn submit_feedback(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let feedback = ModerationService::new(app_state.db_client.clone())
        .submit_feedback(&auth.user, &body.subject, &body.message)
        .await
        .map_err(service_error("feedback/create", auth.user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "message": "Thanks for your feedback",
            "data": feedback
        })),
    ))
}
