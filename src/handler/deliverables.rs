use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::deliverabledtos::*,
    error::HttpError,
    handler::service_error,
    middleware::{role_check, JWTAuthMiddeware},
    models::{deliverablemodels::*, usermodel::UserType},
    service::deliverable_service::{
        DeliverableService, MediaUpload, SubmissionTarget, SubmitContentInput,
    },
    AppState,
};

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn content_handler() -> Router {
    Router::new()
        .route(
            "/submit",
            post(submit_content).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserType::Influencer])
            })),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub fn deliverable_handler() -> Router {
    Router::new()
        .route(
            "/review",
            post(review_deliverable).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserType::Brand])
            })),
        )
        .route(
            "/mine",
            get(get_my_deliverables).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserType::Influencer])
            })),
        )
        .route("/:deliverable_id", get(get_deliverable))
        .route(
            "/:deliverable_id/publish",
            post(publish_deliverable).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserType::Influencer])
            })),
        )
}

fn deliverable_service(app_state: &AppState) -> DeliverableService {
    DeliverableService::new(app_state.db_client.clone(), app_state.media_store.clone())
}

/// Raw multipart fields before validation.
#[derive(Debug, Default)]
pub struct SubmitForm {
    pub uploads: Vec<MediaUpload>,
    pub caption: Option<String>,
    pub content_type: Option<String>,
    pub platforms: Vec<String>,
    pub deliverable_id: Option<String>,
    pub campaign_id: Option<String>,
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw.trim()).map_err(|_| HttpError::bad_request(format!("Invalid {}", field)))
}

impl SubmitForm {
    pub fn into_input(self) -> Result<SubmitContentInput, HttpError> {
        let target = match (
            self.deliverable_id.as_deref().filter(|v| !v.trim().is_empty()),
            self.campaign_id.as_deref().filter(|v| !v.trim().is_empty()),
        ) {
            (Some(id), _) => SubmissionTarget::Deliverable(parse_id(id, "deliverable_id")?),
            (None, Some(id)) => SubmissionTarget::Campaign(parse_id(id, "campaign_id")?),
            (None, None) => {
                return Err(HttpError::bad_request(
                    "Either deliverable_id or campaign_id is required",
                ))
            }
        };

        let content_type = match self.content_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                ContentType::parse(raw)
                    .ok_or_else(|| HttpError::bad_request(format!("Unknown content type: {}", raw)))?,
            ),
        };

        let mut platforms = Vec::new();
        for raw in self.platforms.iter().flat_map(|value| value.split(',')) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let platform = SocialPlatform::parse(raw)
                .ok_or_else(|| HttpError::bad_request(format!("Unknown platform: {}", raw)))?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }

        Ok(SubmitContentInput {
            target,
            uploads: self.uploads,
            caption: self.caption.unwrap_or_default(),
            content_type,
            platforms,
        })
    }
}

async fn read_submit_form(mut multipart: Multipart) -> Result<SubmitForm, HttpError> {
    let mut form = SubmitForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "media" | "media[]" | "files" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                if !bytes.is_empty() {
                    form.uploads.push(MediaUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                match name.as_str() {
                    "caption" => form.caption = Some(value),
                    "content_type" => form.content_type = Some(value),
                    "platforms" | "platforms[]" | "platform" => form.platforms.push(value),
                    "deliverable_id" => form.deliverable_id = Some(value),
                    "campaign_id" => form.campaign_id = Some(value),
                    other => tracing::debug!("Ignoring unknown form field {}", other),
                }
            }
        }
    }

    Ok(form)
}

pub async fn submit_content(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let input = read_submit_form(multipart).await?.into_input()?;

    let outcome = deliverable_service(&app_state)
        .submit_content(&auth.user, input)
        .await
        .map_err(service_error("content/submit", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Content submitted for review",
        "data": outcome
    })))
}

pub async fn review_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ReviewDeliverableDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let deliverable = deliverable_service(&app_state)
        .review(
            &auth.user,
            body.deliverable_id,
            body.action,
            body.feedback,
            body.manual_override,
        )
        .await
        .map_err(service_error("deliverables/review", auth.user.id))?;

    Ok(Json(DeliverableResponseDto {
        status: "success".to_string(),
        data: deliverable,
    }))
}

pub async fn publish_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
    Json(body): Json<PublishDeliverableDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let deliverable = deliverable_service(&app_state)
        .publish(&auth.user, deliverable_id, &body.live_url)
        .await
        .map_err(service_error("deliverables/publish", auth.user.id))?;

    Ok(Json(DeliverableResponseDto {
        status: "success".to_string(),
        data: deliverable,
    }))
}

pub async fn get_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(deliverable_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverable = deliverable_service(&app_state)
        .get_for_user(&auth.user, deliverable_id)
        .await
        .map_err(service_error("deliverables/get", auth.user.id))?;

    Ok(Json(DeliverableResponseDto {
        status: "success".to_string(),
        data: deliverable,
    }))
}

pub async fn get_my_deliverables(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverables = deliverable_service(&app_state)
        .influencer_deliverables(&auth.user)
        .await
        .map_err(service_error("deliverables/mine", auth.user.id))?;

    Ok(Json(DeliverableListResponseDto {
        status: "success".to_string(),
        results: deliverables.len(),
        data: deliverables,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SubmitForm {
        SubmitForm {
            uploads: vec![MediaUpload {
                file_name: "reel.mp4".to_string(),
                bytes: vec![1, 2, 3],
            }],
            caption: Some("New drop".to_string()),
            content_type: Some("Reel".to_string()),
            platforms: vec!["instagram, tiktok".to_string(), "instagram".to_string()],
            deliverable_id: None,
            campaign_id: Some(Uuid::nil().to_string()),
        }
    }

    #[test]
    fn platforms_accept_comma_lists_and_repeats() {
        let input = form().into_input().unwrap();
        assert_eq!(input.target, SubmissionTarget::Campaign(Uuid::nil()));
        assert_eq!(input.platforms, vec![SocialPlatform::Instagram, SocialPlatform::Tiktok]);
        assert_eq!(input.content_type, Some(ContentType::Reel));
    }

    #[test]
    fn deliverable_target_wins_over_campaign() {
        let deliverable_id = Uuid::new_v4();
        let mut f = form();
        f.deliverable_id = Some(deliverable_id.to_string());
        let input = f.into_input().unwrap();
        assert_eq!(input.target, SubmissionTarget::Deliverable(deliverable_id));
    }

    #[test]
    fn bad_fields_are_rejected() {
        let mut no_target = form();
        no_target.campaign_id = None;
        assert!(no_target.into_input().is_err());

        let mut bad_platform = form();
        bad_platform.platforms = vec!["myspace".to_string()];
        assert!(bad_platform.into_input().is_err());

        let mut bad_id = form();
        bad_id.campaign_id = Some("not-a-uuid".to_string());
        assert!(bad_id.into_input().is_err());
    }
}
