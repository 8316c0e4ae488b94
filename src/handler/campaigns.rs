use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{campaigndtos::*, deliverabledtos::DefineDeliverableDto},
    error::HttpError,
    handler::service_error,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserType,
    service::{
        campaign_service::{CampaignService, NewCampaignInput},
        deliverable_service::{DefineDeliverableInput, DeliverableService},
    },
    AppState,
};

pub fn campaign_handler() -> Router {
    Router::new()
        .route("/", get(get_my_campaigns).post(create_campaign))
        .route("/:campaign_id/invites", post(invite_influencer))
        .route(
            "/:campaign_id/deliverables",
            get(get_campaign_deliverables).post(define_deliverable),
        )
        .route("/:campaign_id/metrics", get(get_campaign_metrics))
        .layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserType::Brand, UserType::Admin])
        }))
}

pub async fn create_campaign(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateCampaignDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let campaign = CampaignService::new(app_state.db_client.clone())
        .create_campaign(
            &auth.user,
            NewCampaignInput {
                title: body.title,
                description: body.description,
                budget: body.budget,
                start_date: body.start_date,
                end_date: body.end_date,
            },
        )
        .await
        .map_err(service_error("campaigns/create", auth.user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": campaign
        })),
    ))
}

pub async fn get_my_campaigns(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let campaigns = CampaignService::new(app_state.db_client.clone())
        .brand_campaigns(&auth.user)
        .await
        .map_err(service_error("campaigns/list", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": campaigns.len(),
        "data": campaigns
    })))
}

pub async fn invite_influencer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<InviteInfluencerDto>,
) -> Result<impl IntoResponse, HttpError> {
    let collaboration = CampaignService::new(app_state.db_client.clone())
        .invite_influencer(&auth.user, campaign_id, body.influencer_id, body.commission_rate)
        .await
        .map_err(service_error("campaigns/invite", auth.user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": collaboration
        })),
    ))
}

pub async fn define_deliverable(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(campaign_id): Path<Uuid>,
    Json(body): Json<DefineDeliverableDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let deliverable = DeliverableService::new(app_state.db_client.clone(), app_state.media_store.clone())
        .define_deliverable(
            &auth.user,
            campaign_id,
            DefineDeliverableInput {
                influencer_id: body.influencer_id,
                task_description: body.task_description,
                platform: body.platform,
                content_type: body.content_type,
                post_count: body.post_count,
                reel_count: body.reel_count,
                video_count: body.video_count,
                due_date: body.due_date,
            },
        )
        .await
        .map_err(service_error("campaigns/deliverables/create", auth.user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": deliverable
        })),
    ))
}

pub async fn get_campaign_deliverables(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let deliverables = DeliverableService::new(app_state.db_client.clone(), app_state.media_store.clone())
        .campaign_deliverables(&auth.user, campaign_id)
        .await
        .map_err(service_error("campaigns/deliverables", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": deliverables.len(),
        "data": deliverables
    })))
}

pub async fn get_campaign_metrics(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(campaign_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let performance = CampaignService::new(app_state.db_client.clone())
        .performance(&auth.user, campaign_id)
        .await
        .map_err(service_error("campaigns/metrics", auth.user.id))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": performance
    })))
}
