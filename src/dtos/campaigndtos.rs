use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateCampaignDto {
    #[validate(length(min = 1, max = 200, message = "Campaign title is required"))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub budget: BigDecimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InviteInfluencerDto {
    pub influencer_id: Uuid,
    pub commission_rate: BigDecimal,
}
