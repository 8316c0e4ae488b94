use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::deliverablemodels::*;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewDeliverableDto {
    pub deliverable_id: Uuid,
    pub action: ReviewAction,

    #[validate(length(max = 2000, message = "Feedback is too long"))]
    pub feedback: Option<String>,

    #[serde(default, rename = "override")]
    pub manual_override: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PublishDeliverableDto {
    #[validate(length(min = 1, max = 2048, message = "Live URL is required"))]
    pub live_url: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DefineDeliverableDto {
    pub influencer_id: Uuid,

    #[validate(length(min = 1, max = 2000, message = "Task description is required"))]
    pub task_description: String,

    pub platform: SocialPlatform,
    pub content_type: ContentType,

    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub post_count: i32,

    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub reel_count: i32,

    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub video_count: i32,

    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverableResponseDto {
    pub status: String,
    pub data: Deliverable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverableListResponseDto {
    pub status: String,
    pub results: usize,
    pub data: Vec<Deliverable>,
}
