use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::feedbackmodel::FeedbackStatus;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ApprovePaymentDto {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RejectPaymentDto {
    #[validate(length(min = 1, max = 500, message = "A rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateFeedbackDto {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveFeedbackDto {
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQueryDto {
    pub status: Option<FeedbackStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
