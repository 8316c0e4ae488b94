use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{admindb::ModerationExt, db::DBClient},
    models::{
        campaignmodels::{CampaignInfluencer, CollaborationStatus},
        feedbackmodel::{Feedback, FeedbackStatus, FeedbackWithUser},
        usermodel::User,
    },
    service::error::ServiceError,
    utils::sanitize::{clean_optional, clean_text},
};

pub const MAX_FEEDBACK_PAGE: i64 = 100;

pub fn page_bounds(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(20).clamp(1, MAX_FEEDBACK_PAGE);
    let page = page.unwrap_or(1).max(1);
    (limit, (page - 1).saturating_mul(limit))
}

#[derive(Debug, Clone)]
pub struct ModerationService {
    db_client: Arc<DBClient>,
}

impl ModerationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn submit_feedback(
        &self,
        user: &User,
        subject: &str,
        message: &str,
    ) -> Result<Feedback, ServiceError> {
        let subject = clean_text(subject);
        let message = clean_text(message);
        if subject.is_empty() || message.is_empty() {
            return Err(ServiceError::Validation("Subject and message are required".to_string()));
        }

        Ok(self.db_client.create_feedback(user.id, subject, message).await?)
    }

    pub async fn list_feedback(
        &self,
        status: Option<FeedbackStatus>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<FeedbackWithUser>, ServiceError> {
        let (limit, offset) = page_bounds(page, limit);
        Ok(self.db_client.list_feedback(status, limit, offset).await?)
    }

    pub async fn resolve_feedback(
        &self,
        admin: &User,
        feedback_id: Uuid,
        note: Option<String>,
    ) -> Result<Feedback, ServiceError> {
        let resolved = self
            .db_client
            .resolve_feedback(feedback_id, admin.id, clean_optional(note.as_deref()))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Open feedback {}", feedback_id)))?;

        tracing::info!("Admin {} resolved feedback {}", admin.id, feedback_id);
        Ok(resolved)
    }

    pub async fn delete_feedback(&self, admin: &User, feedback_id: Uuid) -> Result<(), ServiceError> {
        if self.db_client.delete_feedback(feedback_id).await? == 0 {
            return Err(ServiceError::NotFound(format!("Feedback {}", feedback_id)));
        }
        tracing::info!("Admin {} deleted feedback {}", admin.id, feedback_id);
        Ok(())
    }

    pub async fn set_collaboration_status(
        &self,
        admin: &User,
        collaboration_id: Uuid,
        status: CollaborationStatus,
    ) -> Result<CampaignInfluencer, ServiceError> {
        let current = self
            .db_client
            .get_collaboration_by_id(collaboration_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Collaboration {}", collaboration_id)))?;

        if current.status == status {
            return Ok(current);
        }

        let collaboration = self
            .db_client
            .set_collaboration_status(collaboration_id, status)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Collaboration {}", collaboration_id)))?;

        tracing::info!(
            "Admin {} set collaboration {} to {}",
            admin.id,
            collaboration_id,
            status.to_str()
        );
        Ok(collaboration)
    }

    pub async fn delete_collaboration(
        &self,
        admin: &User,
        collaboration_id: Uuid,
    ) -> Result<(), ServiceError> {
        if self.db_client.delete_collaboration(collaboration_id).await? == 0 {
            return Err(ServiceError::NotFound(format!("Collaboration {}", collaboration_id)));
        }
        tracing::info!("Admin {} deleted collaboration {}", admin.id, collaboration_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(3), Some(10)), (10, 20));
        assert_eq!(page_bounds(Some(0), Some(1_000)), (MAX_FEEDBACK_PAGE, 0));
        assert_eq!(page_bounds(Some(-2), Some(0)), (1, 0));
        assert_eq!(page_bounds(Some(i64::MAX), Some(100)), (100, i64::MAX));
        assert_eq!(page_bounds(Some(i64::MAX), None), (20, i64::MAX));
    }
}
