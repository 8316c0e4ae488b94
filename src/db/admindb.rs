// db/admindb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    campaignmodels::{CampaignInfluencer, CollaborationStatus},
    feedbackmodel::*,
};

#[async_trait]
pub trait ModerationExt {
    async fn create_feedback(
        &self,
        user_id: Uuid,
        subject: String,
        message: String,
    ) -> Result<Feedback, sqlx::Error>;

    async fn list_feedback(
        &self,
        status: Option<FeedbackStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedbackWithUser>, sqlx::Error>;

    /// Only open feedback can be resolved; `None` otherwise.
    async fn resolve_feedback(
        &self,
        feedback_id: Uuid,
        admin_id: Uuid,
        note: Option<String>,
    ) -> Result<Option<Feedback>, sqlx::Error>;

    async fn delete_feedback(&self, feedback_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_collaboration_by_id(
        &self,
        collaboration_id: Uuid,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error>;

    async fn set_collaboration_status(
        &self,
        collaboration_id: Uuid,
        status: CollaborationStatus,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error>;

    async fn delete_collaboration(&self, collaboration_id: Uuid) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl ModerationExt for DBClient {
    async fn create_feedback(
        &self,
        user_id: Uuid,
        subject: String,
        message: String,
    ) -> Result<Feedback, sqlx::Error> {
        sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (user_id, subject, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#
        )
        .bind(user_id)
        .bind(subject)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_feedback(
        &self,
        status: Option<FeedbackStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FeedbackWithUser>, sqlx::Error> {
        sqlx::query_as::<_, FeedbackWithUser>(
            r#"
            SELECT f.*, u.name AS user_name, u.email AS user_email
            FROM feedback f
            JOIN users u ON u.id = f.user_id
            WHERE ($1::feedback_status IS NULL OR f.status = $1)
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn resolve_feedback(
        &self,
        feedback_id: Uuid,
        admin_id: Uuid,
        note: Option<String>,
    ) -> Result<Option<Feedback>, sqlx::Error> {
        sqlx::query_as::<_, Feedback>(
            r#"
            UPDATE feedback
            SET status = 'resolved', resolution_note = $3, resolved_by = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING *
            "#
        )
        .bind(feedback_id)
        .bind(admin_id)
        .bind(note)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_feedback(&self, feedback_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_collaboration_by_id(
        &self,
        collaboration_id: Uuid,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error> {
        sqlx::query_as::<_, CampaignInfluencer>(
            "SELECT * FROM campaign_influencers WHERE id = $1"
        )
        .bind(collaboration_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_collaboration_status(
        &self,
        collaboration_id: Uuid,
        status: CollaborationStatus,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error> {
        sqlx::query_as::<_, CampaignInfluencer>(
            r#"
            UPDATE campaign_influencers
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(collaboration_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_collaboration(&self, collaboration_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaign_influencers WHERE id = $1")
            .bind(collaboration_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
