// db/deliverabledb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::deliverablemodels::*;

#[derive(Debug, Clone)]
pub struct NewDeliverable {
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub task_description: String,
    pub platform: SocialPlatform,
    pub content_type: ContentType,
    pub post_count: i32,
    pub reel_count: i32,
    pub video_count: i32,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewContentSubmission {
    pub influencer_id: Uuid,
    pub campaign_id: Uuid,
    pub deliverable_id: Option<Uuid>,
    pub caption: String,
    pub content_type: ContentType,
    pub platforms: Vec<SocialPlatform>,
    pub media_urls: Vec<String>,
}

#[async_trait]
pub trait DeliverableExt {
    async fn create_deliverable(&self, deliverable: NewDeliverable) -> Result<Deliverable, sqlx::Error>;

    async fn get_deliverable(&self, deliverable_id: Uuid) -> Result<Option<Deliverable>, sqlx::Error>;

    async fn get_campaign_deliverables(&self, campaign_id: Uuid) -> Result<Vec<Deliverable>, sqlx::Error>;

    async fn get_influencer_deliverables(&self, influencer_id: Uuid) -> Result<Vec<Deliverable>, sqlx::Error>;

    /// Writes the update only if status and version still match what the
    /// update was computed from. `None` means another write won.
    async fn apply_deliverable_update(
        &self,
        deliverable_id: Uuid,
        update: &DeliverableUpdate,
    ) -> Result<Option<Deliverable>, sqlx::Error>;

    async fn create_content_submission(
        &self,
        submission: NewContentSubmission,
    ) -> Result<ContentSubmission, sqlx::Error>;

    /// Records the submission and moves the deliverable in one transaction.
    async fn submit_to_deliverable(
        &self,
        deliverable_id: Uuid,
        update: &DeliverableUpdate,
        submission: NewContentSubmission,
    ) -> Result<Option<(ContentSubmission, Deliverable)>, sqlx::Error>;

    async fn count_submissions_since(
        &self,
        influencer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;
}

const UPDATE_DELIVERABLE_SQL: &str = r#"
    UPDATE deliverables
    SET status = $4,
        content_url = $5,
        media_urls = $6,
        caption = $7,
        submitted_at = $8,
        reviewed_by = $9,
        reviewed_at = $10,
        review_feedback = $11,
        published_at = $12,
        version = version + 1,
        updated_at = NOW()
    WHERE id = $1 AND status = $2 AND version = $3
    RETURNING *
"#;

const INSERT_SUBMISSION_SQL: &str = r#"
    INSERT INTO content_submissions
    (influencer_id, campaign_id, deliverable_id, caption, content_type, platforms, media_urls)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    RETURNING *
"#;

fn platform_strings(platforms: &[SocialPlatform]) -> Vec<String> {
    platforms.iter().map(|p| p.to_str().to_string()).collect()
}

async fn run_update<'c, E>(
    executor: E,
    deliverable_id: Uuid,
    update: &DeliverableUpdate,
) -> Result<Option<Deliverable>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, Deliverable>(UPDATE_DELIVERABLE_SQL)
        .bind(deliverable_id)
        .bind(update.expected_status)
        .bind(update.expected_version)
        .bind(update.status)
        .bind(update.content_url.clone())
        .bind(update.media_urls.clone())
        .bind(update.caption.clone())
        .bind(update.submitted_at)
        .bind(update.reviewed_by)
        .bind(update.reviewed_at)
        .bind(update.review_feedback.clone())
        .bind(update.published_at)
        .fetch_optional(executor)
        .await
}

#[async_trait]
impl DeliverableExt for DBClient {
    async fn create_deliverable(&self, deliverable: NewDeliverable) -> Result<Deliverable, sqlx::Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            INSERT INTO deliverables
            (campaign_id, influencer_id, task_description, platform, content_type,
             post_count, reel_count, video_count, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#
        )
        .bind(deliverable.campaign_id)
        .bind(deliverable.influencer_id)
        .bind(deliverable.task_description)
        .bind(deliverable.platform)
        .bind(deliverable.content_type)
        .bind(deliverable.post_count)
        .bind(deliverable.reel_count)
        .bind(deliverable.video_count)
        .bind(deliverable.due_date)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_deliverable(&self, deliverable_id: Uuid) -> Result<Option<Deliverable>, sqlx::Error> {
        sqlx::query_as::<_, Deliverable>("SELECT * FROM deliverables WHERE id = $1")
            .bind(deliverable_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_campaign_deliverables(&self, campaign_id: Uuid) -> Result<Vec<Deliverable>, sqlx::Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            SELECT * FROM deliverables
            WHERE campaign_id = $1
            ORDER BY created_at ASC
            "#
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_influencer_deliverables(&self, influencer_id: Uuid) -> Result<Vec<Deliverable>, sqlx::Error> {
        sqlx::query_as::<_, Deliverable>(
            r#"
            SELECT * FROM deliverables
            WHERE influencer_id = $1
            ORDER BY due_date ASC NULLS LAST, created_at DESC
            "#
        )
        .bind(influencer_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn apply_deliverable_update(
        &self,
        deliverable_id: Uuid,
        update: &DeliverableUpdate,
    ) -> Result<Option<Deliverable>, sqlx::Error> {
        run_update(&self.pool, deliverable_id, update).await
    }

    async fn create_content_submission(
        &self,
        submission: NewContentSubmission,
    ) -> Result<ContentSubmission, sqlx::Error> {
        sqlx::query_as::<_, ContentSubmission>(INSERT_SUBMISSION_SQL)
            .bind(submission.influencer_id)
            .bind(submission.campaign_id)
            .bind(submission.deliverable_id)
            .bind(submission.caption)
            .bind(submission.content_type)
            .bind(platform_strings(&submission.platforms))
            .bind(submission.media_urls)
            .fetch_one(&self.pool)
            .await
    }

    async fn submit_to_deliverable(
        &self,
        deliverable_id: Uuid,
        update: &DeliverableUpdate,
        submission: NewContentSubmission,
    ) -> Result<Option<(ContentSubmission, Deliverable)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let Some(deliverable) = run_update(&mut *tx, deliverable_id, update).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let record = sqlx::query_as::<_, ContentSubmission>(INSERT_SUBMISSION_SQL)
            .bind(submission.influencer_id)
            .bind(submission.campaign_id)
            .bind(submission.deliverable_id)
            .bind(submission.caption)
            .bind(submission.content_type)
            .bind(platform_strings(&submission.platforms))
            .bind(submission.media_urls)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((record, deliverable)))
    }

    async fn count_submissions_since(
        &self,
        influencer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM content_submissions
            WHERE influencer_id = $1 AND created_at >= $2
            "#
        )
        .bind(influencer_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::{types::BigDecimal, PgPool};

    use crate::{
        db::{campaigndb::CampaignExt, fixtures::insert_user},
        models::usermodel::UserType,
    };

    async fn seeded_deliverable(db: &DBClient) -> (Uuid, Deliverable) {
        let brand = insert_user(&db.pool, UserType::Brand).await;
        let influencer = insert_user(&db.pool, UserType::Influencer).await;
        let campaign = db
            .create_campaign(brand, "Launch".to_string(), None, BigDecimal::from(500), None, None)
            .await
            .unwrap();
        db.create_collaboration(campaign.id, influencer, BigDecimal::from(10))
            .await
            .unwrap();

        let deliverable = db
            .create_deliverable(NewDeliverable {
                campaign_id: campaign.id,
                influencer_id: influencer,
                task_description: "One launch post".to_string(),
                platform: SocialPlatform::Instagram,
                content_type: ContentType::Post,
                post_count: 1,
                reel_count: 0,
                video_count: 0,
                due_date: None,
            })
            .await
            .unwrap();

        (brand, deliverable)
    }

    fn launch_post() -> SubmissionContent {
        SubmissionContent {
            media_urls: vec!["/media/launch.jpg".to_string()],
            caption: "Launch day".to_string(),
            content_type: None,
            platforms: vec![],
        }
    }

    #[test]
    fn platforms_are_stored_as_lowercase_names() {
        let stored = platform_strings(&[SocialPlatform::Youtube, SocialPlatform::Tiktok]);
        assert_eq!(stored, vec!["youtube", "tiktok"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stale_updates_are_not_applied(pool: PgPool) {
        let db = DBClient::new(pool);
        let (brand, deliverable) = seeded_deliverable(&db).await;
        let now = Utc::now();

        let submit = deliverable.submit(&launch_post(), now).unwrap();
        let submitted = db
            .apply_deliverable_update(deliverable.id, &submit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(submitted.status, DeliverableStatus::Submitted);
        assert_eq!(submitted.version, deliverable.version + 1);
        assert_eq!(submitted.content_url.as_deref(), Some("/media/launch.jpg"));

        // Replaying the same update finds neither the old status nor the old version.
        assert!(db
            .apply_deliverable_update(deliverable.id, &submit)
            .await
            .unwrap()
            .is_none());

        // Right status, stale version.
        let approve = submitted
            .review(ReviewAction::Approve, brand, None, false, now)
            .unwrap()
            .unwrap();
        let mut stale = approve.clone();
        stale.expected_version = deliverable.version;
        assert!(db
            .apply_deliverable_update(deliverable.id, &stale)
            .await
            .unwrap()
            .is_none());

        let stored = db.get_deliverable(deliverable.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeliverableStatus::Submitted);
        assert_eq!(stored.version, submitted.version);

        let approved = db
            .apply_deliverable_update(deliverable.id, &approve)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, DeliverableStatus::Approved);
        assert_eq!(approved.reviewed_by, Some(brand));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn lost_submission_race_records_nothing(pool: PgPool) {
        let db = DBClient::new(pool);
        let (_, deliverable) = seeded_deliverable(&db).await;
        let now = Utc::now();

        let mut stale = deliverable.submit(&launch_post(), now).unwrap();
        stale.expected_version += 1;

        let record = NewContentSubmission {
            influencer_id: deliverable.influencer_id,
            campaign_id: deliverable.campaign_id,
            deliverable_id: Some(deliverable.id),
            caption: "Launch day".to_string(),
            content_type: ContentType::Post,
            platforms: vec![SocialPlatform::Instagram],
            media_urls: vec!["/media/launch.jpg".to_string()],
        };

        let outcome = db
            .submit_to_deliverable(deliverable.id, &stale, record)
            .await
            .unwrap();
        assert!(outcome.is_none());

        let recorded = db
            .count_submissions_since(deliverable.influencer_id, now - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(recorded, 0);

        let stored = db.get_deliverable(deliverable.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeliverableStatus::Pending);
        assert!(stored.content_url.is_none());
    }
}
