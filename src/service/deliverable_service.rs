// service/deliverable_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        campaigndb::CampaignExt,
        db::DBClient,
        deliverabledb::{DeliverableExt, NewContentSubmission, NewDeliverable},
    },
    models::{
        campaignmodels::{Campaign, CollaborationStatus},
        deliverablemodels::*,
        usermodel::User,
    },
    service::{
        error::ServiceError,
        media_store::MediaStore,
        subscription_service::{GatedAction, SubscriptionService},
    },
    utils::sanitize::{clean_optional, clean_text},
};

/// One uploaded file as read from the multipart body.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionTarget {
    Deliverable(Uuid),
    Campaign(Uuid),
}

#[derive(Debug, Clone)]
pub struct SubmitContentInput {
    pub target: SubmissionTarget,
    pub uploads: Vec<MediaUpload>,
    pub caption: String,
    pub content_type: Option<ContentType>,
    pub platforms: Vec<SocialPlatform>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub submission: ContentSubmission,
    pub deliverable: Option<Deliverable>,
}

#[derive(Debug, Clone)]
pub struct DefineDeliverableInput {
    pub influencer_id: Uuid,
    pub task_description: String,
    pub platform: SocialPlatform,
    pub content_type: ContentType,
    pub post_count: i32,
    pub reel_count: i32,
    pub video_count: i32,
    pub due_date: Option<DateTime<Utc>>,
}

pub fn validate_live_url(live_url: &str) -> Result<String, ServiceError> {
    let live_url = live_url.trim();
    if !(live_url.starts_with("https://") || live_url.starts_with("http://")) {
        return Err(ServiceError::Validation(
            "The live URL must be an http(s) link to the published post".to_string(),
        ));
    }
    Ok(live_url.to_string())
}

fn ensure_influencer_owns(user: &User, deliverable: &Deliverable) -> Result<(), ServiceError> {
    if deliverable.influencer_id != user.id {
        return Err(ServiceError::Forbidden(user.id, format!("deliverable {}", deliverable.id)));
    }
    Ok(())
}

fn ensure_brand_owns(user: &User, campaign: &Campaign) -> Result<(), ServiceError> {
    if campaign.brand_id != user.id {
        return Err(ServiceError::Forbidden(user.id, format!("campaign {}", campaign.id)));
    }
    Ok(())
}

/// Submission row written next to a deliverable; platform and content type
/// always come from the deliverable itself.
fn deliverable_submission_record(
    deliverable: &Deliverable,
    update: &DeliverableUpdate,
) -> NewContentSubmission {
    NewContentSubmission {
        influencer_id: deliverable.influencer_id,
        campaign_id: deliverable.campaign_id,
        deliverable_id: Some(deliverable.id),
        caption: update.caption.clone().unwrap_or_default(),
        content_type: deliverable.content_type,
        platforms: vec![deliverable.platform],
        media_urls: update.media_urls.clone(),
    }
}

#[derive(Clone)]
pub struct DeliverableService {
    db_client: Arc<DBClient>,
    media_store: Arc<dyn MediaStore>,
}

impl DeliverableService {
    pub fn new(db_client: Arc<DBClient>, media_store: Arc<dyn MediaStore>) -> Self {
        Self { db_client, media_store }
    }

    async fn load_deliverable(&self, deliverable_id: Uuid) -> Result<Deliverable, ServiceError> {
        self.db_client
            .get_deliverable(deliverable_id)
            .await?
            .ok_or(ServiceError::DeliverableNotFound(deliverable_id))
    }

    async fn load_campaign(&self, campaign_id: Uuid) -> Result<Campaign, ServiceError> {
        self.db_client
            .get_campaign(campaign_id)
            .await?
            .ok_or(ServiceError::CampaignNotFound(campaign_id))
    }

    async fn ensure_active_collaboration(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
    ) -> Result<(), ServiceError> {
        let collaboration = self
            .db_client
            .get_collaboration(campaign_id, influencer_id)
            .await?;

        match collaboration {
            Some(c) if c.status != CollaborationStatus::Rejected => Ok(()),
            _ => Err(ServiceError::Validation(
                "The influencer is not collaborating on this campaign".to_string(),
            )),
        }
    }

    /// Stores every upload or none of them.
    async fn store_media(&self, uploads: &[MediaUpload]) -> Result<Vec<String>, ServiceError> {
        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.media_store.store(&upload.file_name, &upload.bytes).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    self.discard_media(&urls).await;
                    return Err(e.into());
                }
            }
        }
        Ok(urls)
    }

    async fn discard_media(&self, urls: &[String]) {
        for url in urls {
            if let Err(e) = self.media_store.remove(url).await {
                tracing::warn!("Failed to remove orphaned media {}: {}", url, e);
            }
        }
    }

    pub async fn define_deliverable(
        &self,
        brand: &User,
        campaign_id: Uuid,
        input: DefineDeliverableInput,
    ) -> Result<Deliverable, ServiceError> {
        let campaign = self.load_campaign(campaign_id).await?;
        ensure_brand_owns(brand, &campaign)?;
        self.ensure_active_collaboration(campaign_id, input.influencer_id).await?;

        let task_description = clean_text(&input.task_description);
        if task_description.is_empty() {
            return Err(ServiceError::Validation("Task description is required".to_string()));
        }

        let deliverable = self
            .db_client
            .create_deliverable(NewDeliverable {
                campaign_id,
                influencer_id: input.influencer_id,
                task_description,
                platform: input.platform,
                content_type: input.content_type,
                post_count: input.post_count,
                reel_count: input.reel_count,
                video_count: input.video_count,
                due_date: input.due_date,
            })
            .await?;

        tracing::info!(
            "Brand {} defined deliverable {} for influencer {}",
            brand.id,
            deliverable.id,
            deliverable.influencer_id
        );
        Ok(deliverable)
    }

    async fn record_deliverable_submission(
        &self,
        deliverable: &Deliverable,
        content: SubmissionContent,
        now: DateTime<Utc>,
    ) -> Result<(ContentSubmission, Deliverable), ServiceError> {
        let update = deliverable.submit(&content, now)?;
        let record = deliverable_submission_record(deliverable, &update);

        self.db_client
            .submit_to_deliverable(deliverable.id, &update, record)
            .await?
            .ok_or_else(|| ServiceError::ConcurrentModification(format!("Deliverable {}", deliverable.id)))
    }

    pub async fn submit_content(
        &self,
        influencer: &User,
        input: SubmitContentInput,
    ) -> Result<SubmissionOutcome, ServiceError> {
        SubscriptionService::new(self.db_client.clone())
            .check_action(influencer, GatedAction::UploadContent)
            .await?;

        let caption = clean_text(&input.caption);
        let now = Utc::now();

        match input.target {
            SubmissionTarget::Deliverable(deliverable_id) => {
                let deliverable = self.load_deliverable(deliverable_id).await?;
                ensure_influencer_owns(influencer, &deliverable)?;

                // Validate against file names first so nothing is written for a doomed request.
                let preview = SubmissionContent {
                    media_urls: input.uploads.iter().map(|u| u.file_name.clone()).collect(),
                    caption: caption.clone(),
                    content_type: input.content_type,
                    platforms: input.platforms.clone(),
                };
                deliverable.submit(&preview, now)?;

                let media_urls = self.store_media(&input.uploads).await?;
                let recorded = self
                    .record_deliverable_submission(
                        &deliverable,
                        SubmissionContent {
                            media_urls: media_urls.clone(),
                            ..preview
                        },
                        now,
                    )
                    .await;

                if recorded.is_err() {
                    self.discard_media(&media_urls).await;
                }
                let (submission, updated) = recorded?;

                tracing::info!(
                    "Influencer {} submitted deliverable {} (version {})",
                    influencer.id,
                    deliverable_id,
                    updated.version
                );

                Ok(SubmissionOutcome {
                    submission,
                    deliverable: Some(updated),
                })
            }
            SubmissionTarget::Campaign(campaign_id) => {
                self.load_campaign(campaign_id).await?;
                self.ensure_active_collaboration(campaign_id, influencer.id).await?;

                if input.uploads.is_empty() {
                    return Err(ServiceError::Validation("At least one media file is required".to_string()));
                }
                if caption.is_empty() {
                    return Err(ServiceError::Validation("Caption is required".to_string()));
                }
                let content_type = input
                    .content_type
                    .ok_or_else(|| ServiceError::Validation("Content type is required".to_string()))?;
                if input.platforms.is_empty() {
                    return Err(ServiceError::Validation("Select at least one platform".to_string()));
                }

                let media_urls = self.store_media(&input.uploads).await?;
                let recorded = self
                    .db_client
                    .create_content_submission(NewContentSubmission {
                        influencer_id: influencer.id,
                        campaign_id,
                        deliverable_id: None,
                        caption,
                        content_type,
                        platforms: input.platforms,
                        media_urls: media_urls.clone(),
                    })
                    .await;

                if recorded.is_err() {
                    self.discard_media(&media_urls).await;
                }
                let submission = recorded?;

                tracing::info!("Influencer {} submitted content to campaign {}", influencer.id, campaign_id);

                Ok(SubmissionOutcome {
                    submission,
                    deliverable: None,
                })
            }
        }
    }

    pub async fn review(
        &self,
        brand: &User,
        deliverable_id: Uuid,
        action: ReviewAction,
        feedback: Option<String>,
        manual_override: bool,
    ) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load_deliverable(deliverable_id).await?;
        let campaign = self.load_campaign(deliverable.campaign_id).await?;
        ensure_brand_owns(brand, &campaign)?;

        let feedback = clean_optional(feedback.as_deref());
        let Some(update) = deliverable.review(
            action,
            brand.id,
            feedback.as_deref(),
            manual_override,
            Utc::now(),
        )?
        else {
            return Ok(deliverable);
        };

        let reviewed = self
            .db_client
            .apply_deliverable_update(deliverable_id, &update)
            .await?
            .ok_or_else(|| ServiceError::ConcurrentModification(format!("Deliverable {}", deliverable_id)))?;

        tracing::info!(
            "Brand {} moved deliverable {} from {} to {}",
            brand.id,
            deliverable_id,
            update.expected_status.to_str(),
            reviewed.status.to_str()
        );
        Ok(reviewed)
    }

    pub async fn publish(
        &self,
        influencer: &User,
        deliverable_id: Uuid,
        live_url: &str,
    ) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load_deliverable(deliverable_id).await?;
        ensure_influencer_owns(influencer, &deliverable)?;

        let live_url = validate_live_url(live_url)?;
        let update = deliverable.publish(&live_url, Utc::now())?;

        let published = self
            .db_client
            .apply_deliverable_update(deliverable_id, &update)
            .await?
            .ok_or_else(|| ServiceError::ConcurrentModification(format!("Deliverable {}", deliverable_id)))?;

        tracing::info!("Influencer {} published deliverable {}", influencer.id, deliverable_id);
        Ok(published)
    }

    /// Visible to the assigned influencer, the campaign's brand and admins.
    pub async fn get_for_user(&self, user: &User, deliverable_id: Uuid) -> Result<Deliverable, ServiceError> {
        let deliverable = self.load_deliverable(deliverable_id).await?;
        if user.is_admin() || deliverable.influencer_id == user.id {
            return Ok(deliverable);
        }

        let campaign = self.load_campaign(deliverable.campaign_id).await?;
        ensure_brand_owns(user, &campaign)?;
        Ok(deliverable)
    }

    pub async fn influencer_deliverables(&self, influencer: &User) -> Result<Vec<Deliverable>, ServiceError> {
        Ok(self.db_client.get_influencer_deliverables(influencer.id).await?)
    }

    pub async fn campaign_deliverables(
        &self,
        brand: &User,
        campaign_id: Uuid,
    ) -> Result<Vec<Deliverable>, ServiceError> {
        let campaign = self.load_campaign(campaign_id).await?;
        if !brand.is_admin() {
            ensure_brand_owns(brand, &campaign)?;
        }
        Ok(self.db_client.get_campaign_deliverables(campaign_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sqlx::{types::BigDecimal, PgPool};

    use crate::{
        db::{fixtures::insert_user, userdb::UserExt},
        models::{deliverablemodels::tests::pending_deliverable, usermodel::UserType},
        service::plan_maintenance::seed_default_plans,
    };

    /// Remembers what was stored and removed. Optionally fails on the n-th
    /// store, or bumps a deliverable's version mid-upload to lose the race.
    #[derive(Default)]
    struct RecordingStore {
        fail_on: Option<usize>,
        race: Option<(PgPool, Uuid)>,
        stored: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn store(&self, file_name: &str, _bytes: &[u8]) -> Result<String, std::io::Error> {
            if let Some((pool, deliverable_id)) = &self.race {
                sqlx::query("UPDATE deliverables SET version = version + 1 WHERE id = $1")
                    .bind(deliverable_id)
                    .execute(pool)
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            }

            let mut stored = self.stored.lock().unwrap();
            if self.fail_on == Some(stored.len()) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            let url = format!("/media/{}-{}", stored.len(), file_name);
            stored.push(url.clone());
            Ok(url)
        }

        async fn remove(&self, url: &str) -> Result<(), std::io::Error> {
            self.removed.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn uploads(names: &[&str]) -> Vec<MediaUpload> {
        names
            .iter()
            .map(|name| MediaUpload {
                file_name: name.to_string(),
                bytes: vec![1, 2, 3],
            })
            .collect()
    }

    fn user(id: Uuid, user_type: UserType) -> User {
        User {
            id,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            user_type,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn live_url_must_be_http() {
        assert_eq!(
            validate_live_url("  https://instagram.com/p/abc ").unwrap(),
            "https://instagram.com/p/abc"
        );
        assert!(validate_live_url("").is_err());
        assert!(validate_live_url("instagram.com/p/abc").is_err());
        assert!(validate_live_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn only_the_assigned_influencer_owns_a_deliverable() {
        let deliverable = pending_deliverable();
        let owner = user(deliverable.influencer_id, UserType::Influencer);
        let stranger = user(Uuid::new_v4(), UserType::Influencer);

        assert!(ensure_influencer_owns(&owner, &deliverable).is_ok());
        let err = ensure_influencer_owns(&stranger, &deliverable).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn submission_record_uses_the_deliverable_platform_and_type() {
        let deliverable = pending_deliverable();
        let update = deliverable
            .submit(
                &SubmissionContent {
                    media_urls: vec!["/media/1-reel.mp4".to_string()],
                    caption: "Out now".to_string(),
                    content_type: None,
                    platforms: vec![],
                },
                Utc::now(),
            )
            .unwrap();

        let record = deliverable_submission_record(&deliverable, &update);
        assert_eq!(record.deliverable_id, Some(deliverable.id));
        assert_eq!(record.platforms, vec![deliverable.platform]);
        assert_eq!(record.content_type, deliverable.content_type);
        assert_eq!(record.media_urls, vec!["/media/1-reel.mp4".to_string()]);
        assert_eq!(record.caption, "Out now");
    }

    #[tokio::test]
    async fn partial_uploads_are_rolled_back() {
        let pool = PgPool::connect_lazy("postgres://localhost/collabsync").unwrap();
        let store = Arc::new(RecordingStore {
            fail_on: Some(1),
            ..Default::default()
        });
        let service = DeliverableService::new(Arc::new(DBClient::new(pool)), store.clone());

        let err = service
            .store_media(&uploads(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(*store.removed.lock().unwrap(), vec!["/media/0-a.jpg".to_string()]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn lost_submit_race_removes_stored_media(pool: PgPool) {
        let db = Arc::new(DBClient::new(pool.clone()));
        seed_default_plans(&db).await.unwrap();

        let brand = insert_user(&pool, UserType::Brand).await;
        let influencer_id = insert_user(&pool, UserType::Influencer).await;
        let influencer = db.get_user(influencer_id).await.unwrap().unwrap();

        let campaign = db
            .create_campaign(brand, "Launch".to_string(), None, BigDecimal::from(500), None, None)
            .await
            .unwrap();
        db.create_collaboration(campaign.id, influencer_id, BigDecimal::from(10))
            .await
            .unwrap();
        let deliverable = db
            .create_deliverable(NewDeliverable {
                campaign_id: campaign.id,
                influencer_id,
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

        let store = Arc::new(RecordingStore {
            race: Some((pool.clone(), deliverable.id)),
            ..Default::default()
        });
        let service = DeliverableService::new(db.clone(), store.clone());

        let err = service
            .submit_content(
                &influencer,
                SubmitContentInput {
                    target: SubmissionTarget::Deliverable(deliverable.id),
                    uploads: uploads(&["post.jpg", "alt.jpg"]),
                    caption: "Launch day".to_string(),
                    content_type: Some(ContentType::Post),
                    platforms: vec![SocialPlatform::Instagram],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ConcurrentModification(_)));
        let stored = store.stored.lock().unwrap().clone();
        assert_eq!(stored.len(), 2);
        assert_eq!(*store.removed.lock().unwrap(), stored);

        let unchanged = db.get_deliverable(deliverable.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, DeliverableStatus::Pending);
    }
}
