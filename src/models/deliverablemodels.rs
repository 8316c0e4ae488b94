// models/deliverablemodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "deliverable_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliverableStatus {
    Pending,
    Submitted,
    Approved,
    Rejected,
    Published,
}

impl DeliverableStatus {
    pub fn to_str(&self) -> &str {
        match self {
            DeliverableStatus::Pending => "pending",
            DeliverableStatus::Submitted => "submitted",
            DeliverableStatus::Approved => "approved",
            DeliverableStatus::Rejected => "rejected",
            DeliverableStatus::Published => "published",
        }
    }

    /// Every state past `pending` carries a content URL.
    pub fn has_content(&self) -> bool {
        !matches!(self, DeliverableStatus::Pending)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "social_platform", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Instagram,
    Tiktok,
    Youtube,
    Facebook,
    Twitter,
}

impl SocialPlatform {
    pub fn to_str(&self) -> &str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Tiktok => "tiktok",
            SocialPlatform::Youtube => "youtube",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Twitter => "twitter",
        }
    }

    pub fn parse(raw: &str) -> Option<SocialPlatform> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "instagram" => Some(SocialPlatform::Instagram),
            "tiktok" => Some(SocialPlatform::Tiktok),
            "youtube" => Some(SocialPlatform::Youtube),
            "facebook" => Some(SocialPlatform::Facebook),
            "twitter" | "x" => Some(SocialPlatform::Twitter),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "content_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Reel,
    Video,
    Story,
}

impl ContentType {
    pub fn to_str(&self) -> &str {
        match self {
            ContentType::Post => "post",
            ContentType::Reel => "reel",
            ContentType::Video => "video",
            ContentType::Story => "story",
        }
    }

    pub fn parse(raw: &str) -> Option<ContentType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "post" => Some(ContentType::Post),
            "reel" => Some(ContentType::Reel),
            "video" => Some(ContentType::Video),
            "story" => Some(ContentType::Story),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Deliverable {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub task_description: String,
    pub platform: SocialPlatform,
    pub content_type: ContentType,
    pub post_count: i32,
    pub reel_count: i32,
    pub video_count: i32,
    pub status: DeliverableStatus,
    pub content_url: Option<String>,
    pub media_urls: Vec<String>,
    pub caption: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_feedback: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ContentSubmission {
    pub id: Uuid,
    pub influencer_id: Uuid,
    pub campaign_id: Uuid,
    pub deliverable_id: Option<Uuid>,
    pub caption: String,
    pub content_type: ContentType,
    pub platforms: Vec<String>,
    pub media_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Uploaded content as handed to the state machine.
#[derive(Debug, Clone)]
pub struct SubmissionContent {
    pub media_urls: Vec<String>,
    pub caption: String,
    pub content_type: Option<ContentType>,
    pub platforms: Vec<SocialPlatform>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Cannot {action} a deliverable in status {from:?}")]
    InvalidTransition {
        from: DeliverableStatus,
        action: &'static str,
    },

    #[error("{0}")]
    Validation(String),
}

/// Full set of mutable columns after a transition. Applied with a
/// compare-and-swap on `expected_status` and `expected_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverableUpdate {
    pub expected_status: DeliverableStatus,
    pub expected_version: i32,
    pub status: DeliverableStatus,
    pub content_url: Option<String>,
    pub media_urls: Vec<String>,
    pub caption: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_feedback: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Deliverable {
    pub fn content_invariant_holds(&self) -> bool {
        let has_url = self.content_url.as_deref().map(|u| !u.is_empty()).unwrap_or(false);
        has_url == self.status.has_content()
    }

    fn base_update(&self) -> DeliverableUpdate {
        DeliverableUpdate {
            expected_status: self.status,
            expected_version: self.version,
            status: self.status,
            content_url: self.content_url.clone(),
            media_urls: self.media_urls.clone(),
            caption: self.caption.clone(),
            submitted_at: self.submitted_at,
            reviewed_by: self.reviewed_by,
            reviewed_at: self.reviewed_at,
            review_feedback: self.review_feedback.clone(),
            published_at: self.published_at,
        }
    }

    /// pending|rejected -> submitted. Platform and content type are locked
    /// to the deliverable's own values.
    pub fn submit(
        &self,
        content: &SubmissionContent,
        now: DateTime<Utc>,
    ) -> Result<DeliverableUpdate, TransitionError> {
        if !matches!(self.status, DeliverableStatus::Pending | DeliverableStatus::Rejected) {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                action: "submit",
            });
        }

        let media_urls: Vec<String> = content
            .media_urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        if media_urls.is_empty() {
            return Err(TransitionError::Validation(
                "At least one media file is required".to_string(),
            ));
        }

        let caption = content.caption.trim();
        if caption.is_empty() {
            return Err(TransitionError::Validation("Caption is required".to_string()));
        }

        if let Some(content_type) = content.content_type {
            if content_type != self.content_type {
                return Err(TransitionError::Validation(format!(
                    "This deliverable expects a {} but a {} was submitted",
                    self.content_type.to_str(),
                    content_type.to_str()
                )));
            }
        }

        if let Some(other) = content.platforms.iter().find(|p| **p != self.platform) {
            return Err(TransitionError::Validation(format!(
                "This deliverable is for {} and cannot be submitted to {}",
                self.platform.to_str(),
                other.to_str()
            )));
        }

        let mut update = self.base_update();
        update.status = DeliverableStatus::Submitted;
        update.content_url = media_urls.first().cloned();
        update.media_urls = media_urls;
        update.caption = Some(caption.to_string());
        update.submitted_at = Some(now);
        update.reviewed_by = None;
        update.reviewed_at = None;
        update.review_feedback = None;
        Ok(update)
    }

    /// Brand review. Returns `Ok(None)` when an identical approve by the same
    /// reviewer has already been applied.
    pub fn review(
        &self,
        action: ReviewAction,
        reviewer: Uuid,
        feedback: Option<&str>,
        manual_override: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<DeliverableUpdate>, TransitionError> {
        let feedback = feedback.map(str::trim).filter(|f| !f.is_empty());

        if action == ReviewAction::Reject && feedback.is_none() {
            return Err(TransitionError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }

        if action == ReviewAction::Approve
            && self.status == DeliverableStatus::Approved
            && self.reviewed_by == Some(reviewer)
            && self.review_feedback.as_deref() == feedback
        {
            return Ok(None);
        }

        let allowed = match self.status {
            DeliverableStatus::Submitted => true,
            DeliverableStatus::Rejected | DeliverableStatus::Approved => manual_override,
            DeliverableStatus::Pending | DeliverableStatus::Published => false,
        };

        if !allowed {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                action: match action {
                    ReviewAction::Approve => "approve",
                    ReviewAction::Reject => "reject",
                },
            });
        }

        let mut update = self.base_update();
        update.status = match action {
            ReviewAction::Approve => DeliverableStatus::Approved,
            ReviewAction::Reject => DeliverableStatus::Rejected,
        };
        update.reviewed_by = Some(reviewer);
        update.reviewed_at = Some(now);
        update.review_feedback = feedback.map(|f| f.to_string());
        Ok(Some(update))
    }

    /// approved -> published; the live URL replaces the content URL.
    pub fn publish(&self, live_url: &str, now: DateTime<Utc>) -> Result<DeliverableUpdate, TransitionError> {
        if self.status != DeliverableStatus::Approved {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                action: "publish",
            });
        }

        let live_url = live_url.trim();
        if live_url.is_empty() {
            return Err(TransitionError::Validation("A live content URL is required".to_string()));
        }

        let mut update = self.base_update();
        update.status = DeliverableStatus::Published;
        update.content_url = Some(live_url.to_string());
        update.published_at = Some(now);
        Ok(update)
    }

    /// In-memory application of an update, mirroring the SQL write.
    pub fn apply(&self, update: &DeliverableUpdate) -> Deliverable {
        Deliverable {
            status: update.status,
            content_url: update.content_url.clone(),
            media_urls: update.media_urls.clone(),
            caption: update.caption.clone(),
            submitted_at: update.submitted_at,
            reviewed_by: update.reviewed_by,
            reviewed_at: update.reviewed_at,
            review_feedback: update.review_feedback.clone(),
            published_at: update.published_at,
            version: self.version + 1,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn pending_deliverable() -> Deliverable {
        Deliverable {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            influencer_id: Uuid::new_v4(),
            task_description: "One launch reel".to_string(),
            platform: SocialPlatform::Instagram,
            content_type: ContentType::Reel,
            post_count: 0,
            reel_count: 1,
            video_count: 0,
            status: DeliverableStatus::Pending,
            content_url: None,
            media_urls: vec![],
            caption: None,
            submitted_at: None,
            reviewed_by: None,
            reviewed_at: None,
            review_feedback: None,
            published_at: None,
            due_date: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn content() -> SubmissionContent {
        SubmissionContent {
            media_urls: vec!["/media/a.mp4".to_string(), "/media/b.jpg".to_string()],
            caption: "  Launch day!  ".to_string(),
            content_type: Some(ContentType::Reel),
            platforms: vec![SocialPlatform::Instagram],
        }
    }

    fn submitted() -> Deliverable {
        let d = pending_deliverable();
        let update = d.submit(&content(), Utc::now()).unwrap();
        d.apply(&update)
    }

    #[test]
    fn submit_sets_content_and_timestamp() {
        let d = submitted();
        assert_eq!(d.status, DeliverableStatus::Submitted);
        assert_eq!(d.content_url.as_deref(), Some("/media/a.mp4"));
        assert_eq!(d.caption.as_deref(), Some("Launch day!"));
        assert!(d.submitted_at.is_some());
        assert_eq!(d.version, 1);
        assert!(d.content_invariant_holds());
    }

    #[test]
    fn submit_requires_media_and_caption() {
        let d = pending_deliverable();

        let mut no_media = content();
        no_media.media_urls = vec!["  ".to_string()];
        assert!(matches!(d.submit(&no_media, Utc::now()), Err(TransitionError::Validation(_))));

        let mut no_caption = content();
        no_caption.caption = "   ".to_string();
        assert!(matches!(d.submit(&no_caption, Utc::now()), Err(TransitionError::Validation(_))));
    }

    #[test]
    fn submit_locks_platform_and_content_type() {
        let d = pending_deliverable();

        let mut wrong_platform = content();
        wrong_platform.platforms = vec![SocialPlatform::Instagram, SocialPlatform::Tiktok];
        assert!(matches!(d.submit(&wrong_platform, Utc::now()), Err(TransitionError::Validation(_))));

        let mut wrong_type = content();
        wrong_type.content_type = Some(ContentType::Post);
        assert!(matches!(d.submit(&wrong_type, Utc::now()), Err(TransitionError::Validation(_))));
    }

    #[test]
    fn cannot_submit_twice_without_review() {
        let d = submitted();
        assert_eq!(
            d.submit(&content(), Utc::now()),
            Err(TransitionError::InvalidTransition { from: DeliverableStatus::Submitted, action: "submit" })
        );
    }

    #[test]
    fn reject_without_feedback_is_invalid_and_leaves_status() {
        let d = submitted();
        let reviewer = Uuid::new_v4();

        let result = d.review(ReviewAction::Reject, reviewer, Some("   "), false, Utc::now());
        assert!(matches!(result, Err(TransitionError::Validation(_))));

        let result = d.review(ReviewAction::Reject, reviewer, None, false, Utc::now());
        assert!(matches!(result, Err(TransitionError::Validation(_))));
        assert_eq!(d.status, DeliverableStatus::Submitted);
    }

    #[test]
    fn approve_clears_rejection_feedback_and_is_idempotent() {
        let reviewer = Uuid::new_v4();
        let d = submitted();

        let rejected = d.apply(
            &d.review(ReviewAction::Reject, reviewer, Some("Audio is muted"), false, Utc::now())
                .unwrap()
                .unwrap(),
        );
        assert_eq!(rejected.review_feedback.as_deref(), Some("Audio is muted"));

        let resubmitted = rejected.apply(&rejected.submit(&content(), Utc::now()).unwrap());
        assert_eq!(resubmitted.status, DeliverableStatus::Submitted);
        assert_eq!(resubmitted.review_feedback, None);

        let approved = resubmitted.apply(
            &resubmitted
                .review(ReviewAction::Approve, reviewer, None, false, Utc::now())
                .unwrap()
                .unwrap(),
        );
        assert_eq!(approved.status, DeliverableStatus::Approved);
        assert_eq!(approved.review_feedback, None);
        assert!(approved.content_invariant_holds());

        let again = approved.review(ReviewAction::Approve, reviewer, None, false, Utc::now());
        assert_eq!(again, Ok(None));

        let other_reviewer = approved.review(ReviewAction::Approve, Uuid::new_v4(), None, false, Utc::now());
        assert!(matches!(other_reviewer, Err(TransitionError::InvalidTransition { .. })));
    }

    #[test]
    fn rejected_can_be_approved_only_with_override() {
        let reviewer = Uuid::new_v4();
        let d = submitted();
        let rejected = d.apply(
            &d.review(ReviewAction::Reject, reviewer, Some("Wrong hashtag"), false, Utc::now())
                .unwrap()
                .unwrap(),
        );

        assert!(matches!(
            rejected.review(ReviewAction::Approve, reviewer, None, false, Utc::now()),
            Err(TransitionError::InvalidTransition { .. })
        ));

        let approved = rejected
            .review(ReviewAction::Approve, reviewer, Some("Fine after all"), true, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(approved.status, DeliverableStatus::Approved);
        assert_eq!(approved.review_feedback.as_deref(), Some("Fine after all"));
    }

    #[test]
    fn publish_requires_approval() {
        let pending = pending_deliverable();
        assert_eq!(
            pending.publish("https://instagram.com/p/1", Utc::now()),
            Err(TransitionError::InvalidTransition { from: DeliverableStatus::Pending, action: "publish" })
        );

        let d = submitted();
        assert!(d.publish("https://instagram.com/p/1", Utc::now()).is_err());

        let approved = d.apply(
            &d.review(ReviewAction::Approve, Uuid::new_v4(), None, false, Utc::now())
                .unwrap()
                .unwrap(),
        );
        let published = approved.apply(&approved.publish("https://instagram.com/p/1", Utc::now()).unwrap());
        assert_eq!(published.status, DeliverableStatus::Published);
        assert_eq!(published.content_url.as_deref(), Some("https://instagram.com/p/1"));
        assert!(published.content_invariant_holds());
    }

    #[test]
    fn published_is_never_reviewable() {
        let reviewer = Uuid::new_v4();
        let d = submitted();
        let approved = d.apply(&d.review(ReviewAction::Approve, reviewer, None, false, Utc::now()).unwrap().unwrap());
        let published = approved.apply(&approved.publish("https://youtu.be/x", Utc::now()).unwrap());

        for manual_override in [false, true] {
            assert!(published
                .review(ReviewAction::Reject, reviewer, Some("late"), manual_override, Utc::now())
                .is_err());
        }
    }

    #[test]
    fn pending_has_no_content_url() {
        let d = pending_deliverable();
        assert!(d.content_invariant_holds());

        let mut broken = d.clone();
        broken.content_url = Some("/media/x".to_string());
        assert!(!broken.content_invariant_holds());
    }

    #[test]
    fn expected_version_is_the_current_one() {
        let d = submitted();
        let update = d.review(ReviewAction::Approve, Uuid::new_v4(), None, false, Utc::now()).unwrap().unwrap();
        assert_eq!(update.expected_version, d.version);
        assert_eq!(update.expected_status, DeliverableStatus::Submitted);
    }
}
