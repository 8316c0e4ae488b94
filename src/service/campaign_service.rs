use std::sync::Arc;

use chrono::{DateTime, Utc};
use num_traits::Signed;
use serde::Serialize;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{campaigndb::CampaignExt, db::DBClient, userdb::UserExt},
    models::{
        campaignmodels::*,
        usermodel::{User, UserType},
    },
    service::{
        error::ServiceError,
        subscription_service::{GatedAction, SubscriptionService},
    },
    utils::sanitize::{clean_optional, clean_text},
};

#[derive(Debug, Clone)]
pub struct NewCampaignInput {
    pub title: String,
    pub description: Option<String>,
    pub budget: BigDecimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignPerformance {
    pub metrics: Option<CampaignMetrics>,
    pub influencers: Vec<CampaignInfluencer>,
}

pub fn validate_commission_rate(rate: &BigDecimal) -> Result<(), ServiceError> {
    if rate.is_negative() || *rate > BigDecimal::from(100) {
        return Err(ServiceError::Validation(
            "Commission rate must be between 0 and 100 percent".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_campaign_input(input: &NewCampaignInput) -> Result<(), ServiceError> {
    if input.budget.is_negative() {
        return Err(ServiceError::Validation("Budget cannot be negative".to_string()));
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end <= start {
            return Err(ServiceError::Validation("End date must be after the start date".to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CampaignService {
    db_client: Arc<DBClient>,
}

impl CampaignService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    async fn owned_campaign(&self, brand: &User, campaign_id: Uuid) -> Result<Campaign, ServiceError> {
        let campaign = self
            .db_client
            .get_campaign(campaign_id)
            .await?
            .ok_or(ServiceError::CampaignNotFound(campaign_id))?;

        if campaign.brand_id != brand.id && !brand.is_admin() {
            return Err(ServiceError::Forbidden(brand.id, format!("campaign {}", campaign_id)));
        }
        Ok(campaign)
    }

    pub async fn create_campaign(
        &self,
        brand: &User,
        input: NewCampaignInput,
    ) -> Result<Campaign, ServiceError> {
        validate_campaign_input(&input)?;

        let title = clean_text(&input.title);
        if title.is_empty() {
            return Err(ServiceError::Validation("Campaign title is required".to_string()));
        }

        SubscriptionService::new(self.db_client.clone())
            .check_action(brand, GatedAction::CreateCampaign)
            .await?;

        let campaign = self
            .db_client
            .create_campaign(
                brand.id,
                title,
                clean_optional(input.description.as_deref()),
                input.budget,
                input.start_date,
                input.end_date,
            )
            .await?;

        tracing::info!("Brand {} created campaign {}", brand.id, campaign.id);
        Ok(campaign)
    }

    pub async fn brand_campaigns(&self, brand: &User) -> Result<Vec<Campaign>, ServiceError> {
        Ok(self.db_client.get_brand_campaigns(brand.id).await?)
    }

    pub async fn invite_influencer(
        &self,
        brand: &User,
        campaign_id: Uuid,
        influencer_id: Uuid,
        commission_rate: BigDecimal,
    ) -> Result<CampaignInfluencer, ServiceError> {
        let campaign = self.owned_campaign(brand, campaign_id).await?;
        validate_commission_rate(&commission_rate)?;

        if matches!(campaign.status, CampaignStatus::Completed | CampaignStatus::Cancelled) {
            return Err(ServiceError::Validation(
                "Invites can only be sent for draft or active campaigns".to_string(),
            ));
        }

        let influencer = self
            .db_client
            .get_user(influencer_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Influencer {}", influencer_id)))?;

        if influencer.user_type != UserType::Influencer {
            return Err(ServiceError::Validation("Only influencers can be invited".to_string()));
        }

        if self
            .db_client
            .get_collaboration(campaign_id, influencer_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "This influencer has already been invited to the campaign".to_string(),
            ));
        }

        SubscriptionService::new(self.db_client.clone())
            .check_action(brand, GatedAction::SendInvite)
            .await?;

        let collaboration = self
            .db_client
            .create_collaboration(campaign_id, influencer_id, commission_rate)
            .await?;

        tracing::info!(
            "Brand {} invited influencer {} to campaign {}",
            brand.id,
            influencer_id,
            campaign_id
        );
        Ok(collaboration)
    }

    pub async fn performance(
        &self,
        brand: &User,
        campaign_id: Uuid,
    ) -> Result<CampaignPerformance, ServiceError> {
        self.owned_campaign(brand, campaign_id).await?;

        let metrics = self.db_client.get_campaign_metrics(campaign_id).await?;
        let influencers = self.db_client.get_campaign_collaborations(campaign_id).await?;

        Ok(CampaignPerformance { metrics, influencers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input(budget: i64) -> NewCampaignInput {
        NewCampaignInput {
            title: "Summer launch".to_string(),
            description: None,
            budget: BigDecimal::from(budget),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn commission_rate_is_a_percentage() {
        assert!(validate_commission_rate(&BigDecimal::from(0)).is_ok());
        assert!(validate_commission_rate(&BigDecimal::from_str("12.5").unwrap()).is_ok());
        assert!(validate_commission_rate(&BigDecimal::from(100)).is_ok());
        assert!(validate_commission_rate(&BigDecimal::from(-1)).is_err());
        assert!(validate_commission_rate(&BigDecimal::from_str("100.01").unwrap()).is_err());
    }

    #[test]
    fn campaign_dates_and_budget_are_checked() {
        assert!(validate_campaign_input(&input(1000)).is_ok());
        assert!(validate_campaign_input(&input(-5)).is_err());

        let mut backwards = input(1000);
        backwards.start_date = Some(Utc::now());
        backwards.end_date = Some(Utc::now() - chrono::Duration::days(1));
        assert!(validate_campaign_input(&backwards).is_err());
    }
}
