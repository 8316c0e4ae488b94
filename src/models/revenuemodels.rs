// models/revenuemodels.rs
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

/// Sum of qualifying orders for one (campaign, influencer) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PairRevenueRow {
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub revenue: BigDecimal,
    pub order_count: i64,
}

/// Sum of qualifying orders for one campaign, regardless of influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignRevenueRow {
    pub campaign_id: Uuid,
    pub revenue: BigDecimal,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignBudget {
    pub campaign_id: Uuid,
    pub budget: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommissionRate {
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub commission_rate: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerAggregate {
    pub campaign_id: Uuid,
    pub influencer_id: Uuid,
    pub revenue: BigDecimal,
    pub commission: BigDecimal,
    pub conversions: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignAggregate {
    pub campaign_id: Uuid,
    pub revenue: BigDecimal,
    pub sales_count: i32,
    pub roi: BigDecimal,
}

/// Everything the aggregation job writes back after the reset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RevenueReport {
    pub influencers: Vec<InfluencerAggregate>,
    pub campaigns: Vec<CampaignAggregate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RevenueWriteSummary {
    pub influencer_rows_reset: u64,
    pub metric_rows_reset: u64,
    pub influencer_rows_updated: u64,
    pub metric_rows_written: u64,
    pub unmatched_pairs: u64,
}
