// db/campaigndb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{campaignmodels::*, revenuemodels::*};

#[async_trait]
pub trait CampaignExt {
    async fn create_campaign(
        &self,
        brand_id: Uuid,
        title: String,
        description: Option<String>,
        budget: BigDecimal,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Campaign, sqlx::Error>;

    async fn get_campaign(&self, campaign_id: Uuid) -> Result<Option<Campaign>, sqlx::Error>;

    async fn get_brand_campaigns(&self, brand_id: Uuid) -> Result<Vec<Campaign>, sqlx::Error>;

    /// Draft and active campaigns count against the plan's campaign cap.
    async fn count_open_campaigns(&self, brand_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Invited or approved collaborations on the brand's open campaigns.
    async fn count_open_collaborations(&self, brand_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn create_collaboration(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
        commission_rate: BigDecimal,
    ) -> Result<CampaignInfluencer, sqlx::Error>;

    async fn get_collaboration(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error>;

    async fn get_campaign_collaborations(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<CampaignInfluencer>, sqlx::Error>;

    async fn get_campaign_metrics(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignMetrics>, sqlx::Error>;
}

#[async_trait]
pub trait RevenueExt {
    async fn fetch_pair_revenue(&self) -> Result<Vec<PairRevenueRow>, sqlx::Error>;

    async fn fetch_campaign_revenue(&self) -> Result<Vec<CampaignRevenueRow>, sqlx::Error>;

    async fn fetch_campaign_budgets(&self) -> Result<Vec<CampaignBudget>, sqlx::Error>;

    async fn fetch_commission_rates(&self) -> Result<Vec<CommissionRate>, sqlx::Error>;

    /// Zeroes every derived counter, then writes the report, in one transaction.
    async fn write_revenue_report(
        &self,
        report: &RevenueReport,
    ) -> Result<RevenueWriteSummary, sqlx::Error>;
}

fn revenue_status_strings() -> Vec<String> {
    OrderStatus::revenue_statuses()
        .iter()
        .map(|s| s.to_str().to_string())
        .collect()
}

#[async_trait]
impl CampaignExt for DBClient {
    async fn create_campaign(
        &self,
        brand_id: Uuid,
        title: String,
        description: Option<String>,
        budget: BigDecimal,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Campaign, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (brand_id, title, description, budget, status, start_date, end_date)
            VALUES ($1, $2, $3, $4, 'active', $5, $6)
            RETURNING *
            "#
        )
        .bind(brand_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO campaign_metrics (campaign_id) VALUES ($1)")
            .bind(campaign.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(campaign)
    }

    async fn get_campaign(&self, campaign_id: Uuid) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_brand_campaigns(&self, brand_id: Uuid) -> Result<Vec<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE brand_id = $1 ORDER BY created_at DESC"
        )
        .bind(brand_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_open_campaigns(&self, brand_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM campaigns
            WHERE brand_id = $1 AND status IN ('draft', 'active')
            "#
        )
        .bind(brand_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn count_open_collaborations(&self, brand_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM campaign_influencers ci
            JOIN campaigns c ON c.id = ci.campaign_id
            WHERE c.brand_id = $1
              AND c.status IN ('draft', 'active')
              AND ci.status IN ('invited', 'approved')
            "#
        )
        .bind(brand_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_collaboration(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
        commission_rate: BigDecimal,
    ) -> Result<CampaignInfluencer, sqlx::Error> {
        sqlx::query_as::<_, CampaignInfluencer>(
            r#"
            INSERT INTO campaign_influencers (campaign_id, influencer_id, commission_rate)
            VALUES ($1, $2, $3)
            RETURNING *
            "#
        )
        .bind(campaign_id)
        .bind(influencer_id)
        .bind(commission_rate)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_collaboration(
        &self,
        campaign_id: Uuid,
        influencer_id: Uuid,
    ) -> Result<Option<CampaignInfluencer>, sqlx::Error> {
        sqlx::query_as::<_, CampaignInfluencer>(
            "SELECT * FROM campaign_influencers WHERE campaign_id = $1 AND influencer_id = $2"
        )
        .bind(campaign_id)
        .bind(influencer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_campaign_collaborations(
        &self,
        campaign_id: Uuid,
    ) -> Result<Vec<CampaignInfluencer>, sqlx::Error> {
        sqlx::query_as::<_, CampaignInfluencer>(
            r#"
            SELECT * FROM campaign_influencers
            WHERE campaign_id = $1
            ORDER BY revenue DESC, created_at ASC
            "#
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_campaign_metrics(
        &self,
        campaign_id: Uuid,
    ) -> Result<Option<CampaignMetrics>, sqlx::Error> {
        sqlx::query_as::<_, CampaignMetrics>(
            "SELECT * FROM campaign_metrics WHERE campaign_id = $1"
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl RevenueExt for DBClient {
    async fn fetch_pair_revenue(&self) -> Result<Vec<PairRevenueRow>, sqlx::Error> {
        sqlx::query_as::<_, PairRevenueRow>(
            r#"
            SELECT campaign_id, influencer_id,
                   COALESCE(SUM(total_amount), 0) AS revenue,
                   COUNT(*) AS order_count
            FROM orders
            WHERE campaign_id IS NOT NULL
              AND influencer_id IS NOT NULL
              AND status::text = ANY($1)
            GROUP BY campaign_id, influencer_id
            ORDER BY campaign_id, influencer_id
            "#
        )
        .bind(revenue_status_strings())
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_campaign_revenue(&self) -> Result<Vec<CampaignRevenueRow>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRevenueRow>(
            r#"
            SELECT campaign_id,
                   COALESCE(SUM(total_amount), 0) AS revenue,
                   COUNT(*) AS order_count
            FROM orders
            WHERE campaign_id IS NOT NULL
              AND status::text = ANY($1)
            GROUP BY campaign_id
            ORDER BY campaign_id
            "#
        )
        .bind(revenue_status_strings())
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_campaign_budgets(&self) -> Result<Vec<CampaignBudget>, sqlx::Error> {
        sqlx::query_as::<_, CampaignBudget>("SELECT id AS campaign_id, budget FROM campaigns")
            .fetch_all(&self.pool)
            .await
    }

    async fn fetch_commission_rates(&self) -> Result<Vec<CommissionRate>, sqlx::Error> {
        sqlx::query_as::<_, CommissionRate>(
            "SELECT campaign_id, influencer_id, commission_rate FROM campaign_influencers"
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn write_revenue_report(
        &self,
        report: &RevenueReport,
    ) -> Result<RevenueWriteSummary, sqlx::Error> {
        let mut summary = RevenueWriteSummary::default();
        let mut tx = self.pool.begin().await?;

        summary.influencer_rows_reset = sqlx::query(
            r#"
            UPDATE campaign_influencers
            SET revenue = 0, commission = 0, conversions = 0, updated_at = NOW()
            "#
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        summary.metric_rows_reset = sqlx::query(
            r#"
            UPDATE campaign_metrics
            SET revenue = 0, sales_count = 0, roi = 0, updated_at = NOW()
            "#
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for row in &report.influencers {
            let affected = sqlx::query(
                r#"
                UPDATE campaign_influencers
                SET revenue = $3, commission = $4, conversions = $5, updated_at = NOW()
                WHERE campaign_id = $1 AND influencer_id = $2
                "#
            )
            .bind(row.campaign_id)
            .bind(row.influencer_id)
            .bind(row.revenue.clone())
            .bind(row.commission.clone())
            .bind(row.conversions)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if affected == 0 {
                summary.unmatched_pairs += 1;
                tracing::warn!(
                    "Orders reference campaign {} / influencer {} but no collaboration exists",
                    row.campaign_id,
                    row.influencer_id
                );
            }
            summary.influencer_rows_updated += affected;
        }

        for row in &report.campaigns {
            summary.metric_rows_written += sqlx::query(
                r#"
                INSERT INTO campaign_metrics (campaign_id, revenue, sales_count, roi, updated_at)
                VALUES ($1, $2, $3, $4, NOW())
                ON CONFLICT (campaign_id) DO UPDATE
                SET revenue = EXCLUDED.revenue,
                    sales_count = EXCLUDED.sales_count,
                    roi = EXCLUDED.roi,
                    updated_at = NOW()
                "#
            )
            .bind(row.campaign_id)
            .bind(row.revenue.clone())
            .bind(row.sales_count)
            .bind(row.roi.clone())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(summary)
    }
}
