// service/revenue_service.rs
use std::collections::HashMap;

use num_traits::Zero;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{campaigndb::RevenueExt, db::DBClient},
    models::revenuemodels::*,
    service::error::ServiceError,
};

/// `(revenue - budget) / budget * 100`, and 0 for campaigns without a budget.
pub fn compute_roi(revenue: &BigDecimal, budget: &BigDecimal) -> BigDecimal {
    if budget.is_zero() {
        return BigDecimal::zero();
    }
    ((revenue - budget) * BigDecimal::from(100) / budget).round(2)
}

/// `commission_rate` is a percentage.
pub fn compute_commission(revenue: &BigDecimal, commission_rate: &BigDecimal) -> BigDecimal {
    (revenue * commission_rate / BigDecimal::from(100)).round(2)
}

fn clamp_count(count: i64) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

pub fn build_report(
    pairs: &[PairRevenueRow],
    campaigns: &[CampaignRevenueRow],
    budgets: &[CampaignBudget],
    rates: &[CommissionRate],
) -> RevenueReport {
    let rate_by_pair: HashMap<(Uuid, Uuid), &BigDecimal> = rates
        .iter()
        .map(|r| ((r.campaign_id, r.influencer_id), &r.commission_rate))
        .collect();
    let budget_by_campaign: HashMap<Uuid, &BigDecimal> = budgets
        .iter()
        .map(|b| (b.campaign_id, &b.budget))
        .collect();

    let zero = BigDecimal::zero();

    let influencers = pairs
        .iter()
        .map(|pair| {
            let rate = rate_by_pair
                .get(&(pair.campaign_id, pair.influencer_id))
                .copied()
                .unwrap_or(&zero);

            InfluencerAggregate {
                campaign_id: pair.campaign_id,
                influencer_id: pair.influencer_id,
                revenue: pair.revenue.clone(),
                commission: compute_commission(&pair.revenue, rate),
                conversions: clamp_count(pair.order_count),
            }
        })
        .collect();

    let campaigns = campaigns
        .iter()
        .map(|row| {
            let budget = budget_by_campaign
                .get(&row.campaign_id)
                .copied()
                .unwrap_or(&zero);

            CampaignAggregate {
                campaign_id: row.campaign_id,
                revenue: row.revenue.clone(),
                sales_count: clamp_count(row.order_count),
                roi: compute_roi(&row.revenue, budget),
            }
        })
        .collect();

    RevenueReport { influencers, campaigns }
}

/// Recomputes every revenue counter from the order table.
pub async fn run_aggregation(db_client: &DBClient) -> Result<RevenueWriteSummary, ServiceError> {
    let pairs = db_client.fetch_pair_revenue().await?;
    let campaigns = db_client.fetch_campaign_revenue().await?;
    let budgets = db_client.fetch_campaign_budgets().await?;
    let rates = db_client.fetch_commission_rates().await?;

    tracing::info!(
        "Aggregating {} influencer pairs across {} campaigns",
        pairs.len(),
        campaigns.len()
    );

    let report = build_report(&pairs, &campaigns, &budgets, &rates);
    let summary = db_client.write_revenue_report(&report).await?;

    if summary.unmatched_pairs > 0 {
        tracing::warn!(
            "{} order groups had no matching collaboration and were skipped",
            summary.unmatched_pairs
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use std::str::FromStr;

    use crate::{
        db::{campaigndb::CampaignExt, fixtures::*},
        models::{campaignmodels::OrderStatus, usermodel::UserType},
    };

    fn dec(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).unwrap()
    }

    #[test]
    fn roi_is_relative_to_budget() {
        assert_eq!(compute_roi(&dec("1500"), &dec("1000")), dec("50"));
        assert_eq!(compute_roi(&dec("500"), &dec("1000")), dec("-50"));
        assert_eq!(compute_roi(&dec("1500"), &dec("0")), dec("0"));
    }

    #[test]
    fn commission_is_a_percentage_of_revenue() {
        assert_eq!(compute_commission(&dec("200.00"), &dec("12.5")), dec("25"));
        assert_eq!(compute_commission(&dec("99.99"), &dec("0")), dec("0"));
    }

    #[test]
    fn report_joins_rates_and_budgets() {
        let campaign = Uuid::new_v4();
        let influencer = Uuid::new_v4();
        let stray = Uuid::new_v4();

        let pairs = vec![
            PairRevenueRow { campaign_id: campaign, influencer_id: influencer, revenue: dec("1200"), order_count: 3 },
            PairRevenueRow { campaign_id: campaign, influencer_id: stray, revenue: dec("300"), order_count: 1 },
        ];
        let campaigns = vec![CampaignRevenueRow { campaign_id: campaign, revenue: dec("1500"), order_count: 4 }];
        let budgets = vec![CampaignBudget { campaign_id: campaign, budget: dec("1000") }];
        let rates = vec![CommissionRate { campaign_id: campaign, influencer_id: influencer, commission_rate: dec("10") }];

        let report = build_report(&pairs, &campaigns, &budgets, &rates);

        assert_eq!(report.influencers.len(), 2);
        assert_eq!(report.influencers[0].commission, dec("120"));
        assert_eq!(report.influencers[0].conversions, 3);
        // No collaboration row means no rate on file.
        assert_eq!(report.influencers[1].commission, dec("0"));

        assert_eq!(report.campaigns.len(), 1);
        assert_eq!(report.campaigns[0].sales_count, 4);
        assert_eq!(report.campaigns[0].roi, dec("50"));
    }

    #[test]
    fn rebuilding_from_the_same_orders_is_stable() {
        let campaign = Uuid::new_v4();
        let influencer = Uuid::new_v4();
        let pairs = vec![PairRevenueRow { campaign_id: campaign, influencer_id: influencer, revenue: dec("80.50"), order_count: 2 }];
        let campaigns = vec![CampaignRevenueRow { campaign_id: campaign, revenue: dec("80.50"), order_count: 2 }];
        let budgets = vec![CampaignBudget { campaign_id: campaign, budget: dec("0") }];
        let rates = vec![CommissionRate { campaign_id: campaign, influencer_id: influencer, commission_rate: dec("15") }];

        let first = build_report(&pairs, &campaigns, &budgets, &rates);
        let second = build_report(&pairs, &campaigns, &budgets, &rates);
        assert_eq!(first, second);
        assert_eq!(first.campaigns[0].roi, dec("0"));
    }

    #[test]
    fn no_orders_means_an_empty_report() {
        let report = build_report(&[], &[], &[], &[]);
        assert_eq!(report, RevenueReport::default());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn aggregation_reruns_give_the_same_totals(pool: PgPool) {
        let db = DBClient::new(pool.clone());
        let brand = insert_user(&pool, UserType::Brand).await;
        let influencer = insert_user(&pool, UserType::Influencer).await;
        let buyer = insert_user(&pool, UserType::Customer).await;

        let campaign = db
            .create_campaign(brand, "Spring drop".to_string(), None, dec("1000"), None, None)
            .await
            .unwrap();
        db.create_collaboration(campaign.id, influencer, dec("10")).await.unwrap();

        for (status, amount) in [
            (OrderStatus::Completed, "1000.00"),
            (OrderStatus::Paid, "300.00"),
            (OrderStatus::Delivered, "200.00"),
            (OrderStatus::Pending, "700.00"),
            (OrderStatus::Refunded, "400.00"),
            (OrderStatus::Cancelled, "50.00"),
        ] {
            insert_order(&pool, campaign.id, influencer, buyer, status, dec(amount)).await;
        }

        for _ in 0..2 {
            let summary = run_aggregation(&db).await.unwrap();
            assert_eq!(summary.unmatched_pairs, 0);

            let metrics = db.get_campaign_metrics(campaign.id).await.unwrap().unwrap();
            assert_eq!(metrics.revenue, dec("1500"));
            assert_eq!(metrics.sales_count, 3);
            assert_eq!(metrics.roi, dec("50"));

            let collaboration = db.get_collaboration(campaign.id, influencer).await.unwrap().unwrap();
            assert_eq!(collaboration.revenue, dec("1500"));
            assert_eq!(collaboration.commission, dec("150"));
            assert_eq!(collaboration.conversions, 3);
        }

        // A refund after the last run is picked up by the reset, not added on top.
        sqlx::query("UPDATE orders SET status = 'refunded' WHERE status = 'completed'")
            .execute(&pool)
            .await
            .unwrap();
        run_aggregation(&db).await.unwrap();

        let metrics = db.get_campaign_metrics(campaign.id).await.unwrap().unwrap();
        assert_eq!(metrics.revenue, dec("500"));
        assert_eq!(metrics.sales_count, 2);
        assert_eq!(metrics.roi, dec("-50"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn huge_roi_is_stored_alongside_normal_campaigns(pool: PgPool) {
        let db = DBClient::new(pool.clone());
        let brand = insert_user(&pool, UserType::Brand).await;
        let influencer = insert_user(&pool, UserType::Influencer).await;
        let buyer = insert_user(&pool, UserType::Customer).await;

        let tiny = db
            .create_campaign(brand, "Shoestring".to_string(), None, dec("1"), None, None)
            .await
            .unwrap();
        let normal = db
            .create_campaign(brand, "Regular".to_string(), None, dec("1000"), None, None)
            .await
            .unwrap();
        for campaign in [&tiny, &normal] {
            db.create_collaboration(campaign.id, influencer, dec("5")).await.unwrap();
        }

        insert_order(&pool, tiny.id, influencer, buyer, OrderStatus::Completed, dec("200000000.00")).await;
        insert_order(&pool, normal.id, influencer, buyer, OrderStatus::Completed, dec("1500.00")).await;

        let summary = run_aggregation(&db).await.unwrap();
        assert_eq!(summary.metric_rows_written, 2);

        let tiny_metrics = db.get_campaign_metrics(tiny.id).await.unwrap().unwrap();
        assert_eq!(tiny_metrics.roi, dec("19999999900"));

        let normal_metrics = db.get_campaign_metrics(normal.id).await.unwrap().unwrap();
        assert_eq!(normal_metrics.roi, dec("50"));
    }
}
