use std::collections::HashMap;

use sqlx::types::BigDecimal;

use crate::{
    db::{cache::CacheHelper, db::DBClient, subscriptiondb::SubscriptionExt},
    models::subscriptionmodels::*,
    service::error::ServiceError,
};

pub const PLANS_PER_USER_TYPE: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub subscriptions_moved: u64,
    pub plans_deleted: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

#[allow(clippy::too_many_arguments)]
fn template(
    name: PlanName,
    user_type: PlanUserType,
    monthly: i64,
    yearly: i64,
    analytics_tier: AnalyticsTier,
    campaign_limit: i32,
    connection_limit: i32,
    uploads_per_month: i32,
    storage_limit_mb: i32,
    team_size: i32,
) -> PlanTemplate {
    PlanTemplate {
        name,
        user_type,
        monthly_price: BigDecimal::from(monthly),
        yearly_price: BigDecimal::from(yearly),
        analytics_tier,
        campaign_limit,
        connection_limit,
        custom_branding: name == PlanName::Premium,
        priority_support: name != PlanName::Free,
        storage_limit_mb,
        uploads_per_month,
        team_size,
    }
}

/// Free, Basic and Premium for each plan user type.
pub fn default_catalog() -> Vec<PlanTemplate> {
    use AnalyticsTier::{Advanced, Basic, Premium};
    use PlanUserType::{Brand, Influencer};

    vec![
        template(PlanName::Free, Brand, 0, 0, Basic, 1, 5, UNLIMITED, 500, 1),
        template(PlanName::Basic, Brand, 49, 490, Advanced, 5, 25, UNLIMITED, 5_000, 3),
        template(PlanName::Premium, Brand, 149, 1_490, Premium, UNLIMITED, UNLIMITED, UNLIMITED, 50_000, 10),
        template(PlanName::Free, Influencer, 0, 0, Basic, 0, 3, 10, 500, 1),
        template(PlanName::Basic, Influencer, 19, 190, Advanced, 0, 15, 50, 5_000, 1),
        template(PlanName::Premium, Influencer, 49, 490, Premium, 0, UNLIMITED, UNLIMITED, 20_000, 3),
    ]
}

/// One warning per plan user type that does not have exactly three plans.
pub fn plan_count_warnings(counts: &[(PlanUserType, i64)]) -> Vec<String> {
    let counts: HashMap<PlanUserType, i64> = counts.iter().copied().collect();

    PlanUserType::all()
        .iter()
        .filter_map(|user_type| {
            let count = counts.get(user_type).copied().unwrap_or(0);
            if count == PLANS_PER_USER_TYPE {
                None
            } else {
                Some(format!(
                    "Expected {} {} plans after cleanup, found {}",
                    PLANS_PER_USER_TYPE,
                    user_type.to_str(),
                    count
                ))
            }
        })
        .collect()
}

async fn invalidate_plan_cache(db_client: &DBClient) {
    if let Some(redis) = &db_client.redis_client {
        if let Err(e) = CacheHelper::invalidate_plans(redis).await {
            tracing::warn!("Failed to invalidate plan cache: {}", e);
        }
    }
}

/// Moves subscribers off retired tiers onto Premium, then deletes the tiers.
pub async fn cleanup_deprecated_plans(db_client: &DBClient) -> Result<CleanupSummary, ServiceError> {
    let deprecated = [PlanName::Pro, PlanName::Enterprise];

    let subscriptions_moved = db_client
        .reassign_subscriptions_to_plan(&deprecated, PlanName::Premium)
        .await?;
    tracing::info!("Moved {} subscriptions to premium plans", subscriptions_moved);

    let plans_deleted = db_client.delete_plans_by_name(&deprecated).await?;
    tracing::info!("Deleted {} deprecated plans", plans_deleted);

    let counts = db_client.count_plans_by_user_type().await?;
    for (user_type, count) in &counts {
        tracing::info!("{} plans: {}", user_type.to_str(), count);
    }

    let warnings = plan_count_warnings(&counts);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    invalidate_plan_cache(db_client).await;

    Ok(CleanupSummary {
        subscriptions_moved,
        plans_deleted,
        warnings,
    })
}

pub async fn seed_default_plans(db_client: &DBClient) -> Result<SeedSummary, ServiceError> {
    let mut summary = SeedSummary::default();

    for plan in default_catalog() {
        if db_client.insert_plan_if_missing(&plan).await? {
            tracing::info!("Inserted {} {} plan", plan.user_type.to_str(), plan.name.to_str());
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    invalidate_plan_cache(db_client).await;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sqlx::PgPool;

    use crate::{
        db::{fixtures::insert_user, subscriptiondb::NewSubscription},
        models::usermodel::UserType,
    };

    #[test]
    fn catalog_has_three_current_plans_per_type() {
        let catalog = default_catalog();
        for user_type in PlanUserType::all() {
            let names: Vec<PlanName> = catalog
                .iter()
                .filter(|p| p.user_type == user_type)
                .map(|p| p.name)
                .collect();
            assert_eq!(names, PlanName::current().to_vec());
        }
        assert!(catalog.iter().all(|p| !p.name.is_deprecated()));
    }

    #[test]
    fn free_plans_cost_nothing_and_premium_is_unlimited() {
        for plan in default_catalog() {
            match plan.name {
                PlanName::Free => assert_eq!(plan.monthly_price, BigDecimal::from(0)),
                PlanName::Premium => assert_eq!(plan.connection_limit, UNLIMITED),
                _ => {}
            }
        }
    }

    #[test]
    fn exact_counts_produce_no_warnings() {
        let counts = vec![(PlanUserType::Brand, 3), (PlanUserType::Influencer, 3)];
        assert!(plan_count_warnings(&counts).is_empty());
    }

    #[test]
    fn wrong_or_missing_counts_are_reported() {
        let counts = vec![(PlanUserType::Brand, 4)];
        let warnings = plan_count_warnings(&counts);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("brand") && warnings[0].contains("found 4"));
        assert!(warnings[1].contains("influencer") && warnings[1].contains("found 0"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn cleanup_leaves_three_plans_per_type(pool: PgPool) {
        let db = DBClient::new(pool.clone());

        let seeded = seed_default_plans(&db).await.unwrap();
        assert_eq!(seeded.inserted, 6);

        for user_type in PlanUserType::all() {
            for name in [PlanName::Pro, PlanName::Enterprise] {
                let retired = template(
                    name,
                    user_type,
                    299,
                    2_990,
                    AnalyticsTier::Premium,
                    UNLIMITED,
                    UNLIMITED,
                    UNLIMITED,
                    100_000,
                    25,
                );
                assert!(db.insert_plan_if_missing(&retired).await.unwrap());
            }
        }

        let brand = insert_user(&pool, UserType::Brand).await;
        let pro = db
            .get_plan_by_name(PlanName::Pro, PlanUserType::Brand)
            .await
            .unwrap()
            .unwrap();
        let now = Utc::now();
        let subscription = db
            .create_subscription(NewSubscription {
                user_id: brand,
                plan_id: pro.id,
                status: SubscriptionStatus::Active,
                billing_cycle: BillingCycle::Monthly,
                start_date: Some(now),
                end_date: Some(now + Duration::days(30)),
                amount: BigDecimal::from(299),
                payment_method: None,
                payment_details: None,
                auto_renew: true,
            })
            .await
            .unwrap();

        let summary = cleanup_deprecated_plans(&db).await.unwrap();
        assert_eq!(summary.subscriptions_moved, 1);
        assert_eq!(summary.plans_deleted, 4);
        assert!(summary.warnings.is_empty());

        let counts = db.count_plans_by_user_type().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts.iter().all(|(_, count)| *count == PLANS_PER_USER_TYPE));

        let premium = db
            .get_plan_by_name(PlanName::Premium, PlanUserType::Brand)
            .await
            .unwrap()
            .unwrap();
        let moved = db.get_subscription(subscription.id).await.unwrap().unwrap();
        assert_eq!(moved.plan_id, premium.id);

        // A second run finds nothing left to do.
        let rerun = cleanup_deprecated_plans(&db).await.unwrap();
        assert_eq!(rerun, CleanupSummary::default());
    }
}
