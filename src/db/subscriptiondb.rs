// db/subscriptiondb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::subscriptionmodels::*;

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub amount: BigDecimal,
    pub payment_method: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub auto_renew: bool,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway: Option<String>,
    pub invoice_number: String,
    pub note: Option<String>,
}

#[async_trait]
pub trait SubscriptionExt {
    async fn list_plans(
        &self,
        user_type: Option<PlanUserType>,
    ) -> Result<Vec<SubscriptionPlan>, sqlx::Error>;

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, sqlx::Error>;

    async fn get_plan_by_name(
        &self,
        name: PlanName,
        user_type: PlanUserType,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error>;

    async fn get_latest_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    /// Latest subscription that is active and has not reached its end date.
    async fn get_current_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn get_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<UserSubscription, sqlx::Error>;

    /// Compare-and-swap on the current status; `None` when it no longer matches.
    async fn transition_subscription(
        &self,
        subscription_id: Uuid,
        expected_status: SubscriptionStatus,
        status: SubscriptionStatus,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn cancel_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error>;

    async fn set_auto_renew(
        &self,
        subscription_id: Uuid,
        auto_renew: bool,
    ) -> Result<UserSubscription, sqlx::Error>;

    async fn insert_payment(&self, payment: NewPayment) -> Result<PaymentHistory, sqlx::Error>;

    async fn get_user_payments(&self, user_id: Uuid) -> Result<Vec<PaymentHistory>, sqlx::Error>;

    async fn get_pending_subscription_payments(
        &self,
    ) -> Result<Vec<PendingSubscriptionPayment>, sqlx::Error>;

    async fn get_due_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSubscription>, sqlx::Error>;

    // Plan maintenance

    /// Returns false when a plan with the same name and user type already exists.
    async fn insert_plan_if_missing(&self, plan: &PlanTemplate) -> Result<bool, sqlx::Error>;

    async fn reassign_subscriptions_to_plan(
        &self,
        from_names: &[PlanName],
        to_name: PlanName,
    ) -> Result<u64, sqlx::Error>;

    async fn delete_plans_by_name(&self, names: &[PlanName]) -> Result<u64, sqlx::Error>;

    async fn count_plans_by_user_type(&self) -> Result<Vec<(PlanUserType, i64)>, sqlx::Error>;
}

fn name_strings(names: &[PlanName]) -> Vec<String> {
    names.iter().map(|n| n.to_str().to_string()).collect()
}

#[async_trait]
impl SubscriptionExt for DBClient {
    async fn list_plans(
        &self,
        user_type: Option<PlanUserType>,
    ) -> Result<Vec<SubscriptionPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionPlan>(
            r#"
            SELECT * FROM subscription_plans
            WHERE ($1::plan_user_type IS NULL OR user_type = $1)
            ORDER BY user_type, monthly_price ASC
            "#
        )
        .bind(user_type)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_plan(&self, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE id = $1"
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_plan_by_name(
        &self,
        name: PlanName,
        user_type: PlanUserType,
    ) -> Result<Option<SubscriptionPlan>, sqlx::Error> {
        sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE name = $1 AND user_type = $2"
        )
        .bind(name)
        .bind(user_type)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_latest_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            SELECT * FROM user_subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_current_subscription(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            SELECT * FROM user_subscriptions
            WHERE user_id = $1 AND status = 'active' AND end_date > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            "SELECT * FROM user_subscriptions WHERE id = $1"
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_subscription(
        &self,
        subscription: NewSubscription,
    ) -> Result<UserSubscription, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            INSERT INTO user_subscriptions
            (user_id, plan_id, status, billing_cycle, start_date, end_date,
             amount, payment_method, payment_details, auto_renew)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#
        )
        .bind(subscription.user_id)
        .bind(subscription.plan_id)
        .bind(subscription.status)
        .bind(subscription.billing_cycle)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.amount)
        .bind(subscription.payment_method)
        .bind(subscription.payment_details)
        .bind(subscription.auto_renew)
        .fetch_one(&self.pool)
        .await
    }

    async fn transition_subscription(
        &self,
        subscription_id: Uuid,
        expected_status: SubscriptionStatus,
        status: SubscriptionStatus,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            UPDATE user_subscriptions
            SET status = $3,
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#
        )
        .bind(subscription_id)
        .bind(expected_status)
        .bind(status)
        .bind(start_date)
        .bind(end_date)
        .fetch_optional(&self.pool)
        .await
    }

    async fn cancel_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Option<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            UPDATE user_subscriptions
            SET status = 'cancelled', auto_renew = FALSE, updated_at = NOW()
            WHERE id = $1 AND status IN ('active', 'pending')
            RETURNING *
            "#
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_auto_renew(
        &self,
        subscription_id: Uuid,
        auto_renew: bool,
    ) -> Result<UserSubscription, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            UPDATE user_subscriptions
            SET auto_renew = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(subscription_id)
        .bind(auto_renew)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<PaymentHistory, sqlx::Error> {
        sqlx::query_as::<_, PaymentHistory>(
            r#"
            INSERT INTO payment_history
            (subscription_id, user_id, amount, currency, status, gateway, invoice_number, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#
        )
        .bind(payment.subscription_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(payment.status)
        .bind(payment.gateway)
        .bind(payment.invoice_number)
        .bind(payment.note)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_user_payments(&self, user_id: Uuid) -> Result<Vec<PaymentHistory>, sqlx::Error> {
        sqlx::query_as::<_, PaymentHistory>(
            r#"
            SELECT * FROM payment_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_pending_subscription_payments(
        &self,
    ) -> Result<Vec<PendingSubscriptionPayment>, sqlx::Error> {
        sqlx::query_as::<_, PendingSubscriptionPayment>(
            r#"
            SELECT s.id AS subscription_id, s.user_id, u.name AS user_name, u.email AS user_email,
                   p.name AS plan_name, p.user_type AS plan_user_type, s.billing_cycle,
                   s.amount, s.payment_method, s.created_at
            FROM user_subscriptions s
            JOIN users u ON u.id = s.user_id
            JOIN subscription_plans p ON p.id = s.plan_id
            WHERE s.status = 'pending'
            ORDER BY s.created_at ASC
            "#
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_due_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserSubscription>, sqlx::Error> {
        sqlx::query_as::<_, UserSubscription>(
            r#"
            SELECT * FROM user_subscriptions
            WHERE status = 'active' AND end_date IS NOT NULL AND end_date < $1
            "#
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
    }

    async fn insert_plan_if_missing(&self, plan: &PlanTemplate) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscription_plans
            (name, user_type, monthly_price, yearly_price, analytics_tier, campaign_limit,
             connection_limit, custom_branding, priority_support, storage_limit_mb,
             uploads_per_month, team_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (name, user_type) DO NOTHING
            "#
        )
        .bind(plan.name)
        .bind(plan.user_type)
        .bind(plan.monthly_price.clone())
        .bind(plan.yearly_price.clone())
        .bind(plan.analytics_tier)
        .bind(plan.campaign_limit)
        .bind(plan.connection_limit)
        .bind(plan.custom_branding)
        .bind(plan.priority_support)
        .bind(plan.storage_limit_mb)
        .bind(plan.uploads_per_month)
        .bind(plan.team_size)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reassign_subscriptions_to_plan(
        &self,
        from_names: &[PlanName],
        to_name: PlanName,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_subscriptions s
            SET plan_id = target.id, updated_at = NOW()
            FROM subscription_plans old_plan, subscription_plans target
            WHERE s.plan_id = old_plan.id
              AND old_plan.name::text = ANY($1)
              AND target.user_type = old_plan.user_type
              AND target.name = $2
            "#
        )
        .bind(name_strings(from_names))
        .bind(to_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_plans_by_name(&self, names: &[PlanName]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM subscription_plans WHERE name::text = ANY($1)"
        )
        .bind(name_strings(names))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn count_plans_by_user_type(&self) -> Result<Vec<(PlanUserType, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (PlanUserType, i64)>(
            r#"
            SELECT user_type, COUNT(*) AS plan_count
            FROM subscription_plans
            GROUP BY user_type
            "#
        )
        .fetch_all(&self.pool)
        .await
    }
}
