use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

/// Caps stored as `-1` mean "no limit".
pub const UNLIMITED: i32 = -1;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "plan_name", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanName {
    Free,
    Basic,
    Premium,
    // Retired tiers, kept so old rows can still be read and pruned.
    Pro,
    Enterprise,
}

impl PlanName {
    pub fn to_str(&self) -> &str {
        match self {
            PlanName::Free => "free",
            PlanName::Basic => "basic",
            PlanName::Premium => "premium",
            PlanName::Pro => "pro",
            PlanName::Enterprise => "enterprise",
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, PlanName::Pro | PlanName::Enterprise)
    }

    pub fn current() -> [PlanName; 3] {
        [PlanName::Free, PlanName::Basic, PlanName::Premium]
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "plan_user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanUserType {
    Brand,
    Influencer,
}

impl PlanUserType {
    pub fn to_str(&self) -> &str {
        match self {
            PlanUserType::Brand => "brand",
            PlanUserType::Influencer => "influencer",
        }
    }

    pub fn all() -> [PlanUserType; 2] {
        [PlanUserType::Brand, PlanUserType::Influencer]
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, PartialOrd, Ord)]
#[sqlx(type_name = "analytics_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsTier {
    Basic,
    Advanced,
    Premium,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
    Pending,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "billing_cycle", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn period(&self) -> Duration {
        match self {
            BillingCycle::Monthly => Duration::days(30),
            BillingCycle::Yearly => Duration::days(365),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: PlanName,
    pub user_type: PlanUserType,
    pub monthly_price: BigDecimal,
    pub yearly_price: BigDecimal,
    pub analytics_tier: AnalyticsTier,
    pub campaign_limit: i32,
    pub connection_limit: i32,
    pub custom_branding: bool,
    pub priority_support: bool,
    pub storage_limit_mb: i32,
    pub uploads_per_month: i32,
    pub team_size: i32,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn price_for(&self, cycle: BillingCycle) -> BigDecimal {
        match cycle {
            BillingCycle::Monthly => self.monthly_price.clone(),
            BillingCycle::Yearly => self.yearly_price.clone(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.name == PlanName::Free
    }
}

/// Plan definition without database identity, used for seeding.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanTemplate {
    pub name: PlanName,
    pub user_type: PlanUserType,
    pub monthly_price: BigDecimal,
    pub yearly_price: BigDecimal,
    pub analytics_tier: AnalyticsTier,
    pub campaign_limit: i32,
    pub connection_limit: i32,
    pub custom_branding: bool,
    pub priority_support: bool,
    pub storage_limit_mb: i32,
    pub uploads_per_month: i32,
    pub team_size: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct UserSubscription {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSubscription {
    /// Active and not past its end date.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.end_date.map(|end| end > now).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct PaymentHistory {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway: Option<String>,
    pub invoice_number: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pending subscription joined with its latest plan, for the admin queue.
#[derive(Debug, Deserialize, Serialize, Clone, sqlx::FromRow)]
pub struct PendingSubscriptionPayment {
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub plan_name: PlanName,
    pub plan_user_type: PlanUserType,
    pub billing_cycle: BillingCycle,
    pub amount: BigDecimal,
    pub payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, end_date: Option<DateTime<Utc>>) -> UserSubscription {
        UserSubscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status,
            billing_cycle: BillingCycle::Monthly,
            start_date: Some(Utc::now() - Duration::days(10)),
            end_date,
            amount: BigDecimal::from(0),
            payment_method: None,
            payment_details: None,
            auto_renew: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn current_requires_active_status_and_future_end_date() {
        let now = Utc::now();
        assert!(subscription(SubscriptionStatus::Active, Some(now + Duration::days(1))).is_current(now));
        assert!(!subscription(SubscriptionStatus::Active, Some(now - Duration::days(1))).is_current(now));
        assert!(!subscription(SubscriptionStatus::Active, None).is_current(now));
        assert!(!subscription(SubscriptionStatus::Cancelled, Some(now + Duration::days(1))).is_current(now));
    }

    #[test]
    fn only_pro_and_enterprise_are_deprecated() {
        assert!(PlanName::Pro.is_deprecated());
        assert!(PlanName::Enterprise.is_deprecated());
        assert!(PlanName::current().iter().all(|name| !name.is_deprecated()));
    }
}
