use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::{
        cache::{CacheHelper, PLAN_CACHE_TTL},
        campaigndb::CampaignExt,
        db::DBClient,
        deliverabledb::DeliverableExt,
        subscriptiondb::{NewPayment, NewSubscription, SubscriptionExt},
    },
    models::{
        subscriptionmodels::*,
        usermodel::User,
    },
    service::error::ServiceError,
};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedAction {
    CreateCampaign,
    SendInvite,
    UploadContent,
}

impl GatedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatedAction::CreateCampaign => "create_campaign",
            GatedAction::SendInvite => "send_invite",
            GatedAction::UploadContent => "upload_content",
        }
    }

    pub fn limit(&self, plan: &SubscriptionPlan) -> i32 {
        match self {
            GatedAction::CreateCampaign => plan.campaign_limit,
            GatedAction::SendInvite => plan.connection_limit,
            GatedAction::UploadContent => plan.uploads_per_month,
        }
    }

    pub fn for_user_type(user_type: PlanUserType) -> Vec<GatedAction> {
        match user_type {
            PlanUserType::Brand => vec![GatedAction::CreateCampaign, GatedAction::SendInvite],
            PlanUserType::Influencer => vec![GatedAction::UploadContent],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    pub action: GatedAction,
    pub plan: PlanName,
    pub limit: i32,
    pub used: i64,
    pub allowed: bool,
}

impl GateDecision {
    /// `None` for unlimited plans.
    pub fn remaining(&self) -> Option<i64> {
        if self.limit == UNLIMITED {
            None
        } else {
            Some((self.limit as i64 - self.used).max(0))
        }
    }

    pub fn into_result(self) -> Result<GateDecision, ServiceError> {
        if self.allowed {
            return Ok(self);
        }

        Err(ServiceError::PlanLimitReached {
            action: self.action.as_str(),
            plan: self.plan.to_str().to_string(),
            limit: self.limit,
            used: self.used,
        })
    }
}

pub fn evaluate_gate(plan: &SubscriptionPlan, action: GatedAction, used: i64) -> GateDecision {
    let limit = action.limit(plan);
    let allowed = limit == UNLIMITED || used < limit as i64;

    GateDecision {
        action,
        plan: plan.name,
        limit,
        used,
        allowed,
    }
}

pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("INV-{}-{}", now.format("%Y%m%d"), suffix[..8].to_uppercase())
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectivePlan {
    pub plan: SubscriptionPlan,
    pub subscription: Option<UserSubscription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOverview {
    pub latest_subscription: Option<UserSubscription>,
    pub effective_plan: SubscriptionPlan,
    pub usage: Vec<GateDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub subscription: UserSubscription,
    pub payment: Option<PaymentHistory>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpirySummary {
    pub expired: usize,
    pub renewals_requested: usize,
}

#[derive(Debug, Clone)]
pub struct SubscriptionService {
    db_client: Arc<DBClient>,
}

impl SubscriptionService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    fn plan_user_type(user: &User) -> Result<PlanUserType, ServiceError> {
        user.user_type.plan_user_type().ok_or_else(|| {
            ServiceError::Validation(
                "Only brand and influencer accounts have subscription plans".to_string(),
            )
        })
    }

    pub async fn list_plans(
        &self,
        user_type: Option<PlanUserType>,
    ) -> Result<Vec<SubscriptionPlan>, ServiceError> {
        let cache_key = CacheHelper::plans_key(user_type.as_ref().map(|t| t.to_str()).unwrap_or("all"));

        if let Some(redis) = &self.db_client.redis_client {
            match CacheHelper::get::<Vec<SubscriptionPlan>>(redis, &cache_key).await {
                Ok(Some(plans)) => return Ok(plans),
                Ok(None) => {}
                Err(e) => tracing::warn!("Plan cache read failed: {}", e),
            }
        }

        let plans: Vec<SubscriptionPlan> = self
            .db_client
            .list_plans(user_type)
            .await?
            .into_iter()
            .filter(|plan| !plan.name.is_deprecated())
            .collect();

        if let Some(redis) = &self.db_client.redis_client {
            if let Err(e) = CacheHelper::set(redis, &cache_key, &plans, PLAN_CACHE_TTL).await {
                tracing::warn!("Plan cache write failed: {}", e);
            }
        }

        Ok(plans)
    }

    /// Current paid plan, or the Free plan of the user's type when the latest
    /// subscription is missing, expired, cancelled or still pending.
    pub async fn resolve_effective_plan(&self, user: &User) -> Result<EffectivePlan, ServiceError> {
        let user_type = Self::plan_user_type(user)?;
        let now = Utc::now();

        let current = self
            .db_client
            .get_current_subscription(user.id, now)
            .await?
            .filter(|s| s.is_current(now));

        if let Some(subscription) = current {
            if let Some(plan) = self.db_client.get_plan(subscription.plan_id).await? {
                return Ok(EffectivePlan {
                    plan,
                    subscription: Some(subscription),
                });
            }
            tracing::warn!(
                "Subscription {} points at missing plan {}",
                subscription.id,
                subscription.plan_id
            );
        }

        let free = self
            .db_client
            .get_plan_by_name(PlanName::Free, user_type)
            .await?
            .ok_or_else(|| ServiceError::PlanNotFound(format!("free ({})", user_type.to_str())))?;

        Ok(EffectivePlan {
            plan: free,
            subscription: None,
        })
    }

    pub async fn usage(&self, user: &User, action: GatedAction) -> Result<i64, ServiceError> {
        let used = match action {
            GatedAction::CreateCampaign => self.db_client.count_open_campaigns(user.id).await?,
            GatedAction::SendInvite => self.db_client.count_open_collaborations(user.id).await?,
            GatedAction::UploadContent => {
                self.db_client
                    .count_submissions_since(user.id, month_start(Utc::now()))
                    .await?
            }
        };
        Ok(used)
    }

    /// Fails with `PlanLimitReached` when the action would exceed the plan.
    pub async fn check_action(
        &self,
        user: &User,
        action: GatedAction,
    ) -> Result<GateDecision, ServiceError> {
        let effective = self.resolve_effective_plan(user).await?;
        let used = self.usage(user, action).await?;
        let decision = evaluate_gate(&effective.plan, action, used);

        if !decision.allowed {
            tracing::info!(
                "User {} blocked on {} ({}/{} on {} plan)",
                user.id,
                action.as_str(),
                used,
                decision.limit,
                decision.plan.to_str()
            );
        }

        decision.into_result()
    }

    pub async fn overview(&self, user: &User) -> Result<SubscriptionOverview, ServiceError> {
        let user_type = Self::plan_user_type(user)?;
        let effective = self.resolve_effective_plan(user).await?;
        let latest_subscription = self.db_client.get_latest_subscription(user.id).await?;

        let mut usage = Vec::new();
        for action in GatedAction::for_user_type(user_type) {
            let used = self.usage(user, action).await?;
            usage.push(evaluate_gate(&effective.plan, action, used));
        }

        Ok(SubscriptionOverview {
            latest_subscription,
            effective_plan: effective.plan,
            usage,
        })
    }

    pub async fn checkout(
        &self,
        user: &User,
        plan_id: Uuid,
        billing_cycle: BillingCycle,
        payment_method: Option<String>,
        payment_reference: Option<String>,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let user_type = Self::plan_user_type(user)?;

        let plan = self
            .db_client
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| ServiceError::PlanNotFound(plan_id.to_string()))?;

        if plan.name.is_deprecated() {
            return Err(ServiceError::Validation("This plan is no longer offered".to_string()));
        }

        if plan.user_type != user_type {
            return Err(ServiceError::Validation(format!(
                "The {} plan you selected is for {} accounts",
                plan.name.to_str(),
                plan.user_type.to_str()
            )));
        }

        if let Some(latest) = self.db_client.get_latest_subscription(user.id).await? {
            if latest.status == SubscriptionStatus::Pending {
                return Err(ServiceError::Validation(
                    "A subscription payment is already awaiting approval".to_string(),
                ));
            }
        }

        let now = Utc::now();

        if plan.is_free() {
            let subscription = self
                .db_client
                .create_subscription(NewSubscription {
                    user_id: user.id,
                    plan_id: plan.id,
                    status: SubscriptionStatus::Active,
                    billing_cycle,
                    start_date: Some(now),
                    end_date: Some(now + billing_cycle.period()),
                    amount: plan.price_for(billing_cycle),
                    payment_method: None,
                    payment_details: None,
                    auto_renew: false,
                })
                .await?;

            tracing::info!("User {} switched to the free {} plan", user.id, user_type.to_str());
            return Ok(CheckoutOutcome {
                subscription,
                payment: None,
            });
        }

        let amount = plan.price_for(billing_cycle);
        let subscription = self
            .db_client
            .create_subscription(NewSubscription {
                user_id: user.id,
                plan_id: plan.id,
                status: SubscriptionStatus::Pending,
                billing_cycle,
                start_date: None,
                end_date: None,
                amount: amount.clone(),
                payment_method: payment_method.clone(),
                payment_details: payment_reference
                    .as_ref()
                    .map(|reference| serde_json::json!({ "reference": reference })),
                auto_renew: true,
            })
            .await?;

        let payment = self
            .db_client
            .insert_payment(NewPayment {
                subscription_id: subscription.id,
                user_id: user.id,
                amount,
                currency: DEFAULT_CURRENCY.to_string(),
                status: PaymentStatus::Pending,
                gateway: payment_method,
                invoice_number: generate_invoice_number(now),
                note: payment_reference,
            })
            .await?;

        tracing::info!(
            "User {} requested the {} plan; payment {} awaiting approval",
            user.id,
            plan.name.to_str(),
            payment.invoice_number
        );

        Ok(CheckoutOutcome {
            subscription,
            payment: Some(payment),
        })
    }

    pub async fn cancel(&self, user: &User) -> Result<UserSubscription, ServiceError> {
        let latest = self
            .db_client
            .get_latest_subscription(user.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subscription".to_string()))?;

        self.db_client
            .cancel_subscription(latest.id)
            .await?
            .ok_or_else(|| {
                ServiceError::Validation("Only active or pending subscriptions can be cancelled".to_string())
            })
    }

    pub async fn set_auto_renew(
        &self,
        user: &User,
        auto_renew: bool,
    ) -> Result<UserSubscription, ServiceError> {
        let latest = self
            .db_client
            .get_latest_subscription(user.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Subscription".to_string()))?;

        if !matches!(latest.status, SubscriptionStatus::Active | SubscriptionStatus::Pending) {
            return Err(ServiceError::Validation(
                "Auto-renew can only be changed on an active or pending subscription".to_string(),
            ));
        }

        Ok(self.db_client.set_auto_renew(latest.id, auto_renew).await?)
    }

    pub async fn payments(&self, user: &User) -> Result<Vec<PaymentHistory>, ServiceError> {
        Ok(self.db_client.get_user_payments(user.id).await?)
    }

    pub async fn pending_payments(&self) -> Result<Vec<PendingSubscriptionPayment>, ServiceError> {
        Ok(self.db_client.get_pending_subscription_payments().await?)
    }

    /// Activates a pending subscription for one billing cycle and records a
    /// completed payment.
    pub async fn approve_payment(
        &self,
        admin: &User,
        subscription_id: Uuid,
        note: Option<String>,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let subscription = self
            .db_client
            .get_subscription(subscription_id)
            .await?
            .ok_or(ServiceError::SubscriptionNotFound(subscription_id))?;

        if subscription.status != SubscriptionStatus::Pending {
            return Err(ServiceError::Validation(
                "Subscription is not awaiting payment approval".to_string(),
            ));
        }

        let now = Utc::now();
        let activated = self
            .db_client
            .transition_subscription(
                subscription_id,
                SubscriptionStatus::Pending,
                SubscriptionStatus::Active,
                Some(now),
                Some(now + subscription.billing_cycle.period()),
            )
            .await?
            .ok_or_else(|| ServiceError::ConcurrentModification(format!("Subscription {}", subscription_id)))?;

        let payment = self
            .db_client
            .insert_payment(NewPayment {
                subscription_id,
                user_id: subscription.user_id,
                amount: subscription.amount.clone(),
                currency: DEFAULT_CURRENCY.to_string(),
                status: PaymentStatus::Completed,
                gateway: subscription.payment_method.clone(),
                invoice_number: generate_invoice_number(now),
                note,
            })
            .await?;

        tracing::info!("Admin {} approved payment for subscription {}", admin.id, subscription_id);

        Ok(CheckoutOutcome {
            subscription: activated,
            payment: Some(payment),
        })
    }

    pub async fn reject_payment(
        &self,
        admin: &User,
        subscription_id: Uuid,
        reason: String,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let subscription = self
            .db_client
            .get_subscription(subscription_id)
            .await?
            .ok_or(ServiceError::SubscriptionNotFound(subscription_id))?;

        let cancelled = self
            .db_client
            .transition_subscription(
                subscription_id,
                SubscriptionStatus::Pending,
                SubscriptionStatus::Cancelled,
                None,
                None,
            )
            .await?
            .ok_or_else(|| {
                ServiceError::Validation("Subscription is not awaiting payment approval".to_string())
            })?;

        let payment = self
            .db_client
            .insert_payment(NewPayment {
                subscription_id,
                user_id: subscription.user_id,
                amount: subscription.amount.clone(),
                currency: DEFAULT_CURRENCY.to_string(),
                status: PaymentStatus::Failed,
                gateway: subscription.payment_method.clone(),
                invoice_number: generate_invoice_number(Utc::now()),
                note: Some(reason),
            })
            .await?;

        tracing::info!("Admin {} rejected payment for subscription {}", admin.id, subscription_id);

        Ok(CheckoutOutcome {
            subscription: cancelled,
            payment: Some(payment),
        })
    }

    /// Active subscriptions past their end date either expire or, with
    /// auto-renew on a paid plan, go back to pending with a renewal payment.
    pub async fn process_due_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ExpirySummary, ServiceError> {
        let mut summary = ExpirySummary::default();

        for subscription in self.db_client.get_due_subscriptions(now).await? {
            let plan = self.db_client.get_plan(subscription.plan_id).await?;
            let renewable = subscription.auto_renew
                && plan.as_ref().map(|p| !p.is_free()).unwrap_or(false);

            if renewable {
                let moved = self
                    .db_client
                    .transition_subscription(
                        subscription.id,
                        SubscriptionStatus::Active,
                        SubscriptionStatus::Pending,
                        None,
                        None,
                    )
                    .await?;

                if moved.is_some() {
                    self.db_client
                        .insert_payment(NewPayment {
                            subscription_id: subscription.id,
                            user_id: subscription.user_id,
                            amount: subscription.amount.clone(),
                            currency: DEFAULT_CURRENCY.to_string(),
                            status: PaymentStatus::Pending,
                            gateway: subscription.payment_method.clone(),
                            invoice_number: generate_invoice_number(now),
                            note: Some("Automatic renewal".to_string()),
                        })
                        .await?;
                    summary.renewals_requested += 1;
                }
            } else {
                let moved = self
                    .db_client
                    .transition_subscription(
                        subscription.id,
                        SubscriptionStatus::Active,
                        SubscriptionStatus::Expired,
                        None,
                        None,
                    )
                    .await?;

                if moved.is_some() {
                    summary.expired += 1;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::types::BigDecimal;

    pub(crate) fn plan(name: PlanName, user_type: PlanUserType, limit: i32) -> SubscriptionPlan {
        SubscriptionPlan {
            id: Uuid::new_v4(),
            name,
            user_type,
            monthly_price: BigDecimal::from(0),
            yearly_price: BigDecimal::from(0),
            analytics_tier: AnalyticsTier::Basic,
            campaign_limit: limit,
            connection_limit: limit,
            custom_branding: false,
            priority_support: false,
            storage_limit_mb: 100,
            uploads_per_month: limit,
            team_size: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn gate_blocks_at_the_limit() {
        let free = plan(PlanName::Free, PlanUserType::Brand, 1);

        let first = evaluate_gate(&free, GatedAction::CreateCampaign, 0);
        assert!(first.allowed);
        assert_eq!(first.remaining(), Some(1));

        let second = evaluate_gate(&free, GatedAction::CreateCampaign, 1);
        assert!(!second.allowed);
        assert_eq!(second.remaining(), Some(0));
    }

    #[test]
    fn unlimited_plans_never_block() {
        let premium = plan(PlanName::Premium, PlanUserType::Influencer, UNLIMITED);
        let decision = evaluate_gate(&premium, GatedAction::UploadContent, 10_000);
        assert!(decision.allowed);
        assert_eq!(decision.remaining(), None);
    }

    #[test]
    fn blocked_decision_becomes_plan_limit_error() {
        let free = plan(PlanName::Free, PlanUserType::Brand, 3);
        let err = evaluate_gate(&free, GatedAction::SendInvite, 3)
            .into_result()
            .unwrap_err();

        match err {
            ServiceError::PlanLimitReached { action, plan, limit, used } => {
                assert_eq!(action, "send_invite");
                assert_eq!(plan, "free");
                assert_eq!(limit, 3);
                assert_eq!(used, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn actions_follow_the_user_type() {
        assert_eq!(
            GatedAction::for_user_type(PlanUserType::Brand),
            vec![GatedAction::CreateCampaign, GatedAction::SendInvite]
        );
        assert_eq!(
            GatedAction::for_user_type(PlanUserType::Influencer),
            vec![GatedAction::UploadContent]
        );
    }

    #[test]
    fn usage_window_starts_on_the_first_of_the_month() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 18, 30, 0).unwrap();
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn invoice_numbers_are_dated_and_unique() {
        let now = Utc.with_ymd_and_hms(2024, 5, 7, 12, 0, 0).unwrap();
        let a = generate_invoice_number(now);
        let b = generate_invoice_number(now);
        assert!(a.starts_with("INV-20240507-"));
        assert_eq!(a.len(), "INV-20240507-".len() + 8);
        assert_ne!(a, b);
    }
}
