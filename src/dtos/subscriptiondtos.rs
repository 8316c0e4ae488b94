use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::subscriptionmodels::{BillingCycle, PlanUserType};

#[derive(Debug, Deserialize)]
pub struct PlanQueryDto {
    pub user_type: Option<PlanUserType>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CheckoutDto {
    pub plan_id: Uuid,
    pub billing_cycle: BillingCycle,

    #[validate(length(min = 1, max = 50, message = "Payment method is invalid"))]
    pub payment_method: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Payment reference is invalid"))]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutoRenewDto {
    pub auto_renew: bool,
}
