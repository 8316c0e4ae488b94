use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::subscriptionmodels::PlanUserType;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Brand,
    Influencer,
    Customer,
    Admin,
}

impl UserType {
    pub fn to_str(&self) -> &str {
        match self {
            UserType::Brand => "brand",
            UserType::Influencer => "influencer",
            UserType::Customer => "customer",
            UserType::Admin => "admin",
        }
    }

    /// Only brands and influencers can hold a subscription plan.
    pub fn plan_user_type(&self) -> Option<PlanUserType> {
        match self {
            UserType::Brand => Some(PlanUserType::Brand),
            UserType::Influencer => Some(PlanUserType::Influencer),
            UserType::Customer | UserType::Admin => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub user_type: UserType,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}
