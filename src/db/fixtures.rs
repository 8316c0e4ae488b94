// db/fixtures.rs
//! Row builders for tests that run against a migrated database.
use sqlx::{types::BigDecimal, PgPool};
use uuid::Uuid;

use crate::models::{campaignmodels::OrderStatus, usermodel::UserType};

pub async fn insert_user(pool: &PgPool, user_type: UserType) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, email, user_type) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("{:?} user", user_type))
        .bind(format!("{}@collabsync.test", id))
        .bind(user_type)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn insert_order(
    pool: &PgPool,
    campaign_id: Uuid,
    influencer_id: Uuid,
    buyer_id: Uuid,
    status: OrderStatus,
    total_amount: BigDecimal,
) {
    sqlx::query(
        r#"
        INSERT INTO orders (campaign_id, influencer_id, buyer_id, status, total_amount)
        VALUES ($1, $2, $3, $4, $5)
        "#
    )
    .bind(campaign_id)
    .bind(influencer_id)
    .bind(buyer_id)
    .bind(status)
    .bind(total_amount)
    .execute(pool)
    .await
    .unwrap();
}
