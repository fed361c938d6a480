use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Platform identity of the end user, one account per value.
    pub external_id: i64,
    pub username: Option<String>,
    pub gems: i64,
    pub sparks: i64,
    pub cash_balance_cents: i64,
    /// Audit counter, only ever increases.
    pub cash_earned_cents: i64,
    pub referral_code: String,
    /// Set once at creation, immutable afterwards.
    pub referrer_id: Option<i64>,
    pub selected_tier: Tier,
    pub selected_preset: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "pro")]
    Pro,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Standard
    }
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Pro => "pro",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
