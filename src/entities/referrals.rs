use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Denormalized referral edge, one row per referred signup. Used for
/// counting; bonus computation reads `users.referrer_id` directly.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub referrer_id: i64,
    pub referred_user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
