use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{Tier, user_entity as users};

/// Get-or-create request sent by the presentation layer on first contact.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncAccountRequest {
    #[schema(example = 429871234)]
    pub external_id: i64,
    #[schema(example = "ada")]
    pub username: Option<String>,
    /// Referral code carried in the deep link, if any.
    #[schema(example = "K7Q2M9XD")]
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i64,
    pub external_id: i64,
    pub username: Option<String>,
    pub gems: i64,
    pub sparks: i64,
    pub cash_balance_cents: i64,
    pub cash_earned_cents: i64,
    pub referral_code: String,
    pub referrer_id: Option<i64>,
    pub selected_tier: Tier,
    pub selected_preset: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for AccountResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            username: user.username,
            gems: user.gems,
            sparks: user.sparks,
            cash_balance_cents: user.cash_balance_cents,
            cash_earned_cents: user.cash_earned_cents,
            referral_code: user.referral_code,
            referrer_id: user.referrer_id,
            selected_tier: user.selected_tier,
            selected_preset: user.selected_preset,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountProfileResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub referral_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateTierRequest {
    pub tier: Tier,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePresetRequest {
    /// `null` clears the selection.
    pub preset: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
pub struct FindAccountQuery {
    /// External id (digits) or username.
    pub q: String,
}
