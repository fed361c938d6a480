use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

use crate::database::is_unique_violation;
use crate::entities::{Tier, referral_entity as referrals, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::utils::generate_referral_code;

/// Bound on creation retries after losing a uniqueness race. Referral codes
/// have 36^8 values, so more than one resample never happens in practice.
const CREATE_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct AccountService {
    pool: DatabaseConnection,
}

impl AccountService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn find_by_external_id(&self, external_id: i64) -> AppResult<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::ExternalId.eq(external_id))
            .one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_external_id(&self, external_id: i64) -> AppResult<users::Model> {
        self.find_by_external_id(external_id)
            .await?
            .ok_or(AppError::AccountNotFound)
    }

    pub async fn get_by_id(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or(AppError::AccountNotFound)
    }

    /// Returns the existing account for this platform identity, refreshing
    /// the display-name hint, or creates a new one. A referral code in the
    /// deep link resolves the referrer at creation time; a code pointing at
    /// the identity being onboarded is ignored without error. The referrer
    /// link and the referral edge are written in the same database
    /// transaction as the account row.
    pub async fn get_or_create(
        &self,
        external_id: i64,
        username: Option<&str>,
        referral_code: Option<&str>,
    ) -> AppResult<users::Model> {
        if let Some(user) = self.find_by_external_id(external_id).await? {
            return self.refresh_username(user, username).await;
        }

        for _ in 0..CREATE_ATTEMPTS {
            match self.try_create(external_id, username, referral_code).await {
                Ok(user) => return Ok(user),
                Err(AppError::DatabaseError(err)) if is_unique_violation(&err) => {
                    // Lost a race: either this identity signed up on another
                    // task, or the sampled referral code collided. The first
                    // case returns the winner; the second resamples.
                    if let Some(user) = self.find_by_external_id(external_id).await? {
                        return self.refresh_username(user, username).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::InternalError(
            "could not allocate a unique referral code".to_string(),
        ))
    }

    async fn try_create(
        &self,
        external_id: i64,
        username: Option<&str>,
        referral_code: Option<&str>,
    ) -> AppResult<users::Model> {
        let txn = self.pool.begin().await?;

        let referrer_id = match referral_code {
            Some(code) => users::Entity::find()
                .filter(users::Column::ReferralCode.eq(code))
                .one(&txn)
                .await?
                .and_then(|referrer| (referrer.external_id != external_id).then_some(referrer.id)),
            None => None,
        };

        let code = loop {
            let candidate = generate_referral_code();
            let taken = users::Entity::find()
                .filter(users::Column::ReferralCode.eq(candidate.as_str()))
                .one(&txn)
                .await?
                .is_some();
            if !taken {
                break candidate;
            }
        };

        let now = Utc::now();
        let user = users::ActiveModel {
            external_id: Set(external_id),
            username: Set(username.map(str::to_owned)),
            gems: Set(0),
            sparks: Set(0),
            cash_balance_cents: Set(0),
            cash_earned_cents: Set(0),
            referral_code: Set(code),
            referrer_id: Set(referrer_id),
            selected_tier: Set(Tier::default()),
            selected_preset: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(referrer_id) = referrer_id {
            referrals::ActiveModel {
                referrer_id: Set(referrer_id),
                referred_user_id: Set(user.id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        log::info!(
            "Created account {} for external id {} (referrer: {:?})",
            user.id,
            external_id,
            referrer_id
        );
        Ok(user)
    }

    async fn refresh_username(
        &self,
        user: users::Model,
        username: Option<&str>,
    ) -> AppResult<users::Model> {
        match username {
            Some(name) if user.username.as_deref() != Some(name) => {
                let mut model = user.into_active_model();
                model.username = Set(Some(name.to_owned()));
                model.updated_at = Set(Utc::now());
                Ok(model.update(&self.pool).await?)
            }
            _ => Ok(user),
        }
    }

    /// Last-write-wins single-field update.
    pub async fn set_selected_tier(&self, external_id: i64, tier: Tier) -> AppResult<users::Model> {
        let user = self.get_by_external_id(external_id).await?;
        let mut model = user.into_active_model();
        model.selected_tier = Set(tier);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?)
    }

    /// Last-write-wins single-field update; `None` clears the selection.
    pub async fn set_selected_preset(
        &self,
        external_id: i64,
        preset: Option<String>,
    ) -> AppResult<users::Model> {
        let user = self.get_by_external_id(external_id).await?;
        let mut model = user.into_active_model();
        model.selected_preset = Set(preset);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&self.pool).await?)
    }

    pub async fn referral_count(&self, user_id: i64) -> AppResult<i64> {
        let count = referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(user_id))
            .count(&self.pool)
            .await?;
        Ok(count as i64)
    }

    /// Admin lookup: digits are treated as an external id, anything else as
    /// a username.
    pub async fn find_account(&self, query: &str) -> AppResult<Option<users::Model>> {
        let query = query.trim();
        if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(external_id) = query.parse::<i64>() {
                return self.find_by_external_id(external_id).await;
            }
        }
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(query))
            .one(&self.pool)
            .await?;
        Ok(user)
    }
}
