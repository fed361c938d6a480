use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::Value;

use crate::entities::{
    GenerationKind, GenerationStatus, Tier, TransactionKind, TransactionStatus,
    generation_entity as generations, transaction_entity as transactions,
};
use crate::error::{AppError, AppResult};
use crate::models::{BalanceDelta, Compensation};
use crate::services::ledger_service::{
    apply_balance_delta, record_compensation, record_transaction,
};
use crate::services::pricing::TokenCost;

#[derive(Clone)]
pub struct GenerationService {
    pool: DatabaseConnection,
}

impl GenerationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Debits the cost, records the spend transaction and creates the
    /// `processing` generation row — one atomic unit. The commit happens
    /// before any call to the generation backend, so no ledger lock is ever
    /// held across external latency; if the backend later fails, `fail`
    /// compensates.
    #[allow(clippy::too_many_arguments)]
    pub async fn start(
        &self,
        user_id: i64,
        kind: GenerationKind,
        tier: Option<Tier>,
        prompt: Option<String>,
        preset: Option<String>,
        cost: &TokenCost,
        method: &str,
        payload: Option<Value>,
    ) -> AppResult<(generations::Model, transactions::Model)> {
        let delta = BalanceDelta::tokens(-cost.gems, -cost.sparks);
        let txn = self.pool.begin().await?;

        apply_balance_delta(&txn, user_id, &delta).await?;
        let spend = record_transaction(
            &txn,
            user_id,
            TransactionKind::Spend,
            Some(method),
            TransactionStatus::Paid,
            &delta,
            None,
            payload,
        )
        .await?;

        let now = Utc::now();
        let generation = generations::ActiveModel {
            user_id: Set(user_id),
            kind: Set(kind),
            tier: Set(tier),
            prompt: Set(prompt),
            preset: Set(preset),
            status: Set(GenerationStatus::Processing),
            cost_gems: Set(cost.gems),
            cost_sparks: Set(cost.sparks),
            result_url: Set(None),
            error: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok((generation, spend))
    }

    /// Flips `processing → completed` exactly once. Returns false when the
    /// record was already finalized.
    pub async fn complete(&self, generation_id: i64, result_url: &str) -> AppResult<bool> {
        let result = generations::Entity::update_many()
            .col_expr(
                generations::Column::Status,
                Expr::value(GenerationStatus::Completed),
            )
            .col_expr(generations::Column::ResultUrl, Expr::value(result_url))
            .col_expr(generations::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(generations::Column::Id.eq(generation_id))
            .filter(generations::Column::Status.eq(GenerationStatus::Processing))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Flips `processing → failed` exactly once and, when a compensation is
    /// given, gives the debited tokens back in the same atomic unit. A
    /// replayed failure report finds the row already failed and refunds
    /// nothing.
    pub async fn fail(
        &self,
        generation_id: i64,
        error: &str,
        compensation: Option<&Compensation>,
    ) -> AppResult<bool> {
        let txn = self.pool.begin().await?;

        let flipped = generations::Entity::update_many()
            .col_expr(
                generations::Column::Status,
                Expr::value(GenerationStatus::Failed),
            )
            .col_expr(generations::Column::Error, Expr::value(error))
            .col_expr(generations::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(generations::Column::Id.eq(generation_id))
            .filter(generations::Column::Status.eq(GenerationStatus::Processing))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        if let Some(compensation) = compensation {
            let generation = generations::Entity::find_by_id(generation_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::InternalError(format!(
                        "generation {generation_id} vanished during failure handling"
                    ))
                })?;
            record_compensation(&txn, generation.user_id, compensation).await?;
        }

        txn.commit().await?;
        Ok(true)
    }

    pub async fn get(&self, generation_id: i64) -> AppResult<generations::Model> {
        generations::Entity::find_by_id(generation_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Generation not found".to_string()))
    }
}
