use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::{Value, json};

use crate::config::ReferralConfig;
use crate::database::is_unique_violation;
use crate::entities::{
    TransactionKind, TransactionStatus, transaction_entity as transactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{BalanceDelta, Compensation, PaginatedResponse, PaginationParams,
    TransactionResponse};
use crate::services::pricing::TokenCost;
use crate::services::referral;

/// Applies a signed balance delta to one account row. Debit-direction
/// components are guarded in the UPDATE itself (`balance >= amount`), so the
/// check and the write are a single statement; there is no separate
/// read-then-write window.
pub(crate) async fn apply_balance_delta<C>(
    conn: &C,
    user_id: i64,
    delta: &BalanceDelta,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let mut update = users::Entity::update_many()
        .col_expr(
            users::Column::Gems,
            Expr::col(users::Column::Gems).add(delta.gems),
        )
        .col_expr(
            users::Column::Sparks,
            Expr::col(users::Column::Sparks).add(delta.sparks),
        )
        .col_expr(
            users::Column::CashBalanceCents,
            Expr::col(users::Column::CashBalanceCents).add(delta.cash_cents),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id));

    if delta.gems < 0 {
        update = update.filter(users::Column::Gems.gte(-delta.gems));
    }
    if delta.sparks < 0 {
        update = update.filter(users::Column::Sparks.gte(-delta.sparks));
    }
    if delta.cash_cents < 0 {
        update = update.filter(users::Column::CashBalanceCents.gte(-delta.cash_cents));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        let exists = users::Entity::find_by_id(user_id).one(conn).await?.is_some();
        return Err(if exists {
            AppError::InsufficientBalance
        } else {
            AppError::AccountNotFound
        });
    }
    Ok(())
}

/// Credits referral earnings: spendable balance and the lifetime counter
/// move together.
pub(crate) async fn credit_referral_earnings<C>(
    conn: &C,
    user_id: i64,
    bonus_cents: i64,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::CashBalanceCents,
            Expr::col(users::Column::CashBalanceCents).add(bonus_cents),
        )
        .col_expr(
            users::Column::CashEarnedCents,
            Expr::col(users::Column::CashEarnedCents).add(bonus_cents),
        )
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::AccountNotFound);
    }
    Ok(())
}

/// Inserts one ledger row. A colliding `external_id` surfaces as
/// `DuplicateExternalId` — that covers illegal duplicate creation, which is
/// distinct from the no-op path of a replayed confirmation.
pub(crate) async fn record_transaction<C>(
    conn: &C,
    user_id: i64,
    kind: TransactionKind,
    method: Option<&str>,
    status: TransactionStatus,
    delta: &BalanceDelta,
    external_id: Option<&str>,
    payload: Option<Value>,
) -> AppResult<transactions::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let insert = transactions::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind),
        method: Set(method.map(str::to_owned)),
        status: Set(status),
        amount_gems: Set(delta.gems),
        amount_sparks: Set(delta.sparks),
        amount_cash_cents: Set(delta.cash_cents),
        external_id: Set(external_id.map(str::to_owned)),
        payload: Set(payload),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await;

    match insert {
        Ok(tx) => Ok(tx),
        Err(err) if is_unique_violation(&err) => Err(AppError::DuplicateExternalId(
            external_id.unwrap_or_default().to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Applies a compensation and records it as its own spend-kind transaction
/// tagged with the transaction it reverses.
pub(crate) async fn record_compensation<C>(
    conn: &C,
    user_id: i64,
    compensation: &Compensation,
) -> AppResult<transactions::Model>
where
    C: ConnectionTrait,
{
    apply_balance_delta(conn, user_id, &compensation.delta).await?;
    record_transaction(
        conn,
        user_id,
        TransactionKind::Spend,
        compensation.method.as_deref(),
        TransactionStatus::Paid,
        &compensation.delta,
        None,
        Some(json!({ "compensates": compensation.source_tx_id })),
    )
    .await
}

#[derive(Clone)]
pub struct LedgerService {
    pool: DatabaseConnection,
    referral: ReferralConfig,
}

impl LedgerService {
    pub fn new(pool: DatabaseConnection, referral: ReferralConfig) -> Self {
        Self { pool, referral }
    }

    /// Debits a resolved token cost and records the spend, as one atomic
    /// unit. The spend row is terminal (`paid`) from the start.
    pub async fn debit(
        &self,
        user_id: i64,
        cost: &TokenCost,
        method: &str,
        payload: Option<Value>,
    ) -> AppResult<transactions::Model> {
        let delta = BalanceDelta::tokens(-cost.gems, -cost.sparks);
        let txn = self.pool.begin().await?;
        apply_balance_delta(&txn, user_id, &delta).await?;
        let tx = record_transaction(
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
        txn.commit().await?;
        Ok(tx)
    }

    /// Saga compensation for a committed debit. The original spend stays in
    /// history untouched; this records an independent reversing transaction.
    pub async fn refund(
        &self,
        user_id: i64,
        compensation: &Compensation,
    ) -> AppResult<transactions::Model> {
        let txn = self.pool.begin().await?;
        let tx = record_compensation(&txn, user_id, compensation).await?;
        txn.commit().await?;
        Ok(tx)
    }

    /// Records a pending top-up carrying the idempotency key. Balances are
    /// untouched until confirmation.
    pub async fn create_pending_topup(
        &self,
        user_id: i64,
        gems: i64,
        method: &str,
        external_id: &str,
        payload: Option<Value>,
    ) -> AppResult<transactions::Model> {
        let txn = self.pool.begin().await?;
        let account = users::Entity::find_by_id(user_id).one(&txn).await?;
        if account.is_none() {
            return Err(AppError::AccountNotFound);
        }
        let tx = record_transaction(
            &txn,
            user_id,
            TransactionKind::Topup,
            Some(method),
            TransactionStatus::Pending,
            &BalanceDelta::tokens(gems, 0),
            Some(external_id),
            payload,
        )
        .await?;
        txn.commit().await?;
        Ok(tx)
    }

    /// Signed admin correction, applied and recorded atomically. A
    /// debit-direction adjustment that would overdraw fails with
    /// `InsufficientBalance` and leaves no trace.
    pub async fn admin_adjust(
        &self,
        user_id: i64,
        delta: &BalanceDelta,
        note: Option<&str>,
    ) -> AppResult<transactions::Model> {
        let txn = self.pool.begin().await?;
        apply_balance_delta(&txn, user_id, delta).await?;
        let tx = record_transaction(
            &txn,
            user_id,
            TransactionKind::AdminAdjust,
            Some("admin"),
            TransactionStatus::Paid,
            delta,
            None,
            note.map(|n| json!({ "note": n })),
        )
        .await?;
        txn.commit().await?;
        Ok(tx)
    }

    /// Marks the pending transaction behind `external_id` paid and credits
    /// its amounts, exactly once. Returns `None` for an unknown id as well
    /// as for a replay — callers cannot tell the two apart, which is what
    /// makes retried webhook deliveries safe.
    ///
    /// The `pending`-status filter on the UPDATE is the compare-and-swap
    /// guard: of N concurrent confirmations only one sees rows_affected = 1,
    /// and everything this method does rides the same database transaction.
    pub async fn confirm_topup(
        &self,
        external_id: &str,
    ) -> AppResult<Option<transactions::Model>> {
        let txn = self.pool.begin().await?;

        let flipped = transactions::Entity::update_many()
            .col_expr(
                transactions::Column::Status,
                Expr::value(TransactionStatus::Paid),
            )
            .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(transactions::Column::ExternalId.eq(external_id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Pending))
            .exec(&txn)
            .await?;
        if flipped.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }

        let tx = transactions::Entity::find()
            .filter(transactions::Column::ExternalId.eq(external_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "transaction {external_id} vanished during confirmation"
                ))
            })?;

        apply_balance_delta(
            &txn,
            tx.user_id,
            &BalanceDelta {
                gems: tx.amount_gems,
                sparks: tx.amount_sparks,
                cash_cents: tx.amount_cash_cents,
            },
        )
        .await?;

        let account = users::Entity::find_by_id(tx.user_id)
            .one(&txn)
            .await?
            .ok_or(AppError::AccountNotFound)?;

        if let Some(referrer_id) = account.referrer_id {
            let bonus = referral::bonus_cents(tx.amount_gems, self.referral.percent_bp);
            if bonus > 0 {
                credit_referral_earnings(&txn, referrer_id, bonus).await?;
                record_transaction(
                    &txn,
                    referrer_id,
                    TransactionKind::ReferralBonus,
                    tx.method.as_deref(),
                    TransactionStatus::Paid,
                    &BalanceDelta::cash(bonus),
                    None,
                    Some(json!({ "source_tx": external_id })),
                )
                .await?;
            }
        }

        txn.commit().await?;
        log::info!(
            "Confirmed top-up {} for user {}: +{} gems",
            external_id,
            tx.user_id,
            tx.amount_gems
        );
        Ok(Some(tx))
    }

    /// Transaction history, newest first.
    pub async fn list_transactions(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let total = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await? as i64;

        let rows = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(&self.pool)
            .await?;

        let items: Vec<TransactionResponse> =
            rows.into_iter().map(TransactionResponse::from).collect();
        Ok(PaginatedResponse::new(items, params, total))
    }
}
