use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{TransactionKind, TransactionStatus, transaction_entity as transactions};

/// Signed deltas across the three currencies, applied to an account as one
/// unit. Negative token components are only applied when the balance covers
/// them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    pub gems: i64,
    pub sparks: i64,
    pub cash_cents: i64,
}

impl BalanceDelta {
    pub fn tokens(gems: i64, sparks: i64) -> Self {
        Self {
            gems,
            sparks,
            cash_cents: 0,
        }
    }

    pub fn cash(cents: i64) -> Self {
        Self {
            gems: 0,
            sparks: 0,
            cash_cents: cents,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.gems == 0 && self.sparks == 0 && self.cash_cents == 0
    }

    pub fn inverted(&self) -> Self {
        Self {
            gems: -self.gems,
            sparks: -self.sparks,
            cash_cents: -self.cash_cents,
        }
    }
}

/// Value object describing the reversal of a committed spend. The original
/// debit stays in history; applying the compensation records a new
/// transaction with the inverted amounts.
#[derive(Debug, Clone)]
pub struct Compensation {
    pub source_tx_id: i64,
    pub method: Option<String>,
    pub delta: BalanceDelta,
}

impl Compensation {
    pub fn for_spend(spend: &transactions::Model) -> Self {
        Self {
            source_tx_id: spend.id,
            method: spend.method.clone(),
            delta: BalanceDelta {
                gems: spend.amount_gems,
                sparks: spend.amount_sparks,
                cash_cents: spend.amount_cash_cents,
            }
            .inverted(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i64,
    pub user_id: i64,
    pub kind: TransactionKind,
    pub method: Option<String>,
    pub status: TransactionStatus,
    pub amount_gems: i64,
    pub amount_sparks: i64,
    pub amount_cash_cents: i64,
    pub external_id: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(tx: transactions::Model) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            kind: tx.kind,
            method: tx.method,
            status: tx.status,
            amount_gems: tx.amount_gems,
            amount_sparks: tx.amount_sparks,
            amount_cash_cents: tx.amount_cash_cents,
            external_id: tx.external_id,
            payload: tx.payload,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminAdjustRequest {
    #[serde(default)]
    pub gems_delta: i64,
    #[serde(default)]
    pub sparks_delta: i64,
    #[serde(default)]
    pub cash_delta_cents: i64,
    #[schema(example = "support-compensation")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminAdjustResponse {
    pub transaction: TransactionResponse,
    pub account: crate::models::account::AccountResponse,
}
