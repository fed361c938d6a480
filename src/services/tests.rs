use sea_orm::{ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;

use migration::{Migrator, MigratorTrait};

use crate::config::{PricingConfig, ReferralConfig};
use crate::entities::{
    GenerationKind, GenerationStatus, Tier, TransactionKind, TransactionStatus,
    transaction_entity as transactions,
};
use crate::error::AppError;
use crate::models::{BalanceDelta, Compensation, PaginationParams};
use crate::services::{
    AccountService, GenerationService, LedgerService, PricingResolver, TokenCost,
};

/// One pooled connection: with `sqlite::memory:` every connection is its own
/// database, so the pool must not open a second one.
async fn storage() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options).await.expect("storage inits");
    Migrator::up(&db, None).await.expect("migrations run");
    db
}

fn ledger(db: &DatabaseConnection) -> LedgerService {
    LedgerService::new(db.clone(), ReferralConfig { percent_bp: 1000 })
}

fn pricing() -> PricingResolver {
    PricingResolver::new(PricingConfig::default())
}

async fn tx_count(db: &DatabaseConnection, user_id: i64) -> u64 {
    use sea_orm::PaginatorTrait;
    transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn get_or_create_returns_same_account_and_refreshes_username() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    let created = accounts.get_or_create(42, Some("ada"), None).await.unwrap();
    assert_eq!(created.external_id, 42);
    assert_eq!(created.username.as_deref(), Some("ada"));
    assert_eq!(created.referral_code.len(), 8);
    assert_eq!(created.gems, 0);
    assert_eq!(created.sparks, 0);
    assert_eq!(created.cash_balance_cents, 0);
    assert_eq!(created.selected_tier, Tier::Standard);

    let again = accounts
        .get_or_create(42, Some("ada_lovelace"), None)
        .await
        .unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(again.username.as_deref(), Some("ada_lovelace"));
    assert_eq!(again.referral_code, created.referral_code);
}

#[tokio::test]
async fn referral_link_is_recorded_at_signup() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    let referrer = accounts.get_or_create(100, Some("ref"), None).await.unwrap();
    let referred = accounts
        .get_or_create(200, Some("newbie"), Some(referrer.referral_code.as_str()))
        .await
        .unwrap();

    assert_eq!(referred.referrer_id, Some(referrer.id));
    assert_eq!(accounts.referral_count(referrer.id).await.unwrap(), 1);
    assert_eq!(accounts.referral_count(referred.id).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_referral_code_is_ignored() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    let user = accounts
        .get_or_create(300, None, Some("NOCODE99"))
        .await
        .unwrap();
    assert_eq!(user.referrer_id, None);
    assert_eq!(accounts.referral_count(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn self_referral_never_links() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    let user = accounts.get_or_create(400, None, None).await.unwrap();
    let code = user.referral_code.clone();

    // Re-onboarding with one's own code must not create a link
    let same = accounts.get_or_create(400, None, Some(&code)).await.unwrap();
    assert_eq!(same.id, user.id);
    assert_eq!(same.referrer_id, None);
    assert_eq!(accounts.referral_count(user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn confirmation_is_idempotent() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .create_pending_topup(user.id, 40, "card", "ORD-1", None)
        .await
        .unwrap();

    // Pending top-ups leave balances untouched
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 0);

    let confirmed = ledger.confirm_topup("ORD-1").await.unwrap().unwrap();
    assert_eq!(confirmed.status, TransactionStatus::Paid);
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 40);

    // Replayed delivery: no-op, no second credit, no new row
    assert!(ledger.confirm_topup("ORD-1").await.unwrap().is_none());
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 40);
    assert_eq!(tx_count(&db, user.id).await, 1);
}

#[tokio::test]
async fn confirm_unknown_order_is_a_noop() {
    let db = storage().await;
    let ledger = ledger(&db);
    assert!(ledger.confirm_topup("ORD-missing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_external_id_is_rejected_at_creation() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .create_pending_topup(user.id, 40, "card", "ORD-dup", None)
        .await
        .unwrap();

    let err = ledger
        .create_pending_topup(user.id, 100, "card", "ORD-dup", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateExternalId(_)));
    assert_eq!(tx_count(&db, user.id).await, 1);
}

#[tokio::test]
async fn failed_generation_is_refunded() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);
    let generations = GenerationService::new(db.clone());

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(40, 0), None)
        .await
        .unwrap();

    // No sparks, so the standard tier falls back to gems
    let cost = pricing().resolve(40, 0, Tier::Standard).unwrap();
    assert_eq!(cost, TokenCost::gems(1));

    let (generation, spend) = generations
        .start(
            user.id,
            GenerationKind::TextToImage,
            Some(Tier::Standard),
            Some("a lighthouse at dawn".to_string()),
            None,
            &cost,
            "standard",
            Some(json!({ "prompt": "a lighthouse at dawn" })),
        )
        .await
        .unwrap();

    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 39);
    assert_eq!(spend.amount_gems, -1);
    assert_eq!(spend.status, TransactionStatus::Paid);
    assert_eq!(generation.status, GenerationStatus::Processing);

    let compensation = Compensation::for_spend(&spend);
    let refunded = generations
        .fail(generation.id, "backend unavailable", Some(&compensation))
        .await
        .unwrap();
    assert!(refunded);
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 40);

    let failed = generations.get(generation.id).await.unwrap();
    assert_eq!(failed.status, GenerationStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("backend unavailable"));

    // A replayed failure report refunds nothing
    let replay = generations
        .fail(generation.id, "backend unavailable", Some(&compensation))
        .await
        .unwrap();
    assert!(!replay);
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 40);

    // History keeps both legs: the debit and its compensation
    let rows = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user.id))
        .all(&db)
        .await
        .unwrap();
    let spends: Vec<_> = rows
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Spend)
        .collect();
    assert_eq!(spends.len(), 2);
    assert_eq!(spends.iter().map(|tx| tx.amount_gems).sum::<i64>(), 0);
}

#[tokio::test]
async fn completed_generation_finalizes_once() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);
    let generations = GenerationService::new(db.clone());

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(10, 0), None)
        .await
        .unwrap();

    let (generation, _spend) = generations
        .start(
            user.id,
            GenerationKind::Animate,
            None,
            None,
            None,
            &TokenCost::gems(5),
            "animate",
            None,
        )
        .await
        .unwrap();

    assert!(
        generations
            .complete(generation.id, "https://cdn.example.com/video.mp4")
            .await
            .unwrap()
    );
    assert!(
        !generations
            .complete(generation.id, "https://cdn.example.com/other.mp4")
            .await
            .unwrap()
    );

    let done = generations.get(generation.id).await.unwrap();
    assert_eq!(done.status, GenerationStatus::Completed);
    assert_eq!(
        done.result_url.as_deref(),
        Some("https://cdn.example.com/video.mp4")
    );
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 5);
}

#[tokio::test]
async fn referral_bonus_credits_the_referrer() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let referrer = accounts.get_or_create(100, Some("ref"), None).await.unwrap();
    let referred = accounts
        .get_or_create(200, Some("u"), Some(referrer.referral_code.as_str()))
        .await
        .unwrap();

    ledger
        .create_pending_topup(referred.id, 100, "card", "ORD-2", None)
        .await
        .unwrap();
    ledger.confirm_topup("ORD-2").await.unwrap().unwrap();

    let referrer = accounts.get_by_id(referrer.id).await.unwrap();
    assert_eq!(referrer.cash_balance_cents, 1000);
    assert_eq!(referrer.cash_earned_cents, 1000);

    let bonus = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(referrer.id))
        .filter(transactions::Column::Kind.eq(TransactionKind::ReferralBonus))
        .one(&db)
        .await
        .unwrap()
        .expect("bonus transaction exists");
    assert_eq!(bonus.status, TransactionStatus::Paid);
    assert_eq!(bonus.amount_cash_cents, 1000);
    assert_eq!(bonus.payload.unwrap()["source_tx"], json!("ORD-2"));

    // The replayed confirmation pays no second bonus either
    assert!(ledger.confirm_topup("ORD-2").await.unwrap().is_none());
    let referrer = accounts.get_by_id(referrer.id).await.unwrap();
    assert_eq!(referrer.cash_balance_cents, 1000);
}

#[tokio::test]
async fn no_bonus_without_a_referrer() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .create_pending_topup(user.id, 100, "card", "ORD-3", None)
        .await
        .unwrap();
    ledger.confirm_topup("ORD-3").await.unwrap().unwrap();

    let bonus_rows = transactions::Entity::find()
        .filter(transactions::Column::Kind.eq(TransactionKind::ReferralBonus))
        .all(&db)
        .await
        .unwrap();
    assert!(bonus_rows.is_empty());
}

#[tokio::test]
async fn admin_debit_cannot_overdraw() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(30, 0), Some("seed"))
        .await
        .unwrap();

    let err = ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(-50, 0), Some("takeback"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance));

    // Nothing recorded, nothing applied
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 30);
    assert_eq!(tx_count(&db, user.id).await, 1);
}

#[tokio::test]
async fn debit_fails_without_partial_application() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(1, 0), None)
        .await
        .unwrap();

    let err = ledger
        .debit(user.id, &TokenCost::gems(2), "pro", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance));

    let refreshed = accounts.get_by_id(user.id).await.unwrap();
    assert_eq!(refreshed.gems, 1);
    assert_eq!(tx_count(&db, user.id).await, 1);
}

#[tokio::test]
async fn debit_on_missing_account_reports_not_found() {
    let db = storage().await;
    let ledger = ledger(&db);

    let err = ledger
        .debit(9999, &TokenCost::gems(1), "standard", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound));
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(3, 0), None)
        .await
        .unwrap();

    // Each debit alone fits the balance, both together would overdraw
    let cost = TokenCost::gems(2);
    let (first, second) = tokio::join!(
        ledger.debit(user.id, &cost, "pro", None),
        ledger.debit(user.id, &cost, "pro", None)
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(
        [first, second]
            .into_iter()
            .filter_map(|r| r.err())
            .all(|e| matches!(e, AppError::InsufficientBalance))
    );
    assert_eq!(accounts.get_by_id(user.id).await.unwrap().gems, 1);
}

#[tokio::test]
async fn ledger_conservation_over_mixed_operations() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();

    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(100, 20), Some("seed"))
        .await
        .unwrap();
    ledger
        .create_pending_topup(user.id, 40, "card", "ORD-c", None)
        .await
        .unwrap();
    ledger.confirm_topup("ORD-c").await.unwrap().unwrap();
    let spend = ledger
        .debit(user.id, &TokenCost::gems(2), "pro", None)
        .await
        .unwrap();
    ledger
        .refund(user.id, &Compensation::for_spend(&spend))
        .await
        .unwrap();
    ledger
        .admin_adjust(user.id, &BalanceDelta::tokens(-30, -5), Some("correction"))
        .await
        .unwrap();

    let rows = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user.id))
        .filter(transactions::Column::Status.eq(TransactionStatus::Paid))
        .all(&db)
        .await
        .unwrap();
    let gem_sum: i64 = rows.iter().map(|tx| tx.amount_gems).sum();
    let spark_sum: i64 = rows.iter().map(|tx| tx.amount_sparks).sum();

    let refreshed = accounts.get_by_id(user.id).await.unwrap();
    assert_eq!(refreshed.gems, gem_sum);
    assert_eq!(refreshed.sparks, spark_sum);
    assert_eq!(refreshed.gems, 110);
    assert_eq!(refreshed.sparks, 15);
}

#[tokio::test]
async fn transaction_history_is_paginated_newest_first() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());
    let ledger = ledger(&db);

    let user = accounts.get_or_create(1, None, None).await.unwrap();
    for i in 0..5 {
        ledger
            .admin_adjust(user.id, &BalanceDelta::tokens(i + 1, 0), None)
            .await
            .unwrap();
    }

    let page = ledger
        .list_transactions(user.id, &PaginationParams::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
    // Newest first: the last adjustment comes back on top
    assert_eq!(page.items[0].amount_gems, 5);
}

#[tokio::test]
async fn find_account_resolves_digits_and_usernames() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    let user = accounts.get_or_create(77, Some("ada"), None).await.unwrap();

    let by_id = accounts.find_account("77").await.unwrap().unwrap();
    assert_eq!(by_id.id, user.id);
    let by_name = accounts.find_account("ada").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);
    assert!(accounts.find_account("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn preferences_are_last_write_wins() {
    let db = storage().await;
    let accounts = AccountService::new(db.clone());

    accounts.get_or_create(5, None, None).await.unwrap();

    let updated = accounts.set_selected_tier(5, Tier::Pro).await.unwrap();
    assert_eq!(updated.selected_tier, Tier::Pro);

    let updated = accounts
        .set_selected_preset(5, Some("anime".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.selected_preset.as_deref(), Some("anime"));

    let cleared = accounts.set_selected_preset(5, None).await.unwrap();
    assert_eq!(cleared.selected_preset, None);
}
