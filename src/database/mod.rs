pub mod connection;

pub use connection::{DbPool, create_pool, run_migrations};

/// True when a driver error is a unique-index violation, on either backend.
/// Used to turn external-id collisions into typed errors and to detect lost
/// races on account creation.
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
