use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    ExternalId,
    Username,
    Gems,
    Sparks,
    CashBalanceCents,
    CashEarnedCents,
    ReferralCode,
    ReferrerId,
    SelectedTier,
    SelectedPreset,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    UserId,
    Kind,
    Method,
    Status,
    AmountGems,
    AmountSparks,
    AmountCashCents,
    ExternalId,
    Payload,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Generations {
    Table,
    Id,
    UserId,
    Kind,
    Tier,
    Prompt,
    Preset,
    Status,
    CostGems,
    CostSparks,
    ResultUrl,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    ReferredUserId,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Monetary columns are integer cents. Token balances never go below zero;
/// that is enforced by guarded updates in the services, not by the schema.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::ExternalId).big_integer().not_null())
                    .col(ColumnDef::new(Users::Username).string_len(255))
                    .col(
                        ColumnDef::new(Users::Gems)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::Sparks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CashBalanceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CashEarnedCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::ReferralCode).string_len(32).not_null())
                    .col(ColumnDef::new(Users::ReferrerId).big_integer())
                    .col(ColumnDef::new(Users::SelectedTier).string_len(16).not_null())
                    .col(ColumnDef::new(Users::SelectedPreset).string_len(64))
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_external_id")
                    .table(Users::Table)
                    .col(Users::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_referral_code")
                    .table(Users::Table)
                    .col(Users::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Transactions::Method).string_len(32))
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountGems)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountSparks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transactions::AmountCashCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::ExternalId).string_len(128))
                    .col(ColumnDef::new(Transactions::Payload).json_binary())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_user_id")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .to_owned(),
            )
            .await?;

        // The idempotency key. NULL is allowed (spends, bonuses); non-NULL
        // values are unique across the whole store.
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_external_id")
                    .table(Transactions::Table)
                    .col(Transactions::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Generations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Generations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Generations::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Generations::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Generations::Tier).string_len(16))
                    .col(ColumnDef::new(Generations::Prompt).text())
                    .col(ColumnDef::new(Generations::Preset).string_len(64))
                    .col(
                        ColumnDef::new(Generations::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Generations::CostGems)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Generations::CostSparks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Generations::ResultUrl).text())
                    .col(ColumnDef::new(Generations::Error).text())
                    .col(
                        ColumnDef::new(Generations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Generations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_generations_user_id")
                    .table(Generations::Table)
                    .col(Generations::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferrerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferredUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_referrals_referrer_id")
                    .table(Referrals::Table)
                    .col(Referrals::ReferrerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Referrals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Generations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
