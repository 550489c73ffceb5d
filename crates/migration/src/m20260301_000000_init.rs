//! Initial schema migration - creates all tables from scratch.
//!
//! - `merchants`: merchant accounts, the tenant boundary
//! - `clients`: customers buying on credit, with their outstanding credit
//! - `sales`: cash and credit sales
//! - `payments`: repayments of a client's credit
//! - `expenses`: business expenses
//! - `subscriptions`: one trial/paid subscription per merchant

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
    Phone,
    Email,
    ShopName,
    BusinessType,
    CreatedAt,
}

#[derive(Iden)]
enum Clients {
    Table,
    Id,
    AccountId,
    Name,
    NameNorm,
    Phone,
    Address,
    TotalCredit,
    CreatedAt,
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    AccountId,
    Amount,
    PaymentMode,
    CustomerName,
    ClientId,
    Notes,
    OccurredAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    ClientId,
    Amount,
    Notes,
    OccurredAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    AccountId,
    Amount,
    Motif,
    Category,
    OccurredAt,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    AccountId,
    Status,
    TrialStart,
    TrialEnd,
    PeriodStart,
    PeriodEnd,
    Plan,
    Amount,
    PaymentMethod,
    TransactionRef,
    LastPaymentDate,
    LastPaymentAmount,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Merchants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Merchants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Merchants::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Merchants::Phone).string().not_null())
                    .col(ColumnDef::new(Merchants::Email).string())
                    .col(ColumnDef::new(Merchants::ShopName).string().not_null())
                    .col(ColumnDef::new(Merchants::BusinessType).string())
                    .col(ColumnDef::new(Merchants::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-merchants-phone-unique")
                    .table(Merchants::Table)
                    .col(Merchants::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-merchants-email-unique")
                    .table(Merchants::Table)
                    .col(Merchants::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Clients
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clients::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Clients::AccountId).blob().not_null())
                    .col(ColumnDef::new(Clients::Name).string().not_null())
                    .col(ColumnDef::new(Clients::NameNorm).string().not_null())
                    .col(ColumnDef::new(Clients::Phone).string())
                    .col(ColumnDef::new(Clients::Address).string())
                    .col(
                        ColumnDef::new(Clients::TotalCredit)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Clients::TotalCredit).gte(0)),
                    )
                    .col(ColumnDef::new(Clients::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-clients-account_id")
                            .from(Clients::Table, Clients::AccountId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-clients-account_id-name_norm-unique")
                    .table(Clients::Table)
                    .col(Clients::AccountId)
                    .col(Clients::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Sales
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Sales::AccountId).blob().not_null())
                    .col(ColumnDef::new(Sales::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Sales::PaymentMode).string().not_null())
                    .col(ColumnDef::new(Sales::CustomerName).string())
                    .col(ColumnDef::new(Sales::ClientId).blob())
                    .col(ColumnDef::new(Sales::Notes).string())
                    .col(ColumnDef::new(Sales::OccurredAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-account_id")
                            .from(Sales::Table, Sales::AccountId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales-client_id")
                            .from(Sales::Table, Sales::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-account_id-occurred_at")
                    .table(Sales::Table)
                    .col(Sales::AccountId)
                    .col(Sales::OccurredAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales-client_id")
                    .table(Sales::Table)
                    .col(Sales::ClientId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Payments::ClientId).blob().not_null())
                    .col(ColumnDef::new(Payments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Notes).string())
                    .col(ColumnDef::new(Payments::OccurredAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-client_id")
                            .from(Payments::Table, Payments::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-client_id-occurred_at")
                    .table(Payments::Table)
                    .col(Payments::ClientId)
                    .col(Payments::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::AccountId).blob().not_null())
                    .col(ColumnDef::new(Expenses::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Expenses::Motif).string().not_null())
                    .col(ColumnDef::new(Expenses::Category).string())
                    .col(ColumnDef::new(Expenses::OccurredAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-account_id")
                            .from(Expenses::Table, Expenses::AccountId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-account_id-occurred_at")
                    .table(Expenses::Table)
                    .col(Expenses::AccountId)
                    .col(Expenses::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Subscriptions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::AccountId).blob().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Status)
                            .string()
                            .not_null()
                            .default("trial"),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::TrialStart)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::TrialEnd).timestamp().not_null())
                    .col(ColumnDef::new(Subscriptions::PeriodStart).timestamp())
                    .col(ColumnDef::new(Subscriptions::PeriodEnd).timestamp())
                    .col(ColumnDef::new(Subscriptions::Plan).string())
                    .col(ColumnDef::new(Subscriptions::Amount).big_integer())
                    .col(ColumnDef::new(Subscriptions::PaymentMethod).string())
                    .col(ColumnDef::new(Subscriptions::TransactionRef).string())
                    .col(ColumnDef::new(Subscriptions::LastPaymentDate).timestamp())
                    .col(ColumnDef::new(Subscriptions::LastPaymentAmount).big_integer())
                    .col(ColumnDef::new(Subscriptions::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Subscriptions::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscriptions-account_id")
                            .from(Subscriptions::Table, Subscriptions::AccountId)
                            .to(Merchants::Table, Merchants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscriptions-account_id-unique")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Merchants::Table).to_owned())
            .await?;
        Ok(())
    }
}
