//! Create `subscriptions` table.
//! One row per paid user subscription; periods are month-granular dates (day = 1).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        uuid(Subscriptions::Id)
                            .primary_key()
                            .default(Expr::cust("gen_random_uuid()")),
                    )
                    .col(string_len(Subscriptions::ServiceName, 255).not_null())
                    .col(integer(Subscriptions::Price).not_null().check(Expr::col(Subscriptions::Price).gt(0)))
                    .col(uuid(Subscriptions::UserId).not_null())
                    .col(date(Subscriptions::StartDate).not_null())
                    .col(date_null(Subscriptions::EndDate))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Subscriptions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    ServiceName,
    Price,
    UserId,
    StartDate,
    EndDate,
}
