use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Alerts::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Alerts::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Alerts::Slug).string().not_null())
                .col(ColumnDef::new(Alerts::Title).string().not_null())
                .col(ColumnDef::new(Alerts::Body).string().not_null())
                .col(ColumnDef::new(Alerts::PairAddress).string().not_null())
                .col(ColumnDef::new(Alerts::AlertType).string().not_null()) // "price"
                .col(ColumnDef::new(Alerts::AlertValue).string().not_null())
                .col(ColumnDef::new(Alerts::AlertOption).string().not_null()) // "gte", "lte", "gt", "lt"
                .col(ColumnDef::new(Alerts::ExpirationTime).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Alerts::AlertActions).string().not_null())
                .col(ColumnDef::new(Alerts::AlertStatus).string().not_null().default("active"))
                .col(ColumnDef::new(Alerts::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Alerts::UpdatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Alerts::DeletedAtUnix).big_integer().not_null().default(0))
                .col(ColumnDef::new(Alerts::AccountId).big_integer().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_alerts_account")
                        .from(Alerts::Table, Alerts::AccountId)
                        .to(Accounts::Table, Accounts::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        // Live rows carry deleted_at_unix = 0, so the composite unique index
        // holds exactly one live alert per slug while freeing the slug for
        // reuse once the row is soft deleted.
        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_alerts_slug_deleted_at_unix")
                .table(Alerts::Table)
                .col(Alerts::Slug)
                .col(Alerts::DeletedAtUnix)
                .unique()
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_alerts_account_id")
                .table(Alerts::Table)
                .col(Alerts::AccountId)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_alerts_deleted_at_unix")
                .table(Alerts::Table)
                .col(Alerts::DeletedAtUnix)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Alerts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    Slug,
    Title,
    Body,
    PairAddress,
    AlertType,
    AlertValue,
    AlertOption,
    ExpirationTime,
    AlertActions,
    AlertStatus,
    CreatedAt,
    UpdatedAt,
    DeletedAtUnix,
    AccountId,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
