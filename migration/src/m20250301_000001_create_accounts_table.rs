use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Accounts::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Accounts::Id)
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Accounts::Username).string().not_null())
                .col(ColumnDef::new(Accounts::Email).string().not_null())
                .col(ColumnDef::new(Accounts::DeviceToken).string().not_null())
                .col(ColumnDef::new(Accounts::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Accounts::UpdatedAt).timestamp_with_time_zone().not_null())
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_accounts_username")
                .table(Accounts::Table)
                .col(Accounts::Username)
                .unique()
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Accounts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Username,
    Email,
    DeviceToken,
    CreatedAt,
    UpdatedAt,
}
