use sea_orm_migration::{prelude::*, schema::string};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConfigParam::Table)
                    .if_not_exists()
                    .col(string(ConfigParam::Key).primary_key())
                    .col(string(ConfigParam::Value))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConfigParam::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ConfigParam {
    Table,
    Key,
    Value,
}
