use sea_orm_migration::{
    prelude::*,
    schema::{boolean, pk_auto, string, string_null},
};

use crate::database::models::user::SUPERUSER_ID;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id))
                    .col(string(User::Login))
                    .col(string_null(User::Lang))
                    .col(boolean(User::Active).default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-user-login")
                    .table(User::Table)
                    .col(User::Login)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Seed the super-user every environment bootstraps from.
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(User::Table)
                    .columns([User::Id, User::Login, User::Lang, User::Active])
                    .values_panic([
                        SUPERUSER_ID.into(),
                        "admin".into(),
                        "en_US".into(),
                        true.into(),
                    ])
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Login,
    Lang,
    Active,
}
