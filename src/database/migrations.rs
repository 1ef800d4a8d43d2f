pub use sea_orm_migration::prelude::*;

mod m20260601_000001_create_user;
mod m20260601_000002_create_config_param;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_create_user::Migration),
            Box::new(m20260601_000002_create_config_param::Migration),
        ]
    }
}

pub struct Migrator;
