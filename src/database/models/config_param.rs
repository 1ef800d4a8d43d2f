//! `SeaORM` entity for system key/value parameters.

use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "config_param")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Fetch the value of one parameter, `None` if it was never set.
    pub async fn get<C: ConnectionTrait>(conn: &C, key: &str) -> Result<Option<String>, DbErr> {
        Ok(Self::find_by_id(key).one(conn).await?.map(|param| param.value))
    }

    /// Set a parameter, overwriting an existing value.
    pub async fn set<C: ConnectionTrait>(conn: &C, key: &str, value: &str) -> Result<(), DbErr> {
        match Self::find_by_id(key).one(conn).await? {
            Some(existing) => {
                let mut param: ActiveModel = existing.into();
                param.value = Set(value.to_string());
                param.update(conn).await?;
            }
            None => {
                let param = ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(value.to_string()),
                };
                param.insert(conn).await?;
            }
        }
        Ok(())
    }
}
