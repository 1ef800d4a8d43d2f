//! `SeaORM` entity for application users.

use sea_orm::{entity::prelude::*, ConnectionTrait};

use crate::environment::Context;

/// Fixed privileged identity used to bootstrap an environment before any
/// user-specific logic runs. Seeded by the first migration.
pub const SUPERUSER_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub login: String,
    pub lang: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Read the stored execution context (language) for one user.
    ///
    /// Errors bubble up untouched; deciding whether a failed lookup is
    /// fatal is the caller's business.
    pub async fn context_get<C: ConnectionTrait>(conn: &C, uid: i32) -> Result<Context, DbErr> {
        let user = Self::find_by_id(uid)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {uid} does not exist")))?;

        Ok(match user.lang {
            Some(lang) => Context { lang },
            None => Context::default(),
        })
    }
}
