use sea_orm::entity::prelude::*;

/// Soft-deletion tombstone. Written once per deletion event; the login is
/// snapshotted so the account can be explained after the user row changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_deletions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub login: String,

    pub reason: Option<String>,

    pub deleted_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
