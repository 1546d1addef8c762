use sea_orm::entity::prelude::*;

/// One row per issued refresh token. Rows are deleted on rotation,
/// revocation, or when an expired value is presented.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Opaque refresh value (64 random bytes, url-safe base64)
    #[sea_orm(unique)]
    pub token: String,

    /// RFC 3339; the row is usable only while now < expires_at
    pub expires_at: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
