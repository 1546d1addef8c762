use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Opaque UUID, generated at registration
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Case-sensitive, unique across non-purged rows
    #[sea_orm(unique)]
    pub login: String,

    /// PHC-format digest of the password
    pub password_hash: String,

    /// Salt used for the digest, stored separately for auditability
    pub password_salt: String,

    /// String form of [`crate::domain::Role`]
    pub role: String,

    pub created_at: String,

    pub last_login_at: Option<String>,

    pub is_email_confirmed: bool,

    pub is_blocked: bool,

    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
