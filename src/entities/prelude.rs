pub use super::user_deletions::Entity as UserDeletions;
pub use super::user_restrictions::Entity as UserRestrictions;
pub use super::user_tokens::Entity as UserTokens;
pub use super::users::Entity as Users;
