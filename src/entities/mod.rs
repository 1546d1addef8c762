pub mod prelude;

pub mod user_deletions;
pub mod user_restrictions;
pub mod user_tokens;
pub mod users;
