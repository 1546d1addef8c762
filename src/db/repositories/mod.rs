pub mod deletion;
pub mod restriction;
pub mod token;
pub mod user;
