//! Domain primitives shared across the service: the closed status-code
//! taxonomy, the response envelope, and the account role.

pub mod response;
pub mod role;
pub mod status;

pub use response::ServiceResponse;
pub use role::Role;
pub use status::{Category, StatusCode};
