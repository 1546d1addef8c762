pub mod internal;
pub mod notification;
pub mod profile;

pub use internal::{InternalRequest, InternalServiceClient, Method};
pub use notification::NotificationClient;
pub use profile::ProfileClient;
