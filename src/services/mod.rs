pub mod access_service;
pub use access_service::{AccessDecision, AccessService};

pub mod access_service_impl;
pub use access_service_impl::SeaOrmAccessService;

pub mod registration_service;
pub use registration_service::{RegistrationError, RegistrationOutcome, RegistrationService};

pub mod registration_service_impl;
pub use registration_service_impl::SeaOrmRegistrationService;

pub mod session_service;
pub use session_service::{Claims, SessionError, SessionPair, SessionService};

pub mod session_service_impl;
pub use session_service_impl::SeaOrmSessionService;
