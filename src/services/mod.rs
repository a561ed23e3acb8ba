pub mod access;
pub mod entitlement_service;
pub mod entitlement_service_impl;
pub mod generation;
pub mod session;

pub use access::{AccessVerdict, DenialReason};
pub use entitlement_service::{EntitlementError, EntitlementService};
pub use entitlement_service_impl::SeaOrmEntitlementService;
pub use generation::{GenerationRequest, GenerationService};
pub use session::{InMemorySessionStore, Session, SessionStore};
