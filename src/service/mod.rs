//! Service layer: business logic orchestration.
//!
//! Services sit between the HTTP handlers and the [`crate::persistence::Store`].
//! [`EventService`] owns the status lifecycle; the other services rely on
//! it (or on the store directly) for event lookups.

pub mod checkin_service;
pub mod event_service;
pub mod ingest_service;
pub mod profile_service;
pub mod registration_service;
pub mod status_sweeper;

pub use checkin_service::CheckinService;
pub use event_service::{EventQuery, EventService, SettlementNotice};
pub use ingest_service::{IngestReport, IngestService, ItemOutcome};
pub use profile_service::ProfileService;
pub use registration_service::{RegisterInput, RegistrationService};
pub use status_sweeper::StatusSweeper;
