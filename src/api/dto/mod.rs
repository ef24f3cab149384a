//! Data Transfer Objects for REST request/response serialization.
//!
//! Token amounts travel as decimal strings so large values keep full
//! precision. Request fields that need validation arrive as plain strings
//! and are parsed by the handlers, which report failures as `400` in the
//! standard error envelope.

pub mod checkin_dto;
pub mod common_dto;
pub mod event_dto;
pub mod ingest_dto;
pub mod participant_dto;
pub mod profile_dto;

pub use checkin_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use ingest_dto::*;
pub use participant_dto::*;
pub use profile_dto::*;
