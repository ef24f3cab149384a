//! Domain layer: identifiers, event lifecycle and the reconciled event view.
//!
//! Everything here is pure data and rules. Storage and chain access live
//! in [`crate::persistence`] and [`crate::chain`].

pub mod address;
pub mod amount;
pub mod checkin;
pub mod event_id;
pub mod event_metadata;
pub mod event_status;
pub mod event_view;
pub mod onchain_event;
pub mod participant;
pub mod profile;

pub use address::{TxHash, WalletAddress};
pub use amount::TokenAmount;
pub use checkin::{Checkin, CheckinReview};
pub use event_id::EventId;
pub use event_metadata::{EventMetadata, MetadataPatch, SettlementSummary};
pub use event_status::{EventStatus, derive_status};
pub use event_view::{EventDetail, EventRecord, ParticipantCounts};
pub use onchain_event::{InvalidOnchainEvent, OnchainEvent};
pub use participant::{NewRegistration, Participant, ParticipantWithProfile};
pub use profile::{Profile, ProfilePatch};
