//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::chain::ChainReader;
use crate::persistence::Store;
use crate::service::{
    CheckinService, EventService, IngestService, ProfileService, RegistrationService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage backend, used directly by the health probe.
    pub store: Arc<dyn Store>,
    /// Event reads, metadata and lifecycle.
    pub event_service: Arc<EventService>,
    /// Profiles and balances.
    pub profile_service: Arc<ProfileService>,
    /// Registration, withdrawal and claims.
    pub registration_service: Arc<RegistrationService>,
    /// QR check-ins.
    pub checkin_service: Arc<CheckinService>,
    /// Indexer webhook ingestion.
    pub ingest_service: Arc<IngestService>,
}

impl AppState {
    /// Wires every service over one store and one chain reader.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, chain: Arc<dyn ChainReader>) -> Self {
        let event_service = Arc::new(EventService::new(Arc::clone(&store), Arc::clone(&chain)));
        Self {
            profile_service: Arc::new(ProfileService::new(Arc::clone(&store), chain)),
            registration_service: Arc::new(RegistrationService::new(
                Arc::clone(&store),
                Arc::clone(&event_service),
            )),
            checkin_service: Arc::new(CheckinService::new(Arc::clone(&store))),
            ingest_service: Arc::new(IngestService::new(Arc::clone(&store))),
            event_service,
            store,
        }
    }
}
