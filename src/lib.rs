//! # atfi-gateway
//!
//! REST backend for the ATFi event-commitment platform.
//!
//! Organizers create staking events on-chain; an indexer forwards the
//! creation logs here. This crate joins those immutable on-chain facts with
//! off-chain metadata, drives each event through its status lifecycle, and
//! tracks participants from registration to check-in and reward claim.
//! Token balances and vault participant counts are read from the chain on
//! demand and never stored.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP), indexer webhook
//!     │
//!     ├── REST Handlers + OpenAPI (api/)
//!     │
//!     ├── Services (service/)
//!     │     EventService · ProfileService · RegistrationService
//!     │     CheckinService · IngestService · StatusSweeper
//!     │
//!     ├── Domain types and status machine (domain/)
//!     │
//!     ├── Store traits (persistence/)
//!     │     PostgresStore (sqlx) · MemoryStore
//!     │
//!     └── ChainReader (chain/)
//!           JSON-RPC eth_call client
//! ```

pub mod api;
pub mod app_state;
pub mod chain;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
