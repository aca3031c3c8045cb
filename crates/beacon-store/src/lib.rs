//! # beacon-store
//!
//! Remote roster store adapters for Hearth Beacon. The store is
//! document-oriented, keyed by user with sub-collections per roster
//! entry and per alert:
//!
//! ```text
//! users/{uid}                   preferences.locationSharing, liveLocation
//! users/{uid}/family/{memberId} roster entry
//! users/{uid}/alerts/{alertId}  emergency alerts
//! ```
//!
//! Backends: an HTTP client against the platform's document API, and an
//! in-memory store for tests and development.

pub mod http;
pub mod manager;
pub mod memory;
pub mod roster;

pub use manager::RosterManager;
pub use roster::RosterStore;
