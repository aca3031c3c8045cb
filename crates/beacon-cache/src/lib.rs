//! # beacon-cache
//!
//! Local presence cache for Hearth Beacon: a key/value store holding the
//! sharing session flag, the per-user roster snapshot, the last-known
//! self-location, and the fallback pseudo-identity. The file-backed
//! provider survives process restarts; the in-memory provider backs
//! tests and ephemeral deployments.

pub mod keys;
pub mod provider;

#[cfg(feature = "file")]
pub mod file;
#[cfg(feature = "memory")]
pub mod memory;

pub use provider::CacheManager;
