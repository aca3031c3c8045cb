//! # beacon-engine
//!
//! Location sharing and presence synchronization engine for Hearth
//! Beacon:
//!
//! - sharing session lifecycle (idle/active) with idempotent start/stop
//! - in-process listener hub fanning out location samples and
//!   sharing-state changes
//! - ordered, fire-and-forget write-through to the roster store and the
//!   presence cache
//! - roster reconciliation reads with cache fallback
//! - emergency alert dispatch, independent of the sharing session
//!
//! The engine is an explicit instance constructed once at process start
//! and passed by reference to consumers; `initialize`/`cleanup` bracket
//! its lifecycle.

pub mod alert;
pub mod engine;
pub mod hub;
pub mod persist;
pub mod staleness;

pub use alert::AlertDispatcher;
pub use engine::SyncEngine;
pub use hub::{ListenerGuard, ListenerHub};
