//! Shared value types used across the Beacon crates.

pub mod id;

pub use id::{AlertId, MemberId, UserId};
