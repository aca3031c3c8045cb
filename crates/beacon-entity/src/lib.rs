//! # beacon-entity
//!
//! Domain entity models for Hearth Beacon. Every struct in this crate
//! represents a roster-store document or a domain value object. All
//! entities derive `Debug`, `Clone`, `Serialize`, and `Deserialize`;
//! persisted field names use camelCase to match the document schema.

pub mod alert;
pub mod location;
pub mod member;
pub mod presence;
